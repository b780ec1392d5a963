//! Sample to chunk atom (`stsc`)
//!
//! Location: `moov/trak[multiple]/mdia/minf/stbl/stsc`
//!
//! See:
//! - Sample to chunk atom: <https://developer.apple.com/documentation/quicktime-file-format/sample-to-chunk_atom>
//! - Sample to chunk table: <https://developer.apple.com/documentation/quicktime-file-format/sample-to-chunk_atom/sample-to-chunk_table>

use std::io;

use binrw::BinRead;

use crate::atom::DataAtom;
use crate::binary::PutBe;
use crate::track::Chunk;

/// Sample to chunk atom (`stsc`)
///
/// The table is itself run-length compressed: one entry per run
/// of chunks sharing `(samples_per_chunk, sample_description_id)`.
#[derive(Debug, BinRead)]
#[br(big)]
pub struct Stsc {
    _version: u8,
    _flags: [u8; 3],
    no_of_entries: u32,
    #[br(count = no_of_entries)]
    pub(crate) table: Vec<SampleToChunk>,
}

impl Stsc {
    pub fn len(&self) -> usize {
        self.no_of_entries as usize
    }

    pub fn is_empty(&self) -> bool {
        self.no_of_entries == 0
    }

    pub fn table(&self) -> &[SampleToChunk] {
        &self.table
    }

    /// Expands the table to one `(samples_per_chunk,
    /// sample_description_id)` pair per chunk. The chunk count
    /// comes from `stco`/`co64` since the last entry runs to the
    /// end of the track.
    pub fn expand(&self, chunk_count: usize) -> Vec<(u32, u32)> {
        let mut per_chunk = Vec::with_capacity(chunk_count);
        for (i, entry) in self.table.iter().enumerate() {
            let next_first = self.table.get(i + 1)
                .map(|e| e.first_chunk as usize)
                .unwrap_or(chunk_count + 1);
            for _ in entry.first_chunk as usize..next_first {
                per_chunk.push((entry.samples_per_chunk, entry.sample_description_id));
            }
        }
        per_chunk
    }

    /// Renders the atom from the chunk list, collapsing runs of
    /// identical `(sample_count, sample_description_id)` chunks
    /// into single entries.
    pub(crate) fn atom(chunks: &[Chunk]) -> io::Result<DataAtom> {
        let mut entries: Vec<SampleToChunk> = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let same = entries.last().map_or(false, |e| {
                e.samples_per_chunk == chunk.sample_count
                    && e.sample_description_id == chunk.sample_description_id
            });
            if !same {
                entries.push(SampleToChunk {
                    first_chunk: i as u32 + 1,
                    samples_per_chunk: chunk.sample_count,
                    sample_description_id: chunk.sample_description_id,
                });
            }
        }

        let mut atom = DataAtom::new("stsc");
        atom.put_u32(0)?; // version + flags
        atom.put_u32(entries.len() as u32)?;
        for entry in &entries {
            atom.put_u32(entry.first_chunk)?;
            atom.put_u32(entry.samples_per_chunk)?;
            atom.put_u32(entry.sample_description_id)?;
        }
        Ok(atom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(big)]
pub struct SampleToChunk {
    /// 1-based index of first chunk
    /// that contains the number of
    /// samples specified in `samples_per_chunk`.
    /// The following chunks will all contain the
    /// same number of samples until the next
    /// sample to chunk entry.
    pub(crate) first_chunk: u32,
    /// Number of samples for chunk number
    /// specified by `first_chunk` and on,
    /// until the next sample to chunk entry.
    pub(crate) samples_per_chunk: u32,
    pub(crate) sample_description_id: u32,
}

impl SampleToChunk {
    pub fn first_chunk(&self) -> u32 {
        self.first_chunk
    }

    pub fn samples_per_chunk(&self) -> u32 {
        self.samples_per_chunk
    }

    pub fn sample_description_id(&self) -> u32 {
        self.sample_description_id
    }
}
