//! Chunk offset atom for file sizes below the 32bit limit (`stco`).
//!
//! Location: `moov/trak[multiple]/mdia/minf/stbl/stco`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/chunk_offset_atom>

use std::io;

use binrw::BinRead;

use crate::atom::DataAtom;
use crate::binary::PutBe;
use crate::track::Chunk;

/// Chunk offset atom for file sizes below the 32bit limit (`stco`).
///
/// Location: `moov/trak[multiple]/mdia/minf/stbl/stco`
///
/// See: <https://developer.apple.com/documentation/quicktime-file-format/chunk_offset_atom>
#[derive(Debug, Default, BinRead, Clone)]
#[br(big)]
pub struct Stco {
    _version: u8,
    _flags: [u8; 3],
    pub(crate) no_of_entries: u32,
    /// Chunk offset table consisting of an array of offset values.
    #[br(count = no_of_entries)]
    pub(crate) offsets: Vec<u32>
}

impl Stco {
    pub fn len(&self) -> usize {
        self.no_of_entries as usize
    }

    pub fn is_empty(&self) -> bool {
        self.no_of_entries == 0
    }

    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    /// Returns chunk offset with specified 0-based index.
    pub fn get(&self, chunk_index: usize) -> Option<&u32> {
        self.offsets.get(chunk_index)
    }

    /// Renders the atom from the chunk list. `mdat_bias` shifts
    /// every offset, used when the header moves in front of the
    /// media data during web optimization.
    pub(crate) fn atom(chunks: &[Chunk], mdat_bias: i64) -> io::Result<DataAtom> {
        let mut atom = DataAtom::new("stco");
        atom.put_u32(0)?; // version + flags
        atom.put_u32(chunks.len() as u32)?;
        for chunk in chunks {
            atom.put_u32((chunk.offset as i64 + mdat_bias) as u32)?;
        }
        Ok(atom)
    }
}
