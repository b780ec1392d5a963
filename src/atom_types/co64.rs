//! Chunk to offset atom for file sizes above the 32bit limit (`co64`).
//! The 64-bit equivalent of the `stco` atom.
//!
//! Path: `moov/trak[multiple]/mdia/minf/stbl/co64`

use std::io;

use binrw::BinRead;

use crate::atom::DataAtom;
use crate::binary::PutBe;
use crate::track::Chunk;

use super::Stco;

/// Chunk to offset atom for file sizes above the 32bit limit (`co64`).
/// The 64-bit equivalent of the `stco` atom.
///
/// Path: `moov/trak/mdia/minf/stbl/co64`
#[derive(Debug, Default, BinRead, Clone)]
#[br(big)]
pub struct Co64 {
    _version: u8,
    _flags: [u8; 3],
    no_of_entries: u32,
    #[br(count = no_of_entries)]
    offsets: Vec<u64>
}

impl Co64 {
    /// Returns number of chunks
    /// (each chunk corresponds to one or more samples).
    pub fn len(&self) -> usize {
        self.no_of_entries as usize
    }

    pub fn is_empty(&self) -> bool {
        self.no_of_entries == 0
    }

    /// Returns chunk byte offsets.
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    /// Renders the atom from the chunk list, see [`Stco::atom`].
    pub(crate) fn atom(chunks: &[Chunk], mdat_bias: i64) -> io::Result<DataAtom> {
        let mut atom = DataAtom::new("co64");
        atom.put_u32(0)?; // version + flags
        atom.put_u32(chunks.len() as u32)?;
        for chunk in chunks {
            atom.put_u64((chunk.offset as i64 + mdat_bias) as u64)?;
        }
        Ok(atom)
    }
}

impl From<Stco> for Co64 {
    fn from(value: Stco) -> Self {
        Self {
            _version: 0,
            _flags: [0; 3],
            no_of_entries: value.no_of_entries,
            offsets: value.offsets
                .iter()
                .map(|n| *n as u64)
                .collect()
        }
    }
}
