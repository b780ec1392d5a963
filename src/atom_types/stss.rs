//! Sync sample atom (`stss`).
//!
//! Holds the 1-based numbers of the samples that are sync
//! samples (key frames). Absent entirely when every sample
//! is a sync sample.
//!
//! Location: `moov/trak[multiple]/mdia/minf/stbl/stss`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/sync_sample_atom>

use std::io;

use binrw::BinRead;

use crate::atom::DataAtom;
use crate::binary::PutBe;

/// Sync sample atom (`stss`).
///
/// Location: `moov/trak[multiple]/mdia/minf/stbl/stss`
///
/// See: <https://developer.apple.com/documentation/quicktime-file-format/sync_sample_atom>
#[derive(Debug, Default, BinRead)]
#[br(big)]
pub struct Stss {
    _version: u8,
    _flags: [u8; 3],
    _number_of_entries: u32,
    #[br(count = _number_of_entries)]
    pub(crate) sync_samples: Vec<u32>
}

impl Stss {
    pub fn len(&self) -> usize {
        self.sync_samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sync_samples.is_empty()
    }

    /// 1-based sample numbers of the sync samples.
    pub fn sync_samples(&self) -> &[u32] {
        &self.sync_samples
    }

    pub fn into_sync_samples(self) -> Vec<u32> {
        self.sync_samples
    }

    pub(crate) fn atom(sync_samples: &[u32]) -> io::Result<DataAtom> {
        let mut atom = DataAtom::new("stss");
        atom.put_u32(0)?; // version + flags
        atom.put_u32(sync_samples.len() as u32)?;
        for sample in sync_samples {
            atom.put_u32(*sample)?;
        }
        Ok(atom)
    }
}
