//! Sample size atom (`stsz`).
//!
//! Location: `moov/trak[multiple]/mdia/minf/stbl/stsz`
//!
//! Note that `stsz` lists sample size not chunk size.
//! `stco` or `co64` list chunk offsets, not offsets to individual samples.
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/sample_size_atom>

use std::io;

use binrw::BinRead;

use crate::atom::DataAtom;
use crate::binary::PutBe;
use crate::track::SampleSizeRun;

/// Sample size atom (`stsz`).
///
/// Location: `moov/trak[multiple]/mdia/minf/stbl/stsz`
///
/// See: <https://developer.apple.com/documentation/quicktime-file-format/sample_size_atom>
#[derive(Debug, BinRead)]
#[br(big)]
pub struct Stsz {
    _version: u8,
    _flags: [u8; 3],
    /// Sample size.
    /// If 0 `no_of_entries` contains
    /// the number of u32 values that should be read,
    /// else all sample sizes should have this value.
    pub(crate) sample_size: u32,
    pub(crate) no_of_entries: u32,
    #[br(if(sample_size == 0), count = no_of_entries)]
    pub(crate) sizes: Vec<u32>
}

impl Stsz {
    pub fn len(&self) -> usize {
        self.no_of_entries as usize
    }

    pub fn is_empty(&self) -> bool {
        self.no_of_entries == 0
    }

    pub fn sample_size(&self) -> u32 {
        self.sample_size
    }

    /// Returns discrete list of sample sizes in bytes,
    /// expanding the uniform-size form.
    pub fn sizes(&self) -> Vec<u32> {
        if self.sample_size == 0 {
            self.sizes.clone()
        } else {
            vec![self.sample_size; self.no_of_entries as usize]
        }
    }

    /// Byte size for one sample, 0-based index.
    pub fn size(&self, sample: usize) -> Option<u32> {
        if sample >= self.no_of_entries as usize {
            return None
        }
        if self.sample_size == 0 {
            self.sizes.get(sample).copied()
        } else {
            Some(self.sample_size)
        }
    }

    /// Renders the atom from accumulated runs. A single run
    /// means every sample shares one length, written in the
    /// compact uniform form without a table. Zero-length samples
    /// always take the table form, since a uniform size of 0 is
    /// the table form's marker.
    pub(crate) fn atom(runs: &[SampleSizeRun], sample_count: u64) -> io::Result<DataAtom> {
        let mut atom = DataAtom::new("stsz");
        atom.put_u32(0)?; // version + flags
        match runs {
            [single] if single.sample_length != 0 => {
                atom.put_u32(single.sample_length)?;
                atom.put_u32(sample_count as u32)?;
            }
            _ => {
                atom.put_u32(0)?;
                atom.put_u32(sample_count as u32)?;
                for run in runs {
                    for _ in 0..run.sample_count {
                        atom.put_u32(run.sample_length)?;
                    }
                }
            }
        }
        Ok(atom)
    }
}
