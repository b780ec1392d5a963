//! Time-to-sample atom (`stts`).
//!
//! Location: `moov/trak[multiple]/mdia/minf/stbl/stts`
//!
//! See <https://developer.apple.com/documentation/quicktime-file-format/time-to-sample_atom>

use std::io;

use binrw::BinRead;

use crate::atom::DataAtom;
use crate::binary::PutBe;

/// One run of consecutive samples sharing a duration.
/// Doubles as the in-memory run the writer accumulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(big)]
pub struct TimeToSample {
    pub(crate) sample_count: u32,
    pub(crate) sample_duration: u32,
}

impl TimeToSample {
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn sample_duration(&self) -> u32 {
        self.sample_duration
    }
}

/// Time to sample atom (`stts`).
///
/// Path: `moov/trak[multiple]/mdia/minf/stbl/stts`
///
/// See <https://developer.apple.com/documentation/quicktime-file-format/time-to-sample_atom>
#[derive(Debug, BinRead)]
#[br(big)]
pub struct Stts {
    _version: u8,
    _flags: [u8; 3],
    _no_of_entries: u32,
    #[br(count = _no_of_entries)]
    table: Vec<TimeToSample>
}

impl Stts {
    /// Returns total number of samples.
    ///
    /// If an entry lists a duration for four samples,
    /// it counts as four entries towards the total.
    pub fn len(&self) -> usize {
        self.table.iter()
            .map(|t| t.sample_count as usize)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn table(&self) -> &[TimeToSample] {
        &self.table
    }

    pub fn into_table(self) -> Vec<TimeToSample> {
        self.table
    }

    /// Returns discrete list of unscaled duration values.
    pub fn durations(&self) -> Vec<u32> {
        self.table.iter()
            .flat_map(|t| vec![t.sample_duration; t.sample_count as usize])
            .collect()
    }

    pub fn duration_sum(&self) -> u64 {
        self.table.iter()
            .map(|t| t.sample_duration as u64 * t.sample_count as u64)
            .sum()
    }

    /// Renders the atom from accumulated runs.
    pub(crate) fn atom(table: &[TimeToSample]) -> io::Result<DataAtom> {
        let mut atom = DataAtom::new("stts");
        atom.put_u32(0)?; // version + flags
        atom.put_u32(table.len() as u32)?;
        for run in table {
            atom.put_u32(run.sample_count)?;
            atom.put_u32(run.sample_duration)?;
        }
        Ok(atom)
    }
}
