//! Sample records and run-length grouping.
//!
//! Sample tables compress well because consecutive samples tend to
//! share durations, lengths, and physical adjacency. Each table is
//! a list of runs built online: every new sample either extends the
//! most recent run or opens a new one. The extension rule differs
//! per table, so it is passed in as a predicate.

use crate::consts::MAX_GROUP_SAMPLES;

/// One media sample as handed to the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// Duration in media time scale units.
    pub duration: u32,
    /// Absolute file offset of the first byte.
    pub offset: u64,
    /// Length in bytes.
    pub length: u32,
}

/// Run of consecutive samples sharing one byte length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSizeRun {
    pub(crate) sample_count: u32,
    pub(crate) sample_length: u32,
}

/// Run of physically contiguous samples sharing one sample
/// description, i.e. one `stco`/`co64` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Number of samples stored in this chunk.
    pub(crate) sample_count: u32,
    /// 1-based index into the sample description table.
    pub(crate) sample_description_id: u32,
    /// Absolute file offset of the first byte.
    pub(crate) offset: u64,
    /// Offset one past the last byte. A following chunk starting
    /// here is contiguous and merges in.
    pub(crate) next_offset: u64,
}

impl Chunk {
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn sample_description_id(&self) -> u32 {
        self.sample_description_id
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    #[cfg(test)]
    pub(crate) fn with_shape(sample_count: u32, sample_description_id: u32) -> Self {
        Self {
            sample_count,
            sample_description_id,
            offset: 0,
            next_offset: 0,
        }
    }
}

/// Resolved location of a single sample, expanded from the
/// sample tables on the read side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleLocation {
    /// Absolute file offset of the first byte.
    pub offset: u64,
    /// Length in bytes.
    pub length: u32,
    /// Duration in media time scale units.
    pub duration: u32,
    /// Whether the sample is a sync sample (key frame).
    pub is_sync: bool,
}

/// Appends `new` to a run-length table. `extend` may merge `new`
/// into the last run and return `true`, otherwise `new` opens a
/// run of its own. Merging is only ever attempted against the
/// most recent run.
pub(crate) fn append_run<T>(runs: &mut Vec<T>, new: T, extend: impl FnOnce(&mut T, &T) -> bool) {
    if let Some(last) = runs.last_mut() {
        if extend(last, &new) {
            return;
        }
    }
    runs.push(new);
}

/// Shared capacity guard for run extension: no run may describe
/// more samples than a table entry can hold.
pub(crate) fn fits(current: u32, added: u32) -> bool {
    current as u64 + added as u64 <= MAX_GROUP_SAMPLES as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_run_extends_last_only() {
        let mut runs: Vec<(u32, u32)> = Vec::new();
        let same = |last: &mut (u32, u32), new: &(u32, u32)| {
            if last.1 != new.1 {
                return false;
            }
            last.0 += new.0;
            true
        };
        append_run(&mut runs, (1, 10), same);
        append_run(&mut runs, (1, 10), same);
        append_run(&mut runs, (1, 7), same);
        // 10 again: does not reopen the earlier run
        append_run(&mut runs, (1, 10), same);
        assert_eq!(runs, vec![(2, 10), (1, 7), (1, 10)]);
    }

    #[test]
    fn capacity_guard() {
        assert!(fits(MAX_GROUP_SAMPLES - 1, 1));
        assert!(!fits(MAX_GROUP_SAMPLES, 1));
        assert!(!fits(MAX_GROUP_SAMPLES - 1, 2));
    }
}
