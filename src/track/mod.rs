//! Track model shared by the writer and the reader.
//!
//! The writer mutates a `Track` once per sample write, folding the
//! sample into run-length grouped tables. The reader rebuilds the
//! same model from parsed sample table atoms.

mod edit;
mod sample;
mod track;

pub use edit::Edit;
pub use sample::{Chunk, Sample, SampleLocation, SampleSizeRun};
pub use track::{AudioMedia, Media, Track, VideoMedia};

pub(crate) use sample::append_run;
