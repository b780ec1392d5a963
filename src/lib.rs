//! QuickTime movie multiplexer and demultiplexer, with a
//! lossless implementation of the QuickTime Animation (`rle `)
//! pixel codec.
//!
//! The writer streams samples to any `Write + Seek` sink and
//! renders the movie header when finished. The reader walks the
//! atom tree of a finished movie and rebuilds the same model,
//! including zlib compressed movie headers. Neither side
//! buffers media data in full.
//!
//! Implemented against
//! <https://developer.apple.com/library/archive/documentation/QuickTime/QTFF/QTFFPreface/qtffPreface.html>.
//!
//! ```no_run
//! use movmux::{Mov, MovWriter, VideoMedia};
//! use std::fs::File;
//!
//! fn main() -> Result<(), movmux::MovError> {
//!     let mut writer = MovWriter::new(File::create("out.mov")?);
//!     let video = VideoMedia {
//!         width: 320,
//!         height: 240,
//!         ..Default::default()
//!     };
//!     let track = writer.add_video_track(video, 600)?;
//!     writer.write_sample(track, &[0, 0, 0, 4], 25, true)?;
//!     writer.finish()?;
//!
//!     // Read the movie back.
//!     let mut mov = Mov::new("out.mov")?;
//!     let movie = mov.movie()?;
//!     println!("{:.2} s", movie.duration_sec());
//!     Ok(())
//! }
//! ```

pub mod mov;
pub mod writer;
pub mod fourcc;
pub mod atom;
pub mod atom_types;
pub mod consts;
pub mod binary;
pub mod movie;
pub mod track;
pub mod rle;
pub mod errors;
pub mod tests;

// Internal positioned reader
pub(crate) mod reader;

pub use mov::Mov;
pub use writer::{AudioFormat, MovWriter};
pub use fourcc::FourCC;
pub use atom::{AtomHeader, CompositeAtom, DataAtom, WideDataAtom};
pub use atom_types::{
    Cmvd,
    Co64,
    Dcom,
    Dref,
    Elst,
    Ftyp,
    Hdlr,
    Mdhd,
    Mvhd,
    Smhd,
    Stco,
    Stsc,
    Stsd,
    Stss,
    Stsz,
    Stts,
    Tkhd,
    Vmhd,
    AudioDesc, // stsd component
    VideoDesc, // stsd component
    SampleDescription, // stsd component
};
pub use movie::Movie;
pub use track::{
    AudioMedia,
    Chunk,
    Edit,
    Media,
    Sample,
    SampleLocation,
    Track,
    VideoMedia,
};
pub use rle::{AnimationDecoder, AnimationEncoder, EncodedFrame};
pub use consts::{CONTAINER, mov_time_zero, MOVIE_TIME_SCALE};
pub use errors::MovError;
