//! Typed leaf atoms. Each file pairs the binrw parse struct with
//! the emitter the writer uses to render the same atom.

mod cmov;
mod co64;
mod dref;
mod elst;
mod ftyp;
mod hdlr;
mod mdhd;
mod mvhd;
mod smhd;
mod stco;
mod stsc;
mod stsd;
mod stss;
mod stsz;
mod stts;
mod tkhd;
mod vmhd;

pub use cmov::{Cmvd, Dcom};
pub use co64::Co64;
pub use dref::{DataReference, Dref};
pub use elst::{EditListEntry, Elst};
pub use ftyp::Ftyp;
pub use hdlr::Hdlr;
pub use mdhd::Mdhd;
pub use mvhd::Mvhd;
pub use smhd::Smhd;
pub use stco::Stco;
pub use stsc::{SampleToChunk, Stsc};
pub use stsd::{AudioDesc, SampleDescription, Stsd, VideoDesc};
pub use stss::Stss;
pub use stsz::Stsz;
pub use stts::{Stts, TimeToSample};
pub use tkhd::Tkhd;
pub use vmhd::Vmhd;
