//! Video media information header atom (`vmhd`).
//!
//! Location: `moov/trak[multiple]/mdia/minf/vmhd`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/video_media_information_header_atom>

use std::io;

use binrw::BinRead;

use crate::atom::DataAtom;
use crate::binary::PutBe;

/// Dither copy, the usual transfer mode for video media.
const GRAPHICS_MODE_DITHER_COPY: u16 = 0x0040;

/// Video media information header atom (`vmhd`).
///
/// Location: `moov/trak[multiple]/mdia/minf/vmhd`
///
/// See: <https://developer.apple.com/documentation/quicktime-file-format/video_media_information_header_atom>
#[derive(Debug, BinRead)]
#[br(big)]
pub struct Vmhd {
    _version: u8,
    _flags: [u8; 3],
    /// QuickDraw transfer mode.
    pub(crate) graphics_mode: u16,
    /// RGB op color for the transfer mode.
    pub(crate) op_color: [u16; 3],
}

impl Vmhd {
    pub fn graphics_mode(&self) -> u16 {
        self.graphics_mode
    }

    pub fn op_color(&self) -> &[u16; 3] {
        &self.op_color
    }

    /// Renders the atom. Flag 1 (no lean ahead) is always set.
    pub(crate) fn atom() -> io::Result<DataAtom> {
        let mut atom = DataAtom::new("vmhd");
        atom.put_u32(1)?; // version + flags
        atom.put_u16(GRAPHICS_MODE_DITHER_COPY)?;
        for _ in 0..3 {
            atom.put_u16(0x8000)?; // op color
        }
        Ok(atom)
    }
}
