//! Sound media information header atom (`smhd`).
//!
//! Location: `moov/trak[multiple]/mdia/minf/smhd`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/sound_media_information_header_atom>

use std::io;

use binrw::BinRead;

use crate::atom::DataAtom;
use crate::binary::PutBe;

/// Sound media information header atom (`smhd`).
///
/// Location: `moov/trak[multiple]/mdia/minf/smhd`
///
/// See: <https://developer.apple.com/documentation/quicktime-file-format/sound_media_information_header_atom>
#[derive(Debug, BinRead)]
#[br(big)]
pub struct Smhd {
    _version: u8,
    _flags: [u8; 3],
    /// 8.8 fixed-point stereo balance. 0 is center.
    pub(crate) balance: i16,
    _reserved: u16,
}

impl Smhd {
    /// Stereo balance. 0.0 is center, negative is left,
    /// positive is right.
    pub fn balance(&self) -> f64 {
        self.balance as f64 / 256.0
    }

    /// Renders the atom with a centered balance.
    pub(crate) fn atom() -> io::Result<DataAtom> {
        let mut atom = DataAtom::new("smhd");
        atom.put_u32(0)?; // version + flags
        atom.put_i16(0)?; // balance
        atom.put_u16(0)?;
        Ok(atom)
    }
}
