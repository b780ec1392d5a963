//! Media header atom (`mdhd`).
//!
//! Location: `moov/trak[multiple]/mdia/mdhd`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/media_header_atom>

use std::io;

use binrw::BinRead;
use time::PrimitiveDateTime;

use crate::atom::DataAtom;
use crate::binary::{date_from_mac, PutBe};
use crate::track::Track;

/// Media header atom (`mdhd`).
///
/// Location: `moov/trak[multiple]/mdia/mdhd`
///
/// See: <https://developer.apple.com/documentation/quicktime-file-format/media_header_atom>
#[derive(Debug, BinRead)]
#[br(big)]
pub struct Mdhd {
    _version: u8,
    _flags: [u8; 3],
    /// Indicates the creation calendar date and time for the media.
    /// Represents the calendar date and time in seconds since midnight,
    /// January 1, 1904, preferably using coordinated universal time (UTC).
    pub(crate) creation_time: u32,
    /// Indicates the last change date for the media.
    pub(crate) modification_time: u32,
    /// Number of time units per second for this media.
    pub(crate) time_scale: u32,
    /// Duration of this media in media time scale units.
    pub(crate) duration: u32,
    /// Packed ISO language code for this media.
    /// Each character is stored as a 5-bit offset from 0x60.
    pub(crate) language: u16,
    /// The media's playback quality.
    pub(crate) quality: u16,
}

impl Mdhd {
    /// Creation datetime for this media.
    pub fn creation_time(&self) -> PrimitiveDateTime {
        date_from_mac(self.creation_time)
    }

    /// Modification datetime for this media.
    pub fn modification_time(&self) -> PrimitiveDateTime {
        date_from_mac(self.modification_time)
    }

    /// Number of time units per second for this media.
    pub fn time_scale(&self) -> u32 {
        self.time_scale
    }

    /// Duration of this media in media time scale units.
    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// Duration of this media in seconds.
    pub fn duration_sec(&self) -> f64 {
        self.duration as f64 / self.time_scale as f64
    }

    /// Unpacks the language code into a three character string,
    /// e.g. `eng` for English.
    pub fn language_code(&self) -> String {
        [10_u16, 5, 0]
            .iter()
            .map(|shift| {
                let ch = ((self.language >> shift) & 0x1F) as u8 + 0x60;
                ch as char
            })
            .collect()
    }

    /// Renders the atom. Media duration is clamped to `u32::MAX`
    /// for media longer than the 32-bit header field can express.
    pub(crate) fn atom(track: &Track) -> io::Result<DataAtom> {
        let duration = u32::try_from(track.media_duration).unwrap_or(u32::MAX);
        let mut atom = DataAtom::new("mdhd");
        atom.put_u32(0)?; // version + flags
        atom.put_mac_date(track.creation_time)?;
        atom.put_mac_date(track.modification_time)?;
        atom.put_u32(track.media_time_scale)?;
        atom.put_u32(duration)?;
        atom.put_u16(track.language)?;
        atom.put_u16(0)?; // quality
        Ok(atom)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use binrw::BinReaderExt;

    use super::Mdhd;

    #[test]
    fn language_code_unpacks_five_bit_chars() {
        // 'e' = 5, 'n' = 14, 'g' = 7 -> (5 << 10) | (14 << 5) | 7
        let raw: Vec<u8> = [
            0_u32.to_be_bytes().to_vec(),
            0_u32.to_be_bytes().to_vec(),
            0_u32.to_be_bytes().to_vec(),
            600_u32.to_be_bytes().to_vec(),
            1200_u32.to_be_bytes().to_vec(),
            ((5_u16 << 10) | (14 << 5) | 7).to_be_bytes().to_vec(),
            0_u16.to_be_bytes().to_vec(),
        ]
        .concat();
        let mdhd: Mdhd = Cursor::new(raw).read_ne().unwrap();
        assert_eq!(mdhd.language_code(), "eng");
        assert_eq!(mdhd.time_scale(), 600);
        assert_eq!(mdhd.duration(), 1200);
    }
}
