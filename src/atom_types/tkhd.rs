//! Track header atom (`tkhd`).
//!
//! Location: `moov/trak[multiple]/tkhd`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/track_header_atom>

use std::io;

use binrw::BinRead;
use time::PrimitiveDateTime;

use crate::atom::DataAtom;
use crate::binary::{date_from_mac, matrix_from_bytes, unfixed16_16, unfixed8_8, PutBe};
use crate::track::{Media, Track};

/// Track enabled, track in movie, track in preview.
const TKHD_FLAGS: u32 = 0x0007;

/// Track header atom (`tkhd`).
///
/// Location: `moov/trak[multiple]/tkhd`
///
/// See: <https://developer.apple.com/documentation/quicktime-file-format/track_header_atom>
#[derive(Debug, BinRead)]
#[br(big)]
pub struct Tkhd {
    _version: u8,
    _flags: [u8; 3],
    /// Indicates the creation calendar date and time for the track header.
    /// Represents the calendar date and time in seconds since midnight,
    /// January 1, 1904, preferably using coordinated universal time (UTC).
    pub(crate) creation_time: u32,
    /// Indicates the last change date for the track header.
    pub(crate) modification_time: u32,
    /// Uniquely identifies the track.
    /// Value 0 cannot be used.
    pub(crate) track_id: u32,
    _reserved1: [u8; 4],
    /// Indicates the duration of this track,
    /// in the movie's time coordinate system.
    /// The value of this field is equal to the sum of the durations
    /// of all of the track's edits.
    /// If there is no edit list, then the duration is the sum of the
    /// sample durations, converted into the movie timescale.
    pub(crate) duration: u32,
    _reserved2: [u8; 8],
    /// This track's spatial priority in its movie.
    layer: u16,
    /// Identifies a collection of movie tracks that contain
    /// alternate data for one another.
    pub(crate) alternate_group: u16,
    /// 8.8 fixed-point value that indicates how loudly to play
    /// this track's sound. 1.0 indicates normal volume.
    pub(crate) volume: u16,
    _reserved3: [u8; 2],
    /// The matrix structure associated with this track.
    #[br(map = |raw: [u8; 36]| matrix_from_bytes(&raw))]
    pub(crate) matrix: [f64; 9],
    /// 16.16 fixed-point width of this track in pixels.
    pub(crate) track_width: u32,
    /// 16.16 fixed-point height of this track in pixels.
    pub(crate) track_height: u32,
}

impl Tkhd {
    pub fn track_id(&self) -> u32 {
        self.track_id
    }

    /// Track width in pixels (video tracks only).
    pub fn width(&self) -> f64 {
        unfixed16_16(self.track_width)
    }

    /// Track height in pixels (video tracks only).
    pub fn height(&self) -> f64 {
        unfixed16_16(self.track_height)
    }

    pub fn layer(&self) -> u16 {
        self.layer
    }

    pub fn alternate_group(&self) -> u16 {
        self.alternate_group
    }

    /// Volume "level". 1.0 is normal volume.
    pub fn volume(&self) -> f64 {
        unfixed8_8(self.volume)
    }

    /// This track's unscaled duration, in movie time scale.
    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// This track's duration in seconds.
    pub fn duration_sec(&self, time_scale: u32) -> f64 {
        self.duration as f64 / time_scale as f64
    }

    pub fn matrix(&self) -> &[f64; 9] {
        &self.matrix
    }

    /// Creation datetime for this track.
    pub fn creation_time(&self) -> PrimitiveDateTime {
        date_from_mac(self.creation_time)
    }

    /// Modification datetime for this track.
    pub fn modification_time(&self) -> PrimitiveDateTime {
        date_from_mac(self.modification_time)
    }

    /// Renders the atom. `duration` is the track duration in
    /// movie time scale.
    pub(crate) fn atom(track: &Track, track_id: u32, duration: u32) -> io::Result<DataAtom> {
        let (width, height, volume) = match &track.media {
            Media::Video(video) => (video.width as f64, video.height as f64, 0.0),
            Media::Audio(_) => (0.0, 0.0, 1.0),
        };
        let mut atom = DataAtom::new("tkhd");
        atom.put_u32(TKHD_FLAGS)?; // version + flags
        atom.put_mac_date(track.creation_time)?;
        atom.put_mac_date(track.modification_time)?;
        atom.put_u32(track_id)?;
        atom.put_zeros(4)?;
        atom.put_u32(duration)?;
        atom.put_zeros(8)?;
        atom.put_u16(0)?; // layer
        atom.put_u16(0)?; // alternate group
        atom.put_fixed8_8(volume)?;
        atom.put_zeros(2)?;
        atom.put_matrix(&track.matrix)?;
        atom.put_fixed16_16(width)?;
        atom.put_fixed16_16(height)?;
        Ok(atom)
    }
}
