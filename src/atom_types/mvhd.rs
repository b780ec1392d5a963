//! Movie header atom (`mvhd`).
//!
//! Location: `moov/mvhd`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/movie_header_atom>

use std::io;

use binrw::BinRead;
use time::{Duration, ext::NumericalDuration};

use crate::atom::DataAtom;
use crate::binary::{matrix_from_bytes, PutBe};
use crate::movie::Movie;

/// Movie header atom (`mvhd`).
///
/// Location: `moov/mvhd`
///
/// See: <https://developer.apple.com/documentation/quicktime-file-format/movie_header_atom>
#[derive(Debug, BinRead)]
#[br(big)]
pub struct Mvhd {
    _version: u8,
    _flags: [u8; 3],
    /// Seconds since midnight, 1904-01-01 UTC
    pub creation_time: u32,
    /// Seconds since midnight, 1904-01-01 UTC
    pub modification_time: u32,
    /// Number of time units that pass in one second
    pub time_scale: u32,
    /// Unscaled duration. I.e. "time units"
    /// that require dividing by time scale
    /// to derive a value in seconds.
    ///
    /// Corresponds to the longest track.
    pub duration: u32,
    /// Fixed point number (16.16)
    /// representing preferred play rate
    /// (1.0 = normal playback).
    pub preferred_rate: u32,
    /// Fixed point number (8.8)
    /// representing preferred volume
    /// (1.0 = full volume).
    pub preferred_volume: u16,
    pub reserved: [u8; 10],
    /// Row-major transform.
    #[br(map = |raw: [u8; 36]| matrix_from_bytes(&raw))]
    pub matrix: [f64; 9],
    pub preview_time: u32,
    pub preview_duration: u32,
    pub poster_time: u32,
    pub selection_time: u32,
    pub selection_duration: u32,
    pub current_time: u32,
    pub next_track_id: u32,
}

impl Mvhd {
    /// Creation time as UTC datetime.
    /// May default to container time zero
    /// `1904-01-01 00:00:00` depending on writer.
    pub fn creation_time(&self) -> time::PrimitiveDateTime {
        crate::binary::date_from_mac(self.creation_time)
    }

    /// Modification time as UTC datetime.
    pub fn modification_time(&self) -> time::PrimitiveDateTime {
        crate::binary::date_from_mac(self.modification_time)
    }

    /// Duration of the longest track in seconds.
    pub fn duration(&self) -> Duration {
        (self.duration as f64 / self.time_scale as f64).seconds()
    }

    pub fn preferred_rate(&self) -> f64 {
        crate::binary::unfixed16_16(self.preferred_rate)
    }

    pub fn preferred_volume(&self) -> f64 {
        crate::binary::unfixed8_8(self.preferred_volume)
    }

    /// Renders the atom. `duration` is the longest track
    /// duration in movie time scale, `next_track_id` one past
    /// the highest assigned track id.
    pub(crate) fn atom(movie: &Movie, duration: u32, next_track_id: u32) -> io::Result<DataAtom> {
        let mut atom = DataAtom::new("mvhd");
        atom.put_u32(0)?; // version + flags
        atom.put_mac_date(movie.creation_time)?;
        atom.put_mac_date(movie.modification_time)?;
        atom.put_u32(movie.time_scale)?;
        atom.put_u32(duration)?;
        atom.put_fixed16_16(movie.preferred_rate)?;
        atom.put_fixed8_8(movie.preferred_volume)?;
        atom.put_zeros(10)?;
        atom.put_matrix(&movie.matrix)?;
        atom.put_u32(movie.preview_time)?;
        atom.put_u32(movie.preview_duration)?;
        atom.put_u32(movie.poster_time)?;
        atom.put_u32(movie.selection_time)?;
        atom.put_u32(movie.selection_duration)?;
        atom.put_u32(movie.current_time)?;
        atom.put_u32(next_track_id)?;
        Ok(atom)
    }
}
