//! Movie model shared by the writer and the reader.

use time::PrimitiveDateTime;

use crate::consts::{now, MATRIX_IDENTITY, MOVIE_TIME_SCALE};
use crate::track::Track;

/// Whole-movie state: the global header fields plus the tracks.
///
/// The writer builds a `Movie` incrementally while samples are
/// written. The reader returns a fully populated one.
#[derive(Debug, Clone)]
pub struct Movie {
    pub(crate) time_scale: u32,
    pub(crate) creation_time: PrimitiveDateTime,
    pub(crate) modification_time: PrimitiveDateTime,
    /// Preferred playback rate. 1.0 is normal speed.
    pub(crate) preferred_rate: f64,
    /// Preferred playback volume. 1.0 is full volume.
    pub(crate) preferred_volume: f64,
    pub(crate) matrix: [f64; 9],
    pub(crate) preview_time: u32,
    pub(crate) preview_duration: u32,
    pub(crate) poster_time: u32,
    pub(crate) selection_time: u32,
    pub(crate) selection_duration: u32,
    pub(crate) current_time: u32,
    pub(crate) tracks: Vec<Track>,
}

impl Movie {
    pub(crate) fn new(time_scale: u32) -> Self {
        let now = now();
        Self {
            time_scale,
            creation_time: now,
            modification_time: now,
            preferred_rate: 1.0,
            preferred_volume: 1.0,
            matrix: MATRIX_IDENTITY,
            preview_time: 0,
            preview_duration: 0,
            poster_time: 0,
            selection_time: 0,
            selection_duration: 0,
            current_time: 0,
            tracks: Vec::new(),
        }
    }

    /// Number of movie time units per second.
    pub fn time_scale(&self) -> u32 {
        self.time_scale
    }

    /// Longest track duration, in movie time scale units.
    pub fn duration(&self) -> u32 {
        self.tracks
            .iter()
            .map(|t| t.track_duration(self.time_scale))
            .max()
            .unwrap_or(0)
    }

    /// Movie duration in seconds.
    pub fn duration_sec(&self) -> f64 {
        if self.time_scale == 0 {
            return 0.0;
        }
        self.duration() as f64 / self.time_scale as f64
    }

    pub fn creation_time(&self) -> PrimitiveDateTime {
        self.creation_time
    }

    pub fn modification_time(&self) -> PrimitiveDateTime {
        self.modification_time
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Track by 0-based index.
    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// First video track, if any.
    pub fn video_track(&self) -> Option<&Track> {
        self.tracks.iter().find(|t| t.media().is_video())
    }

    /// First audio track, if any.
    pub fn audio_track(&self) -> Option<&Track> {
        self.tracks.iter().find(|t| t.media().is_audio())
    }

    /// Id for the next track to be added, as written to `mvhd`.
    pub(crate) fn next_track_id(&self) -> u32 {
        self.tracks.len() as u32 + 1
    }
}

impl Default for Movie {
    fn default() -> Self {
        Self::new(MOVIE_TIME_SCALE)
    }
}
