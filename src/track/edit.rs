//! Edit list model.

/// One edit: a span of the movie timeline mapped onto a span of
/// the track's media timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edit {
    /// Duration of the edit in movie time scale units.
    pub track_duration: u32,
    /// Media start time in media time scale units.
    /// -1 inserts empty movie time instead of media.
    pub media_time: i32,
    /// Playback rate for the edit. 1.0 is normal speed.
    pub media_rate: f64,
}

impl Edit {
    pub fn new(track_duration: u32, media_time: i32, media_rate: f64) -> Self {
        Self {
            track_duration,
            media_time,
            media_rate,
        }
    }

    /// An empty edit, delaying the track by `track_duration`
    /// movie time units.
    pub fn empty(track_duration: u32) -> Self {
        Self {
            track_duration,
            media_time: -1,
            media_rate: 1.0,
        }
    }

    pub fn is_empty_edit(&self) -> bool {
        self.media_time == -1
    }
}
