use time::{self, PrimitiveDateTime, Month};

/// FourCC:s for known "container" atoms.
/// These are nested and contain more atoms,
/// within their specified, total size.
///
/// Only container atoms in the main movie tree are listed.
///
/// - `moov`: offset tables, timing, metadata
/// - `trak`: moov.trak (multiple)
/// - `tref`: moov.trak.tref
/// - `edts`: moov.trak.edts
/// - `mdia`: moov.trak.mdia
/// - `minf`: moov.trak.mdia.minf
/// - `dinf`: moov.trak.mdia.minf.dinf
/// - `stbl`: moov.trak.mdia.minf.stbl, contains timing (stts), offsets (stco/co64)
/// - `udta`: moov.udta, may contain custom data
pub const CONTAINER: [&'static str; 9] = [
    "moov",
    "trak",
    "tref",
    "edts",
    "mdia",
    "minf",
    "dinf",
    "stbl",
    "udta",
];

/// Time zero for QuickTime containers. Midnight January 1, 1904.
pub fn mov_time_zero() -> PrimitiveDateTime {
    time::Date::from_calendar_date(1904, Month::January, 1).unwrap()
        .with_hms_milli(0, 0, 0, 0).unwrap()
}

/// Current UTC wall clock, for header timestamps.
pub(crate) fn now() -> PrimitiveDateTime {
    let now = time::OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

/// Default movie time scale: 600 units per second,
/// divisible by common frame rates.
pub const MOVIE_TIME_SCALE: u32 = 600;

/// Major brand written to `ftyp`.
pub const BRAND_QUICKTIME: &str = "qt  ";

/// `ftyp` minor version, a BCD-coded date.
pub const BRAND_VERSION: u32 = 0x2005_0300;

/// Identity transform for movie and track headers.
pub const MATRIX_IDENTITY: [f64; 9] = [
    1.0, 0.0, 0.0,
    0.0, 1.0, 0.0,
    0.0, 0.0, 1.0,
];

/// Upper bound for run-length groups in the sample tables.
pub const MAX_GROUP_SAMPLES: u32 = i32::MAX as u32;

/// Iteration cap for the web-optimization header
/// size stabilization loop.
pub const MAX_HEADER_PASSES: usize = 5;
