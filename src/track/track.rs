//! Track state: media description plus the accumulated sample
//! tables, with the grouping rules that keep them compact.

use rayon::prelude::*;
use time::PrimitiveDateTime;

use crate::atom_types::TimeToSample;
use crate::consts::{now, MATRIX_IDENTITY};
use crate::errors::MovError;

use super::sample::{append_run, fits, Chunk, Sample, SampleLocation, SampleSizeRun};
use super::Edit;

/// Media carried by a track.
#[derive(Debug, Clone, PartialEq)]
pub enum Media {
    Video(VideoMedia),
    Audio(AudioMedia),
}

impl Media {
    pub fn is_video(&self) -> bool {
        matches!(self, Self::Video(_))
    }

    pub fn is_audio(&self) -> bool {
        matches!(self, Self::Audio(_))
    }

    /// Compression format tag for the sample description.
    pub fn compression_tag(&self) -> &str {
        match self {
            Self::Video(video) => &video.compression_tag,
            Self::Audio(audio) => &audio.compression_tag,
        }
    }
}

/// Video media description.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMedia {
    /// Compression format tag, e.g. `rle ` for Animation.
    pub compression_tag: String,
    /// Human readable compressor name, at most 31 bytes.
    pub compressor_name: String,
    /// Frame width in pixels.
    pub width: u16,
    /// Frame height in pixels.
    pub height: u16,
    /// Pixel depth. 8, 16, 24 or 32.
    pub depth: u16,
    /// Spatial quality as a 0.0 - 1.0 fraction.
    pub quality: f64,
    /// Palette for 8 bit video, at most 256 entries.
    pub palette: Option<Vec<[u8; 3]>>,
    /// Key frame cadence the encoder was configured with.
    /// 0 when every sample is a sync sample.
    pub sync_interval: u32,
}

impl Default for VideoMedia {
    fn default() -> Self {
        Self {
            compression_tag: "rle ".to_string(),
            compressor_name: "Animation".to_string(),
            width: 0,
            height: 0,
            depth: 24,
            quality: 1.0,
            palette: None,
            sync_interval: 0,
        }
    }
}

/// Sound media description, including the version 1 sound
/// description packet geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioMedia {
    /// Compression format tag, e.g. `sowt` or `twos`.
    pub compression_tag: String,
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// Number of channels, 1 or 2.
    pub channels: u16,
    /// Bits per uncompressed sample, 8 or 16.
    pub sample_size_bits: u16,
    /// 0 for uncompressed audio, -2 for compressed formats
    /// described by the packet geometry below.
    pub compression_id: i16,
    pub samples_per_packet: u32,
    pub bytes_per_packet: u32,
    pub bytes_per_frame: u32,
    pub bytes_per_sample: u32,
}

/// Single movie track.
///
/// The writer appends samples one call at a time, each of which
/// either extends the most recent run in each grouped table or
/// opens a new one. The reader reconstructs the same state from
/// the parsed sample table atoms.
#[derive(Debug, Clone)]
pub struct Track {
    pub(crate) media: Media,
    pub(crate) media_time_scale: u32,
    /// Sum of all sample durations, in media time scale units.
    pub(crate) media_duration: u64,
    pub(crate) sample_count: u64,
    pub(crate) time_to_samples: Vec<TimeToSample>,
    pub(crate) sample_sizes: Vec<SampleSizeRun>,
    pub(crate) chunks: Vec<Chunk>,
    /// 1-based sync sample numbers, ascending. `None` means
    /// every sample is sync.
    pub(crate) sync_samples: Option<Vec<u32>>,
    pub(crate) edits: Option<Vec<Edit>>,
    pub(crate) track_id: u32,
    pub(crate) matrix: [f64; 9],
    /// Packed ISO language code, 0 when unset.
    pub(crate) language: u16,
    pub(crate) creation_time: PrimitiveDateTime,
    pub(crate) modification_time: PrimitiveDateTime,
}

impl Track {
    pub(crate) fn new(media: Media, media_time_scale: u32) -> Self {
        let now = now();
        Self {
            media,
            media_time_scale,
            media_duration: 0,
            sample_count: 0,
            time_to_samples: Vec::new(),
            sample_sizes: Vec::new(),
            chunks: Vec::new(),
            sync_samples: None,
            edits: None,
            track_id: 0,
            matrix: MATRIX_IDENTITY,
            language: 0,
            creation_time: now,
            modification_time: now,
        }
    }

    /// Folds one sample into the grouped tables.
    pub(crate) fn add_sample(&mut self, sample: Sample, sync: bool) {
        self.add_samples(1, sample.duration, sample.length, sample.offset, sync);
    }

    /// Folds a run of `count` samples sharing one duration and
    /// length, stored back to back at `offset`, into the grouped
    /// tables as a single physical chunk.
    pub(crate) fn add_samples(
        &mut self,
        count: u32,
        duration: u32,
        length: u32,
        offset: u64,
        sync: bool,
    ) {
        let first_number = self.sample_count + 1;
        self.sample_count += count as u64;
        self.media_duration += count as u64 * duration as u64;

        append_run(
            &mut self.time_to_samples,
            TimeToSample {
                sample_count: count,
                sample_duration: duration,
            },
            |last, new| {
                if last.sample_duration != new.sample_duration
                    || !fits(last.sample_count, new.sample_count)
                {
                    return false;
                }
                last.sample_count += new.sample_count;
                true
            },
        );

        append_run(
            &mut self.sample_sizes,
            SampleSizeRun {
                sample_count: count,
                sample_length: length,
            },
            |last, new| {
                if last.sample_length != new.sample_length
                    || !fits(last.sample_count, new.sample_count)
                {
                    return false;
                }
                last.sample_count += new.sample_count;
                true
            },
        );

        append_run(
            &mut self.chunks,
            Chunk {
                sample_count: count,
                sample_description_id: 1,
                offset,
                next_offset: offset + count as u64 * length as u64,
            },
            |last, new| {
                if last.sample_description_id != new.sample_description_id
                    || last.next_offset != new.offset
                    || !fits(last.sample_count, new.sample_count)
                {
                    return false;
                }
                last.sample_count += new.sample_count;
                last.next_offset = new.next_offset;
                true
            },
        );

        self.mark_sync(first_number, count, sync);
    }

    /// Sync bookkeeping is lazy. A track starts without a list,
    /// meaning all sync. The first non-sync sample materializes
    /// the numbers of every earlier sample, after which sync
    /// samples append and non-sync are omitted.
    fn mark_sync(&mut self, first_number: u64, count: u32, sync: bool) {
        match (&mut self.sync_samples, sync) {
            (Some(list), true) => {
                list.extend((0..count).map(|i| (first_number + i as u64) as u32));
            }
            (Some(_), false) => {}
            (None, true) => {}
            (None, false) => {
                self.sync_samples = Some((1..first_number as u32).collect());
            }
        }
    }

    /// Replaces the edit list. The last edit must map to media.
    /// An empty tail edit would leave the track end dangling in
    /// inserted silence.
    pub(crate) fn set_edits(&mut self, edits: Vec<Edit>) -> Result<(), MovError> {
        if edits.is_empty() {
            return Err(MovError::Argument("edit list may not be empty"));
        }
        if edits.last().map_or(false, |e| e.is_empty_edit()) {
            return Err(MovError::Argument("the last edit may not be an empty edit"));
        }
        self.edits = Some(edits);
        Ok(())
    }

    pub fn media(&self) -> &Media {
        &self.media
    }

    /// 1-based track id. 0 until assigned by the writer or
    /// parsed from `tkhd`.
    pub fn track_id(&self) -> u32 {
        self.track_id
    }

    /// Number of time units per second for this track's media.
    pub fn media_time_scale(&self) -> u32 {
        self.media_time_scale
    }

    /// Sum of all sample durations, in media time scale units.
    pub fn media_duration(&self) -> u64 {
        self.media_duration
    }

    /// Media duration in seconds.
    pub fn media_duration_sec(&self) -> f64 {
        if self.media_time_scale == 0 {
            return 0.0;
        }
        self.media_duration as f64 / self.media_time_scale as f64
    }

    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn edits(&self) -> Option<&[Edit]> {
        self.edits.as_deref()
    }

    /// Explicit sync sample numbers, 1-based. `None` means
    /// every sample is sync.
    pub fn sync_samples(&self) -> Option<&[u32]> {
        self.sync_samples.as_deref()
    }

    /// Whether 1-based sample `number` is a sync sample.
    pub fn is_sync_sample(&self, number: u64) -> bool {
        match &self.sync_samples {
            None => true,
            Some(list) => u32::try_from(number)
                .map(|n| list.binary_search(&n).is_ok())
                .unwrap_or(false),
        }
    }

    /// Duration in the movie's time scale: the edit list sum when
    /// present, otherwise the rescaled media duration.
    pub(crate) fn track_duration(&self, movie_time_scale: u32) -> u32 {
        let duration = match &self.edits {
            Some(edits) => edits.iter().map(|e| e.track_duration as u64).sum::<u64>(),
            None if self.media_time_scale == 0 => 0,
            None => self.media_duration * movie_time_scale as u64 / self.media_time_scale as u64,
        };
        duration.min(u32::MAX as u64) as u32
    }

    /// Expands the grouped tables into one location record per
    /// sample, in sample order. Chunks expand in parallel.
    pub fn sample_locations(&self) -> Vec<SampleLocation> {
        let count = self.sample_count as usize;
        let mut sizes: Vec<u32> = Vec::with_capacity(count);
        for run in &self.sample_sizes {
            sizes.extend(std::iter::repeat(run.sample_length).take(run.sample_count as usize));
        }
        let mut durations: Vec<u32> = Vec::with_capacity(count);
        for run in &self.time_to_samples {
            durations.extend(std::iter::repeat(run.sample_duration).take(run.sample_count as usize));
        }

        // 0-based index of each chunk's first sample.
        let mut first_sample = Vec::with_capacity(self.chunks.len());
        let mut acc = 0_usize;
        for chunk in &self.chunks {
            first_sample.push(acc);
            acc += chunk.sample_count as usize;
        }

        self.chunks
            .par_iter()
            .zip(first_sample.par_iter())
            .flat_map(|(chunk, &first)| {
                let mut offset = chunk.offset;
                let mut locations = Vec::with_capacity(chunk.sample_count as usize);
                for i in 0..chunk.sample_count as usize {
                    let sample = first + i;
                    let length = sizes.get(sample).copied().unwrap_or(0);
                    let duration = durations.get(sample).copied().unwrap_or(0);
                    locations.push(SampleLocation {
                        offset,
                        length,
                        duration,
                        is_sync: self.is_sync_sample(sample as u64 + 1),
                    });
                    offset += length as u64;
                }
                locations
            })
            .collect()
    }
}
