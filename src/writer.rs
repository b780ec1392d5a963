//! Movie writer. Multiplexes encoded samples into a QuickTime
//! container on any seekable sink.
//!
//! Tracks are declared first, then samples are streamed in any
//! order. Payload bytes go straight to the sink inside a single
//! `mdat` atom while the grouped sample tables accumulate in
//! memory; `finish` renders the `moov` header after the media
//! data and patches the `mdat` size. `write_web_optimized`
//! produces a copy with the header in front of the media data
//! for progressive playback, optionally zlib-compressed.
//!
//! ```no_run
//! use std::fs::File;
//! use movmux::{MovWriter, VideoMedia};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let file = File::create("out.mov")?;
//!     let mut writer = MovWriter::new(file);
//!     let track = writer.add_video_track(
//!         VideoMedia {
//!             width: 320,
//!             height: 240,
//!             ..Default::default()
//!         },
//!         600,
//!     )?;
//!     writer.write_sample(track, &[0u8; 16], 20, true)?;
//!     writer.close()?;
//!     Ok(())
//! }
//! ```

use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::atom::{CompositeAtom, WideDataAtom};
use crate::atom_types::{
    Cmvd, Co64, Dcom, Dref, Elst, Ftyp, Hdlr, Mdhd, Mvhd, Smhd, Stco, Stsc, Stsd, Stss, Stsz,
    Stts, Tkhd, Vmhd,
};
use crate::binary::PutBe;
use crate::consts::MAX_HEADER_PASSES;
use crate::errors::MovError;
use crate::movie::Movie;
use crate::track::{AudioMedia, Edit, Media, Sample, Track, VideoMedia};

/// Uncompressed audio format as the caller sees it. The sound
/// description tag and packet geometry are derived from it when
/// the track is added.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFormat {
    /// Compression format tag. For PCM the generic tags `raw `,
    /// `sowt` and `twos` are replaced by the tag matching the
    /// sample layout below; other tags pass through unchanged.
    pub compression_tag: String,
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// 1 or 2.
    pub channels: u16,
    /// 8 or 16.
    pub sample_size_bits: u16,
    pub signed: bool,
    pub big_endian: bool,
    /// Whether samples are compressed frames rather than PCM.
    pub compressed: bool,
    /// Media time units covered by one compressed frame.
    /// Ignored for PCM.
    pub frame_duration: u32,
    /// Bytes in one compressed frame. Ignored for PCM.
    pub frame_size: u32,
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            compression_tag: "twos".to_string(),
            sample_rate: 44_100.0,
            channels: 1,
            sample_size_bits: 16,
            signed: true,
            big_endian: true,
            compressed: false,
            frame_duration: 0,
            frame_size: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Tracks may be added, nothing written yet.
    Realized,
    /// `ftyp` written, `mdat` open, samples streaming.
    Started,
    /// Header rendered. Only `write_web_optimized` and `close`
    /// remain meaningful.
    Finished,
}

/// QuickTime movie multiplexer.
///
/// The writer moves through `Realized`, `Started` and `Finished`
/// states; `close` consumes it and returns the sink. Adding a
/// track after the first sample write, or writing a sample after
/// `finish`, is a usage error and panics. Argument validation on
/// the track and sample calls returns [`MovError::Argument`]
/// before any state changes.
pub struct MovWriter<W: Write + Seek> {
    sink: W,
    movie: Movie,
    state: State,
    mdat: Option<WideDataAtom>,
    /// Span of the finished `mdat` atom on the sink, header
    /// included. Valid once `state` is `Finished`.
    mdat_start: u64,
    mdat_end: u64,
}

impl<W: Write + Seek> MovWriter<W> {
    /// New writer over a sink positioned at the movie start.
    /// Nothing is written until the first sample arrives.
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            movie: Movie::default(),
            state: State::Realized,
            mdat: None,
            mdat_start: 0,
            mdat_end: 0,
        }
    }

    /// Movie state accumulated so far.
    pub fn movie(&self) -> &Movie {
        &self.movie
    }

    /// Overrides the default movie time scale of 600.
    pub fn set_movie_time_scale(&mut self, time_scale: u32) -> Result<(), MovError> {
        assert!(
            self.state == State::Realized,
            "the movie time scale must be set before writing"
        );
        if time_scale == 0 {
            return Err(MovError::Argument("time scale must be at least 1"));
        }
        self.movie.time_scale = time_scale;
        Ok(())
    }

    /// Adds a video track and returns its index.
    ///
    /// `time_scale` is the number of media time units per second
    /// sample durations for this track are expressed in.
    pub fn add_video_track(
        &mut self,
        media: VideoMedia,
        time_scale: u32,
    ) -> Result<usize, MovError> {
        assert!(
            self.state == State::Realized,
            "tracks must be added before the first sample write"
        );
        if media.compression_tag.len() != 4 || !media.compression_tag.is_ascii() {
            return Err(MovError::Argument(
                "compression tag must be 4 ASCII characters",
            ));
        }
        if media.compressor_name.is_empty() || media.compressor_name.len() > 31 {
            return Err(MovError::Argument("compressor name must be 1 to 31 bytes"));
        }
        if time_scale == 0 {
            return Err(MovError::Argument("time scale must be at least 1"));
        }
        if media.width == 0 || media.height == 0 {
            return Err(MovError::Argument("frame dimensions must be non-zero"));
        }
        if !matches!(media.depth, 8 | 16 | 24 | 32) {
            return Err(MovError::Argument("frame depth must be 8, 16, 24 or 32"));
        }
        if let Some(palette) = &media.palette {
            if media.depth != 8 {
                return Err(MovError::Argument("a palette requires 8 bit video"));
            }
            if palette.is_empty() || palette.len() > 256 {
                return Err(MovError::Argument("palette must hold 1 to 256 entries"));
            }
        }
        log::debug!(
            "adding video track {}: {} {}x{}@{}bit",
            self.movie.next_track_id(),
            media.compression_tag,
            media.width,
            media.height,
            media.depth
        );
        Ok(self.push_track(Media::Video(media), time_scale))
    }

    /// Adds a sound track and returns its index.
    pub fn add_audio_track(
        &mut self,
        format: AudioFormat,
        time_scale: u32,
    ) -> Result<usize, MovError> {
        assert!(
            self.state == State::Realized,
            "tracks must be added before the first sample write"
        );
        if format.compression_tag.len() != 4 || !format.compression_tag.is_ascii() {
            return Err(MovError::Argument(
                "compression tag must be 4 ASCII characters",
            ));
        }
        if time_scale == 0 {
            return Err(MovError::Argument("time scale must be at least 1"));
        }
        if !(format.sample_rate > 0.0) {
            return Err(MovError::Argument("sample rate must be greater than 0"));
        }
        if !matches!(format.channels, 1 | 2) {
            return Err(MovError::Argument("channel count must be 1 or 2"));
        }
        if !matches!(format.sample_size_bits, 8 | 16) {
            return Err(MovError::Argument("sample size must be 8 or 16 bits"));
        }
        if format.compressed && (format.frame_duration == 0 || format.frame_size == 0) {
            return Err(MovError::Argument(
                "compressed audio requires a frame duration and frame size",
            ));
        }

        let compression_tag = derive_pcm_tag(&format)?;
        let bytes_per_sample = format.sample_size_bits as u32 / 8;
        let media = if format.compressed {
            AudioMedia {
                compression_tag,
                sample_rate: format.sample_rate,
                channels: format.channels,
                sample_size_bits: format.sample_size_bits,
                compression_id: -2,
                samples_per_packet: format.frame_duration,
                bytes_per_packet: format.frame_size / format.channels as u32,
                bytes_per_frame: format.frame_size,
                bytes_per_sample,
            }
        } else {
            AudioMedia {
                compression_tag,
                sample_rate: format.sample_rate,
                channels: format.channels,
                sample_size_bits: format.sample_size_bits,
                compression_id: 0,
                samples_per_packet: 1,
                bytes_per_packet: bytes_per_sample,
                bytes_per_frame: format.channels as u32 * bytes_per_sample,
                bytes_per_sample,
            }
        };
        log::debug!(
            "adding audio track {}: {} {}Hz {}ch",
            self.movie.next_track_id(),
            media.compression_tag,
            media.sample_rate,
            media.channels
        );
        Ok(self.push_track(Media::Audio(media), time_scale))
    }

    fn push_track(&mut self, media: Media, time_scale: u32) -> usize {
        let mut track = Track::new(media, time_scale);
        track.track_id = self.movie.next_track_id();
        self.movie.tracks.push(track);
        self.movie.tracks.len() - 1
    }

    /// Replaces the edit list of a track. The list may not be
    /// empty and its last edit may not be an empty edit.
    pub fn set_edits(&mut self, track: usize, edits: Vec<Edit>) -> Result<(), MovError> {
        self.ensure_writable();
        self.movie
            .tracks
            .get_mut(track)
            .ok_or(MovError::NoSuchTrack(track))?
            .set_edits(edits)
    }

    /// Writes one sample to the track with index `track`.
    ///
    /// `duration` is in the track's media time scale. `is_sync`
    /// marks the sample decodable without prior samples; pass
    /// the key frame flag of the encoded frame for video and
    /// `true` for PCM audio.
    pub fn write_sample(
        &mut self,
        track: usize,
        data: &[u8],
        duration: u32,
        is_sync: bool,
    ) -> Result<(), MovError> {
        self.ensure_writable();
        if duration == 0 {
            return Err(MovError::Argument("sample duration must be greater than 0"));
        }
        let length = u32::try_from(data.len())
            .map_err(|_| MovError::Argument("sample exceeds the 32 bit length field"))?;
        if track >= self.movie.tracks.len() {
            return Err(MovError::NoSuchTrack(track));
        }

        self.ensure_started()?;
        let offset = self.sink.stream_position()?;
        self.sink.write_all(data)?;
        self.movie.tracks[track].add_sample(
            Sample {
                duration,
                offset,
                length,
            },
            is_sync,
        );
        Ok(())
    }

    /// Writes a run of `sample_count` equally sized samples
    /// sharing one duration as a single physical chunk. `data`
    /// holds the samples back to back.
    pub fn write_samples(
        &mut self,
        track: usize,
        sample_count: u32,
        data: &[u8],
        sample_duration: u32,
        is_sync: bool,
    ) -> Result<(), MovError> {
        self.ensure_writable();
        if sample_count == 0 {
            return Err(MovError::Argument("sample count must be greater than 0"));
        }
        if sample_duration == 0 {
            return Err(MovError::Argument("sample duration must be greater than 0"));
        }
        if data.len() % sample_count as usize != 0 {
            return Err(MovError::Argument(
                "buffer length must be a multiple of the sample count",
            ));
        }
        let length = u32::try_from(data.len() / sample_count as usize)
            .map_err(|_| MovError::Argument("sample exceeds the 32 bit length field"))?;
        if track >= self.movie.tracks.len() {
            return Err(MovError::NoSuchTrack(track));
        }

        self.ensure_started()?;
        let offset = self.sink.stream_position()?;
        self.sink.write_all(data)?;
        self.movie.tracks[track]
            .add_samples(sample_count, sample_duration, length, offset, is_sync);
        Ok(())
    }

    /// Streams one sample of `len` bytes from `source`, for
    /// payloads that live in files rather than memory. A source
    /// that ends early fails with [`MovError::ReadMismatch`] and
    /// drops the partial sample from the tables.
    pub fn write_sample_from<R: Read>(
        &mut self,
        track: usize,
        source: R,
        len: u64,
        duration: u32,
        is_sync: bool,
    ) -> Result<(), MovError> {
        self.ensure_writable();
        if duration == 0 {
            return Err(MovError::Argument("sample duration must be greater than 0"));
        }
        let length = u32::try_from(len)
            .map_err(|_| MovError::Argument("sample exceeds the 32 bit length field"))?;
        if track >= self.movie.tracks.len() {
            return Err(MovError::NoSuchTrack(track));
        }

        self.ensure_started()?;
        let offset = self.sink.stream_position()?;
        let copied = io::copy(&mut source.take(len), &mut self.sink)?;
        if copied != len {
            return Err(MovError::ReadMismatch {
                got: copied,
                expected: len,
            });
        }
        self.movie.tracks[track].add_sample(
            Sample {
                duration,
                offset,
                length,
            },
            is_sync,
        );
        Ok(())
    }

    /// Renders the movie header and patches the `mdat` size.
    /// Idempotent. An empty movie still produces a valid file.
    pub fn finish(&mut self) -> Result<(), MovError> {
        if self.state == State::Finished {
            return Ok(());
        }
        self.ensure_started()?;

        let end = self.sink.stream_position()?;
        if let Some(mdat) = self.mdat.as_mut() {
            mdat.finish(&mut self.sink)?;
            self.mdat_start = mdat.offset();
            self.mdat_end = end;
        }

        let moov = self.render_moov(0)?;
        moov.write_to(&mut self.sink)?;
        self.state = State::Finished;
        log::debug!(
            "finished movie: {} track(s), {:.3}s",
            self.movie.tracks().len(),
            self.movie.duration_sec()
        );
        Ok(())
    }

    /// Finishes the movie if needed, flushes, and returns the
    /// sink.
    pub fn close(mut self) -> Result<W, MovError> {
        self.finish()?;
        self.sink.flush()?;
        Ok(self.sink)
    }

    /// Writes a copy of the finished movie with the header atoms
    /// in front of the media data, so playback can start before
    /// the file has fully downloaded. With `compress_header` the
    /// header is zlib-deflated inside a `cmov` atom.
    ///
    /// Finishes the movie first if the caller has not. The
    /// original sink is left untouched apart from its position.
    pub fn write_web_optimized<O: Write>(
        &mut self,
        out: &mut O,
        compress_header: bool,
    ) -> Result<(), MovError>
    where
        W: Read,
    {
        self.finish()?;
        let old_data_offset = self.mdat_start + 16;
        let mdat_len = self.mdat_end - self.mdat_start;

        let ftyp = Ftyp::atom()?;
        let ftyp_len = ftyp.len();

        // The header length feeds back into the chunk offsets it
        // contains, which can in turn change its length: `stco`
        // growing into `co64`, or deflate output shifting by a
        // few bytes. Iterate until a render fits the area its
        // offsets were computed for, with any slack going to a
        // `free` atom between the header and the media data.
        let mut header = self.render_header(compress_header, 0)?;
        let mut pad = 0_u64;
        let mut settled = false;
        for _ in 0..MAX_HEADER_PASSES {
            let area = header.len() as u64 + pad;
            let bias = (ftyp_len + area + 16) as i64 - old_data_offset as i64;
            let next = self.render_header(compress_header, bias)?;
            match area.checked_sub(next.len() as u64) {
                Some(0) => {
                    // The render swallowed the whole area, pad
                    // included. Nothing is left for a free atom.
                    header = next;
                    pad = 0;
                    settled = true;
                    break;
                }
                Some(slack) if slack >= 8 => {
                    header = next;
                    pad = slack;
                    settled = true;
                    break;
                }
                // Render does not fit the area, or leaves less
                // than a minimal free atom. Grow and retry.
                _ => {
                    pad = 8;
                    header = next;
                }
            }
        }
        if !settled {
            log::warn!(
                "header size still drifting after {} passes",
                MAX_HEADER_PASSES
            );
            return Err(MovError::HeaderUnstable(MAX_HEADER_PASSES));
        }

        ftyp.write_to(out)?;
        out.write_all(&header)?;
        if pad > 0 {
            out.put_u32(pad as u32)?;
            out.put_tag("free")?;
            out.put_zeros(pad as usize - 8)?;
        }

        self.sink.seek(SeekFrom::Start(self.mdat_start))?;
        let copied = io::copy(&mut (&mut self.sink).take(mdat_len), out)?;
        if copied != mdat_len {
            return Err(MovError::ReadMismatch {
                got: copied,
                expected: mdat_len,
            });
        }
        out.flush()?;
        log::debug!(
            "web optimized movie written: {} header bytes, {} byte free pad",
            ftyp_len + header.len() as u64,
            pad
        );
        Ok(())
    }

    fn ensure_writable(&self) {
        assert!(
            self.state != State::Finished,
            "write to a finished movie"
        );
    }

    /// Writes `ftyp` and opens the `mdat` atom. Called by the
    /// first sample write.
    fn ensure_started(&mut self) -> Result<(), MovError> {
        if self.state != State::Realized {
            return Ok(());
        }
        Ftyp::atom()?.write_to(&mut self.sink)?;
        let mdat = WideDataAtom::begin(&mut self.sink, "mdat")?;
        log::debug!("movie started, media data at offset {}", mdat.data_offset());
        self.mdat = Some(mdat);
        self.state = State::Started;
        Ok(())
    }

    /// Renders the movie header tree. `mdat_bias` shifts every
    /// emitted chunk offset, non-zero only when the header is
    /// being relocated in front of the media data.
    fn render_moov(&self, mdat_bias: i64) -> Result<CompositeAtom, MovError> {
        let movie = &self.movie;
        let duration = movie.duration();
        let mut moov = CompositeAtom::new("moov");
        moov.add(Mvhd::atom(movie, duration, movie.next_track_id())?);
        for track in movie.tracks() {
            moov.add(self.render_trak(track, mdat_bias)?);
        }
        moov.finish();
        Ok(moov)
    }

    fn render_trak(&self, track: &Track, mdat_bias: i64) -> Result<CompositeAtom, MovError> {
        let duration = track.track_duration(self.movie.time_scale());
        let audio = track.media().is_audio();

        let mut trak = CompositeAtom::new("trak");
        trak.add(Tkhd::atom(track, track.track_id(), duration)?);
        if let Some(edits) = track.edits() {
            let mut edts = CompositeAtom::new("edts");
            edts.add(Elst::atom(edits)?);
            trak.add(edts);
        }

        let mut minf = CompositeAtom::new("minf");
        if audio {
            minf.add(Smhd::atom()?);
        } else {
            minf.add(Vmhd::atom()?);
        }
        minf.add(Hdlr::data_atom()?);
        let mut dinf = CompositeAtom::new("dinf");
        dinf.add(Dref::atom()?);
        minf.add(dinf);
        minf.add(self.render_stbl(track, mdat_bias)?);

        let mut mdia = CompositeAtom::new("mdia");
        mdia.add(Mdhd::atom(track)?);
        mdia.add(Hdlr::media_atom(audio)?);
        mdia.add(minf);
        trak.add(mdia);
        Ok(trak)
    }

    fn render_stbl(&self, track: &Track, mdat_bias: i64) -> Result<CompositeAtom, MovError> {
        let mut stbl = CompositeAtom::new("stbl");
        stbl.add(match track.media() {
            Media::Video(video) => Stsd::video_atom(video)?,
            Media::Audio(audio) => Stsd::audio_atom(audio)?,
        });
        stbl.add(Stts::atom(&track.time_to_samples)?);
        stbl.add(Stsc::atom(track.chunks())?);
        if let Some(sync) = track.sync_samples() {
            stbl.add(Stss::atom(sync)?);
        }
        stbl.add(Stsz::atom(&track.sample_sizes, track.sample_count())?);

        // 32 bit offsets unless the last chunk lands past their
        // range once the bias is applied.
        let last = track
            .chunks()
            .last()
            .map_or(0, |chunk| chunk.offset as i64 + mdat_bias);
        if last > u32::MAX as i64 {
            stbl.add(Co64::atom(track.chunks(), mdat_bias)?);
        } else {
            stbl.add(Stco::atom(track.chunks(), mdat_bias)?);
        }
        Ok(stbl)
    }

    /// Serialized movie header, plain or wrapped in `cmov`.
    fn render_header(&self, compress: bool, mdat_bias: i64) -> Result<Vec<u8>, MovError> {
        let moov = self.render_moov(mdat_bias)?;
        if !compress {
            return moov.to_vec();
        }
        let mut cmov = CompositeAtom::new("cmov");
        cmov.add(Dcom::atom()?);
        cmov.add(Cmvd::atom(&moov.to_vec()?)?);
        let mut outer = CompositeAtom::new("moov");
        outer.add(cmov);
        outer.finish();
        outer.to_vec()
    }
}

/// QuickTime names uncompressed PCM by its byte layout. The
/// generic PCM tags are mapped to the real one; anything else
/// passes through for the caller to get right.
fn derive_pcm_tag(format: &AudioFormat) -> Result<String, MovError> {
    if !matches!(format.compression_tag.as_str(), "raw " | "sowt" | "twos") {
        return Ok(format.compression_tag.clone());
    }
    let tag = match (format.sample_size_bits, format.signed, format.big_endian) {
        (8, false, _) => "raw ",
        (8, true, _) => "twos",
        (16, true, true) => "twos",
        (16, true, false) => "sowt",
        (16, false, _) => return Err(MovError::Argument("16 bit audio samples must be signed")),
        _ => return Err(MovError::Argument("sample size must be 8 or 16 bits")),
    };
    Ok(tag.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn video() -> VideoMedia {
        VideoMedia {
            width: 320,
            height: 240,
            ..Default::default()
        }
    }

    fn writer() -> MovWriter<Cursor<Vec<u8>>> {
        MovWriter::new(Cursor::new(Vec::new()))
    }

    fn u32_at(bytes: &[u8], at: usize) -> u32 {
        u32::from_be_bytes(bytes[at..at + 4].try_into().unwrap())
    }

    #[test]
    fn file_layout_after_finish() {
        let mut writer = writer();
        let track = writer.add_video_track(video(), 600).unwrap();
        writer.write_sample(track, &[1u8; 100], 30, true).unwrap();
        writer.finish().unwrap();
        let bytes = writer.close().unwrap().into_inner();

        assert_eq!(u32_at(&bytes, 0), 20);
        assert_eq!(&bytes[4..8], b"ftyp");
        assert_eq!(&bytes[8..12], b"qt  ");
        // The 16 reserved bytes hold the wide + mdat header pair.
        assert_eq!(u32_at(&bytes, 20), 8);
        assert_eq!(&bytes[24..28], b"wide");
        assert_eq!(u32_at(&bytes, 28), 108);
        assert_eq!(&bytes[32..36], b"mdat");
        // moov directly after the payload, sized to the file end.
        assert_eq!(&bytes[140..144], b"moov");
        assert_eq!(136 + u32_at(&bytes, 136) as usize, bytes.len());
    }

    #[test]
    fn finish_is_idempotent() {
        let mut writer = writer();
        let track = writer.add_video_track(video(), 600).unwrap();
        writer.write_sample(track, &[0u8; 8], 30, true).unwrap();
        writer.finish().unwrap();
        writer.finish().unwrap();
        let bytes = writer.close().unwrap().into_inner();
        // A second moov would extend the file past the first
        // moov's declared end.
        assert_eq!(44 + u32_at(&bytes, 44) as usize, bytes.len());
    }

    #[test]
    fn empty_movie_still_renders_a_header() {
        let mut writer = writer();
        writer.finish().unwrap();
        let bytes = writer.close().unwrap().into_inner();
        assert_eq!(&bytes[4..8], b"ftyp");
        assert_eq!(&bytes[24..28], b"wide");
        assert_eq!(&bytes[32..36], b"mdat");
        assert_eq!(&bytes[40..44], b"moov");
    }

    #[test]
    #[should_panic(expected = "write to a finished movie")]
    fn writes_after_finish_are_fatal() {
        let mut writer = writer();
        let track = writer.add_video_track(video(), 600).unwrap();
        writer.write_sample(track, &[0u8; 8], 30, true).unwrap();
        writer.finish().unwrap();
        let _ = writer.write_sample(track, &[0u8; 8], 30, true);
    }

    #[test]
    #[should_panic(expected = "before the first sample write")]
    fn tracks_must_come_before_samples() {
        let mut writer = writer();
        let track = writer.add_video_track(video(), 600).unwrap();
        writer.write_sample(track, &[0u8; 8], 30, true).unwrap();
        let _ = writer.add_video_track(video(), 600);
    }

    #[test]
    fn rejected_samples_leave_no_trace() {
        let mut writer = writer();
        let track = writer.add_video_track(video(), 600).unwrap();

        let err = writer.write_sample(track, &[0u8; 4], 0, true);
        assert!(matches!(err, Err(MovError::Argument(_))));
        let err = writer.write_sample(9, &[0u8; 4], 10, true);
        assert!(matches!(err, Err(MovError::NoSuchTrack(9))));
        let err = writer.write_samples(track, 3, &[0u8; 4], 10, true);
        assert!(matches!(err, Err(MovError::Argument(_))));
        assert_eq!(writer.movie().track(track).unwrap().sample_count(), 0);

        // The rejected calls wrote nothing, so ftyp still lands
        // at offset 0 for the first accepted sample.
        writer.write_sample(track, &[0u8; 4], 10, true).unwrap();
        let bytes = writer.close().unwrap().into_inner();
        assert_eq!(&bytes[4..8], b"ftyp");
    }

    #[test]
    fn track_arguments_are_checked() {
        let mut writer = writer();
        let bad = [
            VideoMedia {
                compression_tag: "xy".to_string(),
                ..video()
            },
            VideoMedia {
                compressor_name: "x".repeat(32),
                ..video()
            },
            VideoMedia { width: 0, ..video() },
            VideoMedia { depth: 12, ..video() },
            VideoMedia {
                palette: Some(vec![[0, 0, 0]]),
                ..video()
            },
        ];
        for media in bad {
            assert!(matches!(
                writer.add_video_track(media, 600),
                Err(MovError::Argument(_))
            ));
        }
        assert!(matches!(
            writer.add_video_track(video(), 0),
            Err(MovError::Argument(_))
        ));
        assert!(matches!(
            writer.add_audio_track(
                AudioFormat {
                    channels: 3,
                    ..Default::default()
                },
                44_100
            ),
            Err(MovError::Argument(_))
        ));
        assert!(writer.movie().tracks().is_empty());
    }

    #[test]
    fn pcm_tags_follow_the_sample_format() {
        let mut writer = writer();
        let cases = [
            (8, false, true, "raw "),
            (8, true, true, "twos"),
            (16, true, true, "twos"),
            (16, true, false, "sowt"),
        ];
        for (bits, signed, big_endian, expected) in cases {
            let format = AudioFormat {
                sample_size_bits: bits,
                signed,
                big_endian,
                ..Default::default()
            };
            let index = writer.add_audio_track(format, 44_100).unwrap();
            let media = writer.movie().track(index).unwrap().media();
            assert_eq!(media.compression_tag(), expected);
        }
        assert!(matches!(
            writer.add_audio_track(
                AudioFormat {
                    sample_size_bits: 16,
                    signed: false,
                    ..Default::default()
                },
                44_100
            ),
            Err(MovError::Argument(_))
        ));
    }

    #[test]
    fn uncompressed_audio_geometry() {
        let mut writer = writer();
        let index = writer
            .add_audio_track(
                AudioFormat {
                    channels: 2,
                    ..Default::default()
                },
                44_100,
            )
            .unwrap();
        match writer.movie().track(index).unwrap().media() {
            Media::Audio(audio) => {
                assert_eq!(audio.compression_id, 0);
                assert_eq!(audio.samples_per_packet, 1);
                assert_eq!(audio.bytes_per_sample, 2);
                assert_eq!(audio.bytes_per_packet, 2);
                assert_eq!(audio.bytes_per_frame, 4);
            }
            Media::Video(_) => unreachable!(),
        }
    }

    #[test]
    fn file_backed_samples_stream_in() {
        let mut writer = writer();
        let track = writer.add_video_track(video(), 600).unwrap();
        let payload = [7u8; 32];
        writer
            .write_sample_from(track, &payload[..], 32, 10, true)
            .unwrap();

        // A source that ends early fails and drops the sample.
        let err = writer.write_sample_from(track, &payload[..8], 32, 10, true);
        assert!(matches!(err, Err(MovError::ReadMismatch { got: 8, expected: 32 })));
        assert_eq!(writer.movie().track(track).unwrap().sample_count(), 1);
    }

    #[test]
    fn web_optimized_header_precedes_media_data() {
        let mut writer = writer();
        let track = writer.add_video_track(video(), 600).unwrap();
        for i in 0..5u8 {
            writer.write_sample(track, &[i; 64], 20, true).unwrap();
        }
        writer.finish().unwrap();

        let mut out = Vec::new();
        writer.write_web_optimized(&mut out, false).unwrap();

        assert_eq!(&out[4..8], b"ftyp");
        assert_eq!(&out[24..28], b"moov");
        let mut at = 20 + u32_at(&out, 20) as usize;
        if &out[at + 4..at + 8] == b"free" {
            at += u32_at(&out, at) as usize;
        }
        assert_eq!(&out[at + 4..at + 8], b"wide");
        assert_eq!(&out[at + 12..at + 16], b"mdat");

        // Media data is byte-identical to the straight file.
        let file = writer.close().unwrap().into_inner();
        assert_eq!(&out[at + 16..at + 16 + 320], &file[36..356]);
    }

    #[test]
    fn compressed_header_wraps_a_cmov() {
        let mut writer = writer();
        let track = writer.add_video_track(video(), 600).unwrap();
        writer.write_sample(track, &[3u8; 128], 20, true).unwrap();

        let mut out = Vec::new();
        writer.write_web_optimized(&mut out, true).unwrap();

        assert_eq!(&out[4..8], b"ftyp");
        assert_eq!(&out[24..28], b"moov");
        assert_eq!(&out[32..36], b"cmov");
        assert_eq!(u32_at(&out, 36), 12);
        assert_eq!(&out[40..44], b"dcom");
        assert_eq!(&out[52..56], b"cmvd");
    }
}
