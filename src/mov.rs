//! QuickTime movie demuxer.
//!
//! `Mov` opens a finished movie and rebuilds the in-memory
//! [`Movie`]/[`Track`] model from the sample table atoms,
//! including movies whose header is stored zlib compressed
//! inside `moov/cmov`. Media data is never buffered up front:
//! sample bytes are read on demand through
//! [`Mov::sample_data`].

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use binrw::BinReaderExt;
use time::Duration;

use crate::atom::AtomHeader;
use crate::atom_types::{
    Cmvd, Co64, Dcom, Elst, Ftyp, Hdlr, Mdhd, Mvhd, SampleDescription, Stco, Stsc, Stsd, Stss,
    Stsz, Stts, Tkhd,
};
use crate::consts::MOVIE_TIME_SCALE;
use crate::errors::MovError;
use crate::fourcc::FourCC;
use crate::movie::Movie;
use crate::reader::MovReader;
use crate::track::{
    append_run, AudioMedia, Chunk, Edit, Media, SampleLocation, SampleSizeRun, Track, VideoMedia,
};

/// QuickTime movie file demuxer.
pub struct Mov<R: Read + Seek> {
    reader: MovReader<R>,
}

impl Mov<BufReader<File>> {
    /// Opens a movie file.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, MovError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> Mov<R> {
    /// Wraps any seekable byte source holding a movie.
    pub fn from_reader(inner: R) -> Result<Self, MovError> {
        Ok(Self {
            reader: MovReader::new(inner)?,
        })
    }

    /// Total source length in bytes.
    pub fn len(&self) -> u64 {
        self.reader.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reader.is_empty()
    }

    /// Rewinds to the start of the source.
    pub fn reset(&mut self) -> Result<(), MovError> {
        self.reader.reset()
    }

    /// Finds the next top-level atom named `name`, starting at
    /// the current position. Leaves the reader at the start of
    /// the atom's payload.
    pub fn find(&mut self, name: &str) -> Result<AtomHeader, MovError> {
        let target = FourCC::from_str(name);
        while self.reader.pos()? < self.reader.len() {
            let header = self.reader.header(self.reader.len())?;
            if header.name() == &target {
                return Ok(header);
            }
            self.reader.skip(&header)?;
        }
        Err(MovError::NoSuchAtom(name.to_owned()))
    }

    /// All top-level atom headers in file order.
    pub fn headers(&mut self) -> Result<Vec<AtomHeader>, MovError> {
        self.reset()?;
        let mut headers = Vec::new();
        while self.reader.pos()? < self.reader.len() {
            let header = self.reader.header(self.reader.len())?;
            self.reader.skip(&header)?;
            headers.push(header);
        }
        Ok(headers)
    }

    /// File type compatibility atom.
    pub fn ftyp(&mut self) -> Result<Ftyp, MovError> {
        self.reset()?;
        let header = self.find("ftyp")?;
        Ok(self.reader.data(&header)?.read_ne()?)
    }

    /// Header of the media data atom.
    pub fn mdat(&mut self) -> Result<AtomHeader, MovError> {
        self.reset()?;
        self.find("mdat")
    }

    /// Movie play length, from the longest track.
    pub fn duration(&mut self) -> Result<Duration, MovError> {
        let movie = self.movie()?;
        Ok(Duration::seconds_f64(movie.duration_sec()))
    }

    /// Parses the movie header into the full movie model,
    /// inflating a compressed header when one is found.
    pub fn movie(&mut self) -> Result<Movie, MovError> {
        self.reset()?;
        let moov = self.find("moov")?;
        self.parse_moov(&moov)
    }

    /// Reads the media bytes for one sample location.
    pub fn sample_data(&mut self, location: &SampleLocation) -> Result<Vec<u8>, MovError> {
        self.reader.seek_to(location.offset)?;
        Ok(self.reader.read(location.length as u64)?.into_inner())
    }

    fn parse_moov(&mut self, moov: &AtomHeader) -> Result<Movie, MovError> {
        let mut movie = Movie::new(MOVIE_TIME_SCALE);
        while self.reader.pos()? < moov.end() {
            let child = self.reader.header(moov.end())?;
            match child.name() {
                FourCC::Mvhd => {
                    let mvhd: Mvhd = self.reader.data(&child)?.read_ne()?;
                    apply_mvhd(&mut movie, &mvhd);
                }
                FourCC::Trak => {
                    let track = self.parse_trak(&child)?;
                    movie.tracks.push(track);
                }
                FourCC::Cmov => return self.parse_cmov(&child),
                _ => {}
            }
            self.reader.skip(&child)?;
        }
        Ok(movie)
    }

    /// Inflates `moov/cmov` and re-parses the embedded movie
    /// header, which is a complete `moov` atom of its own.
    fn parse_cmov(&mut self, cmov: &AtomHeader) -> Result<Movie, MovError> {
        let mut dcom: Option<Dcom> = None;
        let mut cmvd: Option<Cmvd> = None;
        while self.reader.pos()? < cmov.end() {
            let child = self.reader.header(cmov.end())?;
            match child.name() {
                FourCC::Dcom => dcom = Some(self.reader.data(&child)?.read_ne()?),
                FourCC::Cmvd => cmvd = Some(self.reader.data(&child)?.read_ne()?),
                _ => {}
            }
            self.reader.skip(&child)?;
        }

        let dcom = dcom.ok_or_else(|| MovError::NoSuchAtom("dcom".to_owned()))?;
        if !dcom.is_zlib() {
            return Err(MovError::UnknownCompression(dcom.method().to_owned()));
        }
        let cmvd = cmvd.ok_or_else(|| MovError::NoSuchAtom("cmvd".to_owned()))?;
        let inflated = cmvd.decompress()?;
        log::debug!(
            "inflated movie header: {} -> {} bytes",
            cmov.data_size(),
            inflated.len()
        );
        Mov::from_reader(Cursor::new(inflated))?.movie()
    }

    fn parse_trak(&mut self, trak: &AtomHeader) -> Result<Track, MovError> {
        let mut leaves = TrakLeaves::default();
        self.collect_trak_leaves(trak.end(), &mut leaves)?;
        build_track(leaves)
    }

    /// Descends the `trak` subtree, buffering the payload of
    /// every leaf the track model is built from.
    fn collect_trak_leaves(
        &mut self,
        parent_end: u64,
        leaves: &mut TrakLeaves,
    ) -> Result<(), MovError> {
        while self.reader.pos()? < parent_end {
            let header = self.reader.header(parent_end)?;
            if header.is_container() {
                self.collect_trak_leaves(header.end(), leaves)?;
                continue;
            }
            match header.name() {
                FourCC::Tkhd => leaves.tkhd = Some(self.reader.data(&header)?),
                FourCC::Mdhd => leaves.mdhd = Some(self.reader.data(&header)?),
                FourCC::Elst => leaves.elst = Some(self.reader.data(&header)?),
                FourCC::Stsd => leaves.stsd = Some(self.reader.data(&header)?),
                FourCC::Stts => leaves.stts = Some(self.reader.data(&header)?),
                FourCC::Stsc => leaves.stsc = Some(self.reader.data(&header)?),
                FourCC::Stsz => leaves.stsz = Some(self.reader.data(&header)?),
                FourCC::Stco => leaves.stco = Some(self.reader.data(&header)?),
                FourCC::Co64 => leaves.co64 = Some(self.reader.data(&header)?),
                FourCC::Stss => leaves.stss = Some(self.reader.data(&header)?),
                // Only the `mdia` level handler decides the
                // media kind. The `minf` level one describes
                // data references.
                FourCC::Hdlr => {
                    let hdlr: Hdlr = self.reader.data(&header)?.read_ne()?;
                    if hdlr.is_media_handler() {
                        leaves.handler = Some(hdlr);
                    }
                }
                _ => {}
            }
            self.reader.skip(&header)?;
        }
        Ok(())
    }
}

/// Buffered leaf payloads of one `trak` subtree.
#[derive(Default)]
struct TrakLeaves {
    tkhd: Option<Cursor<Vec<u8>>>,
    mdhd: Option<Cursor<Vec<u8>>>,
    elst: Option<Cursor<Vec<u8>>>,
    stsd: Option<Cursor<Vec<u8>>>,
    stts: Option<Cursor<Vec<u8>>>,
    stsc: Option<Cursor<Vec<u8>>>,
    stsz: Option<Cursor<Vec<u8>>>,
    stco: Option<Cursor<Vec<u8>>>,
    co64: Option<Cursor<Vec<u8>>>,
    stss: Option<Cursor<Vec<u8>>>,
    handler: Option<Hdlr>,
}

fn required(leaf: Option<Cursor<Vec<u8>>>, name: &str) -> Result<Cursor<Vec<u8>>, MovError> {
    leaf.ok_or_else(|| MovError::NoSuchAtom(name.to_owned()))
}

/// Rebuilds one [`Track`] from its buffered leaves.
fn build_track(leaves: TrakLeaves) -> Result<Track, MovError> {
    let tkhd: Tkhd = required(leaves.tkhd, "tkhd")?.read_ne()?;
    let mdhd: Mdhd = required(leaves.mdhd, "mdhd")?.read_ne()?;
    let handler = leaves
        .handler
        .ok_or_else(|| MovError::NoSuchAtom("hdlr".to_owned()))?;
    let audio = handler.is_audio();

    let args: <Stsd as binrw::BinRead>::Args<'_> = binrw::args! { audio };
    let stsd: Stsd = required(leaves.stsd, "stsd")?.read_ne_args(args)?;
    let desc = stsd
        .first()
        .ok_or_else(|| MovError::NoSuchAtom("sample description".to_owned()))?;
    let media = media_from_description(desc)?;

    let stts: Stts = required(leaves.stts, "stts")?.read_ne()?;
    let stsz: Stsz = required(leaves.stsz, "stsz")?.read_ne()?;
    let stsc: Stsc = required(leaves.stsc, "stsc")?.read_ne()?;
    let offsets: Vec<u64> = match (leaves.stco, leaves.co64) {
        (_, Some(mut cursor)) => {
            let co64: Co64 = cursor.read_ne()?;
            co64.offsets().to_vec()
        }
        (Some(mut cursor), None) => {
            let stco: Stco = cursor.read_ne()?;
            Co64::from(stco).offsets().to_vec()
        }
        (None, None) => return Err(MovError::NoSuchAtom("stco".to_owned())),
    };

    // One run per distinct consecutive size. The uniform `stsz`
    // form collapses back into a single run.
    let sizes = stsz.sizes();
    let mut sample_sizes: Vec<SampleSizeRun> = Vec::new();
    for &size in &sizes {
        append_run(
            &mut sample_sizes,
            SampleSizeRun {
                sample_count: 1,
                sample_length: size,
            },
            |last, new| {
                if last.sample_length != new.sample_length {
                    return false;
                }
                last.sample_count += 1;
                true
            },
        );
    }

    // Chunk shapes come from `stsc`, positions from the offset
    // table, lengths from the sizes of the samples within.
    let per_chunk = stsc.expand(offsets.len());
    let mut chunks = Vec::with_capacity(offsets.len());
    let mut next_sample = 0_usize;
    for (offset, (sample_count, sample_description_id)) in offsets.iter().zip(per_chunk) {
        let length: u64 = sizes
            .get(next_sample..)
            .unwrap_or(&[])
            .iter()
            .take(sample_count as usize)
            .map(|&size| size as u64)
            .sum();
        chunks.push(Chunk {
            sample_count,
            sample_description_id,
            offset: *offset,
            next_offset: *offset + length,
        });
        next_sample += sample_count as usize;
    }

    let mut track = Track::new(media, mdhd.time_scale());
    track.track_id = tkhd.track_id();
    track.matrix = *tkhd.matrix();
    track.language = mdhd.language;
    track.creation_time = tkhd.creation_time();
    track.modification_time = tkhd.modification_time();
    track.media_duration = stts.duration_sum();
    track.sample_count = sizes.len() as u64;
    track.time_to_samples = stts.into_table();
    track.sample_sizes = sample_sizes;
    track.chunks = chunks;

    if let Some(mut cursor) = leaves.stss {
        let stss: Stss = cursor.read_ne()?;
        track.sync_samples = Some(stss.into_sync_samples());
    }
    if let Some(mut cursor) = leaves.elst {
        let elst: Elst = cursor.read_ne()?;
        if !elst.is_empty() {
            track.edits = Some(
                elst.into_table()
                    .iter()
                    .map(|e| Edit::new(e.track_duration(), e.media_time(), e.media_rate()))
                    .collect(),
            );
        }
    }
    log::debug!(
        "parsed track {}: {} {} sample(s) in {} chunk(s)",
        track.track_id,
        track.media.compression_tag(),
        track.sample_count,
        track.chunks.len()
    );

    Ok(track)
}

fn media_from_description(desc: &SampleDescription) -> Result<Media, MovError> {
    if let Some(video) = desc.video() {
        return Ok(Media::Video(VideoMedia {
            compression_tag: desc.data_format().to_owned(),
            compressor_name: video.compressor_name().to_owned(),
            width: video.width(),
            height: video.height(),
            depth: video.depth(),
            quality: video.quality(),
            palette: video.palette(),
            sync_interval: 0,
        }));
    }
    if let Some(audio) = desc.audio() {
        return Ok(Media::Audio(AudioMedia {
            compression_tag: desc.data_format().to_owned(),
            sample_rate: audio.sample_rate(),
            channels: audio.channels(),
            sample_size_bits: audio.sample_size(),
            compression_id: audio.compression_id(),
            samples_per_packet: audio.samples_per_packet(),
            bytes_per_packet: audio.bytes_per_packet(),
            bytes_per_frame: audio.bytes_per_frame(),
            bytes_per_sample: audio.bytes_per_sample(),
        }));
    }
    Err(MovError::NoSuchAtom("sample description".to_owned()))
}

/// Copies the parsed movie header fields onto the model.
fn apply_mvhd(movie: &mut Movie, mvhd: &Mvhd) {
    movie.time_scale = mvhd.time_scale;
    movie.creation_time = mvhd.creation_time();
    movie.modification_time = mvhd.modification_time();
    movie.preferred_rate = mvhd.preferred_rate();
    movie.preferred_volume = mvhd.preferred_volume();
    movie.matrix = mvhd.matrix;
    movie.preview_time = mvhd.preview_time;
    movie.preview_duration = mvhd.preview_duration;
    movie.poster_time = mvhd.poster_time;
    movie.selection_time = mvhd.selection_time;
    movie.selection_duration = mvhd.selection_duration;
    movie.current_time = mvhd.current_time;
}
