//! Sample description atom (`stsd`).
//!
//! Declares how the samples in a track are encoded. The payload of
//! each entry depends on the media type, so parsing needs to know
//! whether the enclosing track is a video or a sound track (taken
//! from the preceding `hdlr` atom).
//!
//! Location: `moov/trak[multiple]/mdia/minf/stbl/stsd`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/sample_description_atom>

use std::io::{self, Write};

use binrw::BinRead;

use crate::atom::DataAtom;
use crate::binary::{unfixed16_16, PutBe};
use crate::track::{AudioMedia, VideoMedia};

/// Size of a video sample description up to and including
/// the color table id, i.e. without extension atoms.
const VIDEO_DESC_SIZE: u32 = 86;

/// Size of a version 1 sound sample description.
const AUDIO_DESC_SIZE: u32 = 52;

/// Sample description atom (`stsd`).
///
/// Location: `moov/trak[multiple]/mdia/minf/stbl/stsd`
///
/// See: <https://developer.apple.com/documentation/quicktime-file-format/sample_description_atom>
#[derive(Debug, BinRead)]
#[br(big, import { audio: bool })]
pub struct Stsd {
    _version: u8,
    _flags: [u8; 3],
    no_of_entries: u32,
    #[br(args { count: no_of_entries as usize, inner: binrw::args! { audio } })]
    entries: Vec<SampleDescription>,
}

impl Stsd {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SampleDescription] {
        &self.entries
    }

    /// First sample description. Tracks written by this crate
    /// always have exactly one.
    pub fn first(&self) -> Option<&SampleDescription> {
        self.entries.first()
    }

    /// Renders the atom for a video track.
    pub(crate) fn video_atom(video: &VideoMedia) -> io::Result<DataAtom> {
        let ctab = match &video.palette {
            Some(palette) => color_table(palette)?,
            None => Vec::new(),
        };

        let mut atom = DataAtom::new("stsd");
        atom.put_u32(0)?; // version + flags
        atom.put_u32(1)?;

        atom.put_u32(VIDEO_DESC_SIZE + ctab.len() as u32)?;
        atom.put_tag(&video.compression_tag)?;
        atom.put_zeros(6)?;
        atom.put_u16(1)?; // data reference index
        atom.put_u16(0)?; // version
        atom.put_u16(0)?; // revision level
        atom.put_u32(0)?; // vendor
        atom.put_u32(0)?; // temporal quality
        atom.put_u32((video.quality * 1024.0) as u32)?; // spatial quality
        atom.put_u16(video.width)?;
        atom.put_u16(video.height)?;
        atom.put_fixed16_16(72.0)?; // horizontal resolution, dpi
        atom.put_fixed16_16(72.0)?; // vertical resolution, dpi
        atom.put_u32(0)?; // data size, always 0
        atom.put_u16(1)?; // frame count per sample
        atom.put_pstring_fixed(&video.compressor_name, 32)?;
        atom.put_u16(video.depth)?;
        // 0 means a color table follows the sample description,
        // -1 means use the default table for the depth.
        let color_table_id: i16 = if ctab.is_empty() { -1 } else { 0 };
        atom.put_i16(color_table_id)?;
        atom.write_all(&ctab)?;

        Ok(atom)
    }

    /// Renders the atom for a sound track, always as a
    /// version 1 sound description.
    pub(crate) fn audio_atom(audio: &AudioMedia) -> io::Result<DataAtom> {
        let mut atom = DataAtom::new("stsd");
        atom.put_u32(0)?; // version + flags
        atom.put_u32(1)?;

        atom.put_u32(AUDIO_DESC_SIZE)?;
        atom.put_tag(&audio.compression_tag)?;
        atom.put_zeros(6)?;
        atom.put_u16(1)?; // data reference index
        atom.put_u16(1)?; // version
        atom.put_u16(0)?; // revision level
        atom.put_u32(0)?; // vendor
        atom.put_u16(audio.channels)?;
        atom.put_u16(audio.sample_size_bits)?;
        atom.put_i16(audio.compression_id)?;
        atom.put_u16(0)?; // packet size, always 0
        atom.put_fixed16_16(audio.sample_rate)?;
        atom.put_u32(audio.samples_per_packet)?;
        atom.put_u32(audio.bytes_per_packet)?;
        atom.put_u32(audio.bytes_per_frame)?;
        atom.put_u32(audio.bytes_per_sample)?;

        Ok(atom)
    }
}

/// Serializes an inline color table for palettized video,
/// one entry per palette color.
fn color_table(palette: &[[u8; 3]]) -> io::Result<Vec<u8>> {
    let mut ctab = Vec::with_capacity(8 + palette.len() * 8);
    ctab.put_u32(0)?; // color table seed
    ctab.put_u16(0x8000)?; // device color table
    ctab.put_u16(palette.len() as u16 - 1)?;
    for rgb in palette.iter() {
        ctab.put_u16(0)?;
        for component in rgb.iter() {
            // Widen 8 bit components to 16 bit.
            ctab.put_u16(u16::from_be_bytes([*component, *component]))?;
        }
    }
    Ok(ctab)
}

/// Single sample description entry.
#[derive(Debug, BinRead)]
#[br(big, import { audio: bool })]
pub struct SampleDescription {
    size: u32,
    /// Compression format tag, e.g. `rle ` or `twos`.
    #[br(map = |raw: [u8; 4]| raw.iter().map(|b| *b as char).collect())]
    pub(crate) data_format: String,
    _reserved: [u8; 6],
    /// 1-based index into the `dref` table.
    pub(crate) data_reference_index: u16,
    #[br(args { size, audio })]
    pub(crate) media: DescPayload,
}

impl SampleDescription {
    pub fn data_format(&self) -> &str {
        &self.data_format
    }

    pub fn video(&self) -> Option<&VideoDesc> {
        match &self.media {
            DescPayload::Video(desc) => Some(desc),
            DescPayload::Audio(_) => None,
        }
    }

    pub fn audio(&self) -> Option<&AudioDesc> {
        match &self.media {
            DescPayload::Audio(desc) => Some(desc),
            DescPayload::Video(_) => None,
        }
    }
}

/// Media dependent remainder of a sample description.
#[derive(Debug, BinRead)]
#[br(big, import { size: u32, audio: bool })]
pub enum DescPayload {
    #[br(pre_assert(!audio))]
    Video(#[br(args { size })] VideoDesc),
    #[br(pre_assert(audio))]
    Audio(AudioDesc),
}

/// Video sample description payload, following the
/// common 16 byte entry prefix.
///
/// See: <https://developer.apple.com/documentation/quicktime-file-format/video_sample_description>
#[derive(Debug, BinRead)]
#[br(big, import { size: u32 })]
pub struct VideoDesc {
    _version: u16,
    _revision_level: u16,
    _vendor: u32,
    _temporal_quality: u32,
    /// Spatial quality, 0 - 1024.
    pub(crate) spatial_quality: u32,
    /// Frame width in pixels.
    pub(crate) width: u16,
    /// Frame height in pixels.
    pub(crate) height: u16,
    /// 16.16 fixed-point horizontal resolution in dpi.
    pub(crate) horizontal_resolution: u32,
    /// 16.16 fixed-point vertical resolution in dpi.
    pub(crate) vertical_resolution: u32,
    _data_size: u32,
    /// Frames per sample, usually 1.
    pub(crate) frame_count: u16,
    /// Name of the compressor, fixed 32 byte counted string.
    #[br(map = |raw: [u8; 32]| {
        let len = (raw[0] as usize).min(31);
        raw[1..=len].iter().map(|b| *b as char).collect()
    })]
    pub(crate) compressor_name: String,
    /// Pixel depth. 1, 2, 4, 8, 16, 24 or 32. 34, 36 and 40
    /// denote grayscale at 2, 4 and 8 bits.
    pub(crate) depth: u16,
    /// 0 means a color table is embedded in this description,
    /// -1 means use the default table for the depth.
    pub(crate) color_table_id: i16,
    /// Trailing extensions, including any embedded color table.
    #[br(count = size.saturating_sub(VIDEO_DESC_SIZE))]
    pub(crate) extensions: Vec<u8>,
}

impl VideoDesc {
    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn depth(&self) -> u16 {
        self.depth
    }

    pub fn compressor_name(&self) -> &str {
        &self.compressor_name
    }

    /// Spatial quality as a 0.0 - 1.0 fraction.
    pub fn quality(&self) -> f64 {
        self.spatial_quality as f64 / 1024.0
    }

    pub fn horizontal_resolution(&self) -> f64 {
        unfixed16_16(self.horizontal_resolution)
    }

    pub fn vertical_resolution(&self) -> f64 {
        unfixed16_16(self.vertical_resolution)
    }

    /// Decodes the embedded color table into 8 bit RGB triplets.
    /// Returns `None` unless `color_table_id` is 0 and an intact
    /// table is present in the extensions.
    pub fn palette(&self) -> Option<Vec<[u8; 3]>> {
        if self.color_table_id != 0 || self.extensions.len() < 8 {
            return None;
        }
        let count = u16::from_be_bytes([self.extensions[6], self.extensions[7]]) as usize + 1;
        if self.extensions.len() < 8 + count * 8 {
            return None;
        }
        let palette = self.extensions[8..8 + count * 8]
            .chunks_exact(8)
            .map(|entry| [entry[2], entry[4], entry[6]])
            .collect();
        Some(palette)
    }
}

/// Sound sample description payload, following the
/// common 16 byte entry prefix.
///
/// See: <https://developer.apple.com/documentation/quicktime-file-format/sound_sample_description_version_1>
#[derive(Debug, BinRead)]
#[br(big)]
pub struct AudioDesc {
    /// 0 or 1. Version 1 appends the four
    /// bytes-per-packet fields.
    version: u16,
    _revision_level: u16,
    _vendor: u32,
    /// Number of audio channels.
    pub(crate) channels: u16,
    /// Bits per uncompressed sample, 8 or 16.
    pub(crate) sample_size: u16,
    /// 0 for uncompressed audio, -2 for variable rate formats
    /// described by the version 1 fields.
    pub(crate) compression_id: i16,
    _packet_size: u16,
    /// Unsigned 16.16 fixed-point sample rate in Hz.
    pub(crate) sample_rate: u32,
    #[br(if(version >= 1, 1))]
    pub(crate) samples_per_packet: u32,
    #[br(if(version >= 1, 0))]
    pub(crate) bytes_per_packet: u32,
    #[br(if(version >= 1, 0))]
    pub(crate) bytes_per_frame: u32,
    #[br(if(version >= 1, 0))]
    pub(crate) bytes_per_sample: u32,
}

impl AudioDesc {
    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_size(&self) -> u16 {
        self.sample_size
    }

    pub fn compression_id(&self) -> i16 {
        self.compression_id
    }

    /// Sample rate in Hz. The underlying fixed-point field is
    /// unsigned, unlike the matrix and resolution fields, so
    /// rates of 32768 Hz and above must not decode negative.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate as f64 / 65536.0
    }

    pub fn samples_per_packet(&self) -> u32 {
        self.samples_per_packet
    }

    pub fn bytes_per_packet(&self) -> u32 {
        self.bytes_per_packet
    }

    pub fn bytes_per_frame(&self) -> u32 {
        self.bytes_per_frame
    }

    pub fn bytes_per_sample(&self) -> u32 {
        self.bytes_per_sample
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use binrw::BinReaderExt;

    use crate::track::{AudioMedia, VideoMedia};

    use super::Stsd;

    fn parse(raw: &[u8], audio: bool) -> Stsd {
        let args: <Stsd as binrw::BinRead>::Args<'_> = binrw::args! { audio };
        Cursor::new(&raw[8..]).read_be_args(args).unwrap()
    }

    #[test]
    fn video_description_round_trip() {
        let video = VideoMedia {
            compression_tag: "rle ".to_string(),
            compressor_name: "Animation".to_string(),
            width: 320,
            height: 240,
            depth: 24,
            quality: 1.0,
            palette: None,
            sync_interval: 0,
        };
        let mut atom = Stsd::video_atom(&video).unwrap();
        let mut raw = Vec::new();
        atom.finish();
        atom.write_to(&mut raw).unwrap();

        let stsd = parse(&raw, false);
        assert_eq!(stsd.len(), 1);
        let entry = stsd.first().unwrap();
        assert_eq!(entry.data_format(), "rle ");
        let desc = entry.video().unwrap();
        assert_eq!(desc.width(), 320);
        assert_eq!(desc.height(), 240);
        assert_eq!(desc.depth(), 24);
        assert_eq!(desc.compressor_name(), "Animation");
        assert_eq!(desc.color_table_id, -1);
        assert!(desc.palette().is_none());
    }

    #[test]
    fn video_description_embeds_color_table() {
        let palette = vec![[0, 0, 0], [255, 0, 0], [0, 255, 0], [0, 0, 255]];
        let video = VideoMedia {
            compression_tag: "rle ".to_string(),
            compressor_name: "Animation".to_string(),
            width: 64,
            height: 64,
            depth: 8,
            quality: 1.0,
            palette: Some(palette.clone()),
            sync_interval: 0,
        };
        let mut atom = Stsd::video_atom(&video).unwrap();
        let mut raw = Vec::new();
        atom.finish();
        atom.write_to(&mut raw).unwrap();

        let stsd = parse(&raw, false);
        let desc = stsd.first().unwrap().video().unwrap();
        assert_eq!(desc.color_table_id, 0);
        assert_eq!(desc.palette(), Some(palette));
    }

    #[test]
    fn audio_description_round_trip() {
        let audio = AudioMedia {
            compression_tag: "sowt".to_string(),
            sample_rate: 44100.0,
            channels: 2,
            sample_size_bits: 16,
            compression_id: 0,
            samples_per_packet: 1,
            bytes_per_packet: 2,
            bytes_per_frame: 4,
            bytes_per_sample: 2,
        };
        let mut atom = Stsd::audio_atom(&audio).unwrap();
        let mut raw = Vec::new();
        atom.finish();
        atom.write_to(&mut raw).unwrap();

        let stsd = parse(&raw, true);
        let entry = stsd.first().unwrap();
        assert_eq!(entry.data_format(), "sowt");
        let desc = entry.audio().unwrap();
        assert_eq!(desc.channels(), 2);
        assert_eq!(desc.sample_size(), 16);
        assert_eq!(desc.sample_rate(), 44100.0);
        assert_eq!(desc.bytes_per_frame(), 4);
    }
}
