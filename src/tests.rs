//! End to end coverage. Movies written by `MovWriter` are read
//! back through `Mov` and must come out with identical tables
//! and payload bytes.

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor, Seek, SeekFrom, Write};

    use crate::{
        AnimationDecoder, AnimationEncoder, AudioFormat, Edit, FourCC, Media, Mov, MovWriter,
        VideoMedia,
    };

    fn parse(bytes: Vec<u8>) -> Mov<Cursor<Vec<u8>>> {
        Mov::from_reader(Cursor::new(bytes)).unwrap()
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    fn small_video() -> VideoMedia {
        VideoMedia {
            width: 8,
            height: 8,
            ..Default::default()
        }
    }

    #[test]
    fn round_trip_preserves_tracks_and_payload() {
        let mut writer = MovWriter::new(Cursor::new(Vec::new()));
        let video = writer
            .add_video_track(
                VideoMedia {
                    width: 320,
                    height: 240,
                    ..Default::default()
                },
                600,
            )
            .unwrap();
        let audio = writer
            .add_audio_track(
                AudioFormat {
                    sample_rate: 48_000.0,
                    channels: 2,
                    big_endian: false,
                    ..Default::default()
                },
                48_000,
            )
            .unwrap();

        let frames: [&[u8]; 3] = [&[0x11; 64], &[0x22; 24], &[0x33; 40]];
        let pcm: Vec<u8> = (0u8..16).collect();

        writer.write_sample(video, frames[0], 20, true).unwrap();
        writer.write_samples(audio, 4, &pcm, 1, true).unwrap();
        writer.write_sample(video, frames[1], 20, false).unwrap();
        writer.write_sample(video, frames[2], 25, false).unwrap();

        let bytes = writer.close().unwrap().into_inner();
        let mut mov = parse(bytes);
        assert!(mov.ftyp().unwrap().is_quicktime());

        let mdat = mov.mdat().unwrap();
        assert_eq!(mdat.data_offset(), 36);
        assert_eq!(mdat.data_size(), 144);

        let movie = mov.movie().unwrap();
        assert_eq!(movie.time_scale(), 600);
        assert_eq!(movie.duration(), 65);
        assert_eq!(movie.tracks().len(), 2);

        let v = movie.video_track().unwrap();
        assert_eq!(v.track_id(), 1);
        assert_eq!(v.media_time_scale(), 600);
        assert_eq!(v.sample_count(), 3);
        assert_eq!(v.media_duration(), 65);
        match v.media() {
            Media::Video(m) => {
                assert_eq!(m.compression_tag, "rle ");
                assert_eq!(m.compressor_name, "Animation");
                assert_eq!((m.width, m.height, m.depth), (320, 240, 24));
                assert_eq!(m.palette, None);
            }
            _ => panic!("expected video media"),
        }
        // One chunk for the first frame, one for the pair written
        // back to back after the audio interleave.
        assert_eq!(v.chunks().len(), 2);
        assert_eq!(v.chunks()[0].sample_count(), 1);
        assert_eq!(v.chunks()[1].sample_count(), 2);
        assert_eq!(v.sync_samples(), Some(&[1][..]));

        let a = movie.audio_track().unwrap();
        assert_eq!(a.track_id(), 2);
        assert_eq!(a.media_time_scale(), 48_000);
        assert_eq!(a.sample_count(), 4);
        match a.media() {
            Media::Audio(m) => {
                assert_eq!(m.compression_tag, "sowt");
                assert_eq!(m.sample_rate, 48_000.0);
                assert_eq!((m.channels, m.sample_size_bits), (2, 16));
                assert_eq!(m.compression_id, 0);
                assert_eq!(m.samples_per_packet, 1);
                assert_eq!(m.bytes_per_packet, 2);
                assert_eq!(m.bytes_per_frame, 4);
                assert_eq!(m.bytes_per_sample, 2);
            }
            _ => panic!("expected audio media"),
        }
        assert_eq!(a.chunks().len(), 1);
        assert_eq!(a.chunks()[0].sample_count(), 4);
        assert_eq!(a.sync_samples(), None);

        let locations = v.sample_locations();
        assert_eq!(locations.len(), 3);
        assert_eq!(locations[0].offset, 36);
        assert_eq!(locations[0].duration, 20);
        assert_eq!(locations[2].duration, 25);
        assert!(locations[0].is_sync);
        assert!(!locations[1].is_sync);
        assert!(!locations[2].is_sync);
        for (location, frame) in locations.iter().zip(frames) {
            assert_eq!(location.length as usize, frame.len());
            assert_eq!(mov.sample_data(location).unwrap(), frame);
        }

        let samples: Vec<u8> = a
            .sample_locations()
            .iter()
            .flat_map(|l| mov.sample_data(l).unwrap())
            .collect();
        assert_eq!(samples, pcm);
    }

    #[test]
    fn compressed_audio_keeps_its_packet_geometry() {
        let mut writer = MovWriter::new(Cursor::new(Vec::new()));
        let track = writer
            .add_audio_track(
                AudioFormat {
                    compression_tag: "ima4".to_string(),
                    sample_rate: 22_050.0,
                    channels: 1,
                    compressed: true,
                    frame_duration: 64,
                    frame_size: 34,
                    ..Default::default()
                },
                22_050,
            )
            .unwrap();
        for _ in 0..3 {
            writer.write_sample(track, &[0x55; 34], 64, true).unwrap();
        }

        let bytes = writer.close().unwrap().into_inner();
        let movie = parse(bytes).movie().unwrap();
        let track = movie.audio_track().unwrap();
        assert_eq!(track.media_duration(), 192);
        match track.media() {
            Media::Audio(m) => {
                assert_eq!(m.compression_tag, "ima4");
                assert_eq!(m.sample_rate, 22_050.0);
                assert_eq!(m.compression_id, -2);
                assert_eq!(m.samples_per_packet, 64);
                assert_eq!(m.bytes_per_packet, 34);
                assert_eq!(m.bytes_per_frame, 34);
            }
            _ => panic!("expected audio media"),
        }
    }

    #[test]
    fn indexed_video_palette_survives() {
        let palette = vec![[0u8, 0, 0], [85, 85, 85], [170, 170, 170], [255, 255, 255]];
        let mut writer = MovWriter::new(Cursor::new(Vec::new()));
        let track = writer
            .add_video_track(
                VideoMedia {
                    width: 16,
                    height: 2,
                    depth: 8,
                    palette: Some(palette.clone()),
                    ..Default::default()
                },
                600,
            )
            .unwrap();
        writer.write_sample(track, &[0u8; 8], 10, true).unwrap();

        let bytes = writer.close().unwrap().into_inner();
        let movie = parse(bytes).movie().unwrap();
        match movie.video_track().unwrap().media() {
            Media::Video(m) => {
                assert_eq!(m.depth, 8);
                assert_eq!(m.palette.as_deref(), Some(&palette[..]));
            }
            _ => panic!("expected video media"),
        }
    }

    #[test]
    fn edit_list_and_sync_table_survive() {
        let mut writer = MovWriter::new(Cursor::new(Vec::new()));
        let track = writer.add_video_track(small_video(), 600).unwrap();
        for i in 0u8..4 {
            writer.write_sample(track, &[i; 6], 15, i % 2 == 0).unwrap();
        }
        let edits = vec![Edit::empty(30), Edit::new(80, 0, 1.0)];
        writer.set_edits(track, edits.clone()).unwrap();

        let bytes = writer.close().unwrap().into_inner();
        let movie = parse(bytes).movie().unwrap();
        let track = movie.video_track().unwrap();
        assert_eq!(track.sync_samples(), Some(&[1, 3][..]));
        assert!(track.is_sync_sample(3));
        assert!(!track.is_sync_sample(2));
        assert_eq!(track.edits(), Some(&edits[..]));
        // The edit list, not the media, decides the duration.
        assert_eq!(movie.duration(), 110);
    }

    #[test]
    fn empty_movie_still_parses() {
        let mut writer = MovWriter::new(Cursor::new(Vec::new()));
        writer.add_video_track(small_video(), 600).unwrap();

        let bytes = writer.close().unwrap().into_inner();
        let mut mov = parse(bytes);
        let movie = mov.movie().unwrap();
        assert_eq!(movie.duration(), 0);
        let track = movie.video_track().unwrap();
        assert_eq!(track.sample_count(), 0);
        assert!(track.chunks().is_empty());
        assert!(track.sample_locations().is_empty());
    }

    #[test]
    fn file_backed_movie_reopens_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mov");

        let mut writer = MovWriter::new(std::fs::File::create(&path).unwrap());
        let track = writer.add_video_track(small_video(), 600).unwrap();
        writer.write_sample(track, b"first frame", 30, true).unwrap();
        writer.write_sample(track, b"second", 30, false).unwrap();
        writer.close().unwrap();

        let mut mov = Mov::new(&path).unwrap();
        assert!(mov.ftyp().unwrap().is_quicktime());
        assert!((mov.duration().unwrap().as_seconds_f64() - 0.1).abs() < 1e-9);

        let movie = mov.movie().unwrap();
        let track = movie.video_track().unwrap();
        assert_eq!(track.sample_count(), 2);
        let locations = track.sample_locations();
        assert_eq!(mov.sample_data(&locations[0]).unwrap(), b"first frame");
        assert_eq!(mov.sample_data(&locations[1]).unwrap(), b"second");
    }

    #[test]
    fn web_optimized_copy_moves_the_header_forward() {
        let frames: [&[u8]; 3] = [b"alpha", b"bravo!", b"charlie"];
        let mut writer = MovWriter::new(Cursor::new(Vec::new()));
        let track = writer.add_video_track(small_video(), 600).unwrap();
        for (i, frame) in frames.iter().enumerate() {
            writer.write_sample(track, frame, 10, i == 0).unwrap();
        }
        writer.finish().unwrap();

        let mut optimized = Vec::new();
        writer.write_web_optimized(&mut optimized, false).unwrap();

        let mut mov = parse(optimized);
        let names: Vec<FourCC> = mov
            .headers()
            .unwrap()
            .iter()
            .map(|h| h.name().clone())
            .collect();
        assert_eq!(names.first(), Some(&FourCC::Ftyp));
        assert_eq!(names.last(), Some(&FourCC::Mdat));
        let moov = names.iter().position(|n| *n == FourCC::Moov).unwrap();
        let mdat = names.iter().position(|n| *n == FourCC::Mdat).unwrap();
        assert!(moov < mdat);

        // Chunk offsets moved with the header; the payload bytes
        // must still resolve.
        let movie = mov.movie().unwrap();
        let track = movie.video_track().unwrap();
        for (location, frame) in track.sample_locations().iter().zip(frames) {
            assert_eq!(mov.sample_data(location).unwrap(), frame);
        }
    }

    #[test]
    fn compressed_header_expands_on_read() {
        fn frame_bytes(i: usize) -> Vec<u8> {
            (0..96).map(|j| (i * 31 + j) as u8).collect()
        }

        let mut writer = MovWriter::new(Cursor::new(Vec::new()));
        let track = writer.add_video_track(small_video(), 600).unwrap();
        for i in 0..10 {
            writer
                .write_sample(track, &frame_bytes(i), 10, i == 0)
                .unwrap();
        }

        let mut optimized = Vec::new();
        writer.write_web_optimized(&mut optimized, true).unwrap();
        assert!(contains(&optimized, b"cmov"));
        assert!(contains(&optimized, b"dcom"));
        assert!(contains(&optimized, b"cmvd"));

        let mut mov = parse(optimized);
        let movie = mov.movie().unwrap();
        assert_eq!(movie.time_scale(), 600);
        let track = movie.video_track().unwrap();
        assert_eq!(track.sample_count(), 10);
        assert_eq!(track.sync_samples(), Some(&[1][..]));
        for (i, location) in track.sample_locations().iter().enumerate() {
            assert_eq!(mov.sample_data(location).unwrap(), frame_bytes(i));
        }
    }

    #[test]
    fn animation_frames_survive_the_container() {
        let width = 64u16;
        let height = 48u16;
        let frame0 = vec![0x102030u32; width as usize * height as usize];
        let mut frame1 = frame0.clone();
        for x in 0..width as usize {
            frame1[5 * width as usize + x] = 0xFF8000;
        }
        let frame2 = frame1.clone();

        let mut encoder = AnimationEncoder::new(width, height, 24, 0).unwrap();
        let mut writer = MovWriter::new(Cursor::new(Vec::new()));
        let track = writer
            .add_video_track(
                VideoMedia {
                    width,
                    height,
                    ..Default::default()
                },
                600,
            )
            .unwrap();
        for frame in [&frame0, &frame1, &frame2] {
            let encoded = encoder.encode_rgb(frame).unwrap();
            writer
                .write_sample(track, &encoded.data, 25, encoded.is_key)
                .unwrap();
        }

        let bytes = writer.close().unwrap().into_inner();
        let mut mov = parse(bytes);
        let movie = mov.movie().unwrap();
        let track = movie.video_track().unwrap();
        let locations = track.sample_locations();
        assert!(locations[0].is_sync);
        assert!(!locations[1].is_sync);
        assert!(!locations[2].is_sync);
        // An unchanged frame is a bare no-op chunk.
        assert_eq!(locations[2].length, 4);

        let mut decoder = AnimationDecoder::new(width, height, 24).unwrap();
        for (location, frame) in locations.iter().zip([&frame0, &frame1, &frame2]) {
            let chunk = mov.sample_data(location).unwrap();
            assert_eq!(decoder.decode_rgb(&chunk).unwrap(), *frame);
        }
    }

    /// Seekable sink that keeps only writes holding a non-zero
    /// byte, so a multi-gigabyte zero payload costs no memory.
    /// Reading serves the kept writes back over a zero fill.
    struct SparseSink {
        pos: u64,
        len: u64,
        writes: Vec<(u64, Vec<u8>)>,
    }

    impl SparseSink {
        fn new() -> Self {
            Self {
                pos: 0,
                len: 0,
                writes: Vec::new(),
            }
        }

        /// Recorded bytes in write order.
        fn recorded(&self) -> Vec<u8> {
            self.writes
                .iter()
                .flat_map(|(_, data)| data.iter().copied())
                .collect()
        }

        /// Absolute position of the first `needle` landing inside
        /// a single write.
        fn find(&self, needle: &[u8]) -> Option<u64> {
            self.writes.iter().find_map(|(pos, data)| {
                data.windows(needle.len())
                    .position(|w| w == needle)
                    .map(|at| pos + at as u64)
            })
        }

        fn count(&self, needle: &[u8]) -> usize {
            self.writes
                .iter()
                .map(|(_, data)| data.windows(needle.len()).filter(|w| *w == needle).count())
                .sum()
        }
    }

    impl Write for SparseSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if buf.iter().any(|b| *b != 0) {
                self.writes.push((self.pos, buf.to_vec()));
            }
            self.pos += buf.len() as u64;
            self.len = self.len.max(self.pos);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl io::Read for SparseSink {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let avail = self.len.saturating_sub(self.pos);
            let n = (buf.len() as u64).min(avail) as usize;
            buf[..n].fill(0);
            // Later writes overlay earlier ones.
            for (pos, data) in &self.writes {
                let start = (*pos).max(self.pos);
                let end = (pos + data.len() as u64).min(self.pos + n as u64);
                if start < end {
                    buf[(start - self.pos) as usize..(end - self.pos) as usize]
                        .copy_from_slice(&data[(start - pos) as usize..(end - pos) as usize]);
                }
            }
            self.pos += n as u64;
            Ok(n)
        }
    }

    impl Seek for SparseSink {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            let target = match pos {
                SeekFrom::Start(n) => n as i64,
                SeekFrom::End(n) => self.len as i64 + n,
                SeekFrom::Current(n) => self.pos as i64 + n,
            };
            self.pos = u64::try_from(target)
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "seek before start"))?;
            Ok(self.pos)
        }
    }

    #[test]
    fn chunk_offsets_past_the_32_bit_range_use_the_wide_forms() {
        const BULK: u64 = 4_294_967_290;

        let mut writer = MovWriter::new(SparseSink::new());
        let narrow = writer.add_video_track(small_video(), 600).unwrap();
        let huge = writer.add_video_track(small_video(), 600).unwrap();

        writer.write_sample(narrow, &[1, 2, 3, 4], 10, true).unwrap();
        writer
            .write_sample_from(huge, io::repeat(0), BULK, 10, true)
            .unwrap();
        writer.write_sample(narrow, &[5, 6, 7, 8], 10, true).unwrap();
        writer.finish().unwrap();

        let movie = writer.movie();
        let chunks = movie.tracks()[0].chunks();
        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].offset() > u32::MAX as u64);
        assert_eq!(movie.tracks()[1].chunks().len(), 1);

        let sink = writer.close().unwrap();
        let bytes = sink.recorded();
        // The first track needs 64 bit chunk offsets, the bulk
        // track still fits the 32 bit table.
        assert!(contains(&bytes, b"co64"));
        assert!(contains(&bytes, b"stco"));

        // Two 4 byte samples and the bulk one, behind a 16 byte
        // extended header.
        let mut mdat = vec![0, 0, 0, 1];
        mdat.extend_from_slice(b"mdat");
        mdat.extend_from_slice(&(BULK + 8 + 16).to_be_bytes());
        assert!(contains(&bytes, &mdat));
    }

    /// Three tracks, five samples: both narrow tracks close with
    /// a 16 byte sample behind the bulk one.
    fn three_track_movie<W: Write + Seek>(sink: W, bulk: u64) -> MovWriter<W> {
        let mut writer = MovWriter::new(sink);
        let a = writer.add_video_track(small_video(), 600).unwrap();
        let b = writer.add_video_track(small_video(), 600).unwrap();
        let v = writer.add_video_track(small_video(), 600).unwrap();
        writer.write_sample(a, &[0xA2; 16], 10, true).unwrap();
        writer.write_sample(b, &[0xB2; 16], 10, true).unwrap();
        writer
            .write_sample_from(v, io::repeat(0), bulk, 10, true)
            .unwrap();
        writer.write_sample(a, &[0xAA; 16], 10, true).unwrap();
        writer.write_sample(b, &[0xBB; 16], 10, true).unwrap();
        writer.finish().unwrap();
        writer
    }

    #[test]
    fn web_optimized_offsets_hold_when_the_header_regrows() {
        // The same shape with a tiny bulk sample measures the
        // header length the placement passes start from.
        let header_len = {
            let bytes = three_track_movie(Cursor::new(Vec::new()), 16)
                .close()
                .unwrap()
                .into_inner();
            assert_eq!(&bytes[120..124], b"moov");
            u32::from_be_bytes(bytes[116..120].try_into().unwrap()) as u64
        };

        // Track b's closing chunk crosses the 32 bit range as
        // soon as the header moves in front of the media. Track
        // a's crosses only once the retry pad widens the bias,
        // and its wider table then fills the padded area to the
        // byte, leaving no room for a free atom.
        let bulk = u32::MAX as u64 - header_len - 68;
        let mut writer = three_track_movie(SparseSink::new(), bulk);
        let mut out = SparseSink::new();
        writer.write_web_optimized(&mut out, false).unwrap();

        assert_eq!(out.count(b"co64"), 2);
        assert_eq!(out.count(b"stco"), 1);
        assert_eq!(out.find(b"free"), None);

        // Every claimed chunk offset must resolve to the bytes
        // written there.
        let mut mov = Mov::from_reader(out).unwrap();
        let movie = mov.movie().unwrap();
        for (track, tail) in [(0, [0xAA; 16]), (1, [0xBB; 16])] {
            let locations = movie.tracks()[track].sample_locations();
            assert_eq!(locations.len(), 2);
            assert!(locations[1].offset > u32::MAX as u64);
            assert_eq!(mov.sample_data(&locations[1]).unwrap(), tail);
        }
    }
}
