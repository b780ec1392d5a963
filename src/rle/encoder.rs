//! Animation frame encoder.

use crate::errors::MovError;

use super::{pack_indices, Be16, Be24, Be32, PixelCodec, MODE_SUB_IMAGE, OP_END_OF_LINE};

/// Longest run a single op byte can express.
const MAX_RUN: usize = 127;

/// Most pixels a single skip byte can express.
const MAX_SKIP: usize = 254;

/// One encoded frame.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    /// Complete chunk, ready to be written as one sample.
    pub data: Vec<u8>,
    /// Whether the frame was encoded as a key frame, i.e. without
    /// reference to the previous frame.
    pub is_key: bool,
}

/// Stateful frame compressor for one video track.
///
/// The first frame is always a key frame. Later frames are deltas
/// against the retained previous frame unless the configured key
/// frame interval forces another key. A frame identical to its
/// predecessor encodes as a 4-byte no-op chunk.
#[derive(Debug)]
pub struct AnimationEncoder {
    width: usize,
    height: usize,
    depth: u16,
    /// Force a key frame after this many frames. 0 disables the
    /// cadence, leaving only the initial key frame.
    key_interval: u32,
    /// Frames since the last key frame, counting that key frame.
    since_key: u32,
    prev: Option<PrevFrame>,
}

#[derive(Debug)]
enum PrevFrame {
    /// 8 bit: palette indices packed four per pixel.
    Packed(Vec<Be32>),
    Rgb555(Vec<Be16>),
    Rgb24(Vec<Be24>),
    Rgb32(Vec<Be32>),
}

impl AnimationEncoder {
    /// New encoder for `width` x `height` frames of the given
    /// depth (8, 16, 24 or 32).
    ///
    /// Panics if `depth` is 8 and `width` is not divisible by 4,
    /// since 8-bit frames pack four indices per coded pixel.
    pub fn new(width: u16, height: u16, depth: u16, key_interval: u32) -> Result<Self, MovError> {
        if width == 0 || height == 0 {
            return Err(MovError::Argument("frame dimensions must be non-zero"));
        }
        if !matches!(depth, 8 | 16 | 24 | 32) {
            return Err(MovError::Argument("frame depth must be 8, 16, 24 or 32"));
        }
        if depth == 8 {
            assert!(
                width % 4 == 0,
                "8 bit frame width must be divisible by 4, got {width}"
            );
        }
        Ok(Self {
            width: width as usize,
            height: height as usize,
            depth,
            key_interval,
            since_key: 0,
            prev: None,
        })
    }

    /// Encodes an 8-bit frame of palette indices, row major,
    /// one byte per pixel.
    pub fn encode_indexed(&mut self, indices: &[u8]) -> Result<EncodedFrame, MovError> {
        if self.depth != 8 {
            return Err(MovError::Argument("frame depth does not match the encoder"));
        }
        self.check_len(indices.len())?;
        let cur = pack_indices(indices);

        let force_key = self.force_key();
        let prev = match (&self.prev, force_key) {
            (Some(PrevFrame::Packed(prev)), false) => Some(prev.as_slice()),
            _ => None,
        };
        let is_key = prev.is_none();
        let data = encode_frame(&cur, prev, self.width / 4, self.height);
        self.prev = Some(PrevFrame::Packed(cur));
        self.bump(is_key);
        Ok(EncodedFrame { data, is_key })
    }

    /// Encodes a 16-bit frame, row major, one `u16` per pixel.
    pub fn encode_rgb555(&mut self, pixels: &[u16]) -> Result<EncodedFrame, MovError> {
        if self.depth != 16 {
            return Err(MovError::Argument("frame depth does not match the encoder"));
        }
        self.check_len(pixels.len())?;
        let cur: Vec<Be16> = pixels.iter().map(|p| Be16(*p)).collect();

        let force_key = self.force_key();
        let prev = match (&self.prev, force_key) {
            (Some(PrevFrame::Rgb555(prev)), false) => Some(prev.as_slice()),
            _ => None,
        };
        let is_key = prev.is_none();
        let data = encode_frame(&cur, prev, self.width, self.height);
        self.prev = Some(PrevFrame::Rgb555(cur));
        self.bump(is_key);
        Ok(EncodedFrame { data, is_key })
    }

    /// Encodes a 24- or 32-bit frame, row major, one `u32` per
    /// pixel. At depth 24 the high byte of each pixel is ignored.
    pub fn encode_rgb(&mut self, pixels: &[u32]) -> Result<EncodedFrame, MovError> {
        if self.depth != 24 && self.depth != 32 {
            return Err(MovError::Argument("frame depth does not match the encoder"));
        }
        self.check_len(pixels.len())?;

        let force_key = self.force_key();
        let (data, is_key) = if self.depth == 24 {
            let cur: Vec<Be24> = pixels.iter().map(|p| Be24(p & 0x00FF_FFFF)).collect();
            let prev = match (&self.prev, force_key) {
                (Some(PrevFrame::Rgb24(prev)), false) => Some(prev.as_slice()),
                _ => None,
            };
            let is_key = prev.is_none();
            let data = encode_frame(&cur, prev, self.width, self.height);
            self.prev = Some(PrevFrame::Rgb24(cur));
            (data, is_key)
        } else {
            let cur: Vec<Be32> = pixels.iter().map(|p| Be32(*p)).collect();
            let prev = match (&self.prev, force_key) {
                (Some(PrevFrame::Rgb32(prev)), false) => Some(prev.as_slice()),
                _ => None,
            };
            let is_key = prev.is_none();
            let data = encode_frame(&cur, prev, self.width, self.height);
            self.prev = Some(PrevFrame::Rgb32(cur));
            (data, is_key)
        };
        self.bump(is_key);
        Ok(EncodedFrame { data, is_key })
    }

    fn force_key(&self) -> bool {
        self.key_interval > 0 && self.since_key >= self.key_interval
    }

    fn bump(&mut self, is_key: bool) {
        self.since_key = if is_key { 1 } else { self.since_key + 1 };
    }

    fn check_len(&self, got: usize) -> Result<(), MovError> {
        if got != self.width * self.height {
            return Err(MovError::Argument(
                "pixel buffer does not match frame dimensions",
            ));
        }
        Ok(())
    }
}

/// Encodes one frame. `prev == None` produces a key frame; with a
/// previous frame the output reduces to the dirty scanline range,
/// or to a no-op chunk if nothing changed.
fn encode_frame<P: PixelCodec>(
    cur: &[P],
    prev: Option<&[P]>,
    width: usize,
    height: usize,
) -> Vec<u8> {
    let mut out = vec![0u8; 4];
    match prev {
        None => {
            out.extend_from_slice(&0u16.to_be_bytes());
            for y in 0..height {
                encode_line(&mut out, &cur[y * width..(y + 1) * width], None);
            }
        }
        Some(prev) => {
            let dirty =
                |y: usize| cur[y * width..(y + 1) * width] != prev[y * width..(y + 1) * width];

            let first = match (0..height).find(|&y| dirty(y)) {
                Some(first) => first,
                // Nothing changed: a bare chunk size counting
                // only itself.
                None => return 4u32.to_be_bytes().to_vec(),
            };
            let last = (first..height).rev().find(|&y| dirty(y)).unwrap_or(first);

            if first == 0 && last == height - 1 {
                out.extend_from_slice(&0u16.to_be_bytes());
            } else {
                out.extend_from_slice(&MODE_SUB_IMAGE.to_be_bytes());
                out.extend_from_slice(&(first as u16).to_be_bytes());
                out.extend_from_slice(&0u16.to_be_bytes());
                out.extend_from_slice(&((last - first + 1) as u16).to_be_bytes());
                out.extend_from_slice(&0u16.to_be_bytes());
            }
            for y in first..=last {
                encode_line(
                    &mut out,
                    &cur[y * width..(y + 1) * width],
                    Some(&prev[y * width..(y + 1) * width]),
                );
            }
        }
    }

    let size = out.len() as u32;
    out[0..4].copy_from_slice(&size.to_be_bytes());
    out
}

/// Encodes one scanline: leading skip, ops over the changed span,
/// end of line. Key lines (`prev == None`) span the whole width
/// with a skip byte of exactly 1.
fn encode_line<P: PixelCodec>(out: &mut Vec<u8>, cur: &[P], prev: Option<&[P]>) {
    let span = match prev {
        None => 0..cur.len(),
        Some(prev) => match cur.iter().zip(prev).position(|(c, p)| c != p) {
            None => {
                // Unchanged line inside the dirty range.
                out.push(1);
                out.push(OP_END_OF_LINE);
                return;
            }
            Some(first) => {
                let last = cur
                    .iter()
                    .zip(prev)
                    .rposition(|(c, p)| c != p)
                    .unwrap_or(first);
                first..last + 1
            }
        },
    };

    let mut lead = span.start;
    let step = lead.min(MAX_SKIP);
    out.push((step + 1) as u8);
    lead -= step;
    while lead > 0 {
        let step = lead.min(MAX_SKIP);
        out.push(0x00);
        out.push((step + 1) as u8);
        lead -= step;
    }

    encode_span(out, &cur[span]);
    out.push(OP_END_OF_LINE);
}

/// Emits literal and repeat ops covering `span` completely.
/// Repeat runs require at least two equal pixels; a run of
/// exactly two joins an already open literal instead.
fn encode_span<P: PixelCodec>(out: &mut Vec<u8>, span: &[P]) {
    let mut literal: Vec<P> = Vec::new();
    let mut i = 0;
    while i < span.len() {
        let run = span[i..]
            .iter()
            .take_while(|p| **p == span[i])
            .count()
            .min(MAX_RUN);
        if run >= 3 || (run == 2 && literal.is_empty()) {
            flush_literal(out, &mut literal);
            out.push((-(run as i8)) as u8);
            span[i].put(out);
            i += run;
        } else {
            literal.push(span[i]);
            if literal.len() == MAX_RUN {
                flush_literal(out, &mut literal);
            }
            i += 1;
        }
    }
    flush_literal(out, &mut literal);
}

fn flush_literal<P: PixelCodec>(out: &mut Vec<u8>, literal: &mut Vec<P>) {
    if literal.is_empty() {
        return;
    }
    out.push(literal.len() as u8);
    for pixel in literal.drain(..) {
        pixel.put(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_is_key() {
        let mut enc = AnimationEncoder::new(8, 2, 32, 0).unwrap();
        let frame = vec![7_u32; 16];
        let encoded = enc.encode_rgb(&frame).unwrap();
        assert!(encoded.is_key);
        // mode 0x0000, every line starts with skip byte 1
        assert_eq!(&encoded.data[4..6], &[0, 0]);
        assert_eq!(encoded.data[6], 1);
    }

    #[test]
    fn unchanged_frame_is_a_noop_chunk() {
        let mut enc = AnimationEncoder::new(8, 2, 32, 0).unwrap();
        let frame = vec![7_u32; 16];
        enc.encode_rgb(&frame).unwrap();

        let encoded = enc.encode_rgb(&frame).unwrap();
        assert!(!encoded.is_key);
        assert_eq!(encoded.data, [0, 0, 0, 4]);
    }

    #[test]
    fn key_interval_forces_periodic_keys() {
        let mut enc = AnimationEncoder::new(4, 4, 32, 3).unwrap();
        let frame = vec![0_u32; 16];
        let keys: Vec<bool> = (0..7)
            .map(|_| enc.encode_rgb(&frame).unwrap().is_key)
            .collect();
        assert_eq!(keys, [true, false, false, true, false, false, true]);
    }

    #[test]
    fn delta_reduces_to_dirty_lines() {
        let (w, h) = (8_usize, 6_usize);
        let mut enc = AnimationEncoder::new(w as u16, h as u16, 32, 0).unwrap();
        let first = vec![1_u32; w * h];
        enc.encode_rgb(&first).unwrap();

        let mut second = first.clone();
        second[2 * w + 3] = 9; // line 2
        second[3 * w] = 9; // line 3
        let encoded = enc.encode_rgb(&second).unwrap();

        let mode = u16::from_be_bytes(encoded.data[4..6].try_into().unwrap());
        assert_eq!(mode, MODE_SUB_IMAGE);
        let start = u16::from_be_bytes(encoded.data[6..8].try_into().unwrap());
        let lines = u16::from_be_bytes(encoded.data[10..12].try_into().unwrap());
        assert_eq!(start, 2);
        assert_eq!(lines, 2);
    }

    #[test]
    fn skip_bytes_cap_at_255() {
        let w = 600_usize;
        let mut enc = AnimationEncoder::new(w as u16, 1, 16, 0).unwrap();
        let first = vec![0_u16; w];
        enc.encode_rgb555(&first).unwrap();

        let mut second = first.clone();
        second[580] = 1;
        let encoded = enc.encode_rgb555(&second).unwrap();

        // mode 0x0000 (single line frame), then the line:
        // skip 255 (254 px), 0x00 skip 255 (254 px, 508 total),
        // 0x00 skip 73 (72 px, 580 total).
        assert_eq!(&encoded.data[6..11], &[255, 0x00, 255, 0x00, 73]);
    }

    #[test]
    fn mismatched_buffer_is_rejected_without_state_change() {
        let mut enc = AnimationEncoder::new(8, 2, 32, 0).unwrap();
        assert!(enc.encode_rgb(&[0_u32; 5]).is_err());
        // The failed call did not consume the key frame.
        let encoded = enc.encode_rgb(&[0_u32; 16]).unwrap();
        assert!(encoded.is_key);
    }

    #[test]
    fn depth_mismatch_is_rejected() {
        let mut enc = AnimationEncoder::new(8, 2, 16, 0).unwrap();
        assert!(enc.encode_rgb(&[0_u32; 16]).is_err());
        assert!(enc.encode_indexed(&[0_u8; 16]).is_err());
    }

    #[test]
    #[should_panic(expected = "divisible by 4")]
    fn eight_bit_width_must_be_divisible_by_four() {
        let _ = AnimationEncoder::new(30, 4, 8, 0);
    }
}
