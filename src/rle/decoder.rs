//! Animation frame decoder.

use crate::errors::MovError;

use super::{unpack_indices, Be16, Be24, Be32, PixelCodec, MODE_SUB_IMAGE};

/// Stateful frame decompressor for one video track.
///
/// Holds the current frame as its canvas, initially zeroed. Each
/// chunk is applied in place, so delta frames see the pixels their
/// skips carry over. Feeding chunks out of order produces garbage
/// but not unsafety; a key frame resynchronizes the canvas.
#[derive(Debug)]
pub struct AnimationDecoder {
    width: usize,
    height: usize,
    depth: u16,
    canvas: Canvas,
}

#[derive(Debug)]
enum Canvas {
    /// 8 bit: palette indices packed four per pixel.
    Packed(Vec<Be32>),
    Rgb555(Vec<Be16>),
    Rgb24(Vec<Be24>),
    Rgb32(Vec<Be32>),
}

impl AnimationDecoder {
    /// New decoder for `width` x `height` frames of the given
    /// depth (8, 16, 24 or 32).
    ///
    /// Panics if `depth` is 8 and `width` is not divisible by 4,
    /// matching the encoder precondition.
    pub fn new(width: u16, height: u16, depth: u16) -> Result<Self, MovError> {
        if width == 0 || height == 0 {
            return Err(MovError::Argument("frame dimensions must be non-zero"));
        }
        let (width, height) = (width as usize, height as usize);
        let canvas = match depth {
            8 => {
                assert!(
                    width % 4 == 0,
                    "8 bit frame width must be divisible by 4, got {width}"
                );
                Canvas::Packed(vec![Be32(0); width / 4 * height])
            }
            16 => Canvas::Rgb555(vec![Be16(0); width * height]),
            24 => Canvas::Rgb24(vec![Be24(0); width * height]),
            32 => Canvas::Rgb32(vec![Be32(0); width * height]),
            _ => return Err(MovError::Argument("frame depth must be 8, 16, 24 or 32")),
        };
        Ok(Self {
            width,
            height,
            depth,
            canvas,
        })
    }

    /// Applies an 8-bit chunk and returns the updated frame as
    /// palette indices, one byte per pixel.
    pub fn decode_indexed(&mut self, chunk: &[u8]) -> Result<Vec<u8>, MovError> {
        match &mut self.canvas {
            Canvas::Packed(canvas) => {
                decode_into(canvas, self.width / 4, self.height, chunk)?;
                Ok(unpack_indices(canvas))
            }
            _ => Err(MovError::Argument("frame depth does not match the decoder")),
        }
    }

    /// Applies a 16-bit chunk and returns the updated frame.
    pub fn decode_rgb555(&mut self, chunk: &[u8]) -> Result<Vec<u16>, MovError> {
        match &mut self.canvas {
            Canvas::Rgb555(canvas) => {
                decode_into(canvas, self.width, self.height, chunk)?;
                Ok(canvas.iter().map(|p| p.0).collect())
            }
            _ => Err(MovError::Argument("frame depth does not match the decoder")),
        }
    }

    /// Applies a 24- or 32-bit chunk and returns the updated
    /// frame, one `u32` per pixel.
    pub fn decode_rgb(&mut self, chunk: &[u8]) -> Result<Vec<u32>, MovError> {
        match &mut self.canvas {
            Canvas::Rgb24(canvas) => {
                decode_into(canvas, self.width, self.height, chunk)?;
                Ok(canvas.iter().map(|p| p.0).collect())
            }
            Canvas::Rgb32(canvas) => {
                decode_into(canvas, self.width, self.height, chunk)?;
                Ok(canvas.iter().map(|p| p.0).collect())
            }
            _ => Err(MovError::Argument("frame depth does not match the decoder")),
        }
    }

    pub fn depth(&self) -> u16 {
        self.depth
    }
}

/// Applies one chunk to the canvas. Chunks whose declared size is
/// 8 bytes or less leave the frame unchanged.
fn decode_into<P: PixelCodec>(
    canvas: &mut [P],
    width: usize,
    height: usize,
    chunk: &[u8],
) -> Result<(), MovError> {
    if chunk.len() < 4 {
        return Err(corrupt("chunk shorter than its size field", 0));
    }
    let size = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as usize;
    if size <= 8 {
        return Ok(());
    }
    if size > chunk.len() {
        return Err(corrupt("chunk size exceeds the sample", 0));
    }
    let chunk = &chunk[..size];

    let mode = u16::from_be_bytes([chunk[4], chunk[5]]);
    let (mut pos, start_line, line_count) = if mode & MODE_SUB_IMAGE != 0 {
        if chunk.len() < 14 {
            return Err(corrupt("truncated sub-image header", 6));
        }
        let start = u16::from_be_bytes([chunk[6], chunk[7]]) as usize;
        let count = u16::from_be_bytes([chunk[10], chunk[11]]) as usize;
        (14, start, count)
    } else {
        (6, 0, height)
    };
    if start_line + line_count > height {
        return Err(corrupt("sub-image bounds exceed the frame", 6));
    }

    for line in 0..line_count {
        let row = (start_line + line) * width;
        let mut x = skip(chunk, &mut pos, 0)?;

        loop {
            let op = next_byte(chunk, &mut pos)? as i8;
            match op {
                -1 => break,
                0 => x = skip(chunk, &mut pos, x)?,
                n if n > 0 => {
                    let count = n as usize;
                    if x + count > width {
                        return Err(corrupt("literal run past the end of the line", pos - 1));
                    }
                    if pos + count * P::SIZE > chunk.len() {
                        return Err(corrupt("truncated literal run", pos));
                    }
                    for i in 0..count {
                        canvas[row + x + i] = P::take(&chunk[pos + i * P::SIZE..]);
                    }
                    pos += count * P::SIZE;
                    x += count;
                }
                n => {
                    let count = -(n as isize) as usize;
                    if x + count > width {
                        return Err(corrupt("repeat run past the end of the line", pos - 1));
                    }
                    if pos + P::SIZE > chunk.len() {
                        return Err(corrupt("truncated repeat run", pos));
                    }
                    let pixel = P::take(&chunk[pos..]);
                    pos += P::SIZE;
                    for slot in canvas[row + x..row + x + count].iter_mut() {
                        *slot = pixel;
                    }
                    x += count;
                }
            }
        }
    }
    Ok(())
}

/// Reads one skip byte and returns the new line position.
fn skip(chunk: &[u8], pos: &mut usize, x: usize) -> Result<usize, MovError> {
    let byte = next_byte(chunk, pos)?;
    if byte == 0 {
        return Err(corrupt("zero skip byte", *pos - 1));
    }
    Ok(x + byte as usize - 1)
}

fn next_byte(chunk: &[u8], pos: &mut usize) -> Result<u8, MovError> {
    let byte = chunk
        .get(*pos)
        .copied()
        .ok_or(MovError::CorruptFrame {
            reason: "unexpected end of chunk",
            offset: *pos,
        })?;
    *pos += 1;
    Ok(byte)
}

fn corrupt(reason: &'static str, offset: usize) -> MovError {
    MovError::CorruptFrame { reason, offset }
}
