//! Animation (`rle `) codec.
//!
//! Lossless QuickTime Animation compression over 8/16/24/32-bit
//! frames. Each encoded frame is a self-sized chunk of scanline
//! records built from three op kinds: skip (pixels carried over
//! from the previous frame), literal runs, and repeat runs. Key
//! frames cover every pixel; delta frames reduce to the dirty
//! scanline range and skip unchanged leading pixels per line.
//!
//! The 8-bit variant operates on palette indices packed four to a
//! 32-bit pixel, which is why 8-bit frame widths must be divisible
//! by four.
//!
//! Bitstream reference: <https://wiki.multimedia.cx/index.php/Apple_QuickTime_RLE>

mod decoder;
mod encoder;

pub use decoder::AnimationDecoder;
pub use encoder::{AnimationEncoder, EncodedFrame};

/// Mode bit: the chunk carries sub-image bounds and covers only
/// part of the frame.
pub(crate) const MODE_SUB_IMAGE: u16 = 0x0008;

/// End of scanline op.
pub(crate) const OP_END_OF_LINE: u8 = 0xFF;

/// Serialized pixel access for one depth.
pub(crate) trait PixelCodec: Copy + PartialEq {
    /// Serialized size in bytes.
    const SIZE: usize;

    fn put(self, out: &mut Vec<u8>);

    /// Reads one pixel from the head of `raw`.
    /// `raw` holds at least `SIZE` bytes.
    fn take(raw: &[u8]) -> Self;
}

/// 16-bit pixel, stored big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Be16(pub(crate) u16);

impl PixelCodec for Be16 {
    const SIZE: usize = 2;

    fn put(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.0.to_be_bytes());
    }

    fn take(raw: &[u8]) -> Self {
        Self(u16::from_be_bytes([raw[0], raw[1]]))
    }
}

/// 24-bit pixel in the low bytes of a `u32`, stored as three
/// big-endian bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Be24(pub(crate) u32);

impl PixelCodec for Be24 {
    const SIZE: usize = 3;

    fn put(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.0.to_be_bytes()[1..4]);
    }

    fn take(raw: &[u8]) -> Self {
        Self(u32::from_be_bytes([0, raw[0], raw[1], raw[2]]))
    }
}

/// 32-bit pixel, stored big-endian. Also carries four packed
/// palette indices on the 8-bit path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Be32(pub(crate) u32);

impl PixelCodec for Be32 {
    const SIZE: usize = 4;

    fn put(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.0.to_be_bytes());
    }

    fn take(raw: &[u8]) -> Self {
        Self(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }
}

/// Packs palette indices four per 32-bit pixel, first index in
/// the high byte. Index count must be divisible by four.
pub(crate) fn pack_indices(indices: &[u8]) -> Vec<Be32> {
    indices
        .chunks_exact(4)
        .map(|q| Be32(u32::from_be_bytes([q[0], q[1], q[2], q[3]])))
        .collect()
}

/// Inverse of [`pack_indices`].
pub(crate) fn unpack_indices(packed: &[Be32]) -> Vec<u8> {
    let mut indices = Vec::with_capacity(packed.len() * 4);
    for pixel in packed {
        indices.extend_from_slice(&pixel.0.to_be_bytes());
    }
    indices
}
