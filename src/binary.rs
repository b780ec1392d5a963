//! Big endian primitives shared by the atom builder and the
//! sample description emitters: fixed-point numbers, Mac epoch
//! timestamps, Pascal strings, and 4-byte type tags.
//!
//! Fixed-point sign convention: the magnitude is encoded first,
//! then the combined bit pattern is negated. QuickTime files in
//! the wild follow this convention and decoders undo it the same
//! way, so it must be preserved bit-for-bit.

use std::io::{self, Write};

use time::{Duration, PrimitiveDateTime};

use crate::consts::mov_time_zero;

/// Encodes a 16.16 fixed-point value.
pub(crate) fn fixed16_16(value: f64) -> u32 {
    let v = value.abs();
    let whole = v.trunc() as u32;
    let frac = ((v - v.trunc()) * 65536.0).round() as u32;
    let bits = (whole << 16).wrapping_add(frac);
    if value < 0.0 { bits.wrapping_neg() } else { bits }
}

/// Decodes a 16.16 fixed-point value.
pub(crate) fn unfixed16_16(bits: u32) -> f64 {
    let negative = (bits as i32) < 0;
    let m = if negative { bits.wrapping_neg() } else { bits };
    let v = (m >> 16) as f64 + (m & 0xFFFF) as f64 / 65536.0;
    if negative { -v } else { v }
}

/// Encodes a 2.30 fixed-point value.
pub(crate) fn fixed2_30(value: f64) -> u32 {
    let v = value.abs();
    let whole = v.trunc() as u32;
    let frac = ((v - v.trunc()) * (1u32 << 30) as f64).round() as u32;
    let bits = (whole << 30).wrapping_add(frac);
    if value < 0.0 { bits.wrapping_neg() } else { bits }
}

/// Decodes a 2.30 fixed-point value.
pub(crate) fn unfixed2_30(bits: u32) -> f64 {
    let negative = (bits as i32) < 0;
    let m = if negative { bits.wrapping_neg() } else { bits };
    let v = (m >> 30) as f64 + (m & 0x3FFF_FFFF) as f64 / (1u32 << 30) as f64;
    if negative { -v } else { v }
}

/// Encodes an 8.8 fixed-point value.
pub(crate) fn fixed8_8(value: f64) -> u16 {
    let v = value.abs();
    let whole = v.trunc() as u16;
    let frac = ((v - v.trunc()) * 256.0).round() as u16;
    let bits = (whole << 8).wrapping_add(frac);
    if value < 0.0 { bits.wrapping_neg() } else { bits }
}

/// Decodes an 8.8 fixed-point value.
pub(crate) fn unfixed8_8(bits: u16) -> f64 {
    let negative = (bits as i16) < 0;
    let m = if negative { bits.wrapping_neg() } else { bits };
    let v = (m >> 8) as f64 + (m & 0xFF) as f64 / 256.0;
    if negative { -v } else { v }
}

/// Decodes a 36-byte transform into row-major values.
/// Columns u, v, w are 2.30, everything else 16.16.
pub(crate) fn matrix_from_bytes(bytes: &[u8; 36]) -> [f64; 9] {
    let mut matrix = [0.0; 9];
    for row in 0..3 {
        let base = row * 12;
        let cell = |at: usize| u32::from_be_bytes([
            bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3],
        ]);
        matrix[row * 3] = unfixed16_16(cell(base));
        matrix[row * 3 + 1] = unfixed16_16(cell(base + 4));
        matrix[row * 3 + 2] = unfixed2_30(cell(base + 8));
    }
    matrix
}

/// Seconds since midnight January 1, 1904.
/// Dates before the epoch clamp to 0.
pub(crate) fn mac_date(datetime: PrimitiveDateTime) -> u32 {
    let seconds = (datetime - mov_time_zero()).whole_seconds();
    seconds.clamp(0, u32::MAX as i64) as u32
}

/// Datetime from seconds since midnight January 1, 1904.
pub(crate) fn date_from_mac(seconds: u32) -> PrimitiveDateTime {
    mov_time_zero() + Duration::seconds(seconds as i64)
}

/// Big endian writes of the field types QuickTime headers use.
/// Blanket-implemented for any `Write`, including the payload
/// buffers of the atom builder.
pub(crate) trait PutBe: Write {
    fn put_u8(&mut self, value: u8) -> io::Result<()> {
        self.write_all(&[value])
    }

    fn put_u16(&mut self, value: u16) -> io::Result<()> {
        self.write_all(&value.to_be_bytes())
    }

    fn put_i16(&mut self, value: i16) -> io::Result<()> {
        self.write_all(&value.to_be_bytes())
    }

    fn put_u32(&mut self, value: u32) -> io::Result<()> {
        self.write_all(&value.to_be_bytes())
    }

    fn put_i32(&mut self, value: i32) -> io::Result<()> {
        self.write_all(&value.to_be_bytes())
    }

    fn put_u64(&mut self, value: u64) -> io::Result<()> {
        self.write_all(&value.to_be_bytes())
    }

    fn put_fixed16_16(&mut self, value: f64) -> io::Result<()> {
        self.put_u32(fixed16_16(value))
    }

    fn put_fixed2_30(&mut self, value: f64) -> io::Result<()> {
        self.put_u32(fixed2_30(value))
    }

    fn put_fixed8_8(&mut self, value: f64) -> io::Result<()> {
        self.put_u16(fixed8_8(value))
    }

    fn put_mac_date(&mut self, datetime: PrimitiveDateTime) -> io::Result<()> {
        self.put_u32(mac_date(datetime))
    }

    /// Writes a 3x3 transform. Columns u, v, w are 2.30,
    /// everything else 16.16.
    fn put_matrix(&mut self, matrix: &[f64; 9]) -> io::Result<()> {
        for row in matrix.chunks(3) {
            self.put_fixed16_16(row[0])?;
            self.put_fixed16_16(row[1])?;
            self.put_fixed2_30(row[2])?;
        }
        Ok(())
    }

    /// Atom and sample description type tags are exactly 4
    /// ASCII bytes. Anything else is a caller bug.
    fn put_tag(&mut self, tag: &str) -> io::Result<()> {
        assert!(tag.len() == 4, "type tag must be exactly 4 bytes: '{tag}'");
        self.write_all(tag.as_bytes())
    }

    /// Pascal string: single count byte for `0 < len < 256`,
    /// otherwise a 0x00 escape byte followed by a 16-bit count.
    fn put_pstring(&mut self, s: &str) -> io::Result<()> {
        let bytes = s.as_bytes();
        assert!(bytes.len() <= u16::MAX as usize, "pascal string exceeds 65535 bytes");
        if !bytes.is_empty() && bytes.len() < 256 {
            self.put_u8(bytes.len() as u8)?;
        } else {
            self.put_u8(0)?;
            self.put_u16(bytes.len() as u16)?;
        }
        self.write_all(bytes)
    }

    /// Pascal string zero-padded to `width` bytes total,
    /// count byte included.
    fn put_pstring_fixed(&mut self, s: &str, width: usize) -> io::Result<()> {
        let bytes = s.as_bytes();
        assert!(
            bytes.len() < width.min(256),
            "pascal string '{s}' does not fit fixed width {width}"
        );
        self.put_u8(bytes.len() as u8)?;
        self.write_all(bytes)?;
        self.put_zeros(width - 1 - bytes.len())
    }

    fn put_zeros(&mut self, count: usize) -> io::Result<()> {
        for _ in 0..count {
            self.put_u8(0)?;
        }
        Ok(())
    }
}

impl<W: Write + ?Sized> PutBe for W {}
