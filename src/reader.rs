//! Positioned atom reader over any seekable byte source.
//!
//! `MovReader` is the layer the demuxer walks a file with. It
//! knows nothing about atom semantics beyond the header forms:
//! it reads one header at a time, buffers leaf payloads on
//! request, and seeks past whatever the caller does not want.

use std::io::{Cursor, Read, Seek, SeekFrom};

use crate::atom::AtomHeader;
use crate::errors::MovError;
use crate::fourcc::FourCC;

/// Atom-level reader over any `Read + Seek` source.
#[derive(Debug)]
pub struct MovReader<R: Read + Seek> {
    inner: R,
    /// Total source length in bytes.
    len: u64,
}

impl<R: Read + Seek> MovReader<R> {
    /// Wraps a byte source, deriving its length with a seek to
    /// the end. The reader starts out positioned at offset 0.
    pub fn new(mut inner: R) -> Result<Self, MovError> {
        let len = inner.seek(SeekFrom::End(0))?;
        inner.rewind()?;
        Ok(Self { inner, len })
    }

    /// Total source length in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current position.
    pub fn pos(&mut self) -> Result<u64, MovError> {
        Ok(self.inner.stream_position()?)
    }

    /// Seeks relative to the current position.
    pub fn seek(&mut self, offset_from_current: i64) -> Result<u64, MovError> {
        Ok(self.inner.seek(SeekFrom::Current(offset_from_current))?)
    }

    /// Seeks to an absolute position, verifying the source
    /// landed where it was told to.
    pub fn seek_to(&mut self, offset_from_start: u64) -> Result<u64, MovError> {
        let pos = self.inner.seek(SeekFrom::Start(offset_from_start))?;
        if pos != offset_from_start {
            return Err(MovError::OffsetMismatch {
                got: pos,
                expected: offset_from_start,
            });
        }
        Ok(pos)
    }

    /// Rewinds to offset 0.
    pub fn reset(&mut self) -> Result<(), MovError> {
        self.inner.rewind()?;
        Ok(())
    }

    /// Reads `len` bytes at the current position into a cursor.
    pub fn read(&mut self, len: u64) -> Result<Cursor<Vec<u8>>, MovError> {
        let mut data = Vec::with_capacity(len as usize);
        let got = (&mut self.inner).take(len).read_to_end(&mut data)?;
        if got as u64 != len {
            return Err(MovError::ReadMismatch {
                got: got as u64,
                expected: len,
            });
        }
        Ok(Cursor::new(data))
    }

    fn read_u32(&mut self) -> Result<u32, MovError> {
        let mut raw = [0_u8; 4];
        self.inner.read_exact(&mut raw)?;
        Ok(u32::from_be_bytes(raw))
    }

    fn read_u64(&mut self) -> Result<u64, MovError> {
        let mut raw = [0_u8; 8];
        self.inner.read_exact(&mut raw)?;
        Ok(u64::from_be_bytes(raw))
    }

    /// Reads one atom header at the current position, leaving
    /// the reader at the start of the atom's payload.
    ///
    /// `parent_end` bounds the enclosing atom (the source length
    /// at top level). A declared size of 0 means the atom runs
    /// to that bound, and 1 pulls the real size from a 64 bit
    /// field following the name.
    pub fn header(&mut self, parent_end: u64) -> Result<AtomHeader, MovError> {
        let offset = self.pos()?;
        let size32 = self.read_u32()?;
        let mut raw_name = [0_u8; 4];
        self.inner.read_exact(&mut raw_name)?;
        let name = FourCC::from_slice(&raw_name);

        let (atom_size, header_size) = match size32 {
            0 => {
                let remaining = parent_end.saturating_sub(offset);
                // The open-ended form carries one extra reserved
                // field when there is room for it.
                if remaining >= 12 {
                    self.seek(4)?;
                    (remaining, 12_u8)
                } else {
                    (remaining, 8)
                }
            }
            1 => (self.read_u64()?, 16),
            _ => (size32 as u64, 8),
        };

        if atom_size < header_size as u64 {
            return Err(MovError::UnexpectedAtomSize {
                len: atom_size,
                offset,
            });
        }
        let end = offset + atom_size;
        if end > parent_end {
            return Err(MovError::BoundsError((end, parent_end)));
        }

        Ok(AtomHeader {
            atom_size,
            name,
            offset,
            header_size,
        })
    }

    /// Skips to the first byte after `header`'s atom.
    pub fn skip(&mut self, header: &AtomHeader) -> Result<u64, MovError> {
        self.seek_to(header.end())
    }

    /// Buffers the payload of `header`'s atom, seeking to its
    /// data offset first.
    pub fn data(&mut self, header: &AtomHeader) -> Result<Cursor<Vec<u8>>, MovError> {
        self.seek_to(header.data_offset())?;
        self.read(header.data_size())
    }
}
