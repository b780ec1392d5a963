//! Write-side atom tree.
//!
//! QuickTime atoms are length-prefixed, but payload sizes are not
//! known until the payload is written. `DataAtom` and
//! `CompositeAtom` therefore accumulate payloads in owned buffers
//! and serialize depth-first in a single pass, computing each
//! 32-bit header from buffered lengths. Only `mdat` is too large
//! to buffer: `WideDataAtom` streams it to the seekable sink and
//! patches a reserved 16-byte header on finish.

use std::io::{self, Seek, SeekFrom, Write};

use crate::binary::PutBe;
use crate::errors::MovError;

/// Leaf atom holding its payload in memory.
///
/// Implements `Write`, so payloads are composed with the same
/// `PutBe` helpers the rest of the writer uses.
#[derive(Debug)]
pub struct DataAtom {
    tag: [u8; 4],
    payload: Vec<u8>,
    finished: bool,
}

impl DataAtom {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag_bytes(tag),
            payload: Vec::new(),
            finished: false,
        }
    }

    /// Total serialized size: 8 byte header plus payload.
    pub fn len(&self) -> u64 {
        8 + self.payload.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Freezes the payload. Idempotent.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    pub(crate) fn write_to<W: Write>(&self, sink: &mut W) -> Result<(), MovError> {
        let size = self.len();
        if size > u32::MAX as u64 {
            return Err(MovError::AtomTooLarge {
                name: String::from_utf8_lossy(&self.tag).to_string(),
                size,
            });
        }
        sink.put_u32(size as u32)?;
        sink.write_all(&self.tag)?;
        sink.write_all(&self.payload)?;
        Ok(())
    }
}

impl Write for DataAtom {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        assert!(!self.finished, "write to finished atom");
        self.payload.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Ordered list of child atoms.
#[derive(Debug)]
pub struct CompositeAtom {
    tag: [u8; 4],
    children: Vec<AtomNode>,
    finished: bool,
}

impl CompositeAtom {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag_bytes(tag),
            children: Vec::new(),
            finished: false,
        }
    }

    /// Appends a child. The previously added child is finished
    /// first, so at most one node accepts writes at a time.
    pub fn add(&mut self, child: impl Into<AtomNode>) {
        assert!(!self.finished, "add to finished atom");
        if let Some(last) = self.children.last_mut() {
            last.finish();
        }
        self.children.push(child.into());
    }

    /// Total serialized size: 8 byte header plus children.
    pub fn len(&self) -> u64 {
        8 + self.children.iter().map(|c| c.len()).sum::<u64>()
    }

    /// Finishes all children in order, then self. Idempotent.
    pub fn finish(&mut self) {
        for child in self.children.iter_mut() {
            child.finish();
        }
        self.finished = true;
    }

    pub(crate) fn write_to<W: Write>(&self, sink: &mut W) -> Result<(), MovError> {
        assert!(self.finished, "serialize of unfinished atom");
        let size = self.len();
        if size > u32::MAX as u64 {
            return Err(MovError::AtomTooLarge {
                name: String::from_utf8_lossy(&self.tag).to_string(),
                size,
            });
        }
        sink.put_u32(size as u32)?;
        sink.write_all(&self.tag)?;
        for child in self.children.iter() {
            child.write_to(sink)?;
        }
        Ok(())
    }

    /// Serializes the finished tree into a byte vector.
    pub fn to_vec(&self) -> Result<Vec<u8>, MovError> {
        let mut buf = Vec::with_capacity(self.len() as usize);
        self.write_to(&mut buf)?;
        Ok(buf)
    }
}

#[derive(Debug)]
pub enum AtomNode {
    Data(DataAtom),
    Composite(CompositeAtom),
}

impl AtomNode {
    fn len(&self) -> u64 {
        match self {
            Self::Data(atom) => atom.len(),
            Self::Composite(atom) => atom.len(),
        }
    }

    fn finish(&mut self) {
        match self {
            Self::Data(atom) => atom.finish(),
            Self::Composite(atom) => atom.finish(),
        }
    }

    fn write_to<W: Write>(&self, sink: &mut W) -> Result<(), MovError> {
        match self {
            Self::Data(atom) => atom.write_to(sink),
            Self::Composite(atom) => atom.write_to(sink),
        }
    }
}

impl From<DataAtom> for AtomNode {
    fn from(atom: DataAtom) -> Self {
        Self::Data(atom)
    }
}

impl From<CompositeAtom> for AtomNode {
    fn from(atom: CompositeAtom) -> Self {
        Self::Composite(atom)
    }
}

/// Header reservation for atoms whose payload may pass 4 GiB.
///
/// Reserves 16 bytes on the sink up front. The payload is then
/// streamed directly to the sink by the caller; `finish` seeks
/// back and writes either an 8-byte `wide` filler followed by a
/// normal 32-bit header, or a single extended header with the
/// `size == 1` sentinel and a 64-bit size, then restores the
/// sink position. Both forms occupy exactly the 16 reserved
/// bytes, so the payload never moves.
#[derive(Debug)]
pub struct WideDataAtom {
    tag: [u8; 4],
    offset: u64,
    finished: bool,
}

impl WideDataAtom {
    /// Writes the 16 byte placeholder at the current sink
    /// position.
    pub fn begin<W: Write + Seek>(sink: &mut W, tag: &str) -> Result<Self, MovError> {
        let offset = sink.stream_position()?;
        sink.put_zeros(16)?;
        Ok(Self {
            tag: tag_bytes(tag),
            offset,
            finished: false,
        })
    }

    /// Absolute offset of the reservation start.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Absolute offset where payload bytes begin.
    pub fn data_offset(&self) -> u64 {
        self.offset + 16
    }

    /// Patches the reserved header according to the payload size
    /// accumulated on the sink. Idempotent.
    pub fn finish<W: Write + Seek>(&mut self, sink: &mut W) -> Result<(), MovError> {
        if self.finished {
            return Ok(());
        }
        let end = sink.stream_position()?;
        assert!(end >= self.data_offset(), "sink moved before the atom start");
        let data_size = end - self.data_offset();

        sink.seek(SeekFrom::Start(self.offset))?;
        if data_size + 8 <= u32::MAX as u64 {
            sink.put_u32(8)?;
            sink.put_tag("wide")?;
            sink.put_u32((data_size + 8) as u32)?;
            sink.write_all(&self.tag)?;
        } else {
            sink.put_u32(1)?;
            sink.write_all(&self.tag)?;
            sink.put_u64(data_size + 16)?;
        }
        sink.seek(SeekFrom::Start(end))?;
        self.finished = true;
        Ok(())
    }
}

fn tag_bytes(tag: &str) -> [u8; 4] {
    assert!(tag.len() == 4, "type tag must be exactly 4 bytes: '{tag}'");
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(tag.as_bytes());
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_size_patch() {
        let payload = vec![0u8; 100];
        let mut mvhd = DataAtom::new("mvhd");
        mvhd.write_all(&payload).unwrap();

        let mut moov = CompositeAtom::new("moov");
        moov.add(mvhd);
        moov.finish();

        let bytes = moov.to_vec().unwrap();
        assert_eq!(bytes.len() as u64, 8 + (8 + 100));

        let size = u32::from_be_bytes(bytes[0..4].try_into().unwrap());
        assert_eq!(size as usize, bytes.len());
        assert_eq!(&bytes[4..8], b"moov");
        assert_eq!(&bytes[12..16], b"mvhd");
    }

    #[test]
    fn nested_composites() {
        let mut stts = DataAtom::new("stts");
        stts.write_all(&[0u8; 16]).unwrap();
        let mut stbl = CompositeAtom::new("stbl");
        stbl.add(stts);
        let mut minf = CompositeAtom::new("minf");
        minf.add(stbl);
        minf.finish();

        let bytes = minf.to_vec().unwrap();
        assert_eq!(bytes.len(), 8 + 8 + 8 + 16);
        let stbl_size = u32::from_be_bytes(bytes[8..12].try_into().unwrap());
        assert_eq!(stbl_size, 8 + 8 + 16);
    }

    #[test]
    fn add_finishes_previous_sibling() {
        let mut moov = CompositeAtom::new("moov");
        moov.add(DataAtom::new("mvhd"));
        moov.add(DataAtom::new("iods"));
        match &moov.children[0] {
            AtomNode::Data(atom) => assert!(atom.finished),
            _ => unreachable!(),
        }
    }

    /// Position-only sink for exercising the 4 GiB threshold
    /// without allocating the payload. Bytes written inside the
    /// first 16 positions land in `header`.
    struct SparseSink {
        pos: u64,
        header: [u8; 16],
    }

    impl Write for SparseSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            for byte in buf {
                if self.pos < 16 {
                    self.header[self.pos as usize] = *byte;
                }
                self.pos += 1;
            }
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Seek for SparseSink {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            match pos {
                SeekFrom::Start(p) => self.pos = p,
                SeekFrom::Current(d) => self.pos = (self.pos as i64 + d) as u64,
                SeekFrom::End(_) => unimplemented!(),
            }
            Ok(self.pos)
        }
    }

    fn wide_header_for(payload: u64) -> [u8; 16] {
        let mut sink = SparseSink { pos: 0, header: [0; 16] };
        let mut mdat = WideDataAtom::begin(&mut sink, "mdat").unwrap();
        sink.seek(SeekFrom::Start(16 + payload)).unwrap();
        mdat.finish(&mut sink).unwrap();
        sink.header
    }

    #[test]
    fn wide_atom_32bit_form_at_threshold() {
        let header = wide_header_for(0xFFFF_FFFF - 8);
        assert_eq!(u32::from_be_bytes(header[0..4].try_into().unwrap()), 8);
        assert_eq!(&header[4..8], b"wide");
        assert_eq!(
            u32::from_be_bytes(header[8..12].try_into().unwrap()),
            0xFFFF_FFFF
        );
        assert_eq!(&header[12..16], b"mdat");
    }

    #[test]
    fn wide_atom_extended_form_past_threshold() {
        let payload = 0xFFFF_FFFFu64 - 7;
        let header = wide_header_for(payload);
        assert_eq!(u32::from_be_bytes(header[0..4].try_into().unwrap()), 1);
        assert_eq!(&header[4..8], b"mdat");
        assert_eq!(
            u64::from_be_bytes(header[8..16].try_into().unwrap()),
            payload + 16
        );
    }

    #[test]
    fn empty_data_atom_serializes_header_only() {
        let mut atom = DataAtom::new("free");
        atom.finish();
        let mut buf = Vec::new();
        atom.write_to(&mut buf).unwrap();
        assert_eq!(buf, [0, 0, 0, 8, b'f', b'r', b'e', b'e']);
    }
}
