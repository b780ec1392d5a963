//! Data reference atom (`dref`).
//!
//! Declares the source(s) of a track's media data. Self-contained
//! movies carry a single alias reference with the self-reference
//! flag set.
//!
//! Location: `moov/trak[multiple]/mdia/minf/dinf/dref`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/data_reference_atom>

use std::io;

use binrw::BinRead;

use crate::atom::DataAtom;
use crate::binary::PutBe;

/// Media data is in the same file as the movie atom.
const DREF_SELF_REFERENCE: u32 = 0x0001;

/// Data reference atom (`dref`).
///
/// Location: `moov/trak[multiple]/mdia/minf/dinf/dref`
///
/// See: <https://developer.apple.com/documentation/quicktime-file-format/data_reference_atom>
#[derive(Debug, BinRead)]
#[br(big)]
pub struct Dref {
    _version: u8,
    _flags: [u8; 3],
    no_of_entries: u32,
    #[br(count = no_of_entries)]
    references: Vec<DataReference>,
}

impl Dref {
    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn references(&self) -> &[DataReference] {
        &self.references
    }

    /// Renders the atom with a single self-contained
    /// alias reference.
    pub(crate) fn atom() -> io::Result<DataAtom> {
        let mut atom = DataAtom::new("dref");
        atom.put_u32(0)?; // version + flags
        atom.put_u32(1)?;
        atom.put_u32(12)?; // reference size
        atom.put_tag("alis")?;
        atom.put_u32(DREF_SELF_REFERENCE)?; // version + flags
        Ok(atom)
    }
}

/// Single data reference.
#[derive(Debug, BinRead)]
#[br(big)]
pub struct DataReference {
    size: u32,
    /// Reference type, e.g. `alis`, `rsrc`, `url `.
    #[br(map = |raw: [u8; 4]| raw.iter().map(|b| *b as char).collect())]
    pub(crate) reference_type: String,
    _version: u8,
    flags: [u8; 3],
    /// Reference payload. Empty for self-contained media.
    #[br(count = size.saturating_sub(12))]
    pub(crate) data: Vec<u8>,
}

impl DataReference {
    pub fn reference_type(&self) -> &str {
        &self.reference_type
    }

    /// Returns `true` if the media data lives in the same file.
    pub fn is_self_reference(&self) -> bool {
        self.flags[2] & 0x01 == 0x01
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use binrw::BinReaderExt;

    use super::Dref;

    #[test]
    fn self_contained_reference_round_trip() {
        let mut atom = Dref::atom().unwrap();
        let mut raw = Vec::new();
        atom.finish();
        atom.write_to(&mut raw).unwrap();

        let dref: Dref = Cursor::new(&raw[8..]).read_ne().unwrap();
        assert_eq!(dref.len(), 1);
        assert_eq!(dref.references()[0].reference_type(), "alis");
        assert!(dref.references()[0].is_self_reference());
    }
}
