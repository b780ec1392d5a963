//! File type compatibility atom (`ftyp`).
//!
//! Location: `ftyp` (the very first atom in the file)
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/file_type_compatibility_atom>

use std::io;

use binrw::BinRead;

use crate::atom::DataAtom;
use crate::binary::PutBe;
use crate::consts::{BRAND_QUICKTIME, BRAND_VERSION};

/// File type compatibility atom (`ftyp`).
///
/// Location: `ftyp` (the very first atom in the file)
///
/// See: <https://developer.apple.com/documentation/quicktime-file-format/file_type_compatibility_atom>
#[derive(Debug, BinRead)]
#[br(big)]
pub struct Ftyp {
    /// Major brand, e.g. `qt  ` for QuickTime movie files.
    #[br(map = |raw: [u8; 4]| raw.iter().map(|b| *b as char).collect())]
    pub(crate) major_brand: String,
    /// Informative version of the major brand,
    /// e.g. `0x20050300` for QuickTime 2005.
    pub(crate) minor_version: u32,
    /// Brands this file is compatible with.
    #[br(parse_with = binrw::helpers::until_eof, map = |raw: Vec<[u8; 4]>| {
        raw.iter()
            .map(|brand| brand.iter().map(|b| *b as char).collect())
            .collect()
    })]
    pub(crate) compatible_brands: Vec<String>,
}

impl Ftyp {
    pub fn major_brand(&self) -> &str {
        &self.major_brand
    }

    pub fn minor_version(&self) -> u32 {
        self.minor_version
    }

    pub fn compatible_brands(&self) -> &[String] {
        &self.compatible_brands
    }

    /// Returns `true` for QuickTime movie files.
    pub fn is_quicktime(&self) -> bool {
        self.major_brand == BRAND_QUICKTIME
            || self.compatible_brands.iter().any(|b| b == BRAND_QUICKTIME)
    }

    /// Renders the atom declaring the QuickTime brand.
    pub(crate) fn atom() -> io::Result<DataAtom> {
        let mut atom = DataAtom::new("ftyp");
        atom.put_tag(BRAND_QUICKTIME)?;
        atom.put_u32(BRAND_VERSION)?;
        atom.put_tag(BRAND_QUICKTIME)?;
        Ok(atom)
    }
}
