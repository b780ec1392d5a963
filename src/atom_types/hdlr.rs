//! Handler reference atom (`hdlr`).
//!
//! Occurs twice per track: once under `mdia` declaring the media
//! handler (`mhlr`), once under `minf` declaring the data
//! handler (`dhlr`).
//!
//! Location: `moov/trak[multiple]/mdia/hdlr`,
//! `moov/trak[multiple]/mdia/minf/hdlr`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/handler_reference_atom>

use std::io;

use binrw::BinRead;

use crate::atom::DataAtom;
use crate::binary::PutBe;

/// Handler reference atom (`hdlr`).
///
/// Location: `moov/trak[multiple]/mdia/hdlr`,
/// `moov/trak[multiple]/mdia/minf/hdlr`
///
/// See: <https://developer.apple.com/documentation/quicktime-file-format/handler_reference_atom>
#[derive(Debug, BinRead)]
#[br(big)]
pub struct Hdlr {
    _version: u8,
    _flags: [u8; 3],
    /// Handler kind. `mhlr` for media handlers,
    /// `dhlr` for data handlers.
    #[br(map = |raw: [u8; 4]| raw.iter().map(|b| *b as char).collect())]
    pub(crate) component_type: String,
    /// Media type for media handlers, e.g. `vide` or `soun`.
    /// Data reference type for data handlers, e.g. `alis`.
    #[br(map = |raw: [u8; 4]| raw.iter().map(|b| *b as char).collect())]
    pub(crate) component_subtype: String,
    _component_manufacturer: u32,
    _component_flags: u32,
    _component_flags_mask: u32,
    _name_size: u8,
    /// Counted string naming the component,
    /// e.g. `Video Media Handler`.
    #[br(count = _name_size, map = |raw: Vec<u8>| raw.iter().map(|b| *b as char).collect())]
    pub(crate) component_name: String,
}

impl Hdlr {
    pub fn component_type(&self) -> &str {
        &self.component_type
    }

    pub fn component_subtype(&self) -> &str {
        &self.component_subtype
    }

    pub fn component_name(&self) -> &str {
        &self.component_name
    }

    /// Returns `true` for the `mdia`-level handler declaration.
    pub fn is_media_handler(&self) -> bool {
        self.component_type == "mhlr"
    }

    /// Returns `true` if this handler declares video media.
    pub fn is_video(&self) -> bool {
        self.is_media_handler() && self.component_subtype == "vide"
    }

    /// Returns `true` if this handler declares sound media.
    pub fn is_audio(&self) -> bool {
        self.is_media_handler() && self.component_subtype == "soun"
    }

    /// Renders the `mdia`-level media handler declaration.
    pub(crate) fn media_atom(audio: bool) -> io::Result<DataAtom> {
        let (subtype, name) = if audio {
            ("soun", "Sound Media Handler")
        } else {
            ("vide", "Video Media Handler")
        };
        Self::atom("mhlr", subtype, name)
    }

    /// Renders the `minf`-level data handler declaration.
    pub(crate) fn data_atom() -> io::Result<DataAtom> {
        Self::atom("dhlr", "alis", "Alias Data Handler")
    }

    fn atom(component_type: &str, subtype: &str, name: &str) -> io::Result<DataAtom> {
        let mut atom = DataAtom::new("hdlr");
        atom.put_u32(0)?; // version + flags
        atom.put_tag(component_type)?;
        atom.put_tag(subtype)?;
        atom.put_u32(0)?; // component manufacturer
        atom.put_u32(0)?; // component flags
        atom.put_u32(0)?; // component flags mask
        atom.put_pstring(name)?;
        Ok(atom)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use binrw::BinReaderExt;

    use super::Hdlr;

    #[test]
    fn media_handler_round_trip() {
        let mut atom = Hdlr::media_atom(false).unwrap();
        let mut raw = Vec::new();
        atom.finish();
        atom.write_to(&mut raw).unwrap();

        // Skip the 8 byte atom header before parsing the payload.
        let hdlr: Hdlr = Cursor::new(&raw[8..]).read_ne().unwrap();
        assert!(hdlr.is_video());
        assert_eq!(hdlr.component_name(), "Video Media Handler");
    }

    #[test]
    fn data_handler_declares_alias() {
        let mut atom = Hdlr::data_atom().unwrap();
        let mut raw = Vec::new();
        atom.finish();
        atom.write_to(&mut raw).unwrap();

        let hdlr: Hdlr = Cursor::new(&raw[8..]).read_ne().unwrap();
        assert!(!hdlr.is_media_handler());
        assert_eq!(hdlr.component_subtype(), "alis");
    }
}
