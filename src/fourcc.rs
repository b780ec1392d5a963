//! QuickTime atom FourCC.
//! See https://developer.apple.com/library/archive/documentation/QuickTime/QTFF/QTFFChap2/qtff2.html#//apple_ref/doc/uid/TP40000939-CH204-56313.

/// QuickTime atom Four CC.
/// See https://developer.apple.com/library/archive/documentation/QuickTime/QTFF/QTFFChap2/qtff2.html#//apple_ref/doc/uid/TP40000939-CH204-56313.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FourCC {
    /// Compressed movie atom
    Cmov,
    /// Compressed movie data
    Cmvd,
    /// Chunk offset, 64-bit values
    Co64,
    /// Data compression atom (inside `cmov`)
    Dcom,
    /// Data Information Atoms
    Dinf,
    Dref,
    Edts,
    Elst,
    Free,
    Ftyp,
    Hdlr,
    Mdat,
    Mdhd,
    Mdia,
    Minf,
    /// Movie Atom
    Moov,
    /// Movie Header Atom
    Mvhd,
    Skip,
    Smhd,
    Stbl,
    /// Chunk offset, 32-bit values
    Stco,
    Stsc,
    Stsd,
    Stss,
    Stsz,
    Stts,
    Tkhd,
    /// Track description
    Trak,
    Tref,
    /// User data
    Udta,
    Vmhd,
    /// 8-byte filler reserving room for a 64-bit `mdat` size
    Wide,

    Custom(String)
}

impl FourCC {
    pub fn from_slice(fourcc: &[u8]) -> Self {
        match fourcc {
            b"cmov" => Self::Cmov,
            b"cmvd" => Self::Cmvd,
            b"co64" => Self::Co64,
            b"dcom" => Self::Dcom,
            b"dinf" => Self::Dinf,
            b"dref" => Self::Dref,
            b"edts" => Self::Edts,
            b"elst" => Self::Elst,
            b"free" => Self::Free,
            b"ftyp" => Self::Ftyp,
            b"hdlr" => Self::Hdlr,
            b"mdat" => Self::Mdat,
            b"mdhd" => Self::Mdhd,
            b"mdia" => Self::Mdia,
            b"minf" => Self::Minf,
            b"moov" => Self::Moov,
            b"mvhd" => Self::Mvhd,
            b"skip" => Self::Skip,
            b"smhd" => Self::Smhd,
            b"stbl" => Self::Stbl,
            b"stco" => Self::Stco,
            b"stsc" => Self::Stsc,
            b"stsd" => Self::Stsd,
            b"stss" => Self::Stss,
            b"stsz" => Self::Stsz,
            b"stts" => Self::Stts,
            b"tkhd" => Self::Tkhd,
            b"trak" => Self::Trak,
            b"tref" => Self::Tref,
            b"udta" => Self::Udta,
            b"vmhd" => Self::Vmhd,
            b"wide" => Self::Wide,

            _ => Self::Custom(String::from_utf8_lossy(fourcc).to_string()),
        }
    }

    pub fn from_u32(value: u32) -> Self {
        Self::from_slice(&value.to_be_bytes())
    }

    pub fn from_str(fourcc: &str) -> Self {
        Self::from_slice(fourcc.as_bytes())
    }

    pub fn to_str(&self) -> &str {
        match self {
            Self::Cmov => "cmov",
            Self::Cmvd => "cmvd",
            Self::Co64 => "co64",
            Self::Dcom => "dcom",
            Self::Dinf => "dinf",
            Self::Dref => "dref",
            Self::Edts => "edts",
            Self::Elst => "elst",
            Self::Free => "free",
            Self::Ftyp => "ftyp",
            Self::Hdlr => "hdlr",
            Self::Mdat => "mdat",
            Self::Mdhd => "mdhd",
            Self::Mdia => "mdia",
            Self::Minf => "minf",
            Self::Moov => "moov",
            Self::Mvhd => "mvhd",
            Self::Skip => "skip",
            Self::Smhd => "smhd",
            Self::Stbl => "stbl",
            Self::Stco => "stco",
            Self::Stsc => "stsc",
            Self::Stsd => "stsd",
            Self::Stss => "stss",
            Self::Stsz => "stsz",
            Self::Stts => "stts",
            Self::Tkhd => "tkhd",
            Self::Trak => "trak",
            Self::Tref => "tref",
            Self::Udta => "udta",
            Self::Vmhd => "vmhd",
            Self::Wide => "wide",
            Self::Custom(s) => s.as_str()
        }
    }

    /// Composite atoms are recursed into by the reader,
    /// everything else is a leaf.
    pub fn is_container(&self) -> bool {
        crate::consts::CONTAINER.contains(&self.to_str())
    }

    /// Filler atoms carry no track or movie state.
    pub fn is_filler(&self) -> bool {
        matches!(self, Self::Free | Self::Skip | Self::Wide)
    }
}

impl Default for FourCC {
    fn default() -> Self {
        Self::Custom("None".to_owned())
    }
}

impl std::fmt::Display for FourCC {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}
