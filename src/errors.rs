//! Various QuickTime container related errors.

use std::fmt;

/// Various mov/atom read, parse, and write errors.
#[derive(Debug)]
pub enum MovError {
    /// Converted `BinResult` error.
    BinReadError(binrw::Error),
    /// Converted `Utf8Error`.
    Utf8Error(std::string::FromUtf8Error),
    /// IO error
    IOError(std::io::Error),
    /// Read returned fewer bytes than the header declared.
    ReadMismatch{got: u64, expected: u64},
    /// Seek mismatch.
    OffsetMismatch{got: u64, expected: u64},
    /// Atom mismatch.
    AtomMismatch{got: String, expected: String},
    /// 0 sized atoms,
    /// e.g. 1k Dropbox place holders.
    UnexpectedAtomSize{len: u64, offset: u64},
    /// No such atom.
    NoSuchAtom(String),
    /// Out of bounds.
    BoundsError((u64, u64)),
    /// Atom payload grew past what its 32-bit size field can hold.
    AtomTooLarge{name: String, size: u64},
    /// Relocated movie header size kept shifting and never
    /// settled within the allowed number of passes.
    HeaderUnstable(usize),
    /// Invalid argument passed to the writer or codec API.
    Argument(&'static str),
    /// Track index out of range.
    NoSuchTrack(usize),
    /// Compressed movie header (`dcom`) declares a method
    /// other than `zlib`.
    UnknownCompression(String),
    /// Encoded frame data ended mid-scanline or ran outside
    /// the canvas.
    CorruptFrame{reason: &'static str, offset: usize},
}

impl std::error::Error for MovError {}

impl fmt::Display for MovError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovError::BinReadError(err) => write!(f, "{err}"),
            MovError::Utf8Error(err) => write!(f, "{err}"),
            MovError::IOError(err) => write!(f, "IO error: {}", err),
            MovError::ReadMismatch{got, expected} => write!(f, "Read {got} bytes, expected {expected} bytes."),
            MovError::OffsetMismatch{got, expected} => write!(f, "Moved {got} bytes, expected to move {expected} bytes"),
            MovError::AtomMismatch{got, expected} => write!(f, "Atom mismatch. Expected '{expected}', got '{got}'"),
            MovError::UnexpectedAtomSize{len, offset} => write!(f, "Unexpected atom size of {len} bytes @ offset {offset}."),
            MovError::NoSuchAtom(name) => write!(f, "No such atom {name}."),
            MovError::BoundsError((got, max)) => write!(f, "Bounds error: tried to read at {got} with max {max}."),
            MovError::AtomTooLarge{name, size} => write!(f, "Atom '{name}' is {size} bytes, too large for a 32-bit size field."),
            MovError::HeaderUnstable(passes) => write!(f, "Movie header size did not stabilize after {passes} passes."),
            MovError::Argument(msg) => write!(f, "Invalid argument: {msg}"),
            MovError::NoSuchTrack(index) => write!(f, "No track with index {index}."),
            MovError::UnknownCompression(method) => write!(f, "Unknown movie header compression method '{method}'."),
            MovError::CorruptFrame{reason, offset} => write!(f, "Corrupt frame data @ offset {offset}: {reason}."),
        }
    }
}

/// Converts std::io::Error to MovError
impl From<std::io::Error> for MovError {
    fn from(err: std::io::Error) -> Self {
        MovError::IOError(err)
    }
}

/// Converts std::string::FromUtf8Error to MovError
/// (`&str` reqiures `std::str::Utf8Error`)
impl From<std::string::FromUtf8Error> for MovError {
    fn from(err: std::string::FromUtf8Error) -> MovError {
        MovError::Utf8Error(err)
    }
}

/// Converts MovError to std::io::Error
impl From<MovError> for std::io::Error {
    fn from(err: MovError) -> Self {
        std::io::Error::new(std::io::ErrorKind::Other, err)
    }
}

/// Converts binrw::Error to MovError
impl From<binrw::Error> for MovError {
    fn from(err: binrw::Error) -> MovError {
        MovError::BinReadError(err)
    }
}
