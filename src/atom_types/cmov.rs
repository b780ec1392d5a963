//! Compressed movie atoms (`cmov`, `dcom`, `cmvd`).
//!
//! A compressed movie wraps the entire `moov` payload inside
//! `moov/cmov`: `dcom` names the compression method and `cmvd`
//! holds the deflated movie resource. The only method in use
//! is zlib.
//!
//! Location: `moov/cmov/dcom`, `moov/cmov/cmvd`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/compressed_movie_resources>

use std::io::{self, Write};

use binrw::BinRead;
use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};

use crate::atom::DataAtom;
use crate::binary::PutBe;
use crate::errors::MovError;

/// Compression method used for `dcom`.
pub(crate) const COMPRESSION_ZLIB: &str = "zlib";

/// Data compression atom (`dcom`).
///
/// Location: `moov/cmov/dcom`
#[derive(Debug, BinRead)]
#[br(big)]
pub struct Dcom {
    /// Compression method tag, e.g. `zlib`.
    #[br(map = |raw: [u8; 4]| raw.iter().map(|b| *b as char).collect())]
    pub(crate) method: String,
}

impl Dcom {
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn is_zlib(&self) -> bool {
        self.method == COMPRESSION_ZLIB
    }

    /// Renders the atom declaring zlib compression.
    pub(crate) fn atom() -> io::Result<DataAtom> {
        let mut atom = DataAtom::new("dcom");
        atom.put_tag(COMPRESSION_ZLIB)?;
        Ok(atom)
    }
}

/// Compressed movie data atom (`cmvd`).
///
/// Location: `moov/cmov/cmvd`
#[derive(Debug, BinRead)]
#[br(big)]
pub struct Cmvd {
    /// Size of the movie resource once decompressed.
    pub(crate) uncompressed_size: u32,
    #[br(parse_with = binrw::helpers::until_eof)]
    pub(crate) data: Vec<u8>,
}

impl Cmvd {
    /// Size of the movie resource once decompressed.
    pub fn uncompressed_size(&self) -> u32 {
        self.uncompressed_size
    }

    /// Inflates the embedded movie resource. The result is a
    /// complete `moov` atom, header included. The stream must
    /// run through its checksum and match the declared size; a
    /// payload cut anywhere, trailer included, is an error.
    pub fn decompress(&self) -> Result<Vec<u8>, MovError> {
        let mut inflater = Decompress::new(true);
        // One spare byte so an overlong stream shows up as a
        // size mismatch instead of a full buffer.
        let mut raw = Vec::with_capacity(self.uncompressed_size as usize + 1);
        let status = inflater
            .decompress_vec(&self.data, &mut raw, FlushDecompress::Finish)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        if status != Status::StreamEnd || raw.len() as u64 != self.uncompressed_size as u64 {
            return Err(MovError::ReadMismatch {
                got: raw.len() as u64,
                expected: self.uncompressed_size as u64,
            });
        }
        Ok(raw)
    }

    /// Renders the atom, deflating `moov` (a complete movie atom,
    /// header included).
    pub(crate) fn atom(moov: &[u8]) -> io::Result<DataAtom> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(moov)?;
        let compressed = encoder.finish()?;

        let mut atom = DataAtom::new("cmvd");
        atom.put_u32(moov.len() as u32)?;
        atom.write_all(&compressed)?;
        Ok(atom)
    }
}
