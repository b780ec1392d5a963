use std::ops::Range;

use crate::FourCC;

/// Atom header.
/// 8 or 16 bytes, depending on whether
/// 32 or 64-bit sized.
///
/// ```ignore
/// | [X X X X] [Y Y Y Y] [Z Z Z Z Z Z Z Z] |
///    |         |         |
///    |         |         64bit size (optional, only if 32 bit size == 1)
///    |         FourCC
///    32bit size
/// ```
///
/// A 32-bit size of 0 means the atom runs to the end of its
/// enclosing atom; the resolved byte count is stored here so
/// later offset math never re-derives it.
#[derive(Debug, Clone, Default)]
pub struct AtomHeader {
    /// Total atom size in bytes including 8/16 byte header.
    pub(crate) atom_size: u64,
    /// FourCC
    pub(crate) name: FourCC,
    /// Absolute byte offset for start of atom,
    /// i.e. byte offset for its header,
    /// starting with 32-bit size.
    pub(crate) offset: u64,
    /// 8 for the common form, 16 for 64-bit sizes, 12 when a
    /// zero-size atom carried the extra 4-byte field before
    /// its data. Stored at parse time since it can not be
    /// derived from `atom_size` alone.
    pub(crate) header_size: u8,
}

impl AtomHeader {
    /// Convenience method to check whether atom at current offset is
    /// a container or not.
    pub fn is_container(&self) -> bool {
        self.name.is_container()
    }

    pub fn start(&self) -> u64 {
        self.offset
    }

    pub fn end(&self) -> u64 {
        self.offset + self.atom_size
    }

    pub fn atom_size(&self) -> u64 {
        self.atom_size
    }

    pub fn name(&self) -> &FourCC {
        &self.name
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn header_size(&self) -> u8 {
        self.header_size
    }

    /// Data load absolute offset,
    /// i.e. position after header
    /// adjusted for optional 64bit size value.
    pub fn data_offset(&self) -> u64 {
        self.offset + self.header_size as u64
    }

    /// Size of data load (excludes header size).
    pub fn data_size(&self) -> u64 {
        self.atom_size - self.header_size as u64
    }

    /// Returns start, end offset range for atom.
    pub fn bounds(&self) -> Range<u64> {
        self.offset .. self.end()
    }

    /// Returns `true` if absolute offset `pos`
    /// is contained within the atom span.
    ///
    /// Inclusive lower bound, exclusive upper bound,
    /// i.e. `start_of_atom <= pos < end_of_atom`.
    pub fn contains(&self, pos: u64) -> bool {
        self.offset <= pos && self.end() > pos
    }
}
