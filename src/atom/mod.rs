//! Atom structures: parsed headers on the read side, self-sizing
//! buffered nodes on the write side.

mod builder;
mod header;

pub use builder::{AtomNode, CompositeAtom, DataAtom, WideDataAtom};
pub use header::AtomHeader;
