//! Edit list atom (`elst`).
//!
//! Maps a track's movie timeline onto its media timeline.
//!
//! Location: `moov/trak[multiple]/edts/elst`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/edit_list_atom>

use std::io;

use binrw::BinRead;

use crate::atom::DataAtom;
use crate::binary::{unfixed16_16, PutBe};
use crate::track::Edit;

/// Edit list atom (`elst`).
///
/// Location: `moov/trak[multiple]/edts/elst`
///
/// See: <https://developer.apple.com/documentation/quicktime-file-format/edit_list_atom>
#[derive(Debug, BinRead)]
#[br(big)]
pub struct Elst {
    _version: u8,
    _flags: [u8; 3],
    no_of_entries: u32,
    #[br(count = no_of_entries)]
    table: Vec<EditListEntry>,
}

impl Elst {
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn table(&self) -> &[EditListEntry] {
        &self.table
    }

    pub fn into_table(self) -> Vec<EditListEntry> {
        self.table
    }

    /// Renders the atom.
    pub(crate) fn atom(edits: &[Edit]) -> io::Result<DataAtom> {
        let mut atom = DataAtom::new("elst");
        atom.put_u32(0)?; // version + flags
        atom.put_u32(edits.len() as u32)?;
        for edit in edits.iter() {
            atom.put_u32(edit.track_duration)?;
            atom.put_i32(edit.media_time)?;
            atom.put_fixed16_16(edit.media_rate)?;
        }
        Ok(atom)
    }
}

/// Edit list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(big)]
pub struct EditListEntry {
    /// Duration of this edit in movie time scale units.
    pub(crate) track_duration: u32,
    /// Starting time of this edit within the media,
    /// in media time scale units. -1 marks an empty edit.
    pub(crate) media_time: i32,
    /// 16.16 fixed-point relative playback rate.
    pub(crate) media_rate: u32,
}

impl EditListEntry {
    /// Duration of this edit in movie time scale units.
    pub fn track_duration(&self) -> u32 {
        self.track_duration
    }

    /// Starting time of this edit within the media,
    /// in media time scale units.
    pub fn media_time(&self) -> i32 {
        self.media_time
    }

    /// Relative playback rate for this edit. 1.0 is normal rate.
    pub fn media_rate(&self) -> f64 {
        unfixed16_16(self.media_rate)
    }

    /// An empty edit inserts movie time during which
    /// no media plays.
    pub fn is_empty_edit(&self) -> bool {
        self.media_time == -1
    }
}
