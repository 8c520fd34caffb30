//! Note record and the ordered collection both contexts rewrite.
//!
//! # Responsibility
//! - Define the persisted note shape shared by capture and editor contexts.
//! - Provide order-preserving collection edits used by read-modify-write.
//!
//! # Invariants
//! - Collection order is insertion order (newest first); saves never reorder.
//! - `id` is unique across a collection; stores reject duplicates on write.
//! - `source` is set at capture and carried unchanged by later saves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque note identifier.
///
/// Fresh ids are time-ordered UUIDv7 strings; any string read back from
/// storage is accepted so older timestamp-style ids keep working.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Generates a fresh time-derived id.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for NoteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One captured or edited note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    /// Display title; derived from content unless `manual_title` is set.
    pub title: String,
    /// Rich-text markup, opaque to the store.
    pub content: String,
    /// Last modification time, serialized as ISO-8601.
    pub date: DateTime<Utc>,
    /// Page the note was captured from. `null` for notes created in the editor.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// Set once a user renames the note; freezes the title against content edits.
    #[serde(default, skip_serializing_if = "is_false")]
    pub manual_title: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Ordered note sequence persisted as a single value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteCollection(Vec<Note>);

impl NoteCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Note> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Note] {
        &self.0
    }

    /// Inserts at the head, where new notes live.
    pub fn prepend(&mut self, note: Note) {
        self.0.insert(0, note);
    }

    pub fn position(&self, id: &NoteId) -> Option<usize> {
        self.0.iter().position(|note| &note.id == id)
    }

    pub fn get(&self, id: &NoteId) -> Option<&Note> {
        self.0.iter().find(|note| &note.id == id)
    }

    pub fn get_mut(&mut self, id: &NoteId) -> Option<&mut Note> {
        self.0.iter_mut().find(|note| &note.id == id)
    }

    /// Swaps the record at `index` keeping its sequence position.
    ///
    /// Returns the previous record, or gives `note` back when out of range.
    pub fn replace_at(&mut self, index: usize, note: Note) -> Result<Note, Note> {
        match self.0.get_mut(index) {
            Some(slot) => Ok(std::mem::replace(slot, note)),
            None => Err(note),
        }
    }

    /// Removes every entry with `id`, preserving the order of the rest.
    ///
    /// Returns how many entries were dropped.
    pub fn remove_by_id(&mut self, id: &NoteId) -> usize {
        let before = self.0.len();
        self.0.retain(|note| &note.id != id);
        before - self.0.len()
    }

    /// First id that appears more than once, if any.
    pub fn first_duplicate_id(&self) -> Option<&NoteId> {
        let mut seen = std::collections::HashSet::with_capacity(self.0.len());
        self.0
            .iter()
            .map(|note| &note.id)
            .find(|id| !seen.insert(*id))
    }

    pub fn has_unique_ids(&self) -> bool {
        self.first_duplicate_id().is_none()
    }

    pub fn ids(&self) -> Vec<NoteId> {
        self.0.iter().map(|note| note.id.clone()).collect()
    }
}

impl From<Vec<Note>> for NoteCollection {
    fn from(value: Vec<Note>) -> Self {
        Self(value)
    }
}

impl IntoIterator for NoteCollection {
    type Item = Note;
    type IntoIter = std::vec::IntoIter<Note>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a NoteCollection {
    type Item = &'a Note;
    type IntoIter = std::slice::Iter<'a, Note>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Persisted envelope: `{ "notes": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredNotes {
    #[serde(default)]
    pub notes: NoteCollection,
}
