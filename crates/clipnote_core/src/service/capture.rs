//! Background capture of selected text into new notes.
//!
//! # Responsibility
//! - Turn a "Save to Notes" trigger into a note at the head of the collection.
//!
//! # Invariants
//! - Captured titles always carry the ellipsis marker.
//! - Captures never deduplicate or rate-limit; each trigger is one new note.
//! - The prepend is a plain read-modify-write and can race the editor.

use crate::clock::{Clock, SystemClock};
use crate::model::note::{Note, NoteId};
use crate::service::markup::capture_title;
use crate::store::{read_modify_write, ConsistencyMode, NoteStore, StoreResult};
use log::info;

pub const SAVE_TO_NOTES_MENU_ID: &str = "save-to-notes";
pub const SAVE_TO_NOTES_MENU_TITLE: &str = "Save to Notes";

/// Browsing contexts a menu entry is offered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuContext {
    Selection,
}

/// Registration record for the capture entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuEntry {
    pub id: &'static str,
    pub title: &'static str,
    pub contexts: &'static [MenuContext],
}

/// The single menu entry the capture agent registers at install time.
pub fn capture_menu_entry() -> MenuEntry {
    MenuEntry {
        id: SAVE_TO_NOTES_MENU_ID,
        title: SAVE_TO_NOTES_MENU_TITLE,
        contexts: &[MenuContext::Selection],
    }
}

/// Selected text plus the page it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureEvent {
    pub selection_text: String,
    pub page_url: String,
}

/// Raw menu click as delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureTrigger {
    pub menu_item_id: String,
    pub selection_text: Option<String>,
    pub page_url: String,
}

pub struct CaptureAgent<S: NoteStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
    mode: ConsistencyMode,
}

impl<S: NoteStore> CaptureAgent<S, SystemClock> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: NoteStore, C: Clock> CaptureAgent<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            mode: ConsistencyMode::default(),
        }
    }

    pub fn with_consistency(mut self, mode: ConsistencyMode) -> Self {
        self.mode = mode;
        self
    }

    /// Handles a menu click; ignores other entries and empty selections.
    pub fn handle_trigger(&self, trigger: CaptureTrigger) -> StoreResult<Option<Note>> {
        if trigger.menu_item_id != SAVE_TO_NOTES_MENU_ID {
            return Ok(None);
        }
        let Some(selection_text) = trigger.selection_text.filter(|text| !text.is_empty()) else {
            return Ok(None);
        };

        self.capture(CaptureEvent {
            selection_text,
            page_url: trigger.page_url,
        })
        .map(Some)
    }

    /// Builds the note for `event` and prepends it to the stored collection.
    pub fn capture(&self, event: CaptureEvent) -> StoreResult<Note> {
        let note = self.build_note(event);
        let id = note.id.clone();

        read_modify_write(&self.store, self.mode, "capture", |notes| {
            notes.prepend(note.clone());
            Some(())
        })?;

        info!("event=capture module=capture status=ok note_id={id}");
        Ok(note)
    }

    fn build_note(&self, event: CaptureEvent) -> Note {
        Note {
            id: NoteId::generate(),
            title: capture_title(&event.selection_text),
            content: event.selection_text,
            date: self.clock.now(),
            source: Some(event.page_url),
            background_color: None,
            manual_title: false,
        }
    }
}
