//! Foreground editing session over the shared note store.
//!
//! # Responsibility
//! - Own "the note currently open" as explicit session state.
//! - Persist every surface change immediately via read-modify-write.
//! - Apply the title policy and the delete confirmation guard.
//!
//! # Invariants
//! - `save` and `delete` are silent no-ops while `Closed`.
//! - A note with `manual_title` keeps its title across saves.
//! - Saving an existing note replaces it in place; order never changes.
//! - A new note exists only in the session until its first save.
//! - `source` is carried over from the stored entry, never taken from input.

use crate::clock::{Clock, SystemClock};
use crate::model::note::{Note, NoteId};
use crate::service::export::{export_note, ExportArtifact, ExportError, ExportFormat};
use crate::service::markup::derive_title;
use crate::store::{read_modify_write, ConsistencyMode, NoteStore, StoreResult};
use log::info;

/// Foreground forced onto any custom background; the palette is light.
pub const READABLE_FOREGROUND: &str = "#1f2937";
const EXPORT_FALLBACK_TITLE: &str = "Note";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Foreground {
    #[default]
    ThemeDefault,
    Fixed(&'static str),
}

impl Foreground {
    /// Readable-text rule: custom background forces the dark foreground.
    pub fn for_background(background_color: Option<&str>) -> Self {
        match background_color {
            Some(_) => Self::Fixed(READABLE_FOREGROUND),
            None => Self::ThemeDefault,
        }
    }

    pub fn css_value(self) -> Option<&'static str> {
        match self {
            Self::ThemeDefault => None,
            Self::Fixed(color) => Some(color),
        }
    }
}

/// What the editor currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorSurface {
    pub content: String,
    pub background_color: Option<String>,
    pub foreground: Foreground,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Closed,
    Editing {
        current_id: NoteId,
    },
}

impl SessionState {
    pub fn is_editing(&self) -> bool {
        matches!(self, Self::Editing { .. })
    }

    pub fn current_id(&self) -> Option<&NoteId> {
        match self {
            Self::Closed => None,
            Self::Editing { current_id } => Some(current_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    NoNoteOpen,
    Declined,
    Deleted(NoteId),
}

pub struct EditorSession<S: NoteStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
    mode: ConsistencyMode,
    state: SessionState,
    surface: EditorSurface,
}

impl<S: NoteStore> EditorSession<S, SystemClock> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: NoteStore, C: Clock> EditorSession<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            mode: ConsistencyMode::default(),
            state: SessionState::Closed,
            surface: EditorSurface::default(),
        }
    }

    pub fn with_consistency(mut self, mode: ConsistencyMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn current_id(&self) -> Option<&NoteId> {
        self.state.current_id()
    }

    pub fn surface(&self) -> &EditorSurface {
        &self.surface
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Starts an unsaved note with a fresh id and an empty surface.
    pub fn new_note(&mut self) -> NoteId {
        let id = NoteId::generate();
        self.surface = EditorSurface::default();
        self.state = SessionState::Editing {
            current_id: id.clone(),
        };
        info!("event=editor_new module=editor status=ok note_id={id}");
        id
    }

    /// Loads `note` into the surface and makes it current.
    pub fn open(&mut self, note: &Note) {
        let background_color = note.background_color.clone().filter(|c| !c.is_empty());
        self.surface = EditorSurface {
            content: note.content.clone(),
            foreground: Foreground::for_background(background_color.as_deref()),
            background_color,
        };
        self.state = SessionState::Editing {
            current_id: note.id.clone(),
        };
        info!("event=editor_open module=editor status=ok note_id={}", note.id);
    }

    /// Surface change: replace the content and save right away.
    pub fn input(&mut self, content: impl Into<String>) -> StoreResult<Option<Note>> {
        self.surface.content = content.into();
        self.save()
    }

    /// Background selector change; an empty value clears the hint.
    pub fn set_background_color(&mut self, color: Option<&str>) -> StoreResult<Option<Note>> {
        let color = color.filter(|c| !c.is_empty()).map(str::to_string);
        self.surface.foreground = Foreground::for_background(color.as_deref());
        self.surface.background_color = color;
        self.save()
    }

    /// Writes the open note back, returning the stored record.
    ///
    /// Returns `Ok(None)` without touching the store while `Closed`.
    pub fn save(&mut self) -> StoreResult<Option<Note>> {
        let Some(id) = self.state.current_id().cloned() else {
            return Ok(None);
        };
        let content = self.surface.content.clone();
        let background_color = self.surface.background_color.clone();
        let date = self.clock.now();

        read_modify_write(&self.store, self.mode, "save", |notes| {
            let prior = notes.get(&id);

            let (title, manual_title) = match prior {
                Some(prior) if prior.manual_title => (prior.title.clone(), true),
                _ => (derive_title(&content), false),
            };
            let note = Note {
                id,
                title,
                content,
                date,
                source: prior.and_then(|prior| prior.source.clone()),
                background_color,
                manual_title,
            };

            match notes.get_mut(&note.id) {
                Some(slot) => *slot = note.clone(),
                None => notes.prepend(note.clone()),
            }
            Some(note)
        })
    }

    /// Renames any note by id and pins the title against content edits.
    ///
    /// Returns false, without writing, when `id` is not stored.
    pub fn set_manual_title(&self, id: &NoteId, title: impl Into<String>) -> StoreResult<bool> {
        let title = title.into();
        let renamed = read_modify_write(&self.store, self.mode, "rename", |notes| {
            let note = notes.get_mut(id)?;
            note.title = title;
            note.manual_title = true;
            Some(())
        })?;
        Ok(renamed.is_some())
    }

    /// Deletes the open note after `confirm` agrees, then closes the session.
    ///
    /// `confirm` is not consulted while `Closed`. A declined confirmation
    /// leaves the session editing.
    pub fn delete(&mut self, confirm: impl FnOnce() -> bool) -> StoreResult<DeleteOutcome> {
        let Some(id) = self.state.current_id().cloned() else {
            return Ok(DeleteOutcome::NoNoteOpen);
        };
        if !confirm() {
            return Ok(DeleteOutcome::Declined);
        }

        read_modify_write(&self.store, self.mode, "delete", |notes| {
            Some(notes.remove_by_id(&id))
        })?;

        self.state = SessionState::Closed;
        self.surface = EditorSurface::default();
        info!("event=editor_delete module=editor status=ok note_id={id}");
        Ok(DeleteOutcome::Deleted(id))
    }

    /// Back to the list: save, then close.
    ///
    /// A failed save leaves the session editing so nothing typed is dropped.
    pub fn close(&mut self) -> StoreResult<Option<Note>> {
        let saved = self.save()?;
        self.state = SessionState::Closed;
        self.surface = EditorSurface::default();
        Ok(saved)
    }

    /// Exports the open note; `Ok(None)` while `Closed`.
    pub fn export(&self, format: ExportFormat) -> Result<Option<ExportArtifact>, ExportError> {
        let Some(id) = self.state.current_id() else {
            return Ok(None);
        };
        let notes = self.store.read()?;
        let title = notes
            .get(id)
            .map(|note| note.title.as_str())
            .filter(|title| !title.is_empty())
            .unwrap_or(EXPORT_FALLBACK_TITLE);

        export_note(
            title,
            &self.surface.content,
            self.surface.background_color.as_deref(),
            format,
        )
        .map(Some)
    }
}
