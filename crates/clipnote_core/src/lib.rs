//! Core of ClipNote: the shared note store and the contexts that rewrite it.
//!
//! A capture context and an editor context each run read-modify-write cycles
//! against one persisted collection and learn about each other's writes only
//! through the change notifier.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod service;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{Note, NoteCollection, NoteId, StoredNotes};
pub use notify::{ChangeNotifier, CollectionChanged, Subscription, SubscriptionId};
pub use service::capture::{
    capture_menu_entry, CaptureAgent, CaptureEvent, CaptureTrigger, MenuContext, MenuEntry,
};
pub use service::editor::{
    DeleteOutcome, EditorSession, EditorSurface, Foreground, SessionState, READABLE_FOREGROUND,
};
pub use service::export::{export_note, ExportArtifact, ExportError, ExportFormat};
pub use service::list_view::{display_title, NoteListView, RefreshOutcome, RefreshPolicy};
pub use service::markup::{capture_title, derive_title, strip_markup, DEFAULT_TITLE};
pub use store::{
    read_modify_write, read_modify_write_reported, ConsistencyMode, MemoryNoteStore, NoteStore,
    Revision, RmwReport, SqliteNoteStore, StoreError, StoreResult, Versioned,
};

/// Health probe for host wiring.
pub fn ping() -> &'static str {
    "pong"
}

pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
