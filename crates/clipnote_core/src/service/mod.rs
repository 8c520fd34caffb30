//! Use-case services running in the capture and editor contexts.
//!
//! # Responsibility
//! - Capture: prepend notes built from selected text.
//! - Editor: open/save/rename/delete the current note.
//! - List: reload the displayed collection on change notifications.
//!
//! # Invariants
//! - Every mutation goes through `store::read_modify_write`.

pub mod capture;
pub mod editor;
pub mod export;
pub mod list_view;
pub mod markup;
