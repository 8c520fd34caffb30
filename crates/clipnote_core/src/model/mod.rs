//! Persisted note model.
//!
//! # Invariants
//! - The whole collection is the unit of persistence; there is no per-note row.
//! - Note ids are unique within one collection.

pub mod note;
