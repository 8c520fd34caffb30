//! Whole-collection note store shared by the capture and editor contexts.
//!
//! # Responsibility
//! - Define the read / replace-all contract every writer goes through.
//! - Provide the shared read-modify-write helper and its consistency modes.
//!
//! # Invariants
//! - `write` replaces the entire persisted collection; there is no per-field
//!   update primitive.
//! - `write` never checks what it overwrites. Only `write_if_revision`
//!   compares revisions.
//! - Every successful write bumps the revision by exactly one and then fires
//!   the change notifier.
//! - Under `LastWriterWins`, two interleaved read-modify-write cycles lose the
//!   first writer's change. The helper logs it and lets it happen.

use crate::db::DbError;
use crate::model::note::{NoteCollection, NoteId};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

mod memory_store;
mod sqlite_store;

pub use memory_store::MemoryNoteStore;
pub use sqlite_store::SqliteNoteStore;

/// Write counter stored alongside the collection, bumped once per write.
///
/// A store starts at `0`. That includes a `MemoryNoteStore` seeded through
/// `with_notes`, so `0` does not imply an empty collection.
pub type Revision = u64;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    /// Backing storage could not be read or written.
    PersistenceUnavailable(DbError),
    /// Persisted payload does not decode into a valid collection.
    InvalidData(String),
    /// A write would leave two notes with the same id.
    DuplicateId(NoteId),
    /// A checked write was based on a revision that is no longer current.
    StaleRevision { expected: Revision, actual: Revision },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PersistenceUnavailable(err) => write!(f, "note store unavailable: {err}"),
            Self::InvalidData(details) => write!(f, "invalid persisted notes: {details}"),
            Self::DuplicateId(id) => write!(f, "duplicate note id: {id}"),
            Self::StaleRevision { expected, actual } => write!(
                f,
                "stale write: based on revision {expected}, store is at {actual}"
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::PersistenceUnavailable(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::PersistenceUnavailable(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::PersistenceUnavailable(DbError::Sqlite(value))
    }
}

/// A value together with the revision it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub revision: Revision,
    pub value: T,
}

/// Durable whole-collection store.
pub trait NoteStore {
    /// Current collection and its revision; empty at revision 0 if never written.
    fn read_versioned(&self) -> StoreResult<Versioned<NoteCollection>>;

    /// Replaces the collection unconditionally. Returns the new revision.
    fn write(&self, notes: &NoteCollection) -> StoreResult<Revision>;

    /// Replaces the collection only if the store is still at `expected`.
    fn write_if_revision(&self, expected: Revision, notes: &NoteCollection)
        -> StoreResult<Revision>;

    /// Current collection; empty if never written.
    fn read(&self) -> StoreResult<NoteCollection> {
        self.read_versioned().map(|versioned| versioned.value)
    }
}

impl<S: NoteStore + ?Sized> NoteStore for Arc<S> {
    fn read_versioned(&self) -> StoreResult<Versioned<NoteCollection>> {
        (**self).read_versioned()
    }

    fn write(&self, notes: &NoteCollection) -> StoreResult<Revision> {
        (**self).write(notes)
    }

    fn write_if_revision(
        &self,
        expected: Revision,
        notes: &NoteCollection,
    ) -> StoreResult<Revision> {
        (**self).write_if_revision(expected, notes)
    }
}

impl<S: NoteStore + ?Sized> NoteStore for &S {
    fn read_versioned(&self) -> StoreResult<Versioned<NoteCollection>> {
        (**self).read_versioned()
    }

    fn write(&self, notes: &NoteCollection) -> StoreResult<Revision> {
        (**self).write(notes)
    }

    fn write_if_revision(
        &self,
        expected: Revision,
        notes: &NoteCollection,
    ) -> StoreResult<Revision> {
        (**self).write_if_revision(expected, notes)
    }
}

/// How read-modify-write commits its result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConsistencyMode {
    /// Unconditional overwrite. Interleaved writers silently lose updates.
    #[default]
    LastWriterWins,
    /// Compare-and-swap on the revision; a stale cycle fails with
    /// `StoreError::StaleRevision` and writes nothing.
    RevisionChecked,
}

impl ConsistencyMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LastWriterWins => "last_writer_wins",
            Self::RevisionChecked => "revision_checked",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "last_writer_wins" | "lww" => Some(Self::LastWriterWins),
            "revision_checked" | "cas" => Some(Self::RevisionChecked),
            _ => None,
        }
    }
}

/// What one read-modify-write cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RmwReport<T> {
    /// `None` when `modify` declined to write.
    pub outcome: Option<T>,
    pub read_revision: Revision,
    pub written_revision: Option<Revision>,
    /// Foreign writes that landed between the read and the write and were
    /// replaced by this cycle. Always `0` under `RevisionChecked`.
    pub overwritten_writes: u64,
}

impl<T> RmwReport<T> {
    pub fn lost_update_suspected(&self) -> bool {
        self.overwritten_writes > 0
    }
}

/// Runs one read-modify-write cycle against `store`.
///
/// `modify` edits the freshly read collection and returns `Some(outcome)` to
/// commit it, or `None` to finish without writing. Returns `Ok(None)` in the
/// latter case.
pub fn read_modify_write<S, T>(
    store: &S,
    mode: ConsistencyMode,
    op: &'static str,
    modify: impl FnOnce(&mut NoteCollection) -> Option<T>,
) -> StoreResult<Option<T>>
where
    S: NoteStore + ?Sized,
{
    read_modify_write_reported(store, mode, op, modify).map(|report| report.outcome)
}

/// Same cycle as `read_modify_write`, reporting revisions and overwrites.
pub fn read_modify_write_reported<S, T>(
    store: &S,
    mode: ConsistencyMode,
    op: &'static str,
    modify: impl FnOnce(&mut NoteCollection) -> Option<T>,
) -> StoreResult<RmwReport<T>>
where
    S: NoteStore + ?Sized,
{
    let Versioned {
        revision: read_revision,
        value: mut notes,
    } = store.read_versioned()?;

    let Some(outcome) = modify(&mut notes) else {
        info!(
            "event=rmw module=store status=skipped op={} mode={} revision={}",
            op,
            mode.as_str(),
            read_revision
        );
        return Ok(RmwReport {
            outcome: None,
            read_revision,
            written_revision: None,
            overwritten_writes: 0,
        });
    };

    let (written, overwritten) = match mode {
        ConsistencyMode::LastWriterWins => {
            let written = store.write(&notes)?;
            let overwritten = written.saturating_sub(read_revision + 1);
            if overwritten > 0 {
                warn!(
                    "event=lost_update_suspected module=store status=warn op={} read_revision={} written_revision={} overwritten_writes={}",
                    op, read_revision, written, overwritten
                );
            }
            (written, overwritten)
        }
        ConsistencyMode::RevisionChecked => {
            match store.write_if_revision(read_revision, &notes) {
                Ok(written) => (written, 0),
                Err(err) => {
                    warn!(
                        "event=rmw module=store status=rejected op={} mode={} error={}",
                        op,
                        mode.as_str(),
                        err
                    );
                    return Err(err);
                }
            }
        }
    };

    info!(
        "event=rmw module=store status=ok op={} mode={} revision={} notes={}",
        op,
        mode.as_str(),
        written,
        notes.len()
    );
    Ok(RmwReport {
        outcome: Some(outcome),
        read_revision,
        written_revision: Some(written),
        overwritten_writes: overwritten,
    })
}

/// Rejects collections that would break id uniqueness.
pub(crate) fn ensure_unique_ids(notes: &NoteCollection) -> StoreResult<()> {
    match notes.first_duplicate_id() {
        Some(id) => Err(StoreError::DuplicateId(id.clone())),
        None => Ok(()),
    }
}
