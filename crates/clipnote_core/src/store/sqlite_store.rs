//! SQLite-backed note store.
//!
//! # Invariants
//! - The whole collection lives in one `note_store` row keyed `notes`, as a
//!   JSON `{ "notes": [...] }` payload.
//! - Revision read and bump happen inside one immediate transaction, so a
//!   checked write cannot race another connection on the same file.
//! - Payloads with duplicate ids are rejected on read and on write.

use super::{ensure_unique_ids, NoteStore, Revision, StoreError, StoreResult, Versioned};
use crate::db::{open_db, open_db_in_memory};
use crate::model::note::{NoteCollection, StoredNotes};
use crate::notify::ChangeNotifier;
use log::{debug, error};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

const NOTES_KEY: &str = "notes";

/// Note store over one SQLite connection.
///
/// Each context may open its own store on the same file; they must share
/// one `ChangeNotifier` to observe each other's writes.
pub struct SqliteNoteStore {
    conn: Mutex<Connection>,
    notifier: Arc<ChangeNotifier>,
}

impl SqliteNoteStore {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: Connection, notifier: Arc<ChangeNotifier>) -> Self {
        Self {
            conn: Mutex::new(conn),
            notifier,
        }
    }

    pub fn open(path: impl AsRef<Path>, notifier: Arc<ChangeNotifier>) -> StoreResult<Self> {
        Ok(Self::new(open_db(path)?, notifier))
    }

    pub fn open_in_memory(notifier: Arc<ChangeNotifier>) -> StoreResult<Self> {
        Ok(Self::new(open_db_in_memory()?, notifier))
    }

    pub fn notifier(&self) -> &Arc<ChangeNotifier> {
        &self.notifier
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn commit(&self, expected: Option<Revision>, notes: &NoteCollection) -> StoreResult<Revision> {
        ensure_unique_ids(notes)?;
        let payload = serde_json::to_string(&StoredNotes {
            notes: notes.clone(),
        })
        .map_err(|err| StoreError::InvalidData(format!("cannot encode notes: {err}")))?;

        let result = self.commit_payload(expected, &payload);
        match &result {
            Ok(revision) => {
                debug!(
                    "event=store_write module=store status=ok backend=sqlite revision={} notes={}",
                    revision,
                    notes.len()
                );
            }
            Err(StoreError::StaleRevision { .. }) => {}
            Err(err) => {
                error!("event=store_write module=store status=error backend=sqlite error={err}");
            }
        }

        let revision = result?;
        self.notifier.notify();
        Ok(revision)
    }

    fn commit_payload(&self, expected: Option<Revision>, payload: &str) -> StoreResult<Revision> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = tx
            .query_row(
                "SELECT revision FROM note_store WHERE key = ?1;",
                [NOTES_KEY],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .map(to_revision)
            .transpose()?
            .unwrap_or(0);

        if let Some(expected) = expected {
            if current != expected {
                return Err(StoreError::StaleRevision {
                    expected,
                    actual: current,
                });
            }
        }

        let next = current + 1;
        let next_db = i64::try_from(next)
            .map_err(|_| StoreError::InvalidData(format!("revision {next} out of range")))?;
        tx.execute(
            "INSERT INTO note_store (key, payload, revision, updated_at)
             VALUES (?1, ?2, ?3, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                revision = excluded.revision,
                updated_at = excluded.updated_at;",
            params![NOTES_KEY, payload, next_db],
        )?;
        tx.commit()?;
        Ok(next)
    }
}

impl NoteStore for SqliteNoteStore {
    fn read_versioned(&self) -> StoreResult<Versioned<NoteCollection>> {
        let row = self
            .conn()
            .query_row(
                "SELECT payload, revision FROM note_store WHERE key = ?1;",
                [NOTES_KEY],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;

        let Some((payload, revision)) = row else {
            return Ok(Versioned {
                revision: 0,
                value: NoteCollection::new(),
            });
        };

        let stored: StoredNotes = serde_json::from_str(&payload)
            .map_err(|err| StoreError::InvalidData(format!("cannot decode notes: {err}")))?;
        if let Some(id) = stored.notes.first_duplicate_id() {
            return Err(StoreError::InvalidData(format!(
                "duplicate note id `{id}` in stored collection"
            )));
        }

        Ok(Versioned {
            revision: to_revision(revision)?,
            value: stored.notes,
        })
    }

    fn write(&self, notes: &NoteCollection) -> StoreResult<Revision> {
        self.commit(None, notes)
    }

    fn write_if_revision(
        &self,
        expected: Revision,
        notes: &NoteCollection,
    ) -> StoreResult<Revision> {
        self.commit(Some(expected), notes)
    }
}

fn to_revision(value: i64) -> StoreResult<Revision> {
    Revision::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("negative revision {value} in note_store")))
}
