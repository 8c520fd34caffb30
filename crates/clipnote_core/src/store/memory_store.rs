//! Process-local note store.

use super::{ensure_unique_ids, NoteStore, Revision, StoreError, StoreResult, Versioned};
use crate::model::note::NoteCollection;
use crate::notify::ChangeNotifier;
use log::debug;
use std::sync::{Arc, Mutex, MutexGuard};

/// In-memory store with the same contract as the SQLite store.
///
/// Useful for deterministic interleaving replays: contexts share one
/// instance through `Arc`.
#[derive(Debug)]
pub struct MemoryNoteStore {
    state: Mutex<Versioned<NoteCollection>>,
    notifier: Arc<ChangeNotifier>,
}

impl MemoryNoteStore {
    pub fn new(notifier: Arc<ChangeNotifier>) -> Self {
        Self::with_notes(NoteCollection::new(), notifier)
    }

    /// Starts from `notes` at revision 0, as if they were already persisted.
    pub fn with_notes(notes: NoteCollection, notifier: Arc<ChangeNotifier>) -> Self {
        Self {
            state: Mutex::new(Versioned {
                revision: 0,
                value: notes,
            }),
            notifier,
        }
    }

    pub fn notifier(&self) -> &Arc<ChangeNotifier> {
        &self.notifier
    }

    fn state(&self) -> MutexGuard<'_, Versioned<NoteCollection>> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn commit(&self, expected: Option<Revision>, notes: &NoteCollection) -> StoreResult<Revision> {
        ensure_unique_ids(notes)?;
        let revision = {
            let mut state = self.state();
            if let Some(expected) = expected {
                if state.revision != expected {
                    return Err(StoreError::StaleRevision {
                        expected,
                        actual: state.revision,
                    });
                }
            }
            state.revision += 1;
            state.value = notes.clone();
            state.revision
        };
        debug!(
            "event=store_write module=store status=ok backend=memory revision={} notes={}",
            revision,
            notes.len()
        );
        self.notifier.notify();
        Ok(revision)
    }
}

impl NoteStore for MemoryNoteStore {
    fn read_versioned(&self) -> StoreResult<Versioned<NoteCollection>> {
        Ok(self.state().clone())
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
