//! Note list projection driven by change notifications.
//!
//! # Responsibility
//! - Keep a snapshot of the stored collection for display.
//! - Decide, per notification, whether to reload, using an explicit policy.
//!
//! # Invariants
//! - Under `SuppressWhileEditing`, notifications received while a note is
//!   open are consumed and dropped; nothing replays them on close.
//! - Callers reload explicitly when returning to the list.

use crate::model::note::{Note, NoteCollection};
use crate::notify::{ChangeNotifier, Subscription};
use crate::service::editor::SessionState;
use crate::service::markup::DEFAULT_TITLE;
use crate::store::{NoteStore, StoreResult};
use log::debug;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Ignore changes while the editor is open.
    #[default]
    SuppressWhileEditing,
    /// Reload on every change regardless of editor state.
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No pending notifications.
    Idle,
    Reloaded,
    /// Notifications arrived while editing and were dropped.
    Suppressed { events: usize },
}

pub struct NoteListView<S: NoteStore> {
    store: S,
    notifier: Arc<ChangeNotifier>,
    subscription: Subscription,
    policy: RefreshPolicy,
    notes: NoteCollection,
}

impl<S: NoteStore> NoteListView<S> {
    /// Subscribes to `notifier`. The snapshot stays empty until `reload`.
    pub fn new(store: S, notifier: Arc<ChangeNotifier>, policy: RefreshPolicy) -> Self {
        let subscription = notifier.subscribe();
        Self {
            store,
            notifier,
            subscription,
            policy,
            notes: NoteCollection::new(),
        }
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    pub fn notes(&self) -> &NoteCollection {
        &self.notes
    }

    /// True when the list shows its empty state.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Full re-read of the store into the snapshot.
    pub fn reload(&mut self) -> StoreResult<&NoteCollection> {
        self.notes = self.store.read()?;
        debug!(
            "event=list_reload module=list status=ok notes={}",
            self.notes.len()
        );
        Ok(&self.notes)
    }

    /// Consumes pending notifications and reloads if the policy allows.
    pub fn pump(&mut self, session: &SessionState) -> StoreResult<RefreshOutcome> {
        let events = self.subscription.drain();
        if events == 0 {
            return Ok(RefreshOutcome::Idle);
        }

        if self.policy == RefreshPolicy::SuppressWhileEditing && session.is_editing() {
            debug!("event=list_refresh module=list status=suppressed events={events}");
            return Ok(RefreshOutcome::Suppressed { events });
        }

        self.reload()?;
        Ok(RefreshOutcome::Reloaded)
    }
}

impl<S: NoteStore> Drop for NoteListView<S> {
    fn drop(&mut self) {
        self.notifier.unsubscribe(self.subscription.id());
    }
}

/// Title as shown in the list; blank titles show the default.
pub fn display_title(note: &Note) -> &str {
    if note.title.is_empty() {
        DEFAULT_TITLE
    } else {
        &note.title
    }
}
