//! Collection-changed broadcast shared by every context.
//!
//! # Responsibility
//! - Fan one invalidation signal out to all live subscribers after a write.
//! - Hand out explicit subscription handles that can be revoked.
//!
//! # Invariants
//! - Events carry no diff; subscribers re-read the store.
//! - A writer that also subscribes receives its own writes; origin is not
//!   tracked.
//! - Handles whose receiving end was dropped are pruned on the next notify.

use log::debug;
use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// The only event: "the collection changed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionChanged;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// Receiving end of one subscription.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    events: Receiver<CollectionChanged>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Consumes every pending event and returns how many there were.
    ///
    /// Several writes collapse into one reload, so callers usually only care
    /// whether this is non-zero.
    pub fn drain(&self) -> usize {
        let mut pending = 0;
        loop {
            match self.events.try_recv() {
                Ok(CollectionChanged) => pending += 1,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return pending,
            }
        }
    }

    /// Blocks up to `timeout` for the next event.
    pub fn wait(&self, timeout: Duration) -> Option<CollectionChanged> {
        self.events.recv_timeout(timeout).ok()
    }
}

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    senders: BTreeMap<SubscriptionId, Sender<CollectionChanged>>,
}

/// Broadcast hub shared (via `Arc`) by the store and all subscribers.
#[derive(Debug, Default)]
pub struct ChangeNotifier {
    registry: Mutex<Registry>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel();
        let mut registry = self.registry();
        let id = SubscriptionId(registry.next_id);
        registry.next_id += 1;
        registry.senders.insert(id, tx);
        debug!("event=subscribe module=notify status=ok subscription={}", id.0);
        Subscription { id, events: rx }
    }

    /// Revokes a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.registry().senders.remove(&id).is_some();
        debug!(
            "event=unsubscribe module=notify status={} subscription={}",
            if removed { "ok" } else { "missing" },
            id.0
        );
        removed
    }

    /// Signals every live subscriber and returns how many were reached.
    pub fn notify(&self) -> usize {
        let mut registry = self.registry();
        registry
            .senders
            .retain(|_, sender| sender.send(CollectionChanged).is_ok());
        let reached = registry.senders.len();
        debug!("event=notify module=notify status=ok reached={reached}");
        reached
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry().senders.len()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
