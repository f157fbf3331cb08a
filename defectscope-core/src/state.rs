//! Reactive state store
//!
//! Single source of truth for pipeline-relevant values, decoupling
//! producers (importer, analytics) from consumers via typed keys.
//!
//! ## Model
//!
//! ```text
//! set_state(..) ──► queue ──► tick() ──► change detection ──► notify
//!                  (FIFO)   (one per    (no-op updates       (per-key,
//!                            tick)       dropped)             in order)
//! ```
//!
//! - Updates are merge batches: a list of key/value pairs tagged with an
//!   origin label. They queue in FIFO order and exactly one batch is
//!   applied per [`StateStore::tick`], so the queue can lag under update
//!   pressure; that is accepted, since updates are idempotent merges.
//! - Change detection: scalar values compare by equality; JSON objects
//!   compare top-level key by key. Callers must replace whole objects
//!   rather than mutate nested fields — nested changes behind an
//!   unchanged top-level entry are not detected.
//! - Subscribers for a key run in registration order with the new value.
//!   A callback error is logged and does not stop later subscribers or
//!   clear the queue. There is no cross-key atomicity: a subscriber must
//!   re-read whatever other keys it needs.
//! - Single-threaded by design (`Rc`/`RefCell`, not `Sync`): construct
//!   one store and pass it by reference. Calling `set_state` from inside
//!   a callback is fine (it enqueues); nested `tick`/`flush` calls are
//!   guarded no-ops.

use crate::error::Result;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// Keys the store manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKey {
    /// The imported issue collection
    Issues,
    /// The derived issue index
    Index,
    /// The derived statistics snapshot
    Statistics,
    /// Timestamp of the last successful import
    DataUpdated,
    /// Pipeline status label ("empty", "loaded", ...)
    DataStatus,
    /// UI theme name
    Theme,
}

impl StateKey {
    /// Identifier used in logs and the snapshot store.
    pub fn as_str(&self) -> &'static str {
        match self {
            StateKey::Issues => "issues",
            StateKey::Index => "index",
            StateKey::Statistics => "statistics",
            StateKey::DataUpdated => "data_updated",
            StateKey::DataStatus => "data_status",
            StateKey::Theme => "theme",
        }
    }
}

impl std::fmt::Display for StateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Handle for removing a subscription.
pub type SubscriptionId = u64;

type Callback = Box<dyn FnMut(&Value) -> Result<()>>;

struct Subscriber {
    id: SubscriptionId,
    callback: Rc<RefCell<Callback>>,
}

struct PendingUpdate {
    entries: Vec<(StateKey, Value)>,
    origin: String,
}

/// Keyed publish/subscribe store with a batched update queue.
#[derive(Default)]
pub struct StateStore {
    state: RefCell<HashMap<StateKey, Value>>,
    subscribers: RefCell<HashMap<StateKey, Vec<Subscriber>>>,
    queue: RefCell<VecDeque<PendingUpdate>>,
    next_id: Cell<SubscriptionId>,
    draining: Cell<bool>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a merge update. Nothing is applied until [`Self::tick`].
    ///
    /// `origin` labels the producer in logs ("importer", "dashboard", ...).
    pub fn set_state(&self, entries: Vec<(StateKey, Value)>, origin: &str) {
        tracing::debug!(
            origin,
            keys = ?entries.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
            "State update queued"
        );
        self.queue.borrow_mut().push_back(PendingUpdate {
            entries,
            origin: origin.to_string(),
        });
    }

    /// Enqueue a single-key update.
    pub fn set(&self, key: StateKey, value: Value, origin: &str) {
        self.set_state(vec![(key, value)], origin);
    }

    /// Register a callback for one key. Callbacks run in registration
    /// order; an `Err` is logged and skipped past.
    pub fn subscribe<F>(&self, key: StateKey, callback: F) -> SubscriptionId
    where
        F: FnMut(&Value) -> Result<()> + 'static,
    {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.subscribers
            .borrow_mut()
            .entry(key)
            .or_default()
            .push(Subscriber {
                id,
                callback: Rc::new(RefCell::new(Box::new(callback))),
            });
        id
    }

    /// Remove a subscription. Returns false when it was already gone.
    pub fn unsubscribe(&self, key: StateKey, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        let Some(list) = subscribers.get_mut(&key) else {
            return false;
        };
        let before = list.len();
        list.retain(|s| s.id != id);
        before != list.len()
    }

    /// Current value for a key, if set.
    pub fn get(&self, key: StateKey) -> Option<Value> {
        self.state.borrow().get(&key).cloned()
    }

    /// Copy of the full state map.
    pub fn snapshot(&self) -> HashMap<StateKey, Value> {
        self.state.borrow().clone()
    }

    /// Number of queued, not yet applied updates.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Apply at most one queued update and notify subscribers of the
    /// keys that actually changed. Returns false when the queue was
    /// empty or a drain is already in progress.
    pub fn tick(&self) -> bool {
        if self.draining.get() {
            return false;
        }
        let Some(update) = self.queue.borrow_mut().pop_front() else {
            return false;
        };
        self.draining.set(true);

        let mut changed: Vec<(StateKey, Value)> = Vec::new();
        {
            let mut state = self.state.borrow_mut();
            for (key, value) in update.entries {
                if value_changed(state.get(&key), &value) {
                    state.insert(key, value.clone());
                    changed.push((key, value));
                } else {
                    tracing::debug!(
                        key = key.as_str(),
                        origin = %update.origin,
                        "State update is a no-op"
                    );
                }
            }
        }

        for (key, value) in &changed {
            tracing::debug!(key = key.as_str(), origin = %update.origin, "State changed");

            // Callbacks are cloned out first so they can subscribe or
            // enqueue updates without hitting an active borrow.
            let callbacks: Vec<(SubscriptionId, Rc<RefCell<Callback>>)> = self
                .subscribers
                .borrow()
                .get(key)
                .map(|list| {
                    list.iter()
                        .map(|s| (s.id, Rc::clone(&s.callback)))
                        .collect()
                })
                .unwrap_or_default();

            for (id, callback) in callbacks {
                if let Err(e) = (callback.borrow_mut())(value) {
                    tracing::warn!(
                        key = key.as_str(),
                        subscription = id,
                        error = %e,
                        "Subscriber callback failed"
                    );
                }
            }
        }

        self.draining.set(false);
        true
    }

    /// Drain the queue, including updates enqueued by callbacks along
    /// the way.
    pub fn flush(&self) {
        while self.tick() {}
    }
}

/// Change detection: equality for scalars, top-level key-by-key
/// comparison for objects.
fn value_changed(old: Option<&Value>, new: &Value) -> bool {
    let Some(old) = old else {
        return true;
    };
    match (old, new) {
        (Value::Object(old_map), Value::Object(new_map)) => {
            if old_map.len() != new_map.len() {
                return true;
            }
            old_map
                .iter()
                .any(|(key, value)| new_map.get(key) != Some(value))
        }
        _ => old != new,
    }
}
