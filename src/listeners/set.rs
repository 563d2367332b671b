//! # StateListeners: ordered, synchronous fan-out of state changes.
//!
//! ## What it guarantees
//! - Every published state reaches every current listener exactly once.
//! - Listeners are called in subscription order.
//! - A listener removed before a publish is not called by it.
//! - Panics inside listeners are caught and logged (isolation).
//!
//! ## What it does **not** guarantee
//! - Ordering across concurrent `publish` calls; the owning server serializes them.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, Weak};

use tracing::error;

use crate::state::State;
use crate::sync::lock;

/// Contract for state observers.
///
/// Called synchronously on the task performing the transition; implementations
/// should be quick and must not block.
pub trait StateListener: Send + Sync + 'static {
    /// Handle one transition to `state`.
    fn on_state(&self, state: State);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<F> StateListener for F
where
    F: Fn(State) + Send + Sync + 'static,
{
    fn on_state(&self, state: State) {
        self(state)
    }
}

#[derive(Default)]
struct Entries {
    next_id: u64,
    list: Vec<(u64, Arc<dyn StateListener>)>,
}

impl Entries {
    fn remove(&mut self, id: u64) -> bool {
        let before = self.list.len();
        self.list.retain(|(eid, _)| *eid != id);
        self.list.len() != before
    }
}

/// Observer collection of one server.
#[derive(Default)]
pub struct StateListeners {
    entries: Arc<Mutex<Entries>>,
}

/// Returned by [`StateListeners::subscribe`]; removes the listener on demand.
///
/// Dropping the handle does **not** unsubscribe.
#[derive(Debug, Clone)]
pub struct ListenerHandle {
    id: u64,
    owner: Weak<Mutex<Entries>>,
}

impl StateListeners {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener; it sees every later publish until removed.
    pub fn subscribe<L: StateListener>(&self, listener: L) -> ListenerHandle {
        let mut entries = lock(&self.entries);
        let id = entries.next_id;
        entries.next_id += 1;
        entries.list.push((id, Arc::new(listener)));
        ListenerHandle {
            id,
            owner: Arc::downgrade(&self.entries),
        }
    }

    /// Removes the listener behind `handle`. Returns `false` if it was already gone
    /// or belongs to another collection.
    pub fn unsubscribe(&self, handle: &ListenerHandle) -> bool {
        let same_owner = handle
            .owner
            .upgrade()
            .is_some_and(|owner| Arc::ptr_eq(&owner, &self.entries));
        same_owner && lock(&self.entries).remove(handle.id)
    }

    /// Delivers `state` to every current listener, in subscription order.
    pub fn publish(&self, state: State) {
        let snapshot: Vec<Arc<dyn StateListener>> = lock(&self.entries)
            .list
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();

        for listener in snapshot {
            if let Err(panic_err) = catch_unwind(AssertUnwindSafe(|| listener.on_state(state))) {
                error!(
                    listener = listener.name(),
                    state = %state,
                    panic = ?panic_err,
                    "state listener panicked"
                );
            }
        }
    }

    /// Number of listeners.
    pub fn len(&self) -> usize {
        lock(&self.entries).list.len()
    }

    /// True if there are no listeners.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ListenerHandle {
    /// Removes the listener. Returns `false` if it was already removed.
    pub fn remove(&self) -> bool {
        match self.owner.upgrade() {
            Some(owner) => lock(&owner).remove(self.id),
            None => false,
        }
    }
}
