//! # Server state and identity.
//!
//! [`State`] is the lifecycle position of one [`StaticServer`](crate::StaticServer):
//!
//! ```text
//! INACTIVE ──start()──► STARTING ──LAUNCHED──► ACTIVE
//! ACTIVE   ──stop()───► STOPPING ──TERMINATED─► INACTIVE
//! STARTING | STOPPING | ACTIVE ──CRASHED / failure──► CRASHED
//! CRASHED  ──start()──► STARTING
//! ```
//!
//! `INACTIVE`, `ACTIVE` and `CRASHED` are **stable**: no operation is in flight.
//! `STARTING` and `STOPPING` are **transient** and only exist while the server's
//! [`Gate`](crate::Gate) is held by the operation that produced them.
//!
//! [`ServerId`] is an opaque identifier drawn from a process-wide counter.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Process-wide id counter (ids start at 1).
static SERVER_SEQ: AtomicU64 = AtomicU64::new(1);

/// Lifecycle state of a managed server instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum State {
    /// Not running, no operation in flight.
    #[default]
    Inactive,
    /// `start()` is in flight, waiting for the `LAUNCHED` signal.
    Starting,
    /// Running and serving.
    Active,
    /// `stop()` is in flight, waiting for the `TERMINATED` signal.
    Stopping,
    /// Crashed or failed to transition; a new `start()` is allowed.
    Crashed,
}

impl State {
    /// True for `INACTIVE`, `ACTIVE` and `CRASHED`.
    #[inline]
    pub fn is_stable(self) -> bool {
        matches!(self, State::Inactive | State::Active | State::Crashed)
    }

    /// Upper-case name, as reported to listeners and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            State::Inactive => "INACTIVE",
            State::Starting => "STARTING",
            State::Active => "ACTIVE",
            State::Stopping => "STOPPING",
            State::Crashed => "CRASHED",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque server identifier, unique for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServerId(u64);

impl ServerId {
    /// Allocates the next id.
    pub(crate) fn next() -> Self {
        Self(SERVER_SEQ.fetch_add(1, AtomicOrdering::Relaxed))
    }

    /// Rebuilds an id received from a transport (e.g. a native event payload).
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value, for handing to a process manager.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
