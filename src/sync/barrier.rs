//! # Barrier: one-shot correlation of an asynchronous completion.
//!
//! A [`Barrier`] stands for exactly one pending expectation, e.g. "the external
//! server reports `LAUNCHED`". The operation that triggers the external side
//! effect creates the barrier **right before** that call and waits on it; the
//! signal router later settles it.
//!
//! ```text
//! start()                         SignalRouter
//!   ├─ barrier = Barrier::new()
//!   ├─ process.start(id, cfg) ───────► (external) ───► LAUNCHED
//!   ├─ barrier.wait() ◄───────────────────────────────── barrier.resolve()
//!   └─ drop(barrier)
//! ```
//!
//! ## Rules
//! - The first `resolve`/`reject` wins and returns `true`; later calls are
//!   no-ops returning `false`.
//! - `wait` may be called any number of times, from any number of tasks;
//!   every waiter observes the identical outcome.
//! - Clones share the same underlying state.

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::ServerError;

type Outcome = Option<Result<(), ServerError>>;

/// One-shot, multi-waiter completion primitive.
#[derive(Clone, Debug)]
pub struct Barrier {
    tx: Arc<watch::Sender<Outcome>>,
}

impl Barrier {
    /// Creates an unsettled barrier.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Settles the barrier with success. Returns `false` if it was already settled.
    pub fn resolve(&self) -> bool {
        self.settle(Ok(()))
    }

    /// Settles the barrier with `err`. Returns `false` if it was already settled.
    pub fn reject(&self, err: ServerError) -> bool {
        self.settle(Err(err))
    }

    /// True once `resolve` or `reject` has been called.
    pub fn is_settled(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Suspends until the barrier is settled and returns its outcome.
    pub async fn wait(&self) -> Result<(), ServerError> {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        match rx.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone().unwrap_or(Ok(())),
            Err(_closed) => Err(ServerError::Internal {
                detail: "barrier dropped before settling",
            }),
        }
    }

    fn settle(&self, outcome: Result<(), ServerError>) -> bool {
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(outcome);
            true
        })
    }
}

impl Default for Barrier {
    fn default() -> Self {
        Self::new()
    }
}
