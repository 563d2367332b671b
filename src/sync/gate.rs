//! # Gate: FIFO mutual exclusion for start/stop sequences.
//!
//! A [`Gate`] admits one logical operation at a time. Contenders are suspended
//! cooperatively and admitted strictly in arrival order:
//!
//! ```text
//! acquire() #1 ──► held ─────────────── release() ─┐
//! acquire() #2 ──► queued ─────────────────────────┴► held ── release() ─┐
//! acquire() #3 ──► queued ───────────────────────────────────────────────┴► held
//! ```
//!
//! ## Rules
//! - One gate per server; gates of different servers never block each other.
//! - Not reentrant: acquiring again while holding a permit deadlocks.
//! - Release happens on [`GatePermit::release`] or when the permit is dropped.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Binary FIFO mutex-gate.
///
/// Built on `tokio::sync::Mutex<()>`, which is fair: pending `lock` calls are
/// served in the order they were made.
#[derive(Debug)]
pub struct Gate {
    lock: Arc<Mutex<()>>,
}

/// Proof of holding a [`Gate`]; releases it when dropped.
#[derive(Debug)]
#[must_use = "the gate is released as soon as the permit is dropped"]
pub struct GatePermit {
    _guard: OwnedMutexGuard<()>,
}

impl Gate {
    /// Creates a free gate.
    pub fn new() -> Self {
        Self {
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Suspends until the gate is free, then holds it.
    pub async fn acquire(&self) -> GatePermit {
        GatePermit {
            _guard: Arc::clone(&self.lock).lock_owned().await,
        }
    }

    /// Holds the gate if it is free right now.
    pub fn try_acquire(&self) -> Option<GatePermit> {
        Arc::clone(&self.lock)
            .try_lock_owned()
            .ok()
            .map(|guard| GatePermit { _guard: guard })
    }

    /// True while some operation holds the gate.
    pub fn is_held(&self) -> bool {
        self.lock.try_lock().is_err()
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

impl GatePermit {
    /// Releases the gate, admitting the next queued acquirer (if any).
    pub fn release(self) {
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    #[tokio::test]
    async fn holds_and_releases() {
        let gate = Gate::new();
        let permit = gate.acquire().await;
        assert!(gate.is_held());
        assert!(gate.try_acquire().is_none());
        permit.release();
        assert!(!gate.is_held());
        assert!(gate.try_acquire().is_some());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn admits_in_arrival_order() {
        let gate = Arc::new(Gate::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = gate.acquire().await;
        let mut joins = Vec::new();
        for i in 0..5 {
            let gate = Arc::clone(&gate);
            let order = Arc::clone(&order);
            joins.push(tokio::spawn(async move {
                let _permit = gate.acquire().await;
                order.lock().unwrap().push(i);
                tokio::task::yield_now().await;
            }));
            // Let the task reach the queue before spawning the next one.
            tokio::task::yield_now().await;
        }
        first.release();
        for j in joins {
            j.await.unwrap();
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn never_two_holders() {
        let gate = Arc::new(Gate::new());
        let inside = Arc::new(std::sync::atomic::AtomicUsize::new(0));

        let mut joins = Vec::new();
        for _ in 0..16 {
            let gate = Arc::clone(&gate);
            let inside = Arc::clone(&inside);
            joins.push(tokio::spawn(async move {
                let _permit = gate.acquire().await;
                let now = inside.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                assert_eq!(now, 0);
                tokio::time::sleep(Duration::from_millis(1)).await;
                inside.fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
            }));
        }
        for j in joins {
            j.await.unwrap();
        }
    }
}
