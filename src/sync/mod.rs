//! Coordination primitives behind every start/stop sequence.
//!
//! - [`Gate`] FIFO mutual exclusion, one per server
//! - [`Barrier`] one-shot correlation of an external completion signal

mod barrier;
mod gate;

pub use barrier::Barrier;
pub use gate::{Gate, GatePermit};

use std::sync::{Mutex, MutexGuard};

/// Locks a std mutex, recovering the data if a panicking holder poisoned it.
///
/// Every critical section guarded this way leaves its data consistent at each
/// statement, so the value is safe to reuse.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
