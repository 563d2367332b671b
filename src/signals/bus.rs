//! # Signal bus: lossless transport for completion signals.
//!
//! [`SignalBus`] is a thin wrapper around an unbounded [`tokio::sync::mpsc`]
//! channel carrying [`RawSignal`] envelopes from process managers to the one
//! router of an engine.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                 Consumer (one per engine):
//!   ProcessManager ──┐
//!   native thread  ──┼──► SignalBus ───► SignalReceiver ───► SignalRouter ───► ServerRegistry
//!   test harness   ──┘    (mpsc)
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks and never waits for the router.
//! - **Lossless**: every published signal is delivered exactly once, in publish order,
//!   while the receiver is alive. A signal the router never sees would leave a
//!   start/stop waiting on its barrier.
//! - **Single consumer**: [`SignalBus::channel`] hands out the only receiver.

use tokio::sync::mpsc;

use super::signal::{RawSignal, Signal, SignalKind};
use crate::state::ServerId;

/// Producer side of the signal channel.
///
/// Cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct SignalBus {
    tx: mpsc::UnboundedSender<RawSignal>,
}

/// Consumer side of the signal channel; owned by the router listener.
#[derive(Debug)]
pub struct SignalReceiver {
    rx: mpsc::UnboundedReceiver<RawSignal>,
}

impl SignalBus {
    /// Creates a bus and its only receiver.
    pub fn channel() -> (Self, SignalReceiver) {
        let (tx, rx) = mpsc::unbounded_channel::<RawSignal>();
        (Self { tx }, SignalReceiver { rx })
    }

    /// Publishes an envelope. Dropped only if the receiver is gone (engine shut down).
    pub fn publish(&self, sig: RawSignal) {
        let _ = self.tx.send(sig);
    }

    /// Returns a producer handle for process managers.
    pub fn sender(&self) -> SignalSender {
        SignalSender { bus: self.clone() }
    }
}

impl SignalReceiver {
    /// Next signal; `None` once every bus handle is dropped and the queue is drained.
    pub async fn recv(&mut self) -> Option<RawSignal> {
        self.rx.recv().await
    }
}

/// Producer-side handle over a [`SignalBus`].
#[derive(Clone, Debug)]
pub struct SignalSender {
    bus: SignalBus,
}

impl SignalSender {
    /// Reports that server `id` is up.
    pub fn launched(&self, id: ServerId) {
        self.bus.publish(Signal::new(SignalKind::Launched, id).into());
    }

    /// Reports that server `id` shut down.
    pub fn terminated(&self, id: ServerId) {
        self.bus.publish(Signal::new(SignalKind::Terminated, id).into());
    }

    /// Reports that server `id` crashed, with an optional reason.
    pub fn crashed(&self, id: ServerId, reason: Option<&str>) {
        let mut sig = Signal::new(SignalKind::Crashed, id);
        if let Some(r) = reason {
            sig = sig.with_reason(r);
        }
        self.bus.publish(sig.into());
    }

    /// Forwards an envelope as received from a native transport.
    pub fn raw(&self, sig: RawSignal) {
        self.bus.publish(sig);
    }
}
