//! Out-of-band completion signals: types and lossless transport.
//!
//! The external process manager reports `LAUNCHED`, `TERMINATED` and `CRASHED`
//! asynchronously, tagged with the server id. They travel as string-tagged
//! [`RawSignal`] envelopes over a [`SignalBus`], the way a native event emitter
//! would deliver them, and are parsed into typed [`Signal`]s by the router.
//!
//! ## Contents
//! - [`SignalKind`], [`Signal`], [`RawSignal`] signal data model
//! - [`SignalBus`], [`SignalReceiver`] lossless single-consumer channel over `tokio::sync::mpsc`
//! - [`SignalSender`] producer handle given to process managers
//!
//! ## Quick reference
//! - **Publishers**: [`ProcessManager`](crate::ProcessManager) implementations via [`SignalSender`].
//! - **Consumer**: [`SignalRouter::spawn_listener`](crate::SignalRouter::spawn_listener).

mod bus;
mod signal;

pub use bus::{SignalBus, SignalReceiver, SignalSender};
pub use signal::{RawSignal, Signal, SignalKind, UnknownSignalKind};
