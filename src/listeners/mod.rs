//! # State listeners for server transitions.
//!
//! This module provides the [`StateListener`] trait, the [`StateListeners`]
//! observer collection owned by every server, and (with the `logging` feature)
//! the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! StaticServer::set_state(new)
//!        │  (serialized with the state change)
//!        ▼
//! StateListeners::publish(new)
//!        ├──► listener #1.on_state(new)
//!        ├──► listener #2.on_state(new)
//!        └──► listener #N.on_state(new)      (subscription order)
//! ```
//!
//! Any `Fn(State) + Send + Sync + 'static` closure is a listener.
//!
//! ## Implementing custom listeners
//! ```no_run
//! use staticvisor::{State, StateListener};
//!
//! struct CrashAlert;
//!
//! impl StateListener for CrashAlert {
//!     fn on_state(&self, state: State) {
//!         if state == State::Crashed {
//!             // page someone
//!         }
//!     }
//! }
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::{ListenerHandle, StateListener, StateListeners};
