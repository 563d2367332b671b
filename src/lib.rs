//! # staticvisor
//!
//! **Staticvisor** coordinates the lifecycle of an externally managed static
//! file server (lighttpd-style): it serializes start/stop requests, turns the
//! asynchronous "launched / terminated / crashed" notifications of the external
//! process back into awaitable results, and optionally pauses the server while
//! the host application is in the background.
//!
//! The crate never spawns or serves anything itself. Running the actual server
//! is delegated to a [`ProcessManager`] implemented by the host.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   host code                                   external process side
//!       │                                                │
//!       │ start() / stop()                               │ launched / terminated / crashed
//!       ▼                                                ▼
//! ┌────────────────────────────┐               ┌──────────────────┐
//! │ StaticServer               │               │ SignalSender     │
//! │  - Gate (FIFO, one op)     │               └────────┬─────────┘
//! │  - State + StateListeners  │                        ▼
//! │  - Barrier (one per op)  ◄─┼──resolve/reject── SignalBus ──► SignalRouter
//! └──────┬──────────────┬──────┘                                      │
//!        │              │ register / unregister                       │ lookup by id
//!        │              ▼                                             │
//!        │        ServerRegistry ◄────────────────────────────────────┘
//!        │
//!        ├─► ConfigWriter    (renders the server config file)
//!        ├─► ProcessManager  (initiates launch / shutdown)
//!        └─► AppStateSubscription ◄── AppStateSource (foreground / background)
//! ```
//!
//! ### Lifecycle
//! ```text
//! INACTIVE ──start()──► STARTING ──LAUNCHED──► ACTIVE ──stop()──► STOPPING ──TERMINATED──► INACTIVE
//!                          │                     │                   │
//!                          └──── CRASHED / error ┴───────────────────┴──► CRASHED ──start()──► STARTING
//! ```
//!
//! ## Features
//! | Area            | Description                                              | Key types / traits                           |
//! |-----------------|----------------------------------------------------------|----------------------------------------------|
//! | **Engine**      | Isolated context: bus, registry, router, collaborators.  | [`Engine`], [`EngineBuilder`]                |
//! | **Servers**     | State machine and start/stop controller.                 | [`StaticServer`], [`State`]                  |
//! | **Signals**     | Completion notifications from the external process.      | [`SignalSender`], [`Signal`], [`RawSignal`]  |
//! | **Listeners**   | Ordered, exactly-once state change callbacks.            | [`StateListener`], [`ListenerHandle`]        |
//! | **Process**     | Host-provided launcher and config file rendering.        | [`ProcessManager`], [`ConfigWriter`]         |
//! | **App state**   | Pause in background, resume in foreground.               | [`AppStateSource`], [`AppState`]             |
//! | **Errors**      | Typed errors for operations and routing.                 | [`ServerError`], [`RouterError`]             |
//!
//! ## Optional features
//! - `logging`: exports a built-in [`LogWriter`] state listener backed by `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use async_trait::async_trait;
//! use staticvisor::{
//!     ConfigArtifact, Engine, EngineConfig, ProcessManager, ServerConfig, ServerError,
//!     ServerId, SignalSender, State,
//! };
//!
//! /// Pretends to launch the server and reports back immediately.
//! struct Immediate {
//!     signals: SignalSender,
//!     running: Mutex<Option<ServerId>>,
//! }
//!
//! #[async_trait]
//! impl ProcessManager for Immediate {
//!     async fn start(&self, id: ServerId, _config: &ConfigArtifact) -> Result<(), ServerError> {
//!         *self.running.lock().unwrap() = Some(id);
//!         self.signals.launched(id);
//!         Ok(())
//!     }
//!
//!     async fn stop(&self) -> Result<(), ServerError> {
//!         if let Some(id) = self.running.lock().unwrap().take() {
//!             self.signals.terminated(id);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let builder = Engine::builder(EngineConfig::default());
//!     let process = Arc::new(Immediate { signals: builder.signals(), running: Mutex::new(None) });
//!     let engine = builder.build(process);
//!
//!     let server = engine.server(ServerConfig::builder("/srv/www").port(8080).build()?);
//!     server.add_state_listener(|state: State| println!("server is now {state}"));
//!
//!     assert_eq!(server.start().await?, "http://localhost:8080");
//!     server.stop().await?;
//!     assert_eq!(server.state(), State::Inactive);
//!
//!     engine.shutdown().await?;
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod lifecycle;
mod listeners;
mod process;
mod signals;
mod state;
mod sync;

#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use config::{EngineConfig, LOOPBACK_HOSTNAME, ServerConfig, ServerConfigBuilder};
pub use core::{Engine, EngineBuilder, ServerRegistry, SignalRouter, StaticServer};
pub use error::{RouterError, ServerError};
pub use lifecycle::{AppState, AppStateSource, AppStateSubscription};
pub use listeners::{ListenerHandle, StateListener, StateListeners};
pub use process::{ConfigArtifact, ConfigRequest, ConfigWriter, LighttpdConfig, ProcessManager};
pub use signals::{
    RawSignal, Signal, SignalBus, SignalKind, SignalReceiver, SignalSender, UnknownSignalKind,
};
pub use state::{ServerId, State};
pub use sync::{Barrier, Gate, GatePermit};

// Optional: expose a tracing-backed state listener.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use listeners::LogWriter;
