//! Runtime core: servers, routing and the engine that ties them together.
//!
//! - [`engine`]: [`Engine`] and its [`EngineBuilder`], one isolated context per host;
//! - [`server`]: [`StaticServer`], the state machine and start/stop controller;
//! - [`registry`]: id-to-server routing table;
//! - [`router`]: applies completion signals to registered servers.

mod builder;
mod engine;
mod registry;
mod router;
pub(crate) mod server;


pub use builder::EngineBuilder;
pub use engine::Engine;
pub use registry::ServerRegistry;
pub use router::SignalRouter;
pub use server::StaticServer;
