//! External collaborators of the lifecycle engine.
//!
//! The engine never serves files itself. It drives:
//! - a [`ProcessManager`] that resolves networking parameters and starts/stops
//!   the external server, reporting completion later through signals;
//! - a [`ConfigWriter`] that turns `(file_dir, hostname, port)` into an opaque
//!   [`ConfigArtifact`] consumed by `ProcessManager::start`.
//!
//! [`LighttpdConfig`] is the default writer; it produces a lighttpd config file.

mod config_file;
mod manager;

pub use config_file::{ConfigArtifact, ConfigRequest, ConfigWriter, LighttpdConfig};
pub use manager::ProcessManager;
