//! # Server and engine configuration.
//!
//! Provides [`ServerConfig`] (fixed per server instance) and [`EngineConfig`]
//! (transport capacities of the wiring [`Engine`](crate::Engine)).
//!
//! A server config is built through [`ServerConfig::builder`] and validated by
//! [`ServerConfigBuilder::build`]:
//! - `file_dir` must be non-empty;
//! - a `file://` prefix is stripped;
//! - a relative `file_dir` is resolved against `documents_dir`
//!   (or the current directory when none is given).
//!
//! ## Sentinel values
//! - `port = 0` → allocate an ephemeral port at first start
//! - `signal_timeout = 0s` → wait for completion signals without bound

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ServerError;

/// Hostname used by loopback-only servers.
pub const LOOPBACK_HOSTNAME: &str = "localhost";

/// Fixed configuration of one server instance.
///
/// ## Field semantics
/// - `file_dir`: absolute directory served by the external process
/// - `non_local`: bind to all interfaces (hostname resolved at first start) instead of loopback
/// - `port`: requested port (`0` = allocate once at first start)
/// - `stop_in_background`: soft-stop when the host app goes to background, restart on foreground
/// - `signal_timeout`: bound on each wait for `LAUNCHED`/`TERMINATED` (`0s` = unbounded)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    file_dir: PathBuf,
    non_local: bool,
    port: u16,
    stop_in_background: bool,
    signal_timeout: Duration,
}

impl ServerConfig {
    /// Starts a builder for the given served directory.
    pub fn builder(file_dir: impl Into<PathBuf>) -> ServerConfigBuilder {
        ServerConfigBuilder::new(file_dir)
    }

    /// Absolute served directory.
    pub fn file_dir(&self) -> &Path {
        &self.file_dir
    }

    /// True if the server binds to all interfaces.
    pub fn non_local(&self) -> bool {
        self.non_local
    }

    /// Requested port (`0` = allocate).
    pub fn port(&self) -> u16 {
        self.port
    }

    /// True if the server pauses while the host app is in background.
    pub fn stop_in_background(&self) -> bool {
        self.stop_in_background
    }

    /// Raw signal timeout (`0s` = unbounded).
    pub fn signal_timeout(&self) -> Duration {
        self.signal_timeout
    }

    /// Returns the signal timeout as an `Option`.
    ///
    /// - `None` → wait without bound
    /// - `Some(d)` → each completion wait fails after `d`
    #[inline]
    pub fn signal_timeout_opt(&self) -> Option<Duration> {
        if self.signal_timeout == Duration::ZERO {
            None
        } else {
            Some(self.signal_timeout)
        }
    }
}

/// Fluent builder for [`ServerConfig`].
#[derive(Clone, Debug)]
pub struct ServerConfigBuilder {
    file_dir: PathBuf,
    documents_dir: Option<PathBuf>,
    non_local: bool,
    port: u16,
    stop_in_background: bool,
    signal_timeout: Duration,
}

impl ServerConfigBuilder {
    /// Creates a builder with loopback binding, auto port, no background pause, no timeout.
    pub fn new(file_dir: impl Into<PathBuf>) -> Self {
        Self {
            file_dir: file_dir.into(),
            documents_dir: None,
            non_local: false,
            port: 0,
            stop_in_background: false,
            signal_timeout: Duration::ZERO,
        }
    }

    /// Base directory for a relative `file_dir`.
    pub fn documents_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.documents_dir = Some(dir.into());
        self
    }

    pub fn non_local(mut self, non_local: bool) -> Self {
        self.non_local = non_local;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn stop_in_background(mut self, enabled: bool) -> Self {
        self.stop_in_background = enabled;
        self
    }

    pub fn signal_timeout(mut self, timeout: Duration) -> Self {
        self.signal_timeout = timeout;
        self
    }

    /// Validates and builds the config.
    ///
    /// Fails with [`ServerError::Configuration`] on an empty `file_dir` or when
    /// the current directory cannot be determined for a relative one.
    pub fn build(self) -> Result<ServerConfig, ServerError> {
        let file_dir = resolve_file_dir(&self.file_dir, self.documents_dir.as_deref())?;
        Ok(ServerConfig {
            file_dir,
            non_local: self.non_local,
            port: self.port,
            stop_in_background: self.stop_in_background,
            signal_timeout: self.signal_timeout,
        })
    }
}

fn resolve_file_dir(raw: &Path, documents_dir: Option<&Path>) -> Result<PathBuf, ServerError> {
    let text = raw.to_string_lossy();
    if text.is_empty() {
        return Err(ServerError::configuration("`file_dir` must be a non-empty path"));
    }
    let path = match text.strip_prefix("file://") {
        Some(rest) if !rest.is_empty() => PathBuf::from(rest),
        Some(_) => return Err(ServerError::configuration("`file_dir` must be a non-empty path")),
        None => raw.to_path_buf(),
    };
    if path.is_absolute() {
        return Ok(path);
    }
    let base = match documents_dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().map_err(|e| {
            ServerError::configuration(format!("cannot resolve relative `file_dir`: {e}"))
        })?,
    };
    Ok(base.join(path))
}

/// Capacities of the engine's internal channels.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Ring buffer size of the app-state broadcast (min 1).
    pub app_state_capacity: usize,
}

impl EngineConfig {
    /// Returns the app-state capacity clamped to a minimum of 1.
    #[inline]
    pub fn app_state_capacity_clamped(&self) -> usize {
        self.app_state_capacity.max(1)
    }
}

impl Default for EngineConfig {
    /// - `app_state_capacity = 16`
    fn default() -> Self {
        Self {
            app_state_capacity: 16,
        }
    }
}
