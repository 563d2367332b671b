//! Error types used by the lifecycle engine.
//!
//! This module defines two error enums:
//!
//! - [`ServerError`] failures of a server operation (`start`, `stop`, construction).
//! - [`RouterError`] fatal protocol violations seen by the signal router.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging.
//! [`ServerError`] is `Clone` so a settled [`Barrier`](crate::Barrier) can hand
//! the same outcome to every waiter.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::state::{ServerId, State};

/// # Errors produced by server operations.
///
/// `UnstableState` and `Internal` are synchronization-bug detectors: they must
/// never surface while every start/stop goes through the server's gate.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServerError {
    /// Invalid server configuration (rejected at construction).
    #[error("invalid configuration: {reason}")]
    Configuration {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// An operation found the server in a transient state.
    #[error("server is in unstable state {state}")]
    UnstableState {
        /// The state observed at the guard.
        state: State,
    },

    /// An internal invariant was violated (e.g. a second live barrier).
    #[error("internal error: {detail}")]
    Internal {
        /// Which invariant broke.
        detail: &'static str,
    },

    /// The process manager (or config writer) call itself failed.
    #[error("process manager failure: {error}")]
    External {
        /// The underlying error message.
        error: String,
    },

    /// The external server reported a crash.
    #[error("native server crashed: {}", .reason.as_deref().unwrap_or("no reason reported"))]
    Crashed {
        /// Optional opaque reason carried by the crash signal.
        reason: Option<Arc<str>>,
    },

    /// No completion signal arrived within the configured bound.
    #[error("no completion signal within {timeout:?}")]
    SignalTimeout {
        /// The configured bound.
        timeout: Duration,
    },
}

impl ServerError {
    /// Shorthand for an [`ServerError::External`] failure.
    pub fn external(error: impl ToString) -> Self {
        ServerError::External {
            error: error.to_string(),
        }
    }

    /// Shorthand for a [`ServerError::Configuration`] failure.
    pub fn configuration(reason: impl Into<String>) -> Self {
        ServerError::Configuration {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use staticvisor::ServerError;
    ///
    /// let err = ServerError::Crashed { reason: None };
    /// assert_eq!(err.as_label(), "server_crashed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ServerError::Configuration { .. } => "server_configuration",
            ServerError::UnstableState { .. } => "server_unstable_state",
            ServerError::Internal { .. } => "server_internal",
            ServerError::External { .. } => "server_external_failure",
            ServerError::Crashed { .. } => "server_crashed",
            ServerError::SignalTimeout { .. } => "server_signal_timeout",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ServerError::Configuration { reason } => format!("configuration: {reason}"),
            ServerError::UnstableState { state } => format!("unstable state: {state}"),
            ServerError::Internal { detail } => format!("internal: {detail}"),
            ServerError::External { error } => format!("external: {error}"),
            ServerError::Crashed { reason } => match reason {
                Some(r) => format!("crashed: {r}"),
                None => "crashed".to_string(),
            },
            ServerError::SignalTimeout { timeout } => format!("signal timeout: {timeout:?}"),
        }
    }

    /// True for the two errors that only a broken synchronization discipline can produce.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            ServerError::UnstableState { .. } | ServerError::Internal { .. }
        )
    }
}

/// # Fatal errors seen by the signal router.
///
/// An external collaborator that emits a signal kind outside
/// `LAUNCHED | TERMINATED | CRASHED` has broken its contract; the router's
/// listener stops and reports this error.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// Unrecognized signal kind.
    #[error("unexpected signal {event:?} for server {server}")]
    UnexpectedSignal {
        /// The raw event name as delivered.
        event: String,
        /// The server the signal was addressed to.
        server: ServerId,
    },
}

impl RouterError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RouterError::UnexpectedSignal { .. } => "router_unexpected_signal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crash_message_carries_reason() {
        let err = ServerError::Crashed {
            reason: Some(Arc::from("bind failed")),
        };
        assert_eq!(err.to_string(), "native server crashed: bind failed");
        assert_eq!(err.as_message(), "crashed: bind failed");

        let bare = ServerError::Crashed { reason: None };
        assert_eq!(bare.to_string(), "native server crashed: no reason reported");
    }

    #[test]
    fn protocol_violations() {
        assert!(ServerError::UnstableState { state: State::Starting }.is_protocol_violation());
        assert!(ServerError::Internal { detail: "x" }.is_protocol_violation());
        assert!(!ServerError::external("boom").is_protocol_violation());
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(ServerError::configuration("x").as_label(), "server_configuration");
        let err = RouterError::UnexpectedSignal {
            event: "EXPLODED".into(),
            server: ServerId::from_raw(7),
        };
        assert_eq!(err.as_label(), "router_unexpected_signal");
        assert_eq!(err.to_string(), "unexpected signal \"EXPLODED\" for server 7");
    }
}
