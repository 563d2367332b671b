//! # Signals reported by the external process manager.
//!
//! A signal is delivered "eventually, exactly once" per underlying event, with
//! no ordering guarantee relative to the call that caused it.
//!
//! ## Example
//! ```rust
//! use staticvisor::{RawSignal, ServerId, SignalKind};
//!
//! let raw = RawSignal::new("CRASHED", ServerId::from_raw(3)).with_reason("segfault");
//! let sig = raw.parse().unwrap();
//! assert_eq!(sig.kind, SignalKind::Crashed);
//! assert_eq!(sig.reason.as_deref(), Some("segfault"));
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::RouterError;
use crate::state::ServerId;

/// Classification of completion signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// The external server is up and listening.
    Launched,
    /// The external server has shut down.
    Terminated,
    /// The external server crashed (or failed to launch).
    Crashed,
}

impl SignalKind {
    /// Wire name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            SignalKind::Launched => "LAUNCHED",
            SignalKind::Terminated => "TERMINATED",
            SignalKind::Crashed => "CRASHED",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a wire name is not a known [`SignalKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSignalKind;

impl FromStr for SignalKind {
    type Err = UnknownSignalKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LAUNCHED" => Ok(SignalKind::Launched),
            "TERMINATED" => Ok(SignalKind::Terminated),
            "CRASHED" => Ok(SignalKind::Crashed),
            _ => Err(UnknownSignalKind),
        }
    }
}

/// Typed signal addressed to one server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    /// What happened.
    pub kind: SignalKind,
    /// Which server it happened to.
    pub server: ServerId,
    /// Optional opaque crash reason.
    pub reason: Option<Arc<str>>,
}

impl Signal {
    pub fn new(kind: SignalKind, server: ServerId) -> Self {
        Self {
            kind,
            server,
            reason: None,
        }
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// String-tagged signal envelope, as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSignal {
    /// Wire name of the event (`"LAUNCHED"`, `"TERMINATED"`, `"CRASHED"`).
    pub event: Arc<str>,
    /// Target server.
    pub server: ServerId,
    /// Optional opaque crash reason.
    pub reason: Option<Arc<str>>,
}

impl RawSignal {
    pub fn new(event: impl Into<Arc<str>>, server: ServerId) -> Self {
        Self {
            event: event.into(),
            server,
            reason: None,
        }
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Parses the envelope into a typed [`Signal`].
    ///
    /// An unknown event name is a contract violation of the sender and yields
    /// [`RouterError::UnexpectedSignal`].
    pub fn parse(&self) -> Result<Signal, RouterError> {
        let kind = self
            .event
            .parse::<SignalKind>()
            .map_err(|_| RouterError::UnexpectedSignal {
                event: self.event.to_string(),
                server: self.server,
            })?;
        Ok(Signal {
            kind,
            server: self.server,
            reason: self.reason.clone(),
        })
    }
}

impl From<Signal> for RawSignal {
    fn from(sig: Signal) -> Self {
        Self {
            event: Arc::from(sig.kind.as_str()),
            server: sig.server,
            reason: sig.reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names() {
        for kind in [SignalKind::Launched, SignalKind::Terminated, SignalKind::Crashed] {
            assert_eq!(kind.as_str().parse::<SignalKind>(), Ok(kind));
        }
        assert!("launched".parse::<SignalKind>().is_err());
    }

    #[test]
    fn unknown_event_is_rejected() {
        let id = ServerId::from_raw(11);
        let err = RawSignal::new("PAUSED", id).parse().unwrap_err();
        assert_eq!(
            err,
            RouterError::UnexpectedSignal {
                event: "PAUSED".into(),
                server: id,
            }
        );
    }

    #[test]
    fn typed_signal_converts_to_envelope() {
        let id = ServerId::from_raw(5);
        let raw = RawSignal::from(Signal::new(SignalKind::Terminated, id));
        assert_eq!(&*raw.event, "TERMINATED");
        assert_eq!(raw.parse().unwrap(), Signal::new(SignalKind::Terminated, id));
    }
}
