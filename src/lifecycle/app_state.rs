//! # Host application state feed.
//!
//! The host pushes every foreground/background transition into an
//! [`AppStateSource`]; each subscribed server bridge observes it.
//!
//! ## Rules
//! - `Active` means foreground; `Background` and `Inactive` both count as "not foreground".
//! - Transitions sent while no bridge is subscribed are dropped.

use std::fmt;

use tokio::sync::broadcast;

/// Host application state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppState {
    /// In foreground.
    Active,
    /// In background.
    Background,
    /// Transitioning or obscured (e.g. an incoming call overlay).
    Inactive,
}

impl AppState {
    /// True only for [`AppState::Active`].
    #[inline]
    pub fn is_foreground(self) -> bool {
        matches!(self, AppState::Active)
    }
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AppState::Active => "active",
            AppState::Background => "background",
            AppState::Inactive => "inactive",
        })
    }
}

/// Broadcast feed of host transitions.
#[derive(Clone, Debug)]
pub struct AppStateSource {
    tx: broadcast::Sender<AppState>,
}

impl AppStateSource {
    /// Creates a feed with the given capacity (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Reports a host transition to every subscribed bridge.
    pub fn notify(&self, state: AppState) {
        let _ = self.tx.send(state);
    }

    /// Creates a receiver for subsequent transitions.
    pub fn subscribe(&self) -> broadcast::Receiver<AppState> {
        self.tx.subscribe()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for AppStateSource {
    fn default() -> Self {
        Self::new(16)
    }
}
