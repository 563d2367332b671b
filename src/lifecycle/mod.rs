//! Host application foreground/background integration.
//!
//! - [`AppState`], [`AppStateSource`] the host's transition feed
//! - [`AppStateSubscription`] per-server bridge that soft-stops on background
//!   and restarts on foreground

mod app_state;
mod bridge;

pub use app_state::{AppState, AppStateSource};
pub use bridge::AppStateSubscription;
