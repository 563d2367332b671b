//! # App-state bridge: pause in background, resume in foreground.
//!
//! ```text
//! AppStateSource ──► bridge task ──► Background/Inactive ──► server.soft_stop()
//!                        │        └─► Active             ──► server.resume()
//!                        └─ cancelled by AppStateSubscription::remove()
//! ```
//!
//! ## Rules
//! - Both calls go through the server's gate, so they queue behind (and ahead of)
//!   caller-issued start/stop instead of interleaving.
//! - A foreground resume that was queued before a hard stop does nothing, and
//!   the bridge never re-subscribes a server.
//! - Each transition runs to completion before the next one is read; cancellation
//!   is only observed while idle.
//! - The task holds a weak server reference and exits once the server is gone.
//! - Failures have no caller to return to; they are logged.
//! - Dropping the subscription cancels the bridge.

use std::sync::Weak;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::StaticServer;
use crate::lifecycle::{AppState, AppStateSource};

const BRIDGE_TARGET: &str = "staticvisor::lifecycle";

/// Live bridge between an [`AppStateSource`] and one server.
#[derive(Debug)]
pub struct AppStateSubscription {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl AppStateSubscription {
    /// Subscribes `server` to `source` and spawns the bridge task.
    pub(crate) fn spawn(source: &AppStateSource, server: Weak<StaticServer>) -> Self {
        let mut rx = source.subscribe();
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let join = tokio::spawn(async move {
            loop {
                let state = tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Ok(state) => state,
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(target: BRIDGE_TARGET, skipped, "app state feed lagged");
                            continue;
                        }
                    }
                };
                let Some(server) = server.upgrade() else { break };
                apply(&server, state).await;
            }
            debug!(target: BRIDGE_TARGET, "app state bridge exited");
        });

        Self { cancel, join }
    }

    /// Stops the bridge; no further transitions are applied once it is idle.
    ///
    /// Dropping the subscription has the same effect.
    pub fn remove(self) {
        drop(self);
    }

    /// True once the bridge task has exited.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

impl Drop for AppStateSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn apply(server: &std::sync::Arc<StaticServer>, state: AppState) {
    debug!(target: BRIDGE_TARGET, server = %server.id(), app_state = %state, "app state changed");
    let res = if state.is_foreground() {
        server.resume().await.map(|_origin| ())
    } else {
        server.soft_stop().await
    };
    if let Err(err) = res {
        warn!(
            target: BRIDGE_TARGET,
            server = %server.id(),
            app_state = %state,
            error = %err,
            label = err.as_label(),
            "automatic transition failed"
        );
    }
}
