//! # Signal router - delivers completion signals to servers.
//!
//! Stateless dispatcher over a [`ServerRegistry`].
//!
//! ## Architecture
//! ```text
//! SignalBus → SignalReceiver → SignalRouter listener
//!               ├─► RawSignal::parse()  ── unknown kind ──► abort with RouterError
//!               └─► route(signal)
//!                     ├─ server not registered      → drop (not an error)
//!                     ├─ LAUNCHED | TERMINATED
//!                     │     ├─ barrier armed        → resolve
//!                     │     └─ no barrier           → stray, ignore
//!                     └─ CRASHED
//!                           ├─ barrier unsettled    → reject (in-flight op fails → CRASHED)
//!                           ├─ STARTING | STOPPING  → record (op fails at its next checkpoint)
//!                           └─ steady               → force CRASHED, notify listeners
//! ```

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::core::ServerRegistry;
use crate::core::server::CrashDisposition;
use crate::error::RouterError;
use crate::signals::{RawSignal, Signal, SignalKind, SignalReceiver};

const ROUTER_TARGET: &str = "staticvisor::router";

/// Routes signals to the servers of one registry.
pub struct SignalRouter {
    registry: Arc<ServerRegistry>,
}

impl SignalRouter {
    /// Creates a router over `registry`.
    pub fn new(registry: Arc<ServerRegistry>) -> Arc<Self> {
        Arc::new(Self { registry })
    }

    /// Applies one typed signal.
    pub async fn route(&self, sig: &Signal) {
        let Some(server) = self.registry.get(sig.server).await else {
            debug!(target: ROUTER_TARGET, server = %sig.server, signal = %sig.kind, "signal for untracked server dropped");
            return;
        };

        match sig.kind {
            SignalKind::Launched | SignalKind::Terminated => {
                if !server.complete() {
                    debug!(target: ROUTER_TARGET, server = %sig.server, signal = %sig.kind, "stray signal ignored");
                }
            }
            SignalKind::Crashed => match server.crash(sig.reason.clone()) {
                CrashDisposition::Rejected => {
                    debug!(target: ROUTER_TARGET, server = %sig.server, "crash failed the in-flight operation");
                }
                CrashDisposition::Deferred => {
                    debug!(target: ROUTER_TARGET, server = %sig.server, "crash recorded for the in-flight operation");
                }
                CrashDisposition::Forced => {
                    warn!(
                        target: ROUTER_TARGET,
                        server = %sig.server,
                        reason = sig.reason.as_deref().unwrap_or("unknown"),
                        "server crashed while steady"
                    );
                }
                CrashDisposition::AlreadyCrashed => {
                    debug!(target: ROUTER_TARGET, server = %sig.server, "repeated crash signal ignored");
                }
            },
        }
    }

    /// Parses and applies one envelope; an unknown kind is fatal.
    pub async fn route_raw(&self, raw: &RawSignal) -> Result<(), RouterError> {
        let sig = raw.parse()?;
        self.route(&sig).await;
        Ok(())
    }

    /// Spawns the listener that consumes `rx` until `token` is cancelled or every
    /// bus handle is gone.
    ///
    /// A signal of unknown kind stops the listener; the join handle yields the error.
    pub fn spawn_listener(
        self: Arc<Self>,
        mut rx: SignalReceiver,
        token: CancellationToken,
    ) -> JoinHandle<Result<(), RouterError>> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Some(raw) => {
                            if let Err(err) = self.route_raw(&raw).await {
                                error!(target: ROUTER_TARGET, error = %err, label = err.as_label(), "router aborted");
                                return Err(err);
                            }
                        }
                        None => break,
                    }
                }
            }
            Ok(())
        })
    }
}
