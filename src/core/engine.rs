//! # Engine: one isolated lifecycle context.
//!
//! An [`Engine`] bundles everything servers share: the signal bus, the
//! [`ServerRegistry`], the running [`SignalRouter`], the process manager, the
//! config writer and the app-state feed. Engines never share state, so tests
//! (or several hosts in one process) can run side by side.
//!
//! ```text
//! EngineBuilder::new(cfg)
//!   ├─► signals()  ──► SignalSender (hand to the process manager)
//!   └─► build(process)
//!         ├─► ServerRegistry
//!         ├─► SignalRouter::spawn_listener(bus, runtime_token)
//!         └─► Engine
//!               ├─► server(config) ──► StaticServer
//!               └─► shutdown()     ──► cancel router, join it
//! ```

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::builder::EngineBuilder;
use super::server::{ServerContext, StaticServer};
use super::{registry::ServerRegistry, router::SignalRouter};
use crate::config::{EngineConfig, ServerConfig};
use crate::error::RouterError;
use crate::lifecycle::AppStateSource;
use crate::process::{ConfigWriter, ProcessManager};
use crate::signals::{SignalBus, SignalSender};
use crate::sync::lock;

const ENGINE_TARGET: &str = "staticvisor::engine";

/// Shared lifecycle context for a family of [`StaticServer`]s.
pub struct Engine {
    cfg: EngineConfig,
    bus: SignalBus,
    registry: Arc<ServerRegistry>,
    router: Arc<SignalRouter>,
    ctx: ServerContext,
    runtime_token: CancellationToken,
    router_task: Mutex<Option<JoinHandle<Result<(), RouterError>>>>,
}

impl Engine {
    /// Returns a builder; see [`EngineBuilder`].
    pub fn builder(cfg: EngineConfig) -> EngineBuilder {
        EngineBuilder::new(cfg)
    }

    #[allow(clippy::too_many_arguments)]
    pub(super) fn new_internal(
        cfg: EngineConfig,
        bus: SignalBus,
        registry: Arc<ServerRegistry>,
        router: Arc<SignalRouter>,
        process: Arc<dyn ProcessManager>,
        config_writer: Arc<dyn ConfigWriter>,
        app_state: AppStateSource,
        runtime_token: CancellationToken,
        router_task: JoinHandle<Result<(), RouterError>>,
    ) -> Self {
        let ctx = ServerContext {
            registry: Arc::clone(&registry),
            process,
            config_writer,
            app_state,
        };
        Self {
            cfg,
            bus,
            registry,
            router,
            ctx,
            runtime_token,
            router_task: Mutex::new(Some(router_task)),
        }
    }

    /// Creates a new, `INACTIVE` server bound to this engine.
    ///
    /// The server joins the registry on its first `start()`.
    pub fn server(&self, config: ServerConfig) -> Arc<StaticServer> {
        let server = StaticServer::new(config, self.ctx.clone());
        debug!(target: ENGINE_TARGET, server = %server.id(), dir = %server.file_dir().display(), "server created");
        server
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Sender for completion signals.
    pub fn signals(&self) -> SignalSender {
        self.bus.sender()
    }

    /// App-state feed driving servers created with `stop_in_background`.
    pub fn app_state(&self) -> &AppStateSource {
        &self.ctx.app_state
    }

    pub fn registry(&self) -> &Arc<ServerRegistry> {
        &self.registry
    }

    pub fn router(&self) -> &Arc<SignalRouter> {
        &self.router
    }

    /// The registered server currently starting, running or stopping, if any.
    pub async fn active_server(&self) -> Option<Arc<StaticServer>> {
        self.registry.active().await
    }

    /// False once the router stopped (shutdown, closed bus or fatal signal).
    pub fn is_router_running(&self) -> bool {
        lock(&self.router_task)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Stops the router and reports how it ended.
    ///
    /// Returns the fatal [`RouterError`] if an unknown signal aborted it.
    /// Later calls return `Ok(())`.
    pub async fn shutdown(&self) -> Result<(), RouterError> {
        self.runtime_token.cancel();
        let task = lock(&self.router_task).take();
        let Some(task) = task else {
            return Ok(());
        };
        match task.await {
            Ok(res) => res,
            Err(join_err) => {
                warn!(target: ENGINE_TARGET, error = %join_err, "router task did not finish cleanly");
                Ok(())
            }
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.runtime_token.cancel();
    }
}
