use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{engine::Engine, registry::ServerRegistry, router::SignalRouter};
use crate::{
    config::EngineConfig,
    lifecycle::AppStateSource,
    process::{ConfigWriter, LighttpdConfig, ProcessManager},
    signals::{SignalBus, SignalReceiver, SignalSender},
};

/// Builder for constructing an [`Engine`].
///
/// The signal bus exists as soon as the builder does, so a process manager can
/// be handed its [`SignalSender`] before the engine is built.
pub struct EngineBuilder {
    cfg: EngineConfig,
    bus: SignalBus,
    receiver: SignalReceiver,
    config_writer: Option<Arc<dyn ConfigWriter>>,
    app_state: Option<AppStateSource>,
}

impl EngineBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: EngineConfig) -> Self {
        let (bus, receiver) = SignalBus::channel();
        Self {
            cfg,
            bus,
            receiver,
            config_writer: None,
            app_state: None,
        }
    }

    /// Sender for the engine's completion signals.
    pub fn signals(&self) -> SignalSender {
        self.bus.sender()
    }

    /// Replaces the default [`LighttpdConfig`] writer.
    pub fn with_config_writer(mut self, writer: Arc<dyn ConfigWriter>) -> Self {
        self.config_writer = Some(writer);
        self
    }

    /// Uses an existing app-state feed instead of a fresh one.
    ///
    /// Lets several engines follow the same host application.
    pub fn with_app_state(mut self, source: AppStateSource) -> Self {
        self.app_state = Some(source);
        self
    }

    /// Builds the engine and spawns its signal router.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn build(self, process: Arc<dyn ProcessManager>) -> Arc<Engine> {
        let registry = ServerRegistry::new();
        let router = SignalRouter::new(Arc::clone(&registry));
        let runtime_token = CancellationToken::new();
        let router_task = Arc::clone(&router).spawn_listener(self.receiver, runtime_token.clone());

        let config_writer = self
            .config_writer
            .unwrap_or_else(|| Arc::new(LighttpdConfig::new()));
        let app_state = self
            .app_state
            .unwrap_or_else(|| AppStateSource::new(self.cfg.app_state_capacity_clamped()));

        Arc::new(Engine::new_internal(
            self.cfg,
            self.bus,
            registry,
            router,
            process,
            config_writer,
            app_state,
            runtime_token,
            router_task,
        ))
    }
}
