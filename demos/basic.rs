//! # Example: basic
//!
//! Drives one server through its whole lifecycle against a simulated
//! process manager, with every transition logged through `tracing`.
//!
//! Demonstrates how to:
//! - Hand the engine's [`SignalSender`] to a [`ProcessManager`].
//! - Start and stop a [`StaticServer`](staticvisor::StaticServer) and observe its states.
//! - Pause and resume it through the [`AppStateSource`](staticvisor::AppStateSource).
//! - Recover from a crash reported by the external side.
//!
//! ## Flow
//! ```text
//! start() ──► STARTING ──(launched)──► ACTIVE
//! Background ──► STOPPING ──(terminated)──► INACTIVE
//! Active     ──► STARTING ──(launched)──► ACTIVE
//! crashed    ──► CRASHED
//! start()    ──► STARTING ──(launched)──► ACTIVE
//! stop()     ──► STOPPING ──(terminated)──► INACTIVE
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=staticvisor=debug cargo run --example basic --features logging
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use staticvisor::{
    AppState, ConfigArtifact, Engine, EngineConfig, LogWriter, ProcessManager, ServerConfig,
    ServerError, ServerId, SignalSender, State,
};
use tracing_subscriber::EnvFilter;

/// Simulates an external server that takes a moment to come up and go down.
struct SimulatedLighttpd {
    signals: SignalSender,
    running: Mutex<Option<ServerId>>,
    latency: Duration,
}

#[async_trait]
impl ProcessManager for SimulatedLighttpd {
    async fn start(&self, id: ServerId, config: &ConfigArtifact) -> Result<(), ServerError> {
        tracing::info!(server = %id, config = %config.path().display(), "spawning server");
        *self.running.lock().map_err(|_| ServerError::external("poisoned"))? = Some(id);

        let signals = self.signals.clone();
        let latency = self.latency;
        tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            signals.launched(id);
        });
        Ok(())
    }

    async fn stop(&self) -> Result<(), ServerError> {
        let id = self.running.lock().map_err(|_| ServerError::external("poisoned"))?.take();
        if let Some(id) = id {
            let signals = self.signals.clone();
            let latency = self.latency;
            tokio::spawn(async move {
                tokio::time::sleep(latency).await;
                signals.terminated(id);
            });
        }
        Ok(())
    }
}

async fn settle(server: &staticvisor::StaticServer, state: State) {
    while server.state() != state {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 1. Engine with a simulated process manager
    let builder = Engine::builder(EngineConfig::default());
    let process = Arc::new(SimulatedLighttpd {
        signals: builder.signals(),
        running: Mutex::new(None),
        latency: Duration::from_millis(200),
    });
    let engine = builder.build(process);

    // 2. One server, paused while the app is in background
    let site = std::env::temp_dir().join("staticvisor-site");
    tokio::fs::create_dir_all(&site).await?;
    let server = engine.server(ServerConfig::builder(&site).stop_in_background(true).build()?);
    server.add_state_listener(LogWriter::new(server.id()));

    // 3. Start
    let origin = server.start().await?;
    tracing::info!(%origin, "serving {}", site.display());

    // 4. Background / foreground
    engine.app_state().notify(AppState::Background);
    settle(&server, State::Inactive).await;
    engine.app_state().notify(AppState::Active);
    settle(&server, State::Active).await;

    // 5. Crash reported by the external side, then recover
    engine.signals().crashed(server.id(), Some("out of file descriptors"));
    settle(&server, State::Crashed).await;
    server.start().await?;

    // 6. Hard stop and shutdown
    server.stop().await?;
    engine.shutdown().await?;
    Ok(())
}
