//! Scripted collaborators for engine tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{EngineConfig, ServerConfig, ServerConfigBuilder};
use crate::core::{Engine, StaticServer};
use crate::error::ServerError;
use crate::process::{ConfigArtifact, ConfigRequest, ConfigWriter, ProcessManager};
use crate::signals::SignalSender;
use crate::state::{ServerId, State};
use crate::sync::lock;

pub(crate) const FAKE_IP: &str = "192.168.1.23";
pub(crate) const FAKE_PORT: u16 = 43210;

/// What the fake does when asked to start.
#[derive(Debug, Clone)]
pub(crate) enum OnStart {
    Launch,
    Crash(&'static str),
    Fail,
    Silent,
}

/// What the fake does when asked to stop.
#[derive(Debug, Clone)]
pub(crate) enum OnStop {
    Terminate,
    Crash,
    Fail,
}

pub(crate) struct FakeProcessManager {
    signals: SignalSender,
    on_start: Mutex<OnStart>,
    on_stop: Mutex<OnStop>,
    delay: Mutex<Duration>,
    running: Mutex<Option<ServerId>>,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    pub ip_queries: AtomicUsize,
    pub port_queries: AtomicUsize,
}

impl FakeProcessManager {
    pub fn new(signals: SignalSender) -> Arc<Self> {
        Arc::new(Self {
            signals,
            on_start: Mutex::new(OnStart::Launch),
            on_stop: Mutex::new(OnStop::Terminate),
            delay: Mutex::new(Duration::ZERO),
            running: Mutex::new(None),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
            ip_queries: AtomicUsize::new(0),
            port_queries: AtomicUsize::new(0),
        })
    }

    pub fn on_start(&self, script: OnStart) {
        *lock(&self.on_start) = script;
    }

    pub fn on_stop(&self, script: OnStop) {
        *lock(&self.on_stop) = script;
    }

    /// Delays every emitted signal.
    pub fn signal_delay(&self, delay: Duration) {
        *lock(&self.delay) = delay;
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    fn emit(&self, f: impl FnOnce(&SignalSender) + Send + 'static) {
        let delay = *lock(&self.delay);
        let signals = self.signals.clone();
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            f(&signals);
        });
    }
}

#[async_trait]
impl ProcessManager for FakeProcessManager {
    async fn local_ip_address(&self) -> Result<String, ServerError> {
        self.ip_queries.fetch_add(1, Ordering::SeqCst);
        Ok(FAKE_IP.to_string())
    }

    async fn open_port(&self) -> Result<u16, ServerError> {
        self.port_queries.fetch_add(1, Ordering::SeqCst);
        Ok(FAKE_PORT)
    }

    async fn start(&self, id: ServerId, _config: &ConfigArtifact) -> Result<(), ServerError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        let script = lock(&self.on_start).clone();
        match script {
            OnStart::Launch => {
                *lock(&self.running) = Some(id);
                self.emit(move |s| s.launched(id));
            }
            OnStart::Crash(reason) => self.emit(move |s| s.crashed(id, Some(reason))),
            OnStart::Fail => return Err(ServerError::external("spawn refused")),
            OnStart::Silent => {}
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), ServerError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        let script = lock(&self.on_stop).clone();
        let Some(id) = lock(&self.running).take() else {
            return Ok(());
        };
        match script {
            OnStop::Terminate => self.emit(move |s| s.terminated(id)),
            OnStop::Crash => self.emit(move |s| s.crashed(id, Some("killed"))),
            OnStop::Fail => return Err(ServerError::external("stop refused")),
        }
        Ok(())
    }
}

/// Config writer that keeps nothing on disk.
#[derive(Default)]
pub(crate) struct MemoryConfigWriter {
    pub writes: AtomicUsize,
    pub removes: AtomicUsize,
    pub last: Mutex<Option<(String, u16)>>,
    write_delay: Mutex<Duration>,
    remove_delay: Mutex<Duration>,
}

impl MemoryConfigWriter {
    /// Delays every `write` (counted on entry).
    pub fn write_delay(&self, delay: Duration) {
        *lock(&self.write_delay) = delay;
    }

    /// Delays every `remove` (counted on entry).
    pub fn remove_delay(&self, delay: Duration) {
        *lock(&self.remove_delay) = delay;
    }
}

#[async_trait]
impl ConfigWriter for MemoryConfigWriter {
    async fn write(&self, req: ConfigRequest<'_>) -> Result<ConfigArtifact, ServerError> {
        let n = self.writes.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last) = Some((req.hostname.to_string(), req.port));
        let delay = *lock(&self.write_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(ConfigArtifact::new(format!("memory-{n}.conf")))
    }

    async fn remove(&self, _artifact: &ConfigArtifact) {
        self.removes.fetch_add(1, Ordering::SeqCst);
        let delay = *lock(&self.remove_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

pub(crate) struct Harness {
    pub engine: Arc<Engine>,
    pub process: Arc<FakeProcessManager>,
    pub writer: Arc<MemoryConfigWriter>,
}

impl Harness {
    pub fn new() -> Self {
        let writer = Arc::new(MemoryConfigWriter::default());
        let builder = Engine::builder(EngineConfig::default()).with_config_writer(writer.clone());
        let process = FakeProcessManager::new(builder.signals());
        let engine = builder.build(process.clone());
        Self {
            engine,
            process,
            writer,
        }
    }

    pub fn server(
        &self,
        build: impl FnOnce(ServerConfigBuilder) -> ServerConfigBuilder,
    ) -> Arc<StaticServer> {
        let cfg = build(ServerConfig::builder("/srv/www"))
            .build()
            .expect("valid test config");
        self.engine.server(cfg)
    }
}

/// Polls until `server` reaches `state`; panics after one second.
pub(crate) async fn wait_for_state(server: &StaticServer, state: State) {
    let res = tokio::time::timeout(Duration::from_secs(1), async {
        while server.state() != state {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await;
    assert!(res.is_ok(), "server stayed {} instead of {}", server.state(), state);
}

/// Polls until `cond` holds; panics after one second.
pub(crate) async fn wait_until(what: &str, cond: impl Fn() -> bool) {
    let res = tokio::time::timeout(Duration::from_secs(1), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await;
    assert!(res.is_ok(), "timed out waiting for {what}");
}

/// Records every state a listener sees.
pub(crate) fn recorder() -> (Arc<Mutex<Vec<State>>>, impl Fn(State) + Send + Sync + 'static) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, move |s| lock(&sink).push(s))
}
