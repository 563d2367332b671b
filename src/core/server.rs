//! # StaticServer: state machine and lifecycle controller.
//!
//! A [`StaticServer`] owns one managed lifecycle of the external server: its
//! identity, fixed [`ServerConfig`], current [`State`], the armed [`Barrier`]
//! (if any), a [`Gate`] and its [`StateListeners`].
//!
//! ## Start sequence
//! ```text
//! start()
//!   ├─► gate.acquire()                      (queues behind other start/stop calls)
//!   ├─► stable-state guard                  (transient state here = sync bug)
//!   ├─► ACTIVE? ──► return origin           (no second launch)
//!   ├─► registry.register(self)
//!   ├─► set STARTING, (re)configure app-state bridge
//!   ├─► resolve hostname / port             (first start only)
//!   ├─► config_writer.write(...)
//!   ├─► arm barrier                         (second barrier = internal error)
//!   ├─► process.start(id, artifact)
//!   ├─► barrier.wait()  ◄─── LAUNCHED / CRASHED via SignalRouter
//!   ├─► origin = http://host:port, discard artifact
//!   ├─► crash recorded meanwhile? ──► fail, else set ACTIVE
//!   ├─► on any error: set CRASHED, return error
//!   └─► always: disarm barrier, drop recorded crash, release gate
//! ```
//!
//! ## Stop sequence
//! `soft_stop()` mirrors `start()`: guard, no-op unless `ACTIVE`, set `STOPPING`,
//! arm barrier, `process.stop()`, wait for `TERMINATED`, set `INACTIVE`; errors
//! force `CRASHED`; cleanup always unregisters, disarms and releases.
//! `stop()` additionally drops the app-state bridge first, so no automatic
//! resume happens afterwards. A bridge resume already queued on the gate
//! finds the bridge gone and does nothing.
//!
//! ## Crash signals during an operation
//! - Barrier armed and unsettled: the barrier is rejected, the operation fails.
//! - Otherwise, state still `STARTING`/`STOPPING`: the crash is recorded and the
//!   operation fails at its next checkpoint (before launching, before finalizing).
//! - Otherwise: the state is forced to `CRASHED`.
//!
//! ## Invariants
//! - A barrier is armed only while the gate is held.
//! - Transient states only exist while the gate is held.
//! - Listeners observe every transition exactly once, in order.

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::config::{LOOPBACK_HOSTNAME, ServerConfig};
use crate::core::ServerRegistry;
use crate::error::ServerError;
use crate::lifecycle::{AppStateSource, AppStateSubscription};
use crate::listeners::{ListenerHandle, StateListener, StateListeners};
use crate::process::{ConfigArtifact, ConfigRequest, ConfigWriter, ProcessManager};
use crate::state::{ServerId, State};
use crate::sync::{Barrier, Gate, lock};

const SERVER_TARGET: &str = "staticvisor::server";

/// Collaborators shared by every server of one engine.
#[derive(Clone)]
pub(crate) struct ServerContext {
    pub registry: Arc<ServerRegistry>,
    pub process: Arc<dyn ProcessManager>,
    pub config_writer: Arc<dyn ConfigWriter>,
    pub app_state: AppStateSource,
}

/// What a crash signal did to a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CrashDisposition {
    /// An in-flight operation was failed through its barrier.
    Rejected,
    /// An in-flight operation will fail at its next checkpoint.
    Deferred,
    /// No operation in flight; the state was forced to `CRASHED`.
    Forced,
    /// Already `CRASHED`; nothing changed.
    AlreadyCrashed,
}

/// Mutable part of a server.
#[derive(Default)]
struct Inner {
    state: State,
    barrier: Option<Barrier>,
    hostname: Option<String>,
    port: u16,
    origin: String,
    config_artifact: Option<ConfigArtifact>,
    app_state_sub: Option<AppStateSubscription>,
    /// Crash that arrived while an operation could not be failed through its barrier.
    pending_crash: Option<ServerError>,
}

/// One managed lifecycle of the external static file server.
///
/// Created by [`Engine::server`](crate::Engine::server).
pub struct StaticServer {
    id: ServerId,
    config: ServerConfig,
    inner: Mutex<Inner>,
    /// Serializes "set state + notify" so listeners see transitions in order.
    transition: Mutex<()>,
    gate: Gate,
    listeners: StateListeners,
    ctx: ServerContext,
}

impl StaticServer {
    pub(crate) fn new(config: ServerConfig, ctx: ServerContext) -> Arc<Self> {
        let inner = Inner {
            hostname: (!config.non_local()).then(|| LOOPBACK_HOSTNAME.to_string()),
            port: config.port(),
            ..Inner::default()
        };
        Arc::new(Self {
            id: ServerId::next(),
            config,
            inner: Mutex::new(inner),
            transition: Mutex::new(()),
            gate: Gate::new(),
            listeners: StateListeners::new(),
            ctx,
        })
    }

    // ---------------------------
    // Accessors
    // ---------------------------

    /// Process-unique id, also handed to the process manager.
    pub fn id(&self) -> ServerId {
        self.id
    }

    /// Fixed configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Served directory.
    pub fn file_dir(&self) -> &std::path::Path {
        self.config.file_dir()
    }

    pub fn non_local(&self) -> bool {
        self.config.non_local()
    }

    pub fn stop_in_background(&self) -> bool {
        self.config.stop_in_background()
    }

    /// Hostname: `"localhost"` for loopback servers; `None` until the first
    /// start of a non-local server resolves it.
    pub fn hostname(&self) -> Option<String> {
        lock(&self.inner).hostname.clone()
    }

    /// Port: the requested one, or the allocated one after the first start (`0` before).
    pub fn port(&self) -> u16 {
        lock(&self.inner).port
    }

    /// `http://host:port` after the first successful start; empty before.
    pub fn origin(&self) -> String {
        lock(&self.inner).origin.clone()
    }

    /// Current state.
    pub fn state(&self) -> State {
        lock(&self.inner).state
    }

    /// True while the app-state bridge is subscribed.
    pub fn is_app_state_subscribed(&self) -> bool {
        lock(&self.inner).app_state_sub.is_some()
    }

    /// Subscribes to state transitions.
    pub fn add_state_listener<L: StateListener>(&self, listener: L) -> ListenerHandle {
        self.listeners.subscribe(listener)
    }

    /// Unsubscribes a listener added with [`add_state_listener`](Self::add_state_listener).
    pub fn remove_state_listener(&self, handle: &ListenerHandle) -> bool {
        self.listeners.unsubscribe(handle)
    }

    // ---------------------------
    // Lifecycle
    // ---------------------------

    /// Starts the server and returns its origin.
    ///
    /// Idempotent: when already `ACTIVE`, returns the current origin without a new launch.
    /// Concurrent calls queue on the gate in arrival order.
    pub async fn start(self: &Arc<Self>) -> Result<String, ServerError> {
        let permit = self.gate.acquire().await;
        let res = self.start_locked(StartOrigin::Caller).await;
        if let Err(err) = &res {
            self.fail(err);
        }
        self.end_operation();
        permit.release();
        res
    }

    /// Foreground resume issued by the app-state bridge.
    ///
    /// Returns `Ok(None)` without touching the server when the bridge was
    /// removed (hard stop) while this call waited on the gate.
    pub(crate) async fn resume(self: &Arc<Self>) -> Result<Option<String>, ServerError> {
        let permit = self.gate.acquire().await;
        if !self.is_app_state_subscribed() {
            debug!(target: SERVER_TARGET, server = %self.id, "resume skipped after hard stop");
            permit.release();
            return Ok(None);
        }
        let res = self.start_locked(StartOrigin::Bridge).await;
        if let Err(err) = &res {
            self.fail(err);
        }
        self.end_operation();
        permit.release();
        res.map(Some)
    }

    /// Hard stop: drops the app-state bridge, then soft-stops.
    pub async fn stop(self: &Arc<Self>) -> Result<(), ServerError> {
        let sub = lock(&self.inner).app_state_sub.take();
        if let Some(sub) = sub {
            sub.remove();
        }
        self.soft_stop().await
    }

    /// Soft stop: stops the server but keeps the app-state bridge, so a
    /// foreground transition starts it again. No-op unless `ACTIVE`.
    pub async fn soft_stop(self: &Arc<Self>) -> Result<(), ServerError> {
        let permit = self.gate.acquire().await;
        let res = self.stop_locked().await;
        if let Err(err) = &res {
            self.fail(err);
        }
        self.ctx.registry.unregister(self.id).await;
        self.end_operation();
        permit.release();
        res
    }

    async fn start_locked(self: &Arc<Self>, origin: StartOrigin) -> Result<String, ServerError> {
        self.stable_state_guard()?;
        if self.state() == State::Active {
            debug!(target: SERVER_TARGET, server = %self.id, "already active");
            return Ok(self.origin());
        }

        self.ctx.registry.register(Arc::clone(self)).await;
        self.set_state(State::Starting);
        // The bridge never re-subscribes itself; a hard stop may have removed it.
        if origin == StartOrigin::Caller {
            self.configure_app_state_handling();
        }

        let (hostname, port) = self.resolve_address().await?;

        self.discard_config_artifact().await;
        let artifact = self
            .ctx
            .config_writer
            .write(ConfigRequest {
                file_dir: self.config.file_dir(),
                hostname: &hostname,
                port,
            })
            .await?;
        lock(&self.inner).config_artifact = Some(artifact.clone());

        self.take_pending_crash()?;
        let barrier = self.arm_barrier()?;
        self.ctx.process.start(self.id, &artifact).await?;
        self.await_signal(&barrier).await?;

        let url = format!("http://{hostname}:{port}");
        lock(&self.inner).origin = url.clone();
        self.discard_config_artifact().await;

        self.finish(State::Active)?;
        info!(target: SERVER_TARGET, server = %self.id, origin = %url, "server active");
        Ok(url)
    }

    async fn stop_locked(&self) -> Result<(), ServerError> {
        self.stable_state_guard()?;
        if self.state() != State::Active {
            return Ok(());
        }
        self.set_state(State::Stopping);

        let barrier = self.arm_barrier()?;
        self.ctx.process.stop().await?;
        self.await_signal(&barrier).await?;

        self.finish(State::Inactive)?;
        info!(target: SERVER_TARGET, server = %self.id, "server stopped");
        Ok(())
    }

    /// Fails unless the state is `INACTIVE`, `ACTIVE` or `CRASHED`.
    fn stable_state_guard(&self) -> Result<(), ServerError> {
        let state = self.state();
        if state.is_stable() {
            Ok(())
        } else {
            Err(ServerError::UnstableState { state })
        }
    }

    /// Resolves hostname and port once; later starts reuse them.
    async fn resolve_address(&self) -> Result<(String, u16), ServerError> {
        let (known_host, known_port) = {
            let inner = lock(&self.inner);
            (inner.hostname.clone(), inner.port)
        };

        let hostname = match known_host {
            Some(h) => h,
            None => {
                let h = self.ctx.process.local_ip_address().await?;
                lock(&self.inner).hostname = Some(h.clone());
                h
            }
        };
        let port = match known_port {
            0 => {
                let p = self.ctx.process.open_port().await?;
                lock(&self.inner).port = p;
                p
            }
            p => p,
        };
        Ok((hostname, port))
    }

    fn arm_barrier(&self) -> Result<Barrier, ServerError> {
        let mut inner = lock(&self.inner);
        if inner.barrier.is_some() {
            return Err(ServerError::Internal {
                detail: "a completion barrier is already armed",
            });
        }
        let barrier = Barrier::new();
        inner.barrier = Some(barrier.clone());
        Ok(barrier)
    }

    /// Cleanup of every gated operation.
    fn end_operation(&self) {
        let mut inner = lock(&self.inner);
        inner.barrier = None;
        inner.pending_crash = None;
    }

    /// Fails with a crash recorded while no barrier could carry it.
    fn take_pending_crash(&self) -> Result<(), ServerError> {
        match lock(&self.inner).pending_crash.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Enters the final stable state of an operation, unless a crash was
    /// recorded; checked and applied atomically with respect to `crash()`.
    fn finish(&self, new: State) -> Result<(), ServerError> {
        let _order = lock(&self.transition);
        {
            let mut inner = lock(&self.inner);
            if let Some(err) = inner.pending_crash.take() {
                return Err(err);
            }
            inner.state = new;
        }
        self.listeners.publish(new);
        Ok(())
    }

    async fn await_signal(&self, barrier: &Barrier) -> Result<(), ServerError> {
        match self.config.signal_timeout_opt() {
            Some(timeout) => tokio::time::timeout(timeout, barrier.wait())
                .await
                .map_err(|_elapsed| ServerError::SignalTimeout { timeout })?,
            None => barrier.wait().await,
        }
    }

    async fn discard_config_artifact(&self) {
        let artifact = lock(&self.inner).config_artifact.take();
        if let Some(artifact) = artifact {
            self.ctx.config_writer.remove(&artifact).await;
        }
    }

    fn configure_app_state_handling(self: &Arc<Self>) {
        let mut inner = lock(&self.inner);
        if self.config.stop_in_background() {
            if inner.app_state_sub.is_none() {
                inner.app_state_sub = Some(AppStateSubscription::spawn(
                    &self.ctx.app_state,
                    Arc::downgrade(self),
                ));
            }
        } else if let Some(sub) = inner.app_state_sub.take() {
            sub.remove();
        }
    }

    fn fail(&self, err: &ServerError) {
        warn!(
            target: SERVER_TARGET,
            server = %self.id,
            error = %err,
            label = err.as_label(),
            "lifecycle operation failed"
        );
        self.set_state(State::Crashed);
    }

    fn set_state(&self, new: State) {
        let _order = lock(&self.transition);
        lock(&self.inner).state = new;
        self.listeners.publish(new);
    }

    // ---------------------------
    // Signal entry points (router)
    // ---------------------------

    /// Resolves the armed barrier. Returns `false` for a stray signal.
    pub(crate) fn complete(&self) -> bool {
        match lock(&self.inner).barrier.as_ref() {
            Some(barrier) => barrier.resolve(),
            None => false,
        }
    }

    /// Applies a crash signal.
    pub(crate) fn crash(&self, reason: Option<Arc<str>>) -> CrashDisposition {
        let err = ServerError::Crashed { reason };
        let _order = lock(&self.transition);
        {
            let mut inner = lock(&self.inner);
            let rejected = inner
                .barrier
                .as_ref()
                .is_some_and(|barrier| barrier.reject(err.clone()));
            if rejected {
                return CrashDisposition::Rejected;
            }
            if !inner.state.is_stable() {
                inner.pending_crash = Some(err);
                return CrashDisposition::Deferred;
            }
            if inner.state == State::Crashed {
                return CrashDisposition::AlreadyCrashed;
            }
            inner.state = State::Crashed;
        }
        self.listeners.publish(State::Crashed);
        CrashDisposition::Forced
    }

    // ---------------------------
    // Test hooks (bypass the gate)
    // ---------------------------

    #[cfg(test)]
    pub(crate) fn force_state(&self, state: State) {
        self.set_state(state);
    }

    #[cfg(test)]
    pub(crate) fn force_barrier(&self) -> Barrier {
        let barrier = Barrier::new();
        lock(&self.inner).barrier = Some(barrier.clone());
        barrier
    }

    #[cfg(test)]
    pub(crate) fn armed_barrier(&self) -> Option<Barrier> {
        lock(&self.inner).barrier.clone()
    }
}

/// Who asked for a start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StartOrigin {
    Caller,
    Bridge,
}

impl std::fmt::Debug for StaticServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticServer")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
