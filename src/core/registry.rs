//! # Server registry - routing table for completion signals.
//!
//! Maps [`ServerId`] to the live [`StaticServer`] so the [`SignalRouter`](crate::SignalRouter)
//! can deliver signals from the external process manager.
//!
//! ## Rules
//! - A server registers itself when it enters `STARTING`.
//! - A server unregisters itself in the cleanup of every soft stop.
//! - A server that crashes while `ACTIVE` stays registered; it is still the
//!   server the external side knows about.
//! - Mutations happen inside a server's gate; reads come from the router.
//! - One registry per [`Engine`](crate::Engine); registries never share entries.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::core::StaticServer;
use crate::state::{ServerId, State};

const REGISTRY_TARGET: &str = "staticvisor::registry";

/// Id-to-server routing table.
#[derive(Default)]
pub struct ServerRegistry {
    servers: RwLock<HashMap<ServerId, Arc<StaticServer>>>,
}

impl ServerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Adds (or refreshes) `server`. Returns `true` if it was not registered yet.
    pub(crate) async fn register(&self, server: Arc<StaticServer>) -> bool {
        let id = server.id();
        let fresh = self.servers.write().await.insert(id, server).is_none();
        if fresh {
            debug!(target: REGISTRY_TARGET, server = %id, "registered");
        }
        fresh
    }

    /// Removes `id`. Returns `true` if it was registered.
    pub(crate) async fn unregister(&self, id: ServerId) -> bool {
        let removed = self.servers.write().await.remove(&id).is_some();
        if removed {
            debug!(target: REGISTRY_TARGET, server = %id, "unregistered");
        }
        removed
    }

    /// Looks up a registered server.
    pub async fn get(&self, id: ServerId) -> Option<Arc<StaticServer>> {
        self.servers.read().await.get(&id).cloned()
    }

    /// True if `id` is registered.
    pub async fn contains(&self, id: ServerId) -> bool {
        self.servers.read().await.contains_key(&id)
    }

    /// Returns a registered server that is `STARTING`, `ACTIVE` or `STOPPING`.
    ///
    /// When several qualify, the one with the lowest id wins.
    pub async fn active(&self) -> Option<Arc<StaticServer>> {
        let servers = self.servers.read().await;
        servers
            .values()
            .filter(|s| !matches!(s.state(), State::Inactive | State::Crashed))
            .min_by_key(|s| s.id())
            .cloned()
    }

    /// Returns the sorted list of registered ids.
    pub async fn ids(&self) -> Vec<ServerId> {
        let mut ids: Vec<ServerId> = self.servers.read().await.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of registered servers.
    pub async fn len(&self) -> usize {
        self.servers.read().await.len()
    }

    /// True if no server is registered.
    pub async fn is_empty(&self) -> bool {
        self.servers.read().await.is_empty()
    }
}
