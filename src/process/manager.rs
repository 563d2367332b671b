//! # Process manager contract.
//!
//! `start` and `stop` only **initiate** the transition; completion arrives
//! later as a `LAUNCHED`/`TERMINATED`/`CRASHED` signal through a
//! [`SignalSender`](crate::SignalSender).
//!
//! The address helpers have working defaults:
//! - [`ProcessManager::local_ip_address`] picks the host's outbound IPv4 address,
//!   falling back to `"localhost"`;
//! - [`ProcessManager::open_port`] asks the OS for a free ephemeral port.
//!
//! # Example
//! ```
//! use async_trait::async_trait;
//! use staticvisor::{ConfigArtifact, ProcessManager, ServerError, ServerId, SignalSender};
//!
//! struct Spawner {
//!     signals: SignalSender,
//! }
//!
//! #[async_trait]
//! impl ProcessManager for Spawner {
//!     async fn start(&self, id: ServerId, _config: &ConfigArtifact) -> Result<(), ServerError> {
//!         // spawn the real server here, then report from its supervisor thread:
//!         self.signals.launched(id);
//!         Ok(())
//!     }
//!
//!     async fn stop(&self) -> Result<(), ServerError> {
//!         Ok(())
//!     }
//! }
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use async_trait::async_trait;
use tokio::net::{TcpListener, UdpSocket};

use crate::config::LOOPBACK_HOSTNAME;
use crate::error::ServerError;
use crate::process::ConfigArtifact;
use crate::state::ServerId;

/// Contract of the component that runs the external server.
#[async_trait]
pub trait ProcessManager: Send + Sync + 'static {
    /// Resolves the hostname used by non-local servers. Queried at most once per server.
    async fn local_ip_address(&self) -> Result<String, ServerError> {
        Ok(outbound_ipv4()
            .await
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| LOOPBACK_HOSTNAME.to_string()))
    }

    /// Allocates a free port. Queried at most once per server, only when none was requested.
    async fn open_port(&self) -> Result<u16, ServerError> {
        let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)))
            .await
            .map_err(ServerError::external)?;
        let addr = listener.local_addr().map_err(ServerError::external)?;
        Ok(addr.port())
    }

    /// Initiates the external server for `id` with the given config artifact.
    async fn start(&self, id: ServerId, config: &ConfigArtifact) -> Result<(), ServerError>;

    /// Initiates shutdown of the running external server.
    async fn stop(&self) -> Result<(), ServerError>;
}

/// Local address of a UDP socket "connected" to a public address.
///
/// No packet is sent; the OS only selects the outbound interface.
async fn outbound_ipv4() -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)))
        .await
        .ok()?;
    socket
        .connect(SocketAddr::from((Ipv4Addr::new(192, 0, 2, 1), 80)))
        .await
        .ok()?;
    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(ip) if !ip.is_loopback() && !ip.is_unspecified() => Some(ip),
        _ => None,
    }
}
