//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single egress path (local interface or fixed upstream)
//! - Carry the contention ratio used by the dispatcher
//! - Track active sessions for diagnostics

use std::net::{Ipv4Addr, SocketAddrV4};
use std::num::NonZeroU32;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Where a backend sends traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// SOCKS mode: outbound sockets bind to this local address (port 0, ephemeral).
    Local(SocketAddrV4),
    /// Tunnel mode: every session through this backend connects to `host:port`.
    Upstream { host: String, port: u16 },
}

/// A single configured egress path.
///
/// Immutable after construction. The rotation counter lives in the
/// dispatcher, behind its lock.
#[derive(Debug)]
pub struct Backend {
    endpoint: Endpoint,
    /// Interface name outbound sockets are pinned to, if any.
    interface: Option<String>,
    weight: NonZeroU32,
    active_sessions: AtomicUsize,
}

impl Backend {
    /// Create a backend that egresses through a local address.
    pub fn local(ip: Ipv4Addr, interface: Option<String>, weight: NonZeroU32) -> Self {
        Self::new(Endpoint::Local(SocketAddrV4::new(ip, 0)), interface, weight)
    }

    /// Create a backend that always connects to a fixed upstream target.
    pub fn upstream(host: impl Into<String>, port: u16, weight: NonZeroU32) -> Self {
        Self::new(
            Endpoint::Upstream {
                host: host.into(),
                port,
            },
            None,
            weight,
        )
    }

    pub fn new(endpoint: Endpoint, interface: Option<String>, weight: NonZeroU32) -> Self {
        Self {
            endpoint,
            interface: interface.filter(|name| !name.is_empty()),
            weight,
            active_sessions: AtomicUsize::new(0),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Human-readable address: `ip:0` for local backends, `host:port` for upstreams.
    pub fn address(&self) -> String {
        match &self.endpoint {
            Endpoint::Local(addr) => addr.to_string(),
            Endpoint::Upstream { host, port } if host.contains(':') => format!("[{}]:{}", host, port),
            Endpoint::Upstream { host, port } => format!("{}:{}", host, port),
        }
    }

    /// Local address outbound sockets bind to, if this is an egress backend.
    pub fn local_addr(&self) -> Option<SocketAddrV4> {
        match self.endpoint {
            Endpoint::Local(addr) => Some(addr),
            Endpoint::Upstream { .. } => None,
        }
    }

    /// Fixed destination for tunnel sessions, if this is an upstream backend.
    pub fn upstream_target(&self) -> Option<String> {
        match self.endpoint {
            Endpoint::Upstream { .. } => Some(self.address()),
            Endpoint::Local(_) => None,
        }
    }

    pub fn interface(&self) -> Option<&str> {
        self.interface.as_deref()
    }

    /// Contention ratio: consecutive selections before rotation advances.
    pub fn weight(&self) -> u32 {
        self.weight.get()
    }

    /// Number of relays currently running through this backend.
    pub fn active_sessions(&self) -> usize {
        self.active_sessions.load(Ordering::Relaxed)
    }

    /// Count a session against this backend until the guard drops.
    pub fn track(self: &Arc<Self>) -> BackendSessionGuard {
        self.active_sessions.fetch_add(1, Ordering::Relaxed);
        BackendSessionGuard {
            backend: self.clone(),
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.interface {
            Some(iface) => write!(f, "{} ({})", self.address(), iface),
            None => f.write_str(&self.address()),
        }
    }
}

/// A RAII guard that manages the active session count.
#[derive(Debug)]
pub struct BackendSessionGuard {
    backend: Arc<Backend>,
}

impl Deref for BackendSessionGuard {
    type Target = Backend;
    fn deref(&self) -> &Self::Target {
        &self.backend
    }
}

impl Drop for BackendSessionGuard {
    fn drop(&mut self) {
        self.backend.active_sessions.fetch_sub(1, Ordering::Relaxed);
    }
}
