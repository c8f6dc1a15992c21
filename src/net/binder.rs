//! Outbound connection establishment.
//!
//! # Responsibilities
//! - Resolve the destination (IPv4 results only)
//! - Bind the socket to the backend's local address
//! - Pin the socket to the backend's interface where the platform allows
//! - Bound the whole attempt by the connect timeout
//!
//! # Design Decisions
//! - Interface pinning is best-effort: failure is logged and the dial goes on
//!   with address binding alone
//! - Linux/Android use `SO_BINDTODEVICE`, Apple platforms `IP_BOUND_IF`;
//!   elsewhere only the local address is bound

use std::io;
use std::net::{SocketAddr, SocketAddrV4};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use thiserror::Error;
use tokio::net::{lookup_host, TcpSocket, TcpStream};

use crate::load_balancer::Backend;
use crate::observability::LogSink;

/// Default outbound connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors produced while dialing through a backend.
#[derive(Debug, Error)]
pub enum DialError {
    #[error("failed to resolve {destination}: {source}")]
    Resolve {
        destination: String,
        source: io::Error,
    },

    #[error("{0} has no IPv4 address")]
    NoIpv4Address(String),

    #[error("socket setup failed: {0}")]
    Socket(io::Error),

    #[error("failed to bind local address {addr}: {source}")]
    Bind { addr: SocketAddrV4, source: io::Error },

    #[error("connect to {addr} failed: {source}")]
    Connect { addr: SocketAddrV4, source: io::Error },

    #[error("connect to {destination} timed out after {}s", .timeout.as_secs())]
    Timeout {
        destination: String,
        timeout: Duration,
    },
}

/// Opens outbound TCP connections constrained to a backend's egress path.
#[derive(Debug, Clone)]
pub struct Binder {
    connect_timeout: Duration,
    log: LogSink,
}

impl Binder {
    pub fn new(connect_timeout: Duration, log: LogSink) -> Self {
        Self {
            connect_timeout,
            log,
        }
    }

    /// Connect to `destination` (`host:port`) through `backend`.
    pub async fn dial(&self, backend: &Backend, destination: &str) -> Result<TcpStream, DialError> {
        match tokio::time::timeout(self.connect_timeout, self.dial_inner(backend, destination)).await
        {
            Ok(result) => result,
            Err(_) => Err(DialError::Timeout {
                destination: destination.to_string(),
                timeout: self.connect_timeout,
            }),
        }
    }

    async fn dial_inner(&self, backend: &Backend, destination: &str) -> Result<TcpStream, DialError> {
        let addrs: Vec<SocketAddrV4> = lookup_host(destination)
            .await
            .map_err(|source| DialError::Resolve {
                destination: destination.to_string(),
                source,
            })?
            .filter_map(|addr| match addr {
                SocketAddr::V4(v4) => Some(v4),
                SocketAddr::V6(_) => None,
            })
            .collect();

        let mut last_error = DialError::NoIpv4Address(destination.to_string());
        for addr in addrs {
            let socket = self.open_socket(backend)?;
            match socket.connect(SocketAddr::V4(addr)).await {
                Ok(stream) => {
                    tracing::trace!(remote = %addr, backend = %backend, "Outbound connected");
                    return Ok(stream);
                }
                Err(source) => last_error = DialError::Connect { addr, source },
            }
        }
        Err(last_error)
    }

    fn open_socket(&self, backend: &Backend) -> Result<TcpSocket, DialError> {
        let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))
            .map_err(DialError::Socket)?;

        if let Some(iface) = backend.interface() {
            if let Err(e) = bind_interface(&socket, iface) {
                self.log.diag(format!(
                    "[WARN] Couldn't bind to interface {} (insufficient privileges?): {}",
                    iface, e
                ));
            }
        }

        if let Some(local) = backend.local_addr() {
            socket
                .bind(&SocketAddr::V4(local).into())
                .map_err(|source| DialError::Bind {
                    addr: local,
                    source,
                })?;
        }

        socket.set_nonblocking(true).map_err(DialError::Socket)?;
        Ok(TcpSocket::from_std_stream(socket.into()))
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn bind_interface(socket: &Socket, iface: &str) -> io::Result<()> {
    socket.bind_device(Some(iface.as_bytes()))
}

#[cfg(any(target_os = "macos", target_os = "ios"))]
fn bind_interface(socket: &Socket, iface: &str) -> io::Result<()> {
    let index = nix::net::if_::if_nametoindex(iface).map_err(io::Error::from)?;
    socket.bind_device_by_index_v4(std::num::NonZeroU32::new(index))
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios"
)))]
fn bind_interface(_socket: &Socket, _iface: &str) -> io::Result<()> {
    Ok(())
}
