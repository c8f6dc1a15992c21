//! Session orchestration subsystem.
//!
//! # Data Flow
//! ```text
//! Accepted connection (server.rs)
//!     → SOCKS mode (socks.rs):  handshake → request → select() → dial → reply → relay
//!     → tunnel mode (tunnel.rs): select() → dial backend target
//!                                → on failure select_excluding() until every backend failed
//!                                → relay
//! ```
//!
//! # Design Decisions
//! - Mode is fixed per listener, never negotiated per connection
//! - SOCKS dials are not retried: the client already asked for one destination
//! - Tunnel sessions try each backend at most once

pub mod server;
pub mod socks;
pub mod tunnel;

use std::io;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpStream;

use crate::config::Mode;
use crate::load_balancer::{DispatchError, Dispatcher};
use crate::net::{Binder, DialError, RelaySummary, SessionId};
use crate::observability::{metrics, LogSink};
use crate::socks::ProtocolError;

pub use server::run_accept_loop;

/// Errors that end a session before or instead of relaying.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Handshake failed: {0}")]
    Handshake(ProtocolError),

    #[error("Request failed: {0}")]
    Request(ProtocolError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Failed to connect to {destination} via {backend} (LB:{index}): {source}")]
    Dial {
        destination: String,
        backend: String,
        index: usize,
        source: DialError,
    },

    #[error("All load balancers failed for tunnel (attempted {attempts:?})")]
    AllBackendsFailed { attempts: Vec<usize> },

    #[error("Failed to send reply: {0}")]
    Reply(io::Error),
}

impl SessionError {
    /// Severity tag for the log sink line.
    pub fn severity(&self) -> &'static str {
        match self {
            SessionError::Dial { .. } | SessionError::AllBackendsFailed { .. } => "WARN",
            _ => "ERR",
        }
    }
}

/// What a completed session did.
#[derive(Debug)]
pub struct SessionReport {
    /// `host:port` the session was relayed to.
    pub destination: String,
    /// Backend indices dialed, in order. The last one carried the relay.
    pub attempts: Vec<usize>,
    pub relay: RelaySummary,
}

/// Everything a session needs, shared by all sessions of one listener.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub mode: Mode,
    pub dispatcher: Arc<Dispatcher>,
    pub binder: Binder,
    pub log: LogSink,
}

impl SessionContext {
    pub fn new(mode: Mode, dispatcher: Arc<Dispatcher>, binder: Binder, log: LogSink) -> Self {
        Self {
            mode,
            dispatcher,
            binder,
            log,
        }
    }

    /// Serve one accepted connection according to the listener's mode.
    pub async fn serve(
        &self,
        inbound: TcpStream,
        id: SessionId,
    ) -> Result<SessionReport, SessionError> {
        let _timer = metrics::SessionTimer::start(self.mode.as_str());

        let result = match self.mode {
            Mode::Socks => socks::serve(self, inbound, id).await,
            Mode::Tunnel => tunnel::serve(self, inbound, id).await,
        };

        if let Ok(report) = &result {
            if let Some(bytes) = report.relay.bytes() {
                metrics::record_relay_bytes(report.relay.finished.as_str(), bytes);
            }
        }
        result
    }
}
