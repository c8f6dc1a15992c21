//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::net::DEFAULT_CONNECT_TIMEOUT;

/// Root configuration for the dispatch proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Operating mode for the whole listener.
    pub mode: Mode,

    /// Backend descriptors, in rotation order (`ip[@weight]` or `host:port[@weight]`).
    pub backends: Vec<String>,

    /// Listener configuration (bind host/port, connection limit).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// How inbound connections are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// SOCKS5 CONNECT; backends are local egress addresses.
    #[default]
    Socks,
    /// Raw relay; backends are fixed upstream targets.
    Tunnel,
}

impl Mode {
    /// Map the `tunnel` boolean used by the CLI and `start()` onto a mode.
    pub fn from_tunnel_flag(tunnel: bool) -> Self {
        if tunnel {
            Mode::Tunnel
        } else {
            Mode::Socks
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Socks => "socks",
            Mode::Tunnel => "tunnel",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host to accept connections on (e.g., "127.0.0.1").
    pub host: String,

    /// Port to accept connections on. `0` picks an ephemeral port.
    pub port: u16,

    /// Maximum concurrent sessions (backpressure).
    pub max_connections: usize,
}

impl ListenerConfig {
    /// The `host:port` pair the listener binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_connections: 10_000,
        }
    }
}

/// Timeout configuration for outbound operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Outbound connection establishment timeout in seconds.
    pub connect_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: DEFAULT_CONNECT_TIMEOUT.as_secs(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Suppress per-session diagnostic lines.
    pub quiet: bool,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            quiet: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
