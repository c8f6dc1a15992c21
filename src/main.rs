//! dispatch-proxy: a multi-homed outbound proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌───────────────────────────────────────────────────────┐
//!                    │                    DISPATCH PROXY                      │
//!                    │                                                        │
//!     Client         │  ┌──────────┐    ┌──────────┐    ┌────────────────┐   │
//!     ───────────────┼─▶│   net    │───▶│ session  │───▶│ load_balancer  │   │
//!                    │  │ listener │    │ socks or │    │   dispatcher   │   │
//!                    │  └──────────┘    │  tunnel  │    └───────┬────────┘   │
//!                    │                  └────┬─────┘            │            │
//!                    │                       │                  ▼            │
//!                    │                  ┌────▼─────┐    ┌────────────────┐   │   eth0 / wlan0 /
//!     ◀──────────────┼──────────────────│  relay   │◀───│  net binder    │───┼──▶ upstream
//!                    │                  └──────────┘    └────────────────┘   │
//!                    │                                                        │
//!                    │  config · observability · lifecycle                    │
//!                    └───────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use dispatch_proxy::config::loader::load_unvalidated;
use dispatch_proxy::config::{Mode, ProxyConfig};
use dispatch_proxy::lifecycle::{shutdown_signal, start_with_config};
use dispatch_proxy::observability::{init_logging, LogSink};

/// Spread outbound connections across several interfaces or upstreams.
#[derive(Debug, Parser)]
#[command(name = "dispatch-proxy", version)]
struct Cli {
    /// Host to listen on.
    #[arg(long)]
    lhost: Option<String>,

    /// Port to listen on.
    #[arg(long)]
    lport: Option<u16>,

    /// Tunnel mode: relay raw TCP to fixed `host:port` backends instead of speaking SOCKS5.
    #[arg(long)]
    tunnel: bool,

    /// Suppress per-connection diagnostics.
    #[arg(long)]
    quiet: bool,

    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Backends: `ip[@weight]`, or `host:port[@weight]` with --tunnel.
    backends: Vec<String>,
}

impl Cli {
    /// Load the file configuration, if any, and apply command-line overrides.
    fn into_config(self) -> Result<ProxyConfig, Box<dyn std::error::Error + Send + Sync>> {
        let mut config = match &self.config {
            Some(path) => load_unvalidated(path)?,
            None => ProxyConfig::default(),
        };

        if let Some(host) = self.lhost {
            config.listener.host = host;
        }
        if let Some(port) = self.lport {
            config.listener.port = port;
        }
        if self.tunnel {
            config.mode = Mode::Tunnel;
        }
        if self.quiet {
            config.observability.quiet = true;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        if !self.backends.is_empty() {
            config.backends = self.backends;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Cli::parse().into_config()?;
    init_logging(&config.observability.log_level)?;

    tracing::info!(
        mode = %config.mode,
        listen = %config.listener.bind_address(),
        backends = config.backends.len(),
        "dispatch-proxy v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let log = LogSink::tracing();
    let handle = start_with_config(config, log).await?;

    let signal = shutdown_signal().await?;
    tracing::info!(signal, "Shutdown signal received");

    handle.stop().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
