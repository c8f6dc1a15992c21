//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration
//! - Resolve backend descriptors into egress paths
//! - Initialize subsystems in dependency order
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is returned and nothing listens
//! - Listener binds last (traffic only when ready)

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::{
    validate_config, BackendSpec, ConfigError, ListenerConfig, Mode, ProxyConfig, SpecTarget,
    ValidationError,
};
use crate::lifecycle::Shutdown;
use crate::load_balancer::{Backend, Dispatcher};
use crate::net::{find_interface, Binder, InterfaceLookup, Listener, ListenerError, SessionTracker};
use crate::observability::{metrics, LogSink};
use crate::session::{run_accept_loop, SessionContext};

/// How long `stop()` waits for sessions to close.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that prevent the proxy from starting.
#[derive(Debug, Error)]
pub enum StartError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IP {0} not associated with any interface")]
    UnknownLocalAddress(Ipv4Addr),

    #[error("failed to enumerate network interfaces: {0}")]
    Interfaces(io::Error),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("failed to start metrics endpoint: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

/// Start a proxy from the core parameters.
///
/// `descriptors` are `ip[@weight]` in SOCKS mode or `host:port[@weight]`
/// in tunnel mode. Everything else uses configuration defaults.
pub async fn start<I, S>(
    listen_host: &str,
    listen_port: u16,
    tunnel_mode: bool,
    descriptors: I,
    log: LogSink,
) -> Result<ProxyHandle, StartError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let config = ProxyConfig {
        mode: Mode::from_tunnel_flag(tunnel_mode),
        backends: descriptors.into_iter().map(Into::into).collect(),
        listener: ListenerConfig {
            host: listen_host.to_string(),
            port: listen_port,
            ..ListenerConfig::default()
        },
        ..ProxyConfig::default()
    };
    start_with_config(config, log).await
}

/// Start a proxy from a full configuration.
pub async fn start_with_config(config: ProxyConfig, log: LogSink) -> Result<ProxyHandle, StartError> {
    validate_config(&config).map_err(ConfigError::Validation)?;

    let quiet = log.is_quiet() || config.observability.quiet;
    let log = log.with_quiet(quiet);

    let backends = resolve_backends(&config, &log)?;
    let dispatcher = Arc::new(Dispatcher::new(backends));

    if config.observability.metrics_enabled {
        // Validation guarantees the address parses.
        if let Ok(addr) = config.observability.metrics_address.parse::<SocketAddr>() {
            metrics::init_metrics(addr)?;
        }
    }

    let listener = Listener::bind(&config.listener).await?;
    let local_addr = listener.local_addr().map_err(ListenerError::Accept)?;

    let binder = Binder::new(Duration::from_secs(config.timeouts.connect_secs), log.clone());
    let ctx = SessionContext::new(config.mode, dispatcher, binder, log.clone());
    let shutdown = Shutdown::new();
    let tracker = SessionTracker::new();

    let accept_task = tokio::spawn(run_accept_loop(
        listener,
        ctx,
        tracker.clone(),
        shutdown.clone(),
    ));

    tracing::info!(
        address = %local_addr,
        mode = %config.mode,
        backends = config.backends.len(),
        max_connections = config.listener.max_connections,
        "Proxy started"
    );
    log.status(format!("[INFO] Server started on {}", local_addr));

    Ok(ProxyHandle {
        local_addr,
        shutdown,
        tracker,
        accept_task,
        log,
    })
}

/// Turn descriptors into backends, checking SOCKS addresses against local interfaces.
fn resolve_backends(config: &ProxyConfig, log: &LogSink) -> Result<Vec<Backend>, StartError> {
    let mut backends = Vec::with_capacity(config.backends.len());

    for (index, descriptor) in config.backends.iter().enumerate() {
        let spec = BackendSpec::parse(descriptor, config.mode).map_err(|source| {
            ConfigError::Validation(vec![ValidationError::Descriptor {
                index: index + 1,
                source,
            }])
        })?;

        let backend = match spec.target {
            SpecTarget::Local(ip) => match find_interface(ip).map_err(StartError::Interfaces)? {
                InterfaceLookup::NotFound => return Err(StartError::UnknownLocalAddress(ip)),
                lookup => Backend::local(ip, lookup.into_name(), spec.weight),
            },
            SpecTarget::Upstream { host, port } => Backend::upstream(host, port, spec.weight),
        };

        log.status(format!(
            "[INFO] LB {}: {} (Iface: {}), Ratio: {}",
            index + 1,
            backend.address(),
            backend.interface().unwrap_or("-"),
            backend.weight()
        ));
        backends.push(backend);
    }

    Ok(backends)
}

/// A running proxy.
///
/// Dropping the handle leaves the proxy running; call [`ProxyHandle::stop`]
/// to end it.
#[derive(Debug)]
pub struct ProxyHandle {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    tracker: SessionTracker,
    accept_task: JoinHandle<()>,
    log: LogSink,
}

impl ProxyHandle {
    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Sessions currently running.
    pub fn active_sessions(&self) -> u64 {
        self.tracker.active_count()
    }

    /// Stop accepting, cancel every session and wait for their sockets to close.
    pub async fn stop(self) {
        self.log.status("[INFO] Shutting down");
        self.shutdown.trigger();

        if let Err(e) = self.accept_task.await {
            tracing::warn!(error = %e, "Accept loop ended abnormally");
        }

        if !self.tracker.wait_for_drain(DRAIN_TIMEOUT).await {
            self.log.status(format!(
                "[WARN] {} sessions still open after {}s",
                self.tracker.active_count(),
                DRAIN_TIMEOUT.as_secs()
            ));
        }
        self.log.status("[INFO] Server stopped");
    }
}
