//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dispatch_sessions_total` (counter): accepted sessions by mode
//! - `dispatch_active_sessions` (gauge): sessions currently running
//! - `dispatch_backend_selected_total` (counter): selections by backend
//! - `dispatch_dial_total` (counter): outbound dials by backend and outcome
//! - `dispatch_protocol_errors_total` (counter): SOCKS errors by kind
//! - `dispatch_relay_bytes_total` (counter): bytes moved by the finishing direction
//! - `dispatch_session_duration_seconds` (histogram): session lifetime
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Counts a session as active until dropped, then records its duration.
///
/// Dropping covers sessions cancelled by shutdown as well as completed ones.
#[derive(Debug)]
pub struct SessionTimer {
    started: Instant,
}

impl SessionTimer {
    pub fn start(mode: &'static str) -> Self {
        counter!("dispatch_sessions_total", "mode" => mode).increment(1);
        gauge!("dispatch_active_sessions").increment(1.0);
        Self {
            started: Instant::now(),
        }
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        gauge!("dispatch_active_sessions").decrement(1.0);
        histogram!("dispatch_session_duration_seconds")
            .record(self.started.elapsed().as_secs_f64());
    }
}

pub fn record_backend_selected(backend: &str) {
    counter!("dispatch_backend_selected_total", "backend" => backend.to_string()).increment(1);
}

pub fn record_dial(backend: &str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!(
        "dispatch_dial_total",
        "backend" => backend.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_protocol_error(kind: &'static str) {
    counter!("dispatch_protocol_errors_total", "kind" => kind).increment(1);
}

pub fn record_relay_bytes(direction: &'static str, bytes: u64) {
    counter!("dispatch_relay_bytes_total", "direction" => direction).increment(bytes);
}
