//! Structured logging and the status-line sink.
//!
//! # Responsibilities
//! - Initialize the global tracing subscriber
//! - Provide `LogSink`, the single-argument callback the proxy reports
//!   human-readable status and diagnostic lines through
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Log level configurable via config and environment (`RUST_LOG` wins)
//! - Status lines are always delivered; diagnostic lines are dropped when quiet

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Target used when status lines are forwarded to tracing.
pub const STATUS_TARGET: &str = "dispatch_proxy::status";

/// Initialize the tracing subscriber.
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(level: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("dispatch_proxy={}", level)))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;
    Ok(())
}

/// Receiver for human-readable proxy messages.
///
/// The proxy never inspects what it logs; the sink decides where lines go.
#[derive(Clone)]
pub struct LogSink {
    inner: Arc<dyn Fn(&str) + Send + Sync>,
    quiet: bool,
}

impl LogSink {
    /// Wrap an arbitrary callback.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(f),
            quiet: false,
        }
    }

    /// Forward every line to tracing at INFO.
    pub fn tracing() -> Self {
        Self::new(|line| tracing::info!(target: STATUS_TARGET, "{}", line))
    }

    /// Drop every line.
    pub fn discard() -> Self {
        Self::new(|_| {})
    }

    /// Suppress diagnostic lines (status lines still pass).
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Lifecycle lines: startup, listening, shutdown, configuration.
    pub fn status(&self, line: impl AsRef<str>) {
        (self.inner)(line.as_ref());
    }

    /// Per-session lines: routing decisions, dial failures, protocol errors.
    pub fn diag(&self, line: impl AsRef<str>) {
        if !self.quiet {
            (self.inner)(line.as_ref());
        }
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::tracing()
    }
}

impl std::fmt::Debug for LogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSink").field("quiet", &self.quiet).finish_non_exhaustive()
    }
}
