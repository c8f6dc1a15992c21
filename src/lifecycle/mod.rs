//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validate config → Resolve backends → Build dispatcher → Bind listener
//!     → Spawn accept loop → ProxyHandle
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → caller invokes ProxyHandle::stop()
//!
//! Shutdown (shutdown.rs):
//!     ProxyHandle::stop() → Stop accepting → Cancel sessions → Drain → Done
//! ```
//!
//! # Design Decisions
//! - No global running flag: the handle owns the proxy's lifetime
//! - Ordered shutdown: stop accept, drain, close
//! - Drain has a deadline so a stuck task cannot hang `stop()`

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
pub use startup::{start, start_with_config, ProxyHandle, StartError, DRAIN_TIMEOUT};
