//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Session needs an egress path
//!     → dispatcher.rs select()            (weighted round-robin, advances rotation)
//!     → on dial failure (tunnel mode):
//!         failover.rs records the index   (per-session bitset)
//!         dispatcher.rs select_excluding() (first untried backend from the cursor)
//!     → backend.rs (address, interface, active session count)
//! ```
//!
//! # Design Decisions
//! - One dispatcher shared by all sessions; it knows nothing about sessions
//! - Weighted rotation uses integer counters, not an expanded sequence
//! - Failures are scoped to one session; no backend is ever removed from the pool

pub mod backend;
pub mod dispatcher;
pub mod failover;

pub use backend::{Backend, BackendSessionGuard, Endpoint};
pub use dispatcher::{DispatchError, Dispatcher, Selection};
pub use failover::FailureSet;
