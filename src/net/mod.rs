//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (session id, drain tracking)
//!     → Hand off to session layer
//!
//! Outbound side:
//!     interfaces.rs (which interface owns a backend address)
//!     → binder.rs (bind, pin to interface, connect with timeout)
//!     → relay.rs (bidirectional copy until the first direction ends)
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - Each session tracked for graceful shutdown

pub mod binder;
pub mod connection;
pub mod interfaces;
pub mod listener;
pub mod relay;

pub use binder::{Binder, DialError, DEFAULT_CONNECT_TIMEOUT};
pub use connection::{SessionGuard, SessionId, SessionTracker};
pub use interfaces::{find_interface, InterfaceLookup};
pub use listener::{ConnectionPermit, Listener, ListenerError};
pub use relay::{relay, Direction, RelaySummary};
