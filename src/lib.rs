//! Multi-homed outbound proxy library.
//!
//! Accepts SOCKS5 CONNECT requests (or raw tunnel connections) and spreads
//! the resulting outbound connections across several egress paths using
//! weighted round-robin.

pub mod config;
pub mod net;
pub mod socks;
pub mod load_balancer;
pub mod session;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use lifecycle::{start, start_with_config, ProxyHandle, Shutdown, StartError};
pub use observability::LogSink;
