//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) and/or command line
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → descriptor.rs (backend descriptor grammar)
//!     → ProxyConfig (validated, immutable)
//!     → lifecycle::startup resolves descriptors into backends
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the backend registry never changes at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod descriptor;
pub mod loader;
pub mod schema;
pub mod validation;

pub use descriptor::{BackendSpec, DescriptorError, SpecTarget};
pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{ListenerConfig, Mode, ObservabilityConfig, ProxyConfig, TimeoutConfig};
pub use validation::{validate_config, ValidationError};
