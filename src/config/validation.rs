//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check every backend descriptor against the configured mode
//! - Validate value ranges (timeouts > 0, connection limit within the semaphore's range)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Interface ownership of SOCKS addresses is checked at startup, not here

use std::net::SocketAddr;
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::config::descriptor::{BackendSpec, DescriptorError};
use crate::config::schema::ProxyConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no backends specified")]
    NoBackends,

    #[error("backend #{index}: {source}")]
    Descriptor {
        index: usize,
        #[source]
        source: DescriptorError,
    },

    #[error("listener host must not be empty")]
    EmptyListenHost,

    #[error("listener max_connections must be greater than zero")]
    ZeroMaxConnections,

    #[error("listener max_connections must not exceed {max}")]
    TooManyConnections { max: usize },

    #[error("timeouts.connect_secs must be greater than zero")]
    ZeroConnectTimeout,

    #[error("invalid metrics address: {0}")]
    InvalidMetricsAddress(String),
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }
    for (index, descriptor) in config.backends.iter().enumerate() {
        if let Err(source) = BackendSpec::parse(descriptor, config.mode) {
            errors.push(ValidationError::Descriptor {
                index: index + 1,
                source,
            });
        }
    }

    if config.listener.host.trim().is_empty() {
        errors.push(ValidationError::EmptyListenHost);
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroMaxConnections);
    } else if config.listener.max_connections > Semaphore::MAX_PERMITS {
        errors.push(ValidationError::TooManyConnections {
            max: Semaphore::MAX_PERMITS,
        });
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroConnectTimeout);
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
