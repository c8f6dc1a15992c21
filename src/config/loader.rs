//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    let config: ProxyConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load a configuration file without validating it.
///
/// Used by the binary, which merges command-line overrides before validating.
pub fn load_unvalidated(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Mode;

    #[test]
    fn parses_full_file() {
        let config = parse_config(
            r#"
            mode = "tunnel"
            backends = ["relay-a.example.net:22@2", "relay-b.example.net:22"]

            [listener]
            host = "0.0.0.0"
            port = 1080
            max_connections = 64

            [timeouts]
            connect_secs = 3

            [observability]
            quiet = true
            "#,
        )
        .unwrap();

        assert_eq!(config.mode, Mode::Tunnel);
        assert_eq!(config.backends.len(), 2);
        assert_eq!(config.listener.bind_address(), "0.0.0.0:1080");
        assert_eq!(config.listener.max_connections, 64);
        assert_eq!(config.timeouts.connect_secs, 3);
        assert!(config.observability.quiet);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn minimal_file_uses_defaults() {
        let config = parse_config(r#"backends = ["10.0.0.1"]"#).unwrap();
        assert_eq!(config.mode, Mode::Socks);
        assert_eq!(config.listener.port, 8080);
    }

    #[test]
    fn validation_errors_surface() {
        let err = parse_config("backends = []").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert_eq!(err.to_string(), "Validation failed: no backends specified");
    }

    #[test]
    fn syntax_errors_surface() {
        let err = parse_config("mode = \"udp\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
