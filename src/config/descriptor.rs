//! Backend descriptor grammar.
//!
//! ```text
//! socks mode:   <ipv4>[@weight]        e.g. 192.168.1.20@3
//! tunnel mode:  <host>:<port>[@weight] e.g. relay.example.net:22@2
//! ```
//!
//! The weight (contention ratio) is optional and defaults to 1.

use std::net::Ipv4Addr;
use std::num::NonZeroU32;
use thiserror::Error;

use crate::config::schema::Mode;

/// Errors produced while parsing a backend descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("empty backend descriptor")]
    Empty,

    #[error("invalid IPv4 address: {0}")]
    InvalidIpv4(String),

    #[error("invalid tunnel target (expected host:port): {0}")]
    InvalidTarget(String),

    #[error("invalid port in {0}")]
    InvalidPort(String),

    #[error("invalid contention ratio for {0}")]
    InvalidWeight(String),
}

/// What a descriptor points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecTarget {
    /// Local address whose interface carries the egress traffic.
    Local(Ipv4Addr),
    /// Fixed remote endpoint reached in tunnel mode.
    Upstream { host: String, port: u16 },
}

/// A parsed, not yet resolved, backend descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSpec {
    pub target: SpecTarget,
    pub weight: NonZeroU32,
}

impl BackendSpec {
    /// Parse a descriptor according to the listener mode.
    pub fn parse(descriptor: &str, mode: Mode) -> Result<Self, DescriptorError> {
        let descriptor = descriptor.trim();
        if descriptor.is_empty() {
            return Err(DescriptorError::Empty);
        }

        let (addr_part, weight_part) = match descriptor.split_once('@') {
            Some((addr, weight)) => (addr, Some(weight)),
            None => (descriptor, None),
        };

        let weight = match weight_part {
            None => NonZeroU32::MIN,
            Some(raw) => raw
                .parse::<NonZeroU32>()
                .map_err(|_| DescriptorError::InvalidWeight(addr_part.to_string()))?,
        };

        let target = match mode {
            Mode::Socks => addr_part
                .parse::<Ipv4Addr>()
                .map(SpecTarget::Local)
                .map_err(|_| DescriptorError::InvalidIpv4(addr_part.to_string()))?,
            Mode::Tunnel => parse_host_port(addr_part)?,
        };

        Ok(Self { target, weight })
    }
}

fn parse_host_port(raw: &str) -> Result<SpecTarget, DescriptorError> {
    let (host, port) = raw
        .rsplit_once(':')
        .ok_or_else(|| DescriptorError::InvalidTarget(raw.to_string()))?;

    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    // Unbracketed colons mean an IPv6 literal without brackets.
    if host.is_empty() || (host.contains(':') && !raw.starts_with('[')) {
        return Err(DescriptorError::InvalidTarget(raw.to_string()));
    }

    let port = port
        .parse::<u16>()
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| DescriptorError::InvalidPort(raw.to_string()))?;

    Ok(SpecTarget::Upstream {
        host: host.to_string(),
        port,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socks_descriptor_defaults_weight() {
        let spec = BackendSpec::parse("192.168.1.20", Mode::Socks).unwrap();
        assert_eq!(spec.target, SpecTarget::Local(Ipv4Addr::new(192, 168, 1, 20)));
        assert_eq!(spec.weight.get(), 1);
    }

    #[test]
    fn socks_descriptor_with_weight() {
        let spec = BackendSpec::parse("10.0.0.7@3", Mode::Socks).unwrap();
        assert_eq!(spec.weight.get(), 3);
    }

    #[test]
    fn socks_rejects_non_ipv4() {
        assert_eq!(
            BackendSpec::parse("::1", Mode::Socks),
            Err(DescriptorError::InvalidIpv4("::1".into()))
        );
        assert!(BackendSpec::parse("eth0", Mode::Socks).is_err());
    }

    #[test]
    fn rejects_zero_or_garbage_weight() {
        assert_eq!(
            BackendSpec::parse("10.0.0.7@0", Mode::Socks),
            Err(DescriptorError::InvalidWeight("10.0.0.7".into()))
        );
        assert!(BackendSpec::parse("10.0.0.7@x", Mode::Socks).is_err());
        assert!(BackendSpec::parse("10.0.0.7@-2", Mode::Socks).is_err());
    }

    #[test]
    fn tunnel_descriptor() {
        let spec = BackendSpec::parse("relay.example.net:22@2", Mode::Tunnel).unwrap();
        assert_eq!(
            spec.target,
            SpecTarget::Upstream {
                host: "relay.example.net".into(),
                port: 22
            }
        );
        assert_eq!(spec.weight.get(), 2);
    }

    #[test]
    fn tunnel_descriptor_bracketed_host() {
        let spec = BackendSpec::parse("[::1]:2222", Mode::Tunnel).unwrap();
        assert_eq!(
            spec.target,
            SpecTarget::Upstream {
                host: "::1".into(),
                port: 2222
            }
        );
    }

    #[test]
    fn tunnel_rejects_bad_targets() {
        assert!(matches!(
            BackendSpec::parse("relay.example.net", Mode::Tunnel),
            Err(DescriptorError::InvalidTarget(_))
        ));
        assert!(matches!(
            BackendSpec::parse(":22", Mode::Tunnel),
            Err(DescriptorError::InvalidTarget(_))
        ));
        assert!(matches!(
            BackendSpec::parse("host:0", Mode::Tunnel),
            Err(DescriptorError::InvalidPort(_))
        ));
        assert!(matches!(
            BackendSpec::parse("host:70000", Mode::Tunnel),
            Err(DescriptorError::InvalidPort(_))
        ));
        assert_eq!(BackendSpec::parse("  ", Mode::Tunnel), Err(DescriptorError::Empty));
    }
}
