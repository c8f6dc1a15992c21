//! Connection request parsing.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::socks::reply::write_reply;
use crate::socks::{
    read_field, ProtocolError, ATYP_DOMAIN, ATYP_IPV4, ATYP_IPV6, CMD_CONNECT, RESERVED,
    SOCKS_VERSION,
};

/// Destination requested by a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetAddr {
    Ip(SocketAddr),
    Domain(String, u16),
}

impl std::fmt::Display for TargetAddr {
    /// `host:port`, with IPv6 hosts in brackets.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetAddr::Ip(addr) => write!(f, "{}", addr),
            TargetAddr::Domain(host, port) => write!(f, "{}:{}", host, port),
        }
    }
}

/// Read a CONNECT request and return its destination.
///
/// The caller owes the client an error reply if this fails.
pub async fn read_request<R>(reader: &mut R) -> Result<TargetAddr, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 4];
    read_field(reader, &mut header, "request header").await?;

    let [version, command, _reserved, address_type] = header;
    if version != SOCKS_VERSION {
        return Err(ProtocolError::UnsupportedVersion(version));
    }
    if command != CMD_CONNECT {
        return Err(ProtocolError::UnsupportedCommand(command));
    }

    match address_type {
        ATYP_IPV4 => {
            let mut octets = [0u8; 4];
            read_field(reader, &mut octets, "IPv4 address").await?;
            let port = read_port(reader).await?;
            Ok(TargetAddr::Ip(SocketAddr::new(Ipv4Addr::from(octets).into(), port)))
        }
        ATYP_DOMAIN => {
            let mut len = [0u8; 1];
            read_field(reader, &mut len, "domain length").await?;
            let mut name = vec![0u8; len[0] as usize];
            read_field(reader, &mut name, "domain").await?;
            let port = read_port(reader).await?;

            let host = String::from_utf8(name).map_err(|_| ProtocolError::InvalidDomain)?;
            if host.is_empty() {
                return Err(ProtocolError::InvalidDomain);
            }
            Ok(TargetAddr::Domain(host, port))
        }
        ATYP_IPV6 => {
            let mut octets = [0u8; 16];
            read_field(reader, &mut octets, "IPv6 address").await?;
            let port = read_port(reader).await?;
            Ok(TargetAddr::Ip(SocketAddr::new(Ipv6Addr::from(octets).into(), port)))
        }
        other => Err(ProtocolError::UnsupportedAddressType(other)),
    }
}

/// Read a request; on failure, send the matching error reply before returning.
pub async fn accept_request<S>(stream: &mut S) -> Result<TargetAddr, ProtocolError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match read_request(stream).await {
        Ok(target) => Ok(target),
        Err(e) => {
            // The client may already be gone; the protocol error is what matters.
            let _ = write_reply(stream, e.reply_status()).await;
            Err(e)
        }
    }
}

async fn read_port<R>(reader: &mut R) -> Result<u16, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut port = [0u8; 2];
    read_field(reader, &mut port, "port").await?;
    Ok(u16::from_be_bytes(port))
}

/// Encode a request for `target` with the given command byte.
///
/// Fails with `InvalidDomain` if a domain is empty or longer than 255 bytes.
pub fn encode_request(command: u8, target: &TargetAddr) -> Result<Vec<u8>, ProtocolError> {
    let mut buf = vec![SOCKS_VERSION, command, RESERVED];
    let port = match target {
        TargetAddr::Ip(SocketAddr::V4(addr)) => {
            buf.push(ATYP_IPV4);
            buf.extend_from_slice(&addr.ip().octets());
            addr.port()
        }
        TargetAddr::Ip(SocketAddr::V6(addr)) => {
            buf.push(ATYP_IPV6);
            buf.extend_from_slice(&addr.ip().octets());
            addr.port()
        }
        TargetAddr::Domain(host, port) => {
            let len = u8::try_from(host.len()).map_err(|_| ProtocolError::InvalidDomain)?;
            if len == 0 {
                return Err(ProtocolError::InvalidDomain);
            }
            buf.push(ATYP_DOMAIN);
            buf.push(len);
            buf.extend_from_slice(host.as_bytes());
            *port
        }
    };
    buf.extend_from_slice(&port.to_be_bytes());
    Ok(buf)
}
