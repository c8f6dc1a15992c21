//! SOCKS5 protocol engine.
//!
//! # Data Flow
//! ```text
//! Inbound stream
//!     → handshake.rs  (version + methods, always answers "no authentication")
//!     → request.rs    (CONNECT request → TargetAddr)
//!     → reply.rs      (fixed 10-byte replies, zeroed bound address)
//! ```
//!
//! # Design Decisions
//! - Only the no-auth method and the CONNECT command are supported
//! - Replies never report a real bound address; clients only need the status
//! - Every function is generic over `AsyncRead + AsyncWrite` so it can be
//!   driven by a `TcpStream` or an in-memory duplex in tests

use std::io;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

pub mod handshake;
pub mod reply;
pub mod request;

pub use handshake::handshake;
pub use reply::{encode_reply, write_reply, ReplyStatus};
pub use request::{accept_request, encode_request, read_request, TargetAddr};

pub const SOCKS_VERSION: u8 = 0x05;
pub const RESERVED: u8 = 0x00;

pub const AUTH_NO_AUTH: u8 = 0x00;
pub const AUTH_USERNAME_PASSWORD: u8 = 0x02;

pub const CMD_CONNECT: u8 = 0x01;
pub const CMD_BIND: u8 = 0x02;

pub const ATYP_IPV4: u8 = 0x01;
pub const ATYP_DOMAIN: u8 = 0x03;
pub const ATYP_IPV6: u8 = 0x04;

/// Errors raised while speaking SOCKS5 with a client.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unsupported SOCKS version {0:#04x}")]
    UnsupportedVersion(u8),

    #[error("connection closed while reading {0}")]
    Truncated(&'static str),

    #[error("unsupported command {0:#04x}")]
    UnsupportedCommand(u8),

    #[error("address type {0:#04x} not supported")]
    UnsupportedAddressType(u8),

    #[error("invalid domain name")]
    InvalidDomain,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ProtocolError {
    /// Status owed to the client when this error happens after the handshake.
    pub fn reply_status(&self) -> ReplyStatus {
        match self {
            ProtocolError::UnsupportedCommand(_) => ReplyStatus::CommandNotSupported,
            ProtocolError::UnsupportedAddressType(_) => ReplyStatus::AddrTypeNotSupported,
            _ => ReplyStatus::GeneralFailure,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProtocolError::UnsupportedVersion(_) => "version",
            ProtocolError::Truncated(_) => "truncated",
            ProtocolError::UnsupportedCommand(_) => "command",
            ProtocolError::UnsupportedAddressType(_) => "address_type",
            ProtocolError::InvalidDomain => "domain",
            ProtocolError::Io(_) => "io",
        }
    }
}

/// `read_exact` that reports a short read as `Truncated`.
pub(crate) async fn read_field<R>(
    reader: &mut R,
    buf: &mut [u8],
    field: &'static str,
) -> Result<(), ProtocolError>
where
    R: AsyncRead + Unpin,
{
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(ProtocolError::Truncated(field)),
        Err(e) => Err(ProtocolError::Io(e)),
    }
}
