//! Reply encoding.

use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::socks::{ATYP_IPV4, RESERVED, SOCKS_VERSION};

/// SOCKS5 reply codes.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    Succeeded = 0x00,
    GeneralFailure = 0x01,
    ConnectionNotAllowed = 0x02,
    NetworkUnreachable = 0x03,
    HostUnreachable = 0x04,
    ConnectionRefused = 0x05,
    TtlExpired = 0x06,
    CommandNotSupported = 0x07,
    AddrTypeNotSupported = 0x08,
}

impl ReplyStatus {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for ReplyStatus {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0x00 => ReplyStatus::Succeeded,
            0x01 => ReplyStatus::GeneralFailure,
            0x02 => ReplyStatus::ConnectionNotAllowed,
            0x03 => ReplyStatus::NetworkUnreachable,
            0x04 => ReplyStatus::HostUnreachable,
            0x05 => ReplyStatus::ConnectionRefused,
            0x06 => ReplyStatus::TtlExpired,
            0x07 => ReplyStatus::CommandNotSupported,
            0x08 => ReplyStatus::AddrTypeNotSupported,
            other => return Err(other),
        })
    }
}

/// Encode a reply. The bound address is always `0.0.0.0:0`.
pub fn encode_reply(status: ReplyStatus) -> [u8; 10] {
    [
        SOCKS_VERSION,
        status.as_u8(),
        RESERVED,
        ATYP_IPV4,
        0,
        0,
        0,
        0,
        0,
        0,
    ]
}

/// Write a reply to the client.
pub async fn write_reply<W>(writer: &mut W, status: ReplyStatus) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&encode_reply(status)).await
}
