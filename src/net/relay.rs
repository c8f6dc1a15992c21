//! Bidirectional byte relay between the inbound and outbound sockets.
//!
//! # Responsibilities
//! - Copy inbound → outbound and outbound → inbound concurrently
//! - Half-close the destination when a direction reaches EOF
//! - Tear both sockets down once the first direction completes
//!
//! # Design Decisions
//! - Close-on-first-completion bounds resource lifetime: the slower
//!   direction is cancelled even if its peer never closes, at the cost of
//!   possibly dropping its trailing bytes

use std::io;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

/// Which way bytes were flowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Client → remote.
    Upload,
    /// Remote → client.
    Download,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Upload => "upload",
            Direction::Download => "download",
        }
    }
}

/// Outcome of a relay: the direction that finished first and its result.
#[derive(Debug)]
pub struct RelaySummary {
    pub finished: Direction,
    pub result: io::Result<u64>,
}

impl RelaySummary {
    /// Bytes moved by the finishing direction, if it ended cleanly.
    pub fn bytes(&self) -> Option<u64> {
        self.result.as_ref().ok().copied()
    }
}

/// Relay bytes until either direction finishes, then close both sockets.
pub async fn relay(inbound: TcpStream, outbound: TcpStream) -> RelaySummary {
    let (mut inbound_read, mut inbound_write) = inbound.into_split();
    let (mut outbound_read, mut outbound_write) = outbound.into_split();

    let summary = tokio::select! {
        result = pump(&mut inbound_read, &mut outbound_write) => RelaySummary {
            finished: Direction::Upload,
            result,
        },
        result = pump(&mut outbound_read, &mut inbound_write) => RelaySummary {
            finished: Direction::Download,
            result,
        },
    };

    tracing::trace!(
        finished = summary.finished.as_str(),
        bytes = ?summary.bytes(),
        "Relay finished, closing both sockets"
    );
    // Dropping all four halves here closes both sockets.
    summary
}

/// Copy until EOF, then shut down the write side so the peer sees EOF.
async fn pump<R, W>(reader: &mut R, writer: &mut W) -> io::Result<u64>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let copied = tokio::io::copy(reader, writer).await?;
    writer.shutdown().await?;
    Ok(copied)
}
