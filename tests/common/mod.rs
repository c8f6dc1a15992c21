//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dispatch_proxy::socks::{encode_request, TargetAddr, CMD_CONNECT};
use dispatch_proxy::LogSink;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Start a TCP server that echoes everything back until the peer closes.
pub async fn start_echo_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (mut reader, mut writer) = socket.split();
                let _ = tokio::io::copy(&mut reader, &mut writer).await;
                let _ = writer.shutdown().await;
            });
        }
    });
    addr
}

/// Start a server that writes `tag` to every connection, then closes it.
pub async fn start_tag_server(tag: u8) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ = socket.write_all(&[tag]).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    addr
}

/// A loopback port with nothing listening on it.
pub async fn refused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// A connected pair: (client side, server side).
pub async fn tcp_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let client = TcpStream::connect(listener.local_addr().unwrap())
        .await
        .unwrap();
    let (server, _) = listener.accept().await.unwrap();
    (client, server)
}

/// Collects every line written to a `LogSink`.
#[derive(Clone, Default)]
pub struct CapturedLines(Arc<Mutex<Vec<String>>>);

impl CapturedLines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sink(&self) -> LogSink {
        let lines = self.0.clone();
        LogSink::new(move |line| lines.lock().unwrap().push(line.to_string()))
    }

    pub fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }

    /// Poll until a line containing `needle` appears.
    pub async fn wait_for(&self, needle: &str) -> bool {
        for _ in 0..100 {
            if self.contains(needle) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }
}

/// Greet a SOCKS5 proxy, send a request and return the stream and the reply.
pub async fn socks_request(proxy: SocketAddr, command: u8, target: &TargetAddr) -> (TcpStream, [u8; 10]) {
    let request = encode_request(command, target).unwrap();
    socks_raw_request(proxy, &request).await
}

/// Like [`socks_request`], with a pre-encoded request.
pub async fn socks_raw_request(proxy: SocketAddr, request: &[u8]) -> (TcpStream, [u8; 10]) {
    let mut stream = TcpStream::connect(proxy).await.unwrap();
    stream.write_all(&[0x05, 0x01, 0x00]).await.unwrap();

    let mut method = [0u8; 2];
    stream.read_exact(&mut method).await.unwrap();
    assert_eq!(method, [0x05, 0x00]);

    stream.write_all(request).await.unwrap();
    let mut reply = [0u8; 10];
    stream.read_exact(&mut reply).await.unwrap();
    (stream, reply)
}

/// CONNECT through a SOCKS5 proxy and return the stream and the reply.
pub async fn socks_connect(proxy: SocketAddr, target: &TargetAddr) -> (TcpStream, [u8; 10]) {
    socks_request(proxy, CMD_CONNECT, target).await
}

/// Write `payload` and read back as many bytes as were sent.
///
/// The connection stays open: a proxy tears a session down as soon as
/// either side finishes, so a half-close would race the echo.
pub async fn echo_exchange(stream: &mut TcpStream, payload: &[u8]) -> Vec<u8> {
    stream.write_all(payload).await.unwrap();
    let mut received = vec![0u8; payload.len()];
    stream.read_exact(&mut received).await.unwrap();
    received
}

/// True if the peer has closed the connection (EOF or reset).
pub async fn is_closed(stream: &mut TcpStream) -> bool {
    let mut buf = [0u8; 1];
    match tokio::time::timeout(Duration::from_secs(2), stream.read(&mut buf)).await {
        Ok(Ok(0)) | Ok(Err(_)) => true,
        Ok(Ok(_)) | Err(_) => false,
    }
}
