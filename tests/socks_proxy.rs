//! End-to-end tests for SOCKS mode.

use std::net::SocketAddr;

use dispatch_proxy::socks::{ReplyStatus, TargetAddr, CMD_BIND};
use dispatch_proxy::{start, ProxyHandle};

mod common;
use common::CapturedLines;

async fn start_socks_proxy(log: &CapturedLines) -> ProxyHandle {
    start("127.0.0.1", 0, false, ["127.0.0.1"], log.sink())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_connect_and_relay() {
    let echo = common::start_echo_server().await;
    let log = CapturedLines::new();
    let proxy = start_socks_proxy(&log).await;

    let (mut stream, reply) =
        common::socks_connect(proxy.local_addr(), &TargetAddr::Ip(echo)).await;
    assert_eq!(reply, [0x05, 0x00, 0x00, 0x01, 0, 0, 0, 0, 0, 0]);

    let payload: Vec<u8> = (0..4096).map(|_| fastrand::u8(..)).collect();
    assert_eq!(common::echo_exchange(&mut stream, &payload).await, payload);

    assert!(log.contains("[INFO] LB 1: 127.0.0.1:0"));
    assert!(log.contains(&format!("Server started on {}", proxy.local_addr())));
    assert!(log.contains(&format!("-> {} (via 127.0.0.1:0 LB:0)", echo)));

    drop(stream);
    proxy.stop().await;
}

#[tokio::test]
async fn test_connect_by_domain() {
    let echo = common::start_echo_server().await;
    let proxy = start_socks_proxy(&CapturedLines::new()).await;

    let target = TargetAddr::Domain("localhost".into(), echo.port());
    let (mut stream, reply) = common::socks_connect(proxy.local_addr(), &target).await;
    assert_eq!(reply[1], ReplyStatus::Succeeded.as_u8());
    assert_eq!(common::echo_exchange(&mut stream, b"ping").await, b"ping");

    drop(stream);
    proxy.stop().await;
}

#[tokio::test]
async fn test_bind_command_not_supported() {
    let log = CapturedLines::new();
    let proxy = start_socks_proxy(&log).await;

    // Header only: the proxy rejects the command before reading an address.
    let (mut stream, reply) =
        common::socks_raw_request(proxy.local_addr(), &[0x05, CMD_BIND, 0x00, 0x01]).await;
    assert_eq!(reply[1], 0x07);
    assert!(common::is_closed(&mut stream).await);
    assert!(log.wait_for("Request failed: unsupported command").await);

    proxy.stop().await;
}

#[tokio::test]
async fn test_unknown_address_type() {
    let proxy = start_socks_proxy(&CapturedLines::new()).await;

    let (mut stream, reply) =
        common::socks_raw_request(proxy.local_addr(), &[0x05, 0x01, 0x00, 0x05]).await;
    assert_eq!(reply[1], ReplyStatus::AddrTypeNotSupported.as_u8());
    assert!(common::is_closed(&mut stream).await);

    proxy.stop().await;
}

#[tokio::test]
async fn test_unreachable_destination() {
    let port = common::refused_port().await;
    let log = CapturedLines::new();
    let proxy = start_socks_proxy(&log).await;

    let target = TargetAddr::Ip(SocketAddr::from(([127, 0, 0, 1], port)));
    let (mut stream, reply) = common::socks_connect(proxy.local_addr(), &target).await;
    assert_eq!(reply[1], ReplyStatus::NetworkUnreachable.as_u8());
    assert!(common::is_closed(&mut stream).await);
    assert!(log.wait_for("[WARN] sess-").await);
    assert!(log.contains(&format!("Failed to connect to 127.0.0.1:{}", port)));

    proxy.stop().await;
}

#[tokio::test]
async fn test_quiet_suppresses_session_lines() {
    let echo = common::start_echo_server().await;
    let log = CapturedLines::new();
    let proxy = start("127.0.0.1", 0, false, ["127.0.0.1"], log.sink().with_quiet(true))
        .await
        .unwrap();

    let (mut stream, _) = common::socks_connect(proxy.local_addr(), &TargetAddr::Ip(echo)).await;
    assert_eq!(common::echo_exchange(&mut stream, b"quiet").await, b"quiet");
    drop(stream);
    proxy.stop().await;

    assert!(log.contains("Server started on"));
    assert!(log.contains("Server stopped"));
    assert!(!log.contains("[DEBUG]"));
}
