//! Startup failures and graceful shutdown.

use std::time::Duration;

use dispatch_proxy::config::{parse_config, ConfigError, Mode, ProxyConfig, ValidationError};
use dispatch_proxy::{start, start_with_config, LogSink, StartError};
use tokio::net::TcpStream;

mod common;
use common::CapturedLines;

#[tokio::test]
async fn test_stop_closes_listener_and_sessions() {
    let echo = common::start_echo_server().await;
    let log = CapturedLines::new();
    let proxy = start("127.0.0.1", 0, true, [echo.to_string()], log.sink())
        .await
        .unwrap();
    let addr = proxy.local_addr();

    let mut client = TcpStream::connect(addr).await.unwrap();
    assert_eq!(common::echo_exchange(&mut client, b"alive").await, b"alive");
    assert_eq!(proxy.active_sessions(), 1);

    tokio::time::timeout(Duration::from_secs(3), proxy.stop())
        .await
        .expect("stop should not wait for the drain deadline");

    assert!(common::is_closed(&mut client).await);
    assert!(TcpStream::connect(addr).await.is_err());
    assert!(log.contains("[INFO] Shutting down"));
    assert!(log.contains("[INFO] Server stopped"));
}

#[tokio::test]
async fn test_malformed_descriptor_is_fatal() {
    let err = start("127.0.0.1", 0, true, ["10.0.0.1:notaport"], LogSink::discard())
        .await
        .unwrap_err();
    match &err {
        StartError::Config(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 1),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("backend #1"));
}

#[tokio::test]
async fn test_oversized_connection_limit_is_fatal() {
    let mut config = ProxyConfig {
        mode: Mode::Tunnel,
        backends: vec!["127.0.0.1:9".into()],
        ..ProxyConfig::default()
    };
    config.listener.port = 0;
    config.listener.max_connections = usize::MAX;

    let err = start_with_config(config, LogSink::discard()).await.unwrap_err();
    match &err {
        StartError::Config(ConfigError::Validation(errors)) => {
            assert!(matches!(errors[..], [ValidationError::TooManyConnections { .. }]))
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_socks_address_must_be_local() {
    let log = CapturedLines::new();
    let err = start("127.0.0.1", 0, false, ["192.0.2.77@2"], log.sink())
        .await
        .unwrap_err();
    assert!(matches!(err, StartError::UnknownLocalAddress(_)));
    assert!(!log.contains("Server started"));
}

#[tokio::test]
async fn test_port_in_use_is_fatal() {
    let first = start("127.0.0.1", 0, true, ["127.0.0.1:9"], LogSink::discard())
        .await
        .unwrap();
    let port = first.local_addr().port();

    let err = start("127.0.0.1", port, true, ["127.0.0.1:9"], LogSink::discard())
        .await
        .unwrap_err();
    assert!(matches!(err, StartError::Listener(_)));
    assert!(err
        .to_string()
        .starts_with(&format!("Could not start server on 127.0.0.1:{}", port)));

    first.stop().await;
}

#[tokio::test]
async fn test_start_from_toml() {
    let echo = common::start_echo_server().await;
    let config = parse_config(&format!(
        r#"
mode = "tunnel"
backends = ["{}@3"]

[listener]
host = "127.0.0.1"
port = 0
max_connections = 4

[timeouts]
connect_secs = 1

[observability]
quiet = true
"#,
        echo
    ))
    .unwrap();

    let log = CapturedLines::new();
    let proxy = start_with_config(config, log.sink()).await.unwrap();
    let mut client = TcpStream::connect(proxy.local_addr()).await.unwrap();
    assert_eq!(common::echo_exchange(&mut client, b"toml").await, b"toml");
    drop(client);
    proxy.stop().await;

    assert!(log.contains(&format!("[INFO] LB 1: {} (Iface: -), Ratio: 3", echo)));
    assert!(!log.contains("Tunnelled to"));
}
