//! Orchestrator integration tests.
//!
//! Tests the full flow: config -> schema loading -> bind -> datagrams ->
//! shutdown -> final stats.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::net::UdpSocket;
use tokio::sync::oneshot;

use udplog_core::config::UdplogConfig;
use udplog_core::event::Event;
use udplog_daemon::Orchestrator;
use udplog_ingest::CollectingPublisher;

const WAIT: Duration = Duration::from_secs(5);

/// Reserve a free UDP port on loopback.
fn free_port() -> u16 {
    let socket = std::net::UdpSocket::bind("127.0.0.1:0").expect("bind scratch socket");
    socket.local_addr().expect("scratch addr").port()
}

fn test_config(extra: &str) -> UdplogConfig {
    let toml_str = format!(
        r#"
[general]
log_level = "info"

[ingest]
listen_host = "127.0.0.1"
port = {port}
recv_timeout_ms = 50
{extra}
"#,
        port = free_port(),
    );
    UdplogConfig::parse(&toml_str).expect("failed to parse test config")
}

async fn wait_for(publisher: &CollectingPublisher, count: usize) -> Vec<Event> {
    tokio::time::timeout(WAIT, async {
        loop {
            if publisher.len() >= count {
                return publisher.events();
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("events should arrive")
}

#[tokio::test]
async fn test_events_flow_and_stats_on_shutdown() {
    let publisher = Arc::new(CollectingPublisher::new());
    let orchestrator =
        Orchestrator::build_with_publisher(test_config(""), Box::new(Arc::clone(&publisher)))
            .await
            .expect("orchestrator should build");
    let addr = orchestrator.local_addr();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let run = tokio::spawn(orchestrator.run_until(async move {
        let _ = stop_rx.await;
        Ok("test")
    }));

    let client = UdpSocket::bind("127.0.0.1:0").await.expect("client");
    client.send_to(br#"json:metrics:{"a":1}"#, addr).await.expect("send");
    client.send_to(b"garbage", addr).await.expect("send");
    client.send_to(b"plain:app:hello", addr).await.expect("send");

    let events = wait_for(&publisher, 2).await;
    assert_eq!(events[0].fields.get("a"), Some(&json!(1)));
    assert_eq!(events[1].message(), Some("hello"));
    assert_eq!(events[1].counter, 2);

    stop_tx.send(()).expect("signal stop");
    let stats = tokio::time::timeout(WAIT, run)
        .await
        .expect("orchestrator stops")
        .expect("task joins")
        .expect("run succeeds")
        .expect("loop stops within grace period");

    assert_eq!(stats.received, 3);
    assert_eq!(stats.published, 2);
    assert_eq!(stats.dropped_frame, 1);
}

#[tokio::test]
async fn test_schema_files_enable_quarantine() {
    let dir = tempfile::tempdir().expect("tempdir");
    let schema_path = dir.path().join("metrics.json");
    std::fs::File::create(&schema_path)
        .and_then(|mut f| f.write_all(br#"{"type":"object","required":["cpu"]}"#))
        .expect("write schema");

    let extra = format!(
        "enable_json_validation = true\n\n[ingest.json_document_type_schema]\nmetrics = {:?}\n",
        schema_path.display().to_string()
    );
    let publisher = Arc::new(CollectingPublisher::new());
    let orchestrator =
        Orchestrator::build_with_publisher(test_config(&extra), Box::new(Arc::clone(&publisher)))
            .await
            .expect("orchestrator should build");
    let addr = orchestrator.local_addr();
    let token = orchestrator.shutdown_token();

    let never = std::future::pending::<anyhow::Result<&'static str>>();
    let run = tokio::spawn(orchestrator.run_until(never));

    let client = UdpSocket::bind("127.0.0.1:0").await.expect("client");
    client.send_to(br#"json:metrics:{"mem":1}"#, addr).await.expect("send");
    client.send_to(br#"json:audit:{"user":"root"}"#, addr).await.expect("send");
    client.send_to(br#"json:metrics:{"cpu":1}"#, addr).await.expect("send");

    let events = wait_for(&publisher, 2).await;
    assert!(events[0].is_quarantined());
    assert_eq!(events[0].message(), Some(r#"{"mem":1}"#));
    assert!(!events[1].is_quarantined());
    assert_eq!(events[1].counter, 2);

    // 토큰만 취소해도 루프는 다음 타임아웃에 종료된다
    token.cancel();
    tokio::time::timeout(WAIT, async {
        while !run.is_finished() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("loop exits after token cancel");
}

#[tokio::test]
async fn test_missing_schema_file_fails_startup() {
    let extra = "enable_json_validation = true\n\n[ingest.json_document_type_schema]\nmetrics = \"/nonexistent/udplog/metrics.json\"\n";
    let result = Orchestrator::build_with_publisher(
        test_config(extra),
        Box::new(CollectingPublisher::new()),
    )
    .await;
    assert!(result.is_err(), "missing schema file must fail startup");
}

#[tokio::test]
async fn test_schemas_ignored_when_validation_disabled() {
    let extra = "\n[ingest.json_document_type_schema]\nmetrics = \"/nonexistent/udplog/metrics.json\"\n";
    let result = Orchestrator::build_with_publisher(
        test_config(extra),
        Box::new(CollectingPublisher::new()),
    )
    .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_port_in_use_fails_startup() {
    let holder = std::net::UdpSocket::bind("127.0.0.1:0").expect("bind holder");
    let port = holder.local_addr().expect("holder addr").port();

    let mut config = test_config("");
    config.ingest.port = port;
    let result =
        Orchestrator::build_with_publisher(config, Box::new(CollectingPublisher::new())).await;
    let err = result.err().expect("bind must fail while port is held");
    assert!(err.to_string().contains("failed to start ingest"));
}

#[tokio::test]
async fn test_blocked_loop_is_aborted_after_grace() {
    let config = test_config("");
    let mut config = config;
    config.ingest.recv_timeout_ms = 0;

    let orchestrator =
        Orchestrator::build_with_publisher(config, Box::new(CollectingPublisher::new()))
            .await
            .expect("orchestrator should build");
    let addr = orchestrator.local_addr();

    let stats = tokio::time::timeout(WAIT, orchestrator.run_until(async { Ok("test") }))
        .await
        .expect("orchestrator returns after grace")
        .expect("run succeeds");
    assert!(stats.is_none(), "blocked loop should have been aborted");

    // 중단된 루프의 소켓은 해제된다
    std::net::UdpSocket::bind(addr).expect("port released after abort");
}
