//! 통합 테스트 -- 실제 UDP 소켓으로 수집 루프 전체 흐름 검증
//!
//! 루프를 `127.0.0.1:0`에 바인드하고 클라이언트 소켓으로 데이터그램을 보낸 뒤
//! 메모리 퍼블리셔에 도착한 이벤트를 확인합니다.

use std::collections::BTreeMap;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use udplog_core::event::Event;
use udplog_ingest::{
    CollectingPublisher, IngestConfig, IngestConfigBuilder, IngestError, IngestStats,
    IngestionLoop, SchemaLoader, SchemaRegistry,
};

const WAIT: Duration = Duration::from_secs(5);

struct Harness {
    addr: SocketAddr,
    client: UdpSocket,
    publisher: Arc<CollectingPublisher>,
    shutdown: CancellationToken,
    handle: JoinHandle<Result<IngestStats, IngestError>>,
}

impl Harness {
    async fn start(config: IngestConfig, registry: SchemaRegistry) -> Self {
        let publisher = Arc::new(CollectingPublisher::new());
        let shutdown = CancellationToken::new();
        let mut ingest = IngestionLoop::bind(
            &config,
            Arc::new(registry),
            Arc::clone(&publisher),
            shutdown.clone(),
        )
        .await
        .expect("bind ingest socket");
        let addr = ingest.local_addr();

        let handle = tokio::spawn(async move {
            ingest.run().await?;
            Ok::<_, IngestError>(ingest.stats().clone())
        });

        let client = UdpSocket::bind("127.0.0.1:0").await.expect("bind client");
        Self {
            addr,
            client,
            publisher,
            shutdown,
            handle,
        }
    }

    async fn send(&self, data: &[u8]) {
        self.client.send_to(data, self.addr).await.expect("send datagram");
    }

    /// 이벤트가 `count`개 이상 도착할 때까지 기다립니다.
    async fn wait_for(&self, count: usize) -> Vec<Event> {
        tokio::time::timeout(WAIT, async {
            loop {
                if self.publisher.len() >= count {
                    return self.publisher.events();
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {count} events"))
    }

    async fn stop(self) -> IngestStats {
        self.shutdown.cancel();
        tokio::time::timeout(WAIT, self.handle)
            .await
            .expect("loop observes shutdown")
            .expect("loop task joins")
            .expect("loop exits cleanly")
    }
}

fn config() -> IngestConfigBuilder {
    IngestConfigBuilder::new().port(0).recv_timeout_ms(20)
}

fn metrics_registry() -> SchemaRegistry {
    SchemaRegistry::builder()
        .schema(
            "metrics",
            &json!({
                "type": "object",
                "required": ["cpu"],
                "properties": {"cpu": {"type": "number"}}
            }),
        )
        .expect("compile schema")
        .build()
}

#[tokio::test]
async fn json_datagram_becomes_structured_event() {
    let harness = Harness::start(config().build().unwrap(), SchemaRegistry::empty()).await;
    harness.send(br#"json:metrics:{"a":1}"#).await;

    let events = harness.wait_for(1).await;
    assert_eq!(events[0].event_type, "metrics");
    assert_eq!(events[0].fields.get("a"), Some(&json!(1)));
    assert_eq!(events[0].counter, 1);
    assert!(events[0].tags.is_none());

    let stats = harness.stop().await;
    assert_eq!(stats.published, 1);
}

#[tokio::test]
async fn unknown_format_publishes_nothing() {
    let harness = Harness::start(config().build().unwrap(), SchemaRegistry::empty()).await;
    harness.send(b"xml:metrics:<a/>").await;
    harness.send(b"plain:sentinel:done").await;

    let events = harness.wait_for(1).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "sentinel");
    assert_eq!(events[0].counter, 1);

    let stats = harness.stop().await;
    assert_eq!(stats.dropped_frame, 1);
}

#[tokio::test]
async fn schema_failure_is_quarantined_with_raw_payload() {
    let config = config().enable_json_validation(true).build().unwrap();
    let harness = Harness::start(config, metrics_registry()).await;

    let payloads = [r#"{"cpu":"high"}"#, r#"{"mem":1}"#, "{{{ not json", "[1,2,3]"];
    for payload in payloads {
        harness
            .send(format!("json:metrics:{payload}").as_bytes())
            .await;
    }

    let events = harness.wait_for(payloads.len()).await;
    for (event, payload) in events.iter().zip(payloads) {
        assert_eq!(event.message(), Some(payload));
        assert!(event.is_quarantined());
        assert_eq!(event.fields.len(), 1);
    }

    let stats = harness.stop().await;
    assert_eq!(stats.quarantined, payloads.len() as u64);
}

#[tokio::test]
async fn counters_are_dense_across_drops() {
    let config = config().enable_json_validation(true).build().unwrap();
    let harness = Harness::start(config, metrics_registry()).await;

    let datagrams: [&[u8]; 8] = [
        br#"json:metrics:{"cpu":0.1}"#,
        b"bogus:metrics:{}",
        br#"json:metrics:{"cpu":"bad"}"#,
        br#"json:audit:{"user":"root"}"#,
        b"plain:app:hello",
        b"json::{}",
        b"plain:app:",
        br#"json:metrics:{"cpu":0.2}"#,
    ];
    for datagram in datagrams {
        harness.send(datagram).await;
    }

    let events = harness.wait_for(4).await;
    let counters: Vec<u64> = events.iter().map(|e| e.counter).collect();
    assert_eq!(counters, vec![1, 2, 3, 4]);

    let stats = harness.stop().await;
    assert_eq!(stats.published, 4);
    assert_eq!(stats.dropped_frame, 3);
    assert_eq!(stats.dropped_schema_missing, 1);
}

#[tokio::test]
async fn syslog_only_mode_decomposes_priority() {
    let config = config().enable_syslog_format_only(true).build().unwrap();
    let harness = Harness::start(config, SchemaRegistry::empty()).await;
    harness.send(b"<34>Mar 1 foo").await;
    harness.send(b"no prefix here").await;
    harness.send(b"   ").await;
    harness.send(b"<13>sentinel").await;

    let events = harness.wait_for(3).await;
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].event_type, "syslog");
    assert_eq!(events[0].fields.get("facility"), Some(&json!(4)));
    assert_eq!(events[0].fields.get("severity"), Some(&json!(2)));
    assert_eq!(events[0].message(), Some("Mar 1 foo"));

    assert!(events[1].fields.get("facility").is_none());
    assert_eq!(events[1].message(), Some("no prefix here"));
    assert_eq!(events[2].counter, 3);

    harness.stop().await;
}

#[tokio::test]
async fn empty_datagram_is_counted_as_dropped() {
    let harness = Harness::start(config().build().unwrap(), SchemaRegistry::empty()).await;
    harness.send(b"").await;
    harness.send(b"plain:app:after empty").await;

    let events = harness.wait_for(1).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].counter, 1);

    let stats = harness.stop().await;
    assert_eq!(stats.received, 1);
    assert_eq!(stats.dropped_empty, 1);
    assert_eq!(stats.dropped(), 1);
}

#[tokio::test]
async fn schema_missing_publishes_nothing() {
    let config = config().enable_json_validation(true).build().unwrap();
    let harness = Harness::start(config, SchemaRegistry::empty()).await;
    harness.send(br#"json:metrics:{"cpu":1}"#).await;
    harness.send(b"plain:sentinel:done").await;

    let events = harness.wait_for(1).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "sentinel");

    harness.stop().await;
}

#[tokio::test]
async fn oversized_datagram_is_truncated_to_buffer() {
    let config = config().max_message_size(16).build().unwrap();
    let harness = Harness::start(config, SchemaRegistry::empty()).await;
    harness.send(b"plain:app:0123456789abcdef").await;

    let events = harness.wait_for(1).await;
    assert_eq!(events[0].message(), Some("012345"));

    harness.stop().await;
}

#[tokio::test]
async fn timestamp_is_receipt_time() {
    let harness = Harness::start(config().build().unwrap(), SchemaRegistry::empty()).await;
    let before = chrono::Utc::now();
    harness.send(b"plain:app:now").await;
    let events = harness.wait_for(1).await;
    let after = chrono::Utc::now();

    assert!(events[0].timestamp >= before && events[0].timestamp <= after);
    let line: Value = serde_json::from_str(&events[0].to_json_line().unwrap()).unwrap();
    assert!(line["@timestamp"].as_str().unwrap().ends_with('Z'));

    harness.stop().await;
}

#[tokio::test]
async fn schemas_loaded_from_files_drive_validation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metrics.json");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(br#"{"type":"object","required":["cpu"]}"#)
        .unwrap();

    let mapping = BTreeMap::from([("metrics".to_owned(), path.display().to_string())]);
    let registry = SchemaLoader::load(&mapping).await.unwrap();

    let config = config().enable_json_validation(true).build().unwrap();
    let harness = Harness::start(config, registry).await;
    harness.send(br#"json:metrics:{"cpu":1}"#).await;
    harness.send(br#"json:metrics:{"mem":1}"#).await;

    let events = harness.wait_for(2).await;
    assert!(!events[0].is_quarantined());
    assert!(events[1].is_quarantined());

    harness.stop().await;
}

#[tokio::test]
async fn loop_without_timeout_stops_when_task_is_aborted() {
    let config = config().recv_timeout_ms(0).build().unwrap();
    let harness = Harness::start(config, SchemaRegistry::empty()).await;

    harness.shutdown.cancel();
    // 수신 대기 중이라 신호를 보지 못한다. 중단하면 소켓이 해제된다.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!harness.handle.is_finished());
    harness.handle.abort();

    let result = harness.handle.await;
    assert!(result.unwrap_err().is_cancelled());

    // 소켓이 해제되어 같은 주소에 다시 바인드할 수 있다
    UdpSocket::bind(harness.addr).await.expect("rebind after abort");
}

#[tokio::test]
async fn datagram_after_cancel_wakes_blocked_loop() {
    let config = config().recv_timeout_ms(0).build().unwrap();
    let harness = Harness::start(config, SchemaRegistry::empty()).await;

    harness.send(b"plain:app:first").await;
    harness.wait_for(1).await;

    harness.shutdown.cancel();
    harness.send(b"plain:app:wake").await;

    // 깨운 데이터그램은 처리된 뒤 다음 반복에서 종료를 관찰한다
    let stats = harness.stop().await;
    assert_eq!(stats.published, 2);
}
