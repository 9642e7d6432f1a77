#![no_main]

use std::net::SocketAddr;
use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use serde_json::json;
use udplog_ingest::{
    CollectingPublisher, DatagramProcessor, IngestConfigBuilder, RawDatagram, SchemaRegistry,
};

fuzz_target!(|datagrams: Vec<Vec<u8>>| {
    let Ok(registry) = SchemaRegistry::builder().schema(
        "metrics",
        &json!({"type": "object", "required": ["cpu"]}),
    ) else {
        return;
    };
    let Ok(config) = IngestConfigBuilder::new()
        .enable_json_validation(true)
        .build()
    else {
        return;
    };

    let publisher = Arc::new(CollectingPublisher::new());
    let mut processor =
        DatagramProcessor::new(&config, Arc::new(registry.build()), Arc::clone(&publisher));
    let source = SocketAddr::from(([127, 0, 0, 1], 5000));

    for data in datagrams {
        processor.process(&RawDatagram::new(data, source));
    }

    // 카운터는 발행된 이벤트마다 1부터 빈틈없이 증가한다
    let counters: Vec<u64> = publisher.events().iter().map(|e| e.counter).collect();
    let expected: Vec<u64> = (1..=counters.len() as u64).collect();
    assert_eq!(counters, expected);
});
