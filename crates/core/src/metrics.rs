//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::histogram!()`
//! 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `udplog_`
//! - 모듈명: `ingest_`, `publisher_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(udplog_core::metrics::INGEST_DATAGRAMS_RECEIVED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 드롭/격리 사유 레이블 키
pub const LABEL_REASON: &str = "reason";

/// 퍼블리셔 이름 레이블 키
pub const LABEL_PUBLISHER: &str = "publisher";

// ─── Ingest 메트릭 ──────────────────────────────────────────────────

/// Ingest: 수신된 데이터그램 수 (counter, 빈 데이터그램 제외)
pub const INGEST_DATAGRAMS_RECEIVED_TOTAL: &str = "udplog_ingest_datagrams_received_total";

/// Ingest: 드롭된 데이터그램 수 (counter, label: reason)
pub const INGEST_DATAGRAMS_DROPPED_TOTAL: &str = "udplog_ingest_datagrams_dropped_total";

/// Ingest: 퍼블리시된 이벤트 수 (counter)
pub const INGEST_EVENTS_PUBLISHED_TOTAL: &str = "udplog_ingest_events_published_total";

/// Ingest: 격리 처리된 이벤트 수 (counter, label: reason)
pub const INGEST_EVENTS_QUARANTINED_TOTAL: &str = "udplog_ingest_events_quarantined_total";

/// Ingest: 소켓 수신 타임아웃 수 (counter)
pub const INGEST_SOCKET_TIMEOUTS_TOTAL: &str = "udplog_ingest_socket_timeouts_total";

/// Ingest: 데이터그램 1건 처리 시간 (histogram, 초)
pub const INGEST_PROCESSING_DURATION_SECONDS: &str = "udplog_ingest_processing_duration_seconds";

// ─── Publisher 메트릭 ───────────────────────────────────────────────

/// Publisher: 전달 실패 수 (counter, label: publisher)
pub const PUBLISHER_FAILURES_TOTAL: &str = "udplog_publisher_failures_total";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 데이터그램 처리 지연 시간 히스토그램 버킷 (초)
///
/// 10us ~ 100ms 범위
pub const PROCESSING_DURATION_BUCKETS: [f64; 9] = [
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1,
];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
/// 일반적으로 `udplog-daemon`의 시작 시점에서 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        INGEST_DATAGRAMS_RECEIVED_TOTAL,
        "Total number of non-empty datagrams received on the ingest socket"
    );
    describe_counter!(
        INGEST_DATAGRAMS_DROPPED_TOTAL,
        "Total number of datagrams dropped before an event was built"
    );
    describe_counter!(
        INGEST_EVENTS_PUBLISHED_TOTAL,
        "Total number of events handed to the publisher"
    );
    describe_counter!(
        INGEST_EVENTS_QUARANTINED_TOTAL,
        "Total number of events published through the quarantine path"
    );
    describe_counter!(
        INGEST_SOCKET_TIMEOUTS_TOTAL,
        "Total number of receive timeouts on the ingest socket"
    );
    describe_histogram!(
        INGEST_PROCESSING_DURATION_SECONDS,
        "Time to decode, validate, build and publish a single datagram in seconds"
    );
    describe_counter!(
        PUBLISHER_FAILURES_TOTAL,
        "Total number of events the publisher failed to deliver"
    );
}
