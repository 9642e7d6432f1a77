//! 데이터그램 처리기 -- 데이터그램 하나를 디코딩부터 퍼블리시까지 끝까지 처리합니다.
//!
//! # 처리 흐름
//! ```text
//! RawDatagram -> FrameDecoder -> (SchemaValidator) -> EventBuilder -> Publisher
//!                    |                  |                  |
//!                 드롭(프레임)       드롭(스키마 없음)   격리 정책 드롭
//! ```
//!
//! 카운터는 이벤트가 실제로 퍼블리시되는 경우에만 증가합니다.
//! 처리기는 단일 수집 루프가 소유하므로 동기화가 필요 없습니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

use udplog_core::metrics as m;
use udplog_core::pipeline::Publisher;

use crate::builder::{EventBuilder, QuarantineReason};
use crate::config::IngestConfig;
use crate::error::FrameError;
use crate::frame::{FrameDecoder, LogFormat};
use crate::schema::{SchemaRegistry, SchemaValidator, ValidationOutcome};

/// 수신된 원시 데이터그램
///
/// 수집 루프가 생성하고 한 번의 반복 동안만 유지됩니다.
#[derive(Debug, Clone)]
pub struct RawDatagram {
    /// 수신 바이트
    pub data: Bytes,
    /// 송신자 주소
    pub source: SocketAddr,
    /// 수신 시각 (이벤트 `@timestamp`)
    pub received_at: DateTime<Utc>,
}

impl RawDatagram {
    /// 현재 시각을 수신 시각으로 하는 데이터그램을 생성합니다.
    pub fn new(data: impl Into<Bytes>, source: SocketAddr) -> Self {
        Self {
            data: data.into(),
            source,
            received_at: Utc::now(),
        }
    }

    /// 수신 시각을 지정합니다.
    pub fn with_received_at(mut self, received_at: DateTime<Utc>) -> Self {
        self.received_at = received_at;
        self
    }
}

/// 데이터그램 드롭 사유
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// 길이 0 데이터그램
    Empty,
    /// 프레임 디코딩 실패
    Frame(FrameError),
    /// 타입에 대한 스키마가 없음
    SchemaMissing(String),
    /// 격리 퍼블리시가 설정으로 꺼져 있음
    QuarantinePolicy(QuarantineReason),
}

impl DropReason {
    /// 메트릭 레이블용 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Frame(e) => e.reason(),
            Self::SchemaMissing(_) => "schema_missing",
            Self::QuarantinePolicy(QuarantineReason::SchemaInvalid) => "policy_schema_invalid",
            Self::QuarantinePolicy(QuarantineReason::JsonInvalid) => "policy_json_invalid",
        }
    }
}

/// 데이터그램 처리 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// 이벤트가 퍼블리시됨
    Published {
        /// 이벤트에 찍힌 카운터
        counter: u64,
        /// 격리 경로로 퍼블리시되었는지 여부
        quarantined: bool,
    },
    /// 이벤트 없이 드롭됨 (카운터 변화 없음)
    Dropped(DropReason),
}

impl Disposition {
    /// 퍼블리시 여부
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published { .. })
    }
}

/// 격리 이벤트 퍼블리시 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuarantinePolicy {
    /// 스키마 검증 실패 이벤트를 퍼블리시할지 여부
    pub publish_schema_invalid: bool,
    /// JSON 디코딩 실패 이벤트를 퍼블리시할지 여부
    pub publish_json_invalid: bool,
}

impl QuarantinePolicy {
    /// 사유에 대해 퍼블리시가 허용되는지 확인합니다.
    pub fn allows(&self, reason: QuarantineReason) -> bool {
        match reason {
            QuarantineReason::SchemaInvalid => self.publish_schema_invalid,
            QuarantineReason::JsonInvalid => self.publish_json_invalid,
        }
    }
}

impl Default for QuarantinePolicy {
    fn default() -> Self {
        Self {
            publish_schema_invalid: true,
            publish_json_invalid: true,
        }
    }
}

/// 처리 통계
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// 수신된 비어 있지 않은 데이터그램 수
    pub received: u64,
    /// 퍼블리시된 이벤트 수 (격리 포함)
    pub published: u64,
    /// 격리 경로로 퍼블리시된 이벤트 수
    pub quarantined: u64,
    /// 길이 0 데이터그램 수
    pub dropped_empty: u64,
    /// 프레임 디코딩 실패로 드롭된 수
    pub dropped_frame: u64,
    /// 스키마 누락으로 드롭된 수
    pub dropped_schema_missing: u64,
    /// 격리 정책으로 드롭된 수
    pub dropped_policy: u64,
}

impl IngestStats {
    /// 드롭된 데이터그램 총합
    pub fn dropped(&self) -> u64 {
        self.dropped_empty + self.dropped_frame + self.dropped_schema_missing + self.dropped_policy
    }

    fn record_drop(&mut self, reason: &DropReason) {
        match reason {
            DropReason::Empty => self.dropped_empty += 1,
            DropReason::Frame(_) => self.dropped_frame += 1,
            DropReason::SchemaMissing(_) => self.dropped_schema_missing += 1,
            DropReason::QuarantinePolicy(_) => self.dropped_policy += 1,
        }
    }
}

/// 데이터그램 처리기
///
/// 카운터와 통계를 소유하는 처리 컨텍스트입니다. 인스턴스끼리 상태를 공유하지 않습니다.
pub struct DatagramProcessor<P> {
    decoder: FrameDecoder,
    /// json 검증이 켜진 경우에만 `Some`
    validator: Option<SchemaValidator>,
    builder: EventBuilder,
    policy: QuarantinePolicy,
    counter: u64,
    stats: IngestStats,
    publisher: P,
}

impl<P: Publisher> DatagramProcessor<P> {
    /// 설정과 사전 구성된 스키마 레지스트리로 처리기를 생성합니다.
    pub fn new(config: &IngestConfig, registry: Arc<SchemaRegistry>, publisher: P) -> Self {
        let validator = config
            .enable_json_validation
            .then(|| SchemaValidator::new(registry));

        Self {
            decoder: FrameDecoder::new(config.frame_mode()),
            validator,
            builder: EventBuilder::new(config.enable_syslog_format_only),
            policy: config.quarantine_policy(),
            counter: 0,
            stats: IngestStats::default(),
            publisher,
        }
    }

    /// 마지막으로 찍힌 카운터 값 (아직 이벤트가 없으면 0)
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// 처리 통계
    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    /// 퍼블리셔 참조
    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// 데이터그램 하나를 처리합니다.
    ///
    /// 어떤 입력에도 패닉하지 않으며, 결과는 항상 퍼블리시 또는 드롭입니다.
    pub fn process(&mut self, datagram: &RawDatagram) -> Disposition {
        let started = Instant::now();
        let disposition = self.dispatch(datagram);
        metrics::histogram!(m::INGEST_PROCESSING_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        disposition
    }

    fn dispatch(&mut self, datagram: &RawDatagram) -> Disposition {
        if datagram.data.is_empty() {
            return self.discard(DropReason::Empty);
        }

        self.stats.received += 1;
        metrics::counter!(m::INGEST_DATAGRAMS_RECEIVED_TOTAL).increment(1);

        let frame = match self.decoder.decode(&datagram.data) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(
                    source = %datagram.source,
                    len = datagram.data.len(),
                    error = %e,
                    "dropping malformed datagram"
                );
                return self.discard(DropReason::Frame(e));
            }
        };

        let outcome = match (&self.validator, frame.format()) {
            (Some(validator), LogFormat::Json) => {
                Some(validator.validate(frame.event_type(), frame.payload()))
            }
            _ => None,
        };

        if outcome == Some(ValidationOutcome::SchemaMissing) {
            tracing::warn!(
                source = %datagram.source,
                event_type = frame.event_type(),
                "no schema registered for type, dropping datagram"
            );
            return self.discard(DropReason::SchemaMissing(frame.event_type().to_owned()));
        }

        let body = self.builder.assemble(&frame, outcome.as_ref());

        let quarantine = body.quarantine();
        if let Some(reason) = quarantine {
            let detail = match &outcome {
                Some(ValidationOutcome::Invalid(detail)) => detail.as_str(),
                _ => "payload is not a JSON object",
            };

            if !self.policy.allows(reason) {
                tracing::warn!(
                    event_type = frame.event_type(),
                    reason = %reason,
                    detail,
                    "quarantine publishing disabled, dropping datagram"
                );
                return self.discard(DropReason::QuarantinePolicy(reason));
            }

            tracing::warn!(
                event_type = frame.event_type(),
                reason = %reason,
                detail,
                "publishing quarantined event"
            );
        }

        self.counter += 1;
        let counter = self.counter;
        let event = body.stamp(frame.event_type(), datagram.received_at, counter);

        tracing::trace!(
            counter,
            event_type = %event.event_type,
            publisher = self.publisher.name(),
            "publishing event"
        );
        self.publisher.publish(event);

        self.stats.published += 1;
        metrics::counter!(m::INGEST_EVENTS_PUBLISHED_TOTAL).increment(1);
        if let Some(reason) = quarantine {
            self.stats.quarantined += 1;
            metrics::counter!(
                m::INGEST_EVENTS_QUARANTINED_TOTAL,
                m::LABEL_REASON => reason.as_str()
            )
            .increment(1);
        }

        Disposition::Published {
            counter,
            quarantined: quarantine.is_some(),
        }
    }

    fn discard(&mut self, reason: DropReason) -> Disposition {
        self.stats.record_drop(&reason);
        metrics::counter!(
            m::INGEST_DATAGRAMS_DROPPED_TOTAL,
            m::LABEL_REASON => reason.as_str()
        )
        .increment(1);
        Disposition::Dropped(reason)
    }
}
