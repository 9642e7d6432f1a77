//! 이벤트 빌더 -- 디코딩된 프레임을 정규화된 [`Event`]로 조립합니다.
//!
//! 모든 분기는 [`EventBuilder::assemble`] 하나에서 결정됩니다.
//!
//! | 형식 | 조건 | fields | tags |
//! |---|---|---|---|
//! | json | 검증 비활성 또는 `Valid`, 객체로 디코딩됨 | 디코딩된 객체 | 없음 |
//! | json | `Invalid` | `{message}` | 격리 태그 |
//! | json | 디코딩 실패 또는 객체가 아님 | `{message}` | 격리 태그 |
//! | plain | syslog 모드, PRI 추출 성공 | `{facility, severity, message}` | 없음 |
//! | plain | syslog 모드, PRI 추출 실패 | `{message}` | 없음 |
//! | plain | 기본 모드 | `{message}` | 없음 |

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use udplog_core::event::{Event, FIELD_FACILITY, FIELD_MESSAGE, FIELD_SEVERITY, QUARANTINE_TAG};

use crate::frame::{LogFormat, ParsedFrame};
use crate::parser::syslog;
use crate::schema::ValidationOutcome;

/// 격리 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuarantineReason {
    /// 스키마 검증 실패
    SchemaInvalid,
    /// 구조화 JSON으로 디코딩할 수 없음
    JsonInvalid,
}

impl QuarantineReason {
    /// 메트릭 레이블용 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SchemaInvalid => "schema_invalid",
            Self::JsonInvalid => "json_invalid",
        }
    }
}

impl fmt::Display for QuarantineReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 스탬프 전 단계의 이벤트 본문
///
/// 카운터를 소비하기 전에 격리 여부를 확인할 수 있도록 분리되어 있습니다.
#[derive(Debug, Clone, PartialEq)]
pub struct EventBody {
    fields: Map<String, Value>,
    quarantine: Option<QuarantineReason>,
}

impl EventBody {
    /// 조립된 필드
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// 격리 사유 (정상 이벤트는 `None`)
    pub fn quarantine(&self) -> Option<QuarantineReason> {
        self.quarantine
    }

    /// 타입, 수신 시각, 카운터를 찍어 이벤트를 완성합니다.
    pub fn stamp(
        self,
        event_type: impl Into<String>,
        received_at: DateTime<Utc>,
        counter: u64,
    ) -> Event {
        let event = Event::new(event_type, counter, received_at, self.fields);
        match self.quarantine {
            Some(_) => event.with_tag(QUARANTINE_TAG),
            None => event,
        }
    }

    fn message(payload: &str) -> Self {
        let mut fields = Map::with_capacity(1);
        fields.insert(FIELD_MESSAGE.to_owned(), Value::String(payload.to_owned()));
        Self {
            fields,
            quarantine: None,
        }
    }

    fn quarantined(payload: &str, reason: QuarantineReason) -> Self {
        Self {
            quarantine: Some(reason),
            ..Self::message(payload)
        }
    }
}

/// 이벤트 빌더
#[derive(Debug, Clone, Copy, Default)]
pub struct EventBuilder {
    syslog_mode: bool,
}

impl EventBuilder {
    /// 새 빌더를 생성합니다. `syslog_mode`이면 plain 페이로드에서 PRI를 추출합니다.
    pub fn new(syslog_mode: bool) -> Self {
        Self { syslog_mode }
    }

    /// syslog 모드 여부
    pub fn syslog_mode(&self) -> bool {
        self.syslog_mode
    }

    /// 프레임과 검증 결과로 이벤트를 완성합니다.
    ///
    /// `outcome`은 json 검증이 수행된 경우에만 `Some`입니다.
    pub fn build(
        &self,
        frame: &ParsedFrame,
        outcome: Option<&ValidationOutcome>,
        received_at: DateTime<Utc>,
        counter: u64,
    ) -> Event {
        self.assemble(frame, outcome)
            .stamp(frame.event_type(), received_at, counter)
    }

    /// 스탬프 없이 이벤트 본문만 조립합니다.
    ///
    /// `SchemaMissing`은 호출자가 드롭해야 하는 경우이므로 여기서는
    /// 검증이 수행되지 않은 것과 같이 취급합니다.
    pub fn assemble(&self, frame: &ParsedFrame, outcome: Option<&ValidationOutcome>) -> EventBody {
        let payload = frame.payload();
        match (frame.format(), outcome) {
            (LogFormat::Json, Some(ValidationOutcome::Invalid(_))) => {
                EventBody::quarantined(payload, QuarantineReason::SchemaInvalid)
            }
            (LogFormat::Json, _) => match serde_json::from_str::<Value>(payload) {
                Ok(Value::Object(fields)) => EventBody {
                    fields,
                    quarantine: None,
                },
                _ => EventBody::quarantined(payload, QuarantineReason::JsonInvalid),
            },
            (LogFormat::Plain, _) if self.syslog_mode => Self::syslog_body(payload),
            (LogFormat::Plain, _) => EventBody::message(payload),
        }
    }

    fn syslog_body(payload: &str) -> EventBody {
        let Some(line) = syslog::extract(payload) else {
            return EventBody::message(payload);
        };

        let mut fields = Map::with_capacity(3);
        fields.insert(FIELD_FACILITY.to_owned(), Value::from(line.facility));
        fields.insert(FIELD_SEVERITY.to_owned(), Value::from(line.severity));
        fields.insert(FIELD_MESSAGE.to_owned(), Value::String(line.message.to_owned()));
        EventBody {
            fields,
            quarantine: None,
        }
    }
}
