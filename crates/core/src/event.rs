//! 이벤트 레코드 -- 수집 파이프라인의 최종 산출물
//!
//! [`Event`]는 하나의 데이터그램이 디코딩/검증/정규화를 거쳐 만들어진
//! 통합 레코드입니다. 퍼블리셔 어댑터는 이 타입만 알면 됩니다.
//!
//! # 직렬화 형식
//! ```text
//! {"a":1,"@timestamp":"2024-01-15T12:00:00.000000Z","type":"metrics","counter":7}
//! {"message":"{broken","@timestamp":"...","type":"metrics","counter":8,"tags":["_udplogbeat_jspf"]}
//! ```

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

// --- 필드명 상수 ---

/// 수신 시각 필드명
pub const FIELD_TIMESTAMP: &str = "@timestamp";
/// 이벤트 타입 필드명
pub const FIELD_TYPE: &str = "type";
/// 카운터 필드명
pub const FIELD_COUNTER: &str = "counter";
/// 태그 필드명
pub const FIELD_TAGS: &str = "tags";
/// 원문 메시지 필드명
pub const FIELD_MESSAGE: &str = "message";
/// syslog facility 필드명
pub const FIELD_FACILITY: &str = "facility";
/// syslog severity 필드명
pub const FIELD_SEVERITY: &str = "severity";

/// 격리(quarantine) 이벤트 표식 태그
///
/// 스키마 검증 실패와 JSON 디코딩 실패 모두 이 태그 하나를 공유합니다.
pub const QUARANTINE_TAG: &str = "_udplogbeat_jspf";

/// 정규화된 이벤트 레코드
///
/// `timestamp`, `event_type`, `counter`는 격리 이벤트를 포함한 모든 이벤트에 존재합니다.
/// `tags`는 격리 이벤트에만 `Some`입니다.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// 데이터그램 수신 시각 (퍼블리시 시각이 아님)
    pub timestamp: DateTime<Utc>,
    /// 이벤트 타입 (프레임의 type 세그먼트)
    pub event_type: String,
    /// 수집 루프 수명 동안 단조 증가하는 일련번호
    pub counter: u64,
    /// 디코딩된 구조화 필드 또는 `message` 필드
    pub fields: Map<String, Value>,
    /// 격리 표식 태그
    pub tags: Option<BTreeSet<String>>,
}

impl Event {
    /// 태그 없는 새 이벤트를 생성합니다.
    pub fn new(
        event_type: impl Into<String>,
        counter: u64,
        timestamp: DateTime<Utc>,
        fields: Map<String, Value>,
    ) -> Self {
        Self {
            timestamp,
            event_type: event_type.into(),
            counter,
            fields,
            tags: None,
        }
    }

    /// 태그를 추가합니다.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.get_or_insert_with(BTreeSet::new).insert(tag.into());
        self
    }

    /// 격리 이벤트인지 확인합니다.
    pub fn is_quarantined(&self) -> bool {
        self.tags
            .as_ref()
            .is_some_and(|tags| tags.contains(QUARANTINE_TAG))
    }

    /// `message` 필드가 문자열이면 반환합니다.
    pub fn message(&self) -> Option<&str> {
        self.fields.get(FIELD_MESSAGE).and_then(Value::as_str)
    }

    /// 한 줄짜리 JSON 문서로 직렬화합니다.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// 스탬프 필드와 겹치는 페이로드 키인지 확인합니다.
    ///
    /// 스탬프 값이 항상 우선합니다. `tags`는 격리 이벤트일 때만 예약됩니다.
    fn is_reserved(&self, key: &str) -> bool {
        key == FIELD_TIMESTAMP
            || key == FIELD_TYPE
            || key == FIELD_COUNTER
            || (key == FIELD_TAGS && self.tags.is_some())
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in &self.fields {
            if self.is_reserved(key) {
                continue;
            }
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry(
            FIELD_TIMESTAMP,
            &self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
        )?;
        map.serialize_entry(FIELD_TYPE, &self.event_type)?;
        map.serialize_entry(FIELD_COUNTER, &self.counter)?;
        if let Some(tags) = &self.tags {
            map.serialize_entry(FIELD_TAGS, tags)?;
        }
        map.end()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} type={} fields={}",
            self.counter,
            self.event_type,
            self.fields.len(),
        )?;
        if self.is_quarantined() {
            write!(f, " quarantined")?;
        }
        Ok(())
    }
}
