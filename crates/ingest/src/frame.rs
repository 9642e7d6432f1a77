//! 프레임 디코더
//!
//! 원시 데이터그램을 `(format, type, payload)` 3-튜플로 분리합니다.
//!
//! # 와이어 형식
//! ```text
//! <format>:<type>:<payload>
//!
//! json:metrics:{"cpu":0.42,"host":"web-01"}
//! plain:nginx:GET /index.html 200
//! ```
//!
//! 처음 두 개의 `:`만 구분자로 취급하므로 페이로드에는 `:`가 포함될 수 있습니다.
//! 각 세그먼트의 앞뒤 공백은 제거됩니다.
//!
//! syslog 전용 모드에서는 프레이밍을 적용하지 않고 데이터그램 전체를
//! `plain` 형식, `syslog` 타입의 페이로드로 취급합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FrameError;

/// syslog 전용 모드에서 고정되는 이벤트 타입
pub const SYSLOG_TYPE: &str = "syslog";

/// 에러 메시지에 포함할 형식 세그먼트의 최대 길이 (문자 수)
const MAX_REPORTED_FORMAT_LEN: usize = 32;

/// 페이로드 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// 구조화 JSON 페이로드
    Json,
    /// 자유 텍스트 페이로드
    Plain,
}

impl LogFormat {
    /// 와이어 상의 형식 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Plain => "plain",
        }
    }

    /// 형식 세그먼트를 파싱합니다. 대소문자를 구분합니다.
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "json" => Some(Self::Json),
            "plain" => Some(Self::Plain),
            _ => None,
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 디코딩된 프레임
///
/// 디코더만 생성할 수 있으므로 `event_type`과 `payload`는 항상 비어 있지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFrame {
    format: LogFormat,
    event_type: String,
    payload: String,
}

impl ParsedFrame {
    /// 페이로드 형식
    pub fn format(&self) -> LogFormat {
        self.format
    }

    /// 이벤트 타입
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// 페이로드 원문
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// `(format, type, payload)`로 분해합니다.
    pub fn into_parts(self) -> (LogFormat, String, String) {
        (self.format, self.event_type, self.payload)
    }
}

/// 디코더 동작 모드
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FrameMode {
    /// `<format>:<type>:<payload>` 프레이밍 (기본값)
    #[default]
    Framed,
    /// 데이터그램 전체를 syslog 라인으로 취급
    SyslogOnly,
}

/// 프레임 디코더
///
/// 설정된 [`FrameMode`]에 따라 [`decode`] 또는 [`decode_syslog_only`]로 위임합니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameDecoder {
    mode: FrameMode,
}

impl FrameDecoder {
    /// 새 디코더를 생성합니다.
    pub fn new(mode: FrameMode) -> Self {
        Self { mode }
    }

    /// 동작 모드를 반환합니다.
    pub fn mode(&self) -> FrameMode {
        self.mode
    }

    /// 데이터그램을 디코딩합니다.
    pub fn decode(&self, raw: &[u8]) -> Result<ParsedFrame, FrameError> {
        match self.mode {
            FrameMode::Framed => decode(raw),
            FrameMode::SyslogOnly => decode_syslog_only(raw),
        }
    }
}

/// `<format>:<type>:<payload>` 프레임을 디코딩합니다.
///
/// 유효하지 않은 UTF-8 시퀀스는 U+FFFD로 대체됩니다.
///
/// # 에러 (검사 순서대로)
/// - 세그먼트가 3개 미만: [`FrameError::InvalidFraming`]
/// - 형식이 `json`/`plain`이 아님: [`FrameError::InvalidFormat`]
/// - 타입이 비어 있음: [`FrameError::MissingType`]
/// - 페이로드가 비어 있음: [`FrameError::EmptyPayload`]
pub fn decode(raw: &[u8]) -> Result<ParsedFrame, FrameError> {
    let text = String::from_utf8_lossy(raw);
    let mut segments = text.splitn(3, ':');

    let (Some(format), Some(event_type), Some(payload)) =
        (segments.next(), segments.next(), segments.next())
    else {
        return Err(FrameError::InvalidFraming);
    };

    let format = format.trim();
    let format = LogFormat::from_segment(format).ok_or_else(|| {
        FrameError::InvalidFormat(format.chars().take(MAX_REPORTED_FORMAT_LEN).collect())
    })?;

    let event_type = event_type.trim();
    if event_type.is_empty() {
        return Err(FrameError::MissingType);
    }

    let payload = payload.trim();
    if payload.is_empty() {
        return Err(FrameError::EmptyPayload);
    }

    Ok(ParsedFrame {
        format,
        event_type: event_type.to_owned(),
        payload: payload.to_owned(),
    })
}

/// syslog 전용 모드로 디코딩합니다.
///
/// 앞뒤 공백을 제거한 데이터그램 전체가 페이로드가 되며,
/// 형식은 `plain`, 타입은 [`SYSLOG_TYPE`]으로 고정됩니다.
pub fn decode_syslog_only(raw: &[u8]) -> Result<ParsedFrame, FrameError> {
    let text = String::from_utf8_lossy(raw);
    let payload = text.trim();
    if payload.is_empty() {
        return Err(FrameError::EmptyPayload);
    }

    Ok(ParsedFrame {
        format: LogFormat::Plain,
        event_type: SYSLOG_TYPE.to_owned(),
        payload: payload.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn decodes_json_frame() {
        let frame = decode(br#"json:metrics:{"a":1}"#).unwrap();
        assert_eq!(frame.format(), LogFormat::Json);
        assert_eq!(frame.event_type(), "metrics");
        assert_eq!(frame.payload(), r#"{"a":1}"#);
    }

    #[test]
    fn decodes_plain_frame() {
        let frame = decode(b"plain:nginx:GET /index.html 200").unwrap();
        assert_eq!(frame.format(), LogFormat::Plain);
        assert_eq!(frame.event_type(), "nginx");
        assert_eq!(frame.payload(), "GET /index.html 200");
    }

    #[test]
    fn payload_keeps_extra_colons() {
        let frame = decode(b"plain:app:12:30:45 user=a:b").unwrap();
        assert_eq!(frame.payload(), "12:30:45 user=a:b");
    }

    #[test]
    fn segments_are_trimmed() {
        let frame = decode(b"  json \t:  metrics :  {\"a\":1}  \n").unwrap();
        assert_eq!(frame.format(), LogFormat::Json);
        assert_eq!(frame.event_type(), "metrics");
        assert_eq!(frame.payload(), "{\"a\":1}");
    }

    #[test]
    fn rejects_missing_delimiters() {
        assert_eq!(decode(b"json"), Err(FrameError::InvalidFraming));
        assert_eq!(decode(b"json:metrics"), Err(FrameError::InvalidFraming));
        assert_eq!(decode(b""), Err(FrameError::InvalidFraming));
    }

    #[test]
    fn rejects_unknown_format() {
        assert_eq!(
            decode(b"xml:metrics:<a/>"),
            Err(FrameError::InvalidFormat("xml".to_owned()))
        );
        // 대소문자를 구분한다
        assert!(matches!(
            decode(b"JSON:metrics:{}"),
            Err(FrameError::InvalidFormat(_))
        ));
    }

    #[test]
    fn invalid_format_segment_is_truncated_in_error() {
        let long = format!("{}:t:p", "x".repeat(500));
        match decode(long.as_bytes()) {
            Err(FrameError::InvalidFormat(segment)) => {
                assert_eq!(segment.chars().count(), MAX_REPORTED_FORMAT_LEN);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejects_empty_type() {
        assert_eq!(decode(b"json::{}"), Err(FrameError::MissingType));
        assert_eq!(decode(b"json:   :{}"), Err(FrameError::MissingType));
    }

    #[test]
    fn rejects_empty_payload() {
        assert_eq!(decode(b"plain:app:"), Err(FrameError::EmptyPayload));
        assert_eq!(decode(b"plain:app:   \n"), Err(FrameError::EmptyPayload));
    }

    #[test]
    fn format_is_checked_before_type_and_payload() {
        assert!(matches!(decode(b"bogus::"), Err(FrameError::InvalidFormat(_))));
    }

    #[test]
    fn invalid_utf8_is_replaced_not_rejected() {
        let frame = decode(b"plain:app:caf\xff").unwrap();
        assert_eq!(frame.payload(), "caf\u{FFFD}");
    }

    #[test]
    fn syslog_only_uses_whole_datagram() {
        let frame = decode_syslog_only(b"  <34>Mar 1 foo: bar \n").unwrap();
        assert_eq!(frame.format(), LogFormat::Plain);
        assert_eq!(frame.event_type(), SYSLOG_TYPE);
        assert_eq!(frame.payload(), "<34>Mar 1 foo: bar");
    }

    #[test]
    fn syslog_only_rejects_whitespace() {
        assert_eq!(decode_syslog_only(b" \t\r\n"), Err(FrameError::EmptyPayload));
    }

    #[test]
    fn decoder_dispatches_on_mode() {
        let framed = FrameDecoder::new(FrameMode::Framed);
        assert!(framed.decode(b"no framing here").is_err());

        let syslog = FrameDecoder::new(FrameMode::SyslogOnly);
        let frame = syslog.decode(b"no framing here").unwrap();
        assert_eq!(frame.event_type(), SYSLOG_TYPE);
        assert_eq!(syslog.mode(), FrameMode::SyslogOnly);
    }

    #[test]
    fn into_parts_returns_segments() {
        let (format, event_type, payload) = decode(b"plain:a:b").unwrap().into_parts();
        assert_eq!(format, LogFormat::Plain);
        assert_eq!(event_type, "a");
        assert_eq!(payload, "b");
    }

    proptest! {
        #[test]
        fn decode_never_panics(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            let _ = decode(&data);
            let _ = decode_syslog_only(&data);
        }

        #[test]
        fn unknown_format_always_rejected(
            format in "[a-z]{1,8}",
            event_type in "[a-z]{1,8}",
            payload in "[ -~]{1,32}",
        ) {
            prop_assume!(format != "json" && format != "plain");
            let raw = format!("{format}:{event_type}:{payload}");
            prop_assert!(matches!(decode(raw.as_bytes()), Err(FrameError::InvalidFormat(_))));
        }

        #[test]
        fn successful_frames_have_non_empty_segments(data in "[a-z: ]{0,40}") {
            if let Ok(frame) = decode(data.as_bytes()) {
                prop_assert!(!frame.event_type().is_empty());
                prop_assert!(!frame.payload().is_empty());
            }
        }
    }
}
