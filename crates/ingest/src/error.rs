//! 수집 코어 에러 타입
//!
//! [`FrameError`]는 프레임 디코더의 실패 사유로, 에러로 전파되지 않고 드롭 사유가 됩니다.
//! [`IngestError`]는 수집 루프와 구성 단계의 에러입니다. `From<IngestError> for UdplogError`
//! 변환이 구현되어 있어 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use udplog_core::error::{SchemaError, UdplogError};

/// 프레임 디코딩 실패 사유
///
/// 디코더는 부분 프레임을 반환하지 않고 항상 이 에러 중 하나로 실패합니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// 구분자(`:`)가 두 개 미만
    #[error("invalid framing: expected '<format>:<type>:<payload>'")]
    InvalidFraming,

    /// 첫 세그먼트가 `json`도 `plain`도 아님
    #[error("invalid log format '{0}': expected 'json' or 'plain'")]
    InvalidFormat(String),

    /// 타입 세그먼트가 비어 있음
    #[error("a log type must be specified")]
    MissingType,

    /// 페이로드 세그먼트가 비어 있음
    #[error("log payload is empty")]
    EmptyPayload,
}

impl FrameError {
    /// 메트릭 레이블용 짧은 사유 이름을 반환합니다.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidFraming => "invalid_framing",
            Self::InvalidFormat(_) => "invalid_format",
            Self::MissingType => "missing_type",
            Self::EmptyPayload => "empty_payload",
        }
    }
}

/// 수집 코어 에러
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// 소켓 바인드 실패
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// 바인드 주소
        addr: String,
        /// 원인
        #[source]
        source: std::io::Error,
    },

    /// 복구 불가능한 소켓 에러 (루프 종료)
    #[error("socket error: {0}")]
    Socket(#[source] std::io::Error),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 스키마 레지스트리 구성 에러
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl From<IngestError> for UdplogError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Schema(e) => UdplogError::Schema(e),
            other => UdplogError::Ingest(other.to_string()),
        }
    }
}
