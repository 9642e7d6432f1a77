//! 에러 타입 -- 도메인별 에러 정의

/// udplog 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum UdplogError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 스키마 로딩/컴파일 에러
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// 수집 루프 에러
    #[error("ingest error: {0}")]
    Ingest(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 스키마 관련 에러
///
/// 스키마 레지스트리를 구성하는 단계에서만 발생합니다.
/// 수집 루프가 시작된 이후에는 레지스트리가 변경되지 않으므로 발생하지 않습니다.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// 스키마 파일 읽기 실패
    #[error("failed to read schema for type '{type_name}' from {path}: {reason}")]
    Read {
        type_name: String,
        path: String,
        reason: String,
    },

    /// 스키마 문서가 유효한 JSON이 아님
    #[error("schema for type '{type_name}' is not valid JSON: {reason}")]
    InvalidDocument { type_name: String, reason: String },

    /// 스키마 컴파일 실패
    #[error("failed to compile schema for type '{type_name}': {reason}")]
    Compile { type_name: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_to_top_level() {
        let err: UdplogError = ConfigError::InvalidValue {
            field: "ingest.port".to_owned(),
            reason: "must be 1-65535".to_owned(),
        }
        .into();
        assert!(matches!(err, UdplogError::Config(_)));
        assert!(err.to_string().contains("ingest.port"));
    }

    #[test]
    fn schema_error_display_names_type() {
        let err = SchemaError::Compile {
            type_name: "metrics".to_owned(),
            reason: "unknown keyword".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("metrics"));
        assert!(msg.contains("unknown keyword"));
    }
}
