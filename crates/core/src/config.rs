//! 설정 관리 -- udplog.toml 파싱 및 런타임 설정
//!
//! [`UdplogConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//! 수집 코어는 이미 확정된 설정만 소비하며, 로딩 방식은 알지 못합니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선, daemon에서 적용)
//! 2. 환경변수 (`UDPLOG_INGEST_PORT=5140` 형식)
//! 3. 설정 파일 (`udplog.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), udplog_core::error::UdplogError> {
//! use udplog_core::config::UdplogConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = UdplogConfig::load("udplog.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = UdplogConfig::parse("[ingest]\nport = 5140")?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, UdplogError};

/// UDP 페이로드 최대 크기 (IPv4: 65535 - 8 UDP 헤더 - 20 IP 헤더)
pub const MAX_UDP_PAYLOAD: usize = 65_507;

/// udplog 통합 설정
///
/// `udplog.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UdplogConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 수집 설정
    #[serde(default)]
    pub ingest: IngestSection,
    /// 출력(퍼블리셔) 설정
    #[serde(default)]
    pub output: OutputConfig,
    /// 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl UdplogConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, UdplogError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, UdplogError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                UdplogError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                UdplogError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, UdplogError> {
        toml::from_str(toml_str).map_err(|e| {
            UdplogError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `UDPLOG_{SECTION}_{FIELD}`
    /// 예: `UDPLOG_INGEST_ENABLE_JSON_VALIDATION=true`
    ///
    /// 스키마 매핑(`json_document_type_schema`)은 파일로만 설정합니다.
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "UDPLOG_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "UDPLOG_GENERAL_LOG_FORMAT");

        // Ingest
        override_string(&mut self.ingest.listen_host, "UDPLOG_INGEST_LISTEN_HOST");
        override_u16(&mut self.ingest.port, "UDPLOG_INGEST_PORT");
        override_usize(
            &mut self.ingest.max_message_size,
            "UDPLOG_INGEST_MAX_MESSAGE_SIZE",
        );
        override_u64(
            &mut self.ingest.recv_timeout_ms,
            "UDPLOG_INGEST_RECV_TIMEOUT_MS",
        );
        override_bool(
            &mut self.ingest.enable_json_validation,
            "UDPLOG_INGEST_ENABLE_JSON_VALIDATION",
        );
        override_bool(
            &mut self.ingest.enable_syslog_format_only,
            "UDPLOG_INGEST_ENABLE_SYSLOG_FORMAT_ONLY",
        );
        override_bool(
            &mut self.ingest.publish_failed_schema_validation,
            "UDPLOG_INGEST_PUBLISH_FAILED_SCHEMA_VALIDATION",
        );
        override_bool(
            &mut self.ingest.publish_failed_json_invalid,
            "UDPLOG_INGEST_PUBLISH_FAILED_JSON_INVALID",
        );

        // Output
        override_string(&mut self.output.kind, "UDPLOG_OUTPUT_KIND");
        override_string(&mut self.output.path, "UDPLOG_OUTPUT_PATH");

        // Metrics
        override_bool(&mut self.metrics.enabled, "UDPLOG_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "UDPLOG_METRICS_LISTEN_ADDR");
        override_u16(&mut self.metrics.port, "UDPLOG_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), UdplogError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.ingest.listen_host.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "ingest.listen_host".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        if self.ingest.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "ingest.port".to_owned(),
                reason: "must be 1-65535".to_owned(),
            }
            .into());
        }

        if self.ingest.max_message_size == 0 || self.ingest.max_message_size > MAX_UDP_PAYLOAD {
            return Err(ConfigError::InvalidValue {
                field: "ingest.max_message_size".to_owned(),
                reason: format!("must be 1-{}", MAX_UDP_PAYLOAD),
            }
            .into());
        }

        // 검증이 켜져 있는데 스키마가 하나도 없으면 모든 json 데이터그램이 드롭된다
        if self.ingest.enable_json_validation && self.ingest.json_document_type_schema.is_empty()
        {
            warn!("json validation enabled without any schema; every json datagram will be dropped");
        }

        let valid_outputs = ["stdout", "file"];
        if !valid_outputs.contains(&self.output.kind.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "output.kind".to_owned(),
                reason: format!("must be one of: {}", valid_outputs.join(", ")),
            }
            .into());
        }

        if self.output.kind == "file" && self.output.path.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "output.path".to_owned(),
                reason: "path is required when output.kind is 'file'".to_owned(),
            }
            .into());
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "metrics.port".to_owned(),
                reason: "must be 1-65535".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 수집 설정 (`[ingest]` 섹션)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSection {
    /// 바인드 호스트
    pub listen_host: String,
    /// 수신 포트
    pub port: u16,
    /// 최대 데이터그램 크기 (바이트)
    pub max_message_size: usize,
    /// 수신 타임아웃 (밀리초, 0이면 타임아웃 없음)
    pub recv_timeout_ms: u64,
    /// json 형식 페이로드의 스키마 검증 활성화
    pub enable_json_validation: bool,
    /// syslog 전용 모드 (프레임 디코더 우회)
    pub enable_syslog_format_only: bool,
    /// 스키마 검증 실패 시 격리 이벤트로 퍼블리시
    pub publish_failed_schema_validation: bool,
    /// JSON 디코딩 실패 시 격리 이벤트로 퍼블리시
    pub publish_failed_json_invalid: bool,
    /// 이벤트 타입 -> JSON Schema 파일 경로
    pub json_document_type_schema: BTreeMap<String, String>,
}

impl Default for IngestSection {
    fn default() -> Self {
        Self {
            listen_host: "127.0.0.1".to_owned(),
            port: 5000,
            max_message_size: 1024,
            recv_timeout_ms: 1000,
            enable_json_validation: false,
            enable_syslog_format_only: false,
            publish_failed_schema_validation: true,
            publish_failed_json_invalid: true,
            json_document_type_schema: BTreeMap::new(),
        }
    }
}

/// 출력 설정 (`[output]` 섹션)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// 출력 종류 (stdout, file)
    pub kind: String,
    /// 파일 출력 경로 (kind = "file"일 때)
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            kind: "stdout".to_owned(),
            path: String::new(),
        }
    }
}

/// 메트릭 설정 (`[metrics]` 섹션)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prometheus 엔드포인트 활성화
    pub enabled: bool,
    /// 리슨 주소
    pub listen_addr: String,
    /// 리슨 포트
    pub port: u16,
    /// 엔드포인트 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9100,
            endpoint: "/metrics".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
