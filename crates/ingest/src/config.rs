//! 수집 코어 설정
//!
//! [`IngestConfig`]는 core의 [`IngestSection`](udplog_core::config::IngestSection)에서
//! 파생됩니다. 스키마 파일 매핑은 포함하지 않습니다. 수집 코어는 이미 구성된
//! 레지스트리만 받습니다.
//!
//! # 사용 예시
//! ```ignore
//! use udplog_core::config::UdplogConfig;
//! use udplog_ingest::config::IngestConfig;
//!
//! let core_config = UdplogConfig::default();
//! let config = IngestConfig::from_core(&core_config.ingest);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use udplog_core::config::{IngestSection, MAX_UDP_PAYLOAD};

use crate::error::IngestError;
use crate::frame::FrameMode;
use crate::processor::QuarantinePolicy;

/// 수집 코어 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// 수신 호스트
    pub listen_host: String,
    /// 수신 포트 (0이면 임의 포트)
    pub port: u16,
    /// 수신 버퍼 크기 (바이트). 더 긴 데이터그램은 잘립니다.
    pub max_message_size: usize,
    /// 수신 타임아웃 (밀리초, 0이면 무제한)
    pub recv_timeout_ms: u64,
    /// json 페이로드 스키마 검증 여부
    pub enable_json_validation: bool,
    /// syslog 전용 모드
    pub enable_syslog_format_only: bool,
    /// 스키마 검증 실패 이벤트 퍼블리시 여부
    pub publish_failed_schema_validation: bool,
    /// JSON 디코딩 실패 이벤트 퍼블리시 여부
    pub publish_failed_json_invalid: bool,
}

impl Default for IngestConfig {
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
        }
    }
}

impl IngestConfig {
    /// core의 `IngestSection`에서 수집 설정을 생성합니다.
    pub fn from_core(core: &IngestSection) -> Self {
        Self {
            listen_host: core.listen_host.clone(),
            port: core.port,
            max_message_size: core.max_message_size,
            recv_timeout_ms: core.recv_timeout_ms,
            enable_json_validation: core.enable_json_validation,
            enable_syslog_format_only: core.enable_syslog_format_only,
            publish_failed_schema_validation: core.publish_failed_schema_validation,
            publish_failed_json_invalid: core.publish_failed_json_invalid,
        }
    }

    /// 로그 표시용 바인드 주소 (`host:port`, IPv6는 대괄호)
    pub fn bind_addr(&self) -> String {
        if self.listen_host.contains(':') {
            format!("[{}]:{}", self.listen_host, self.port)
        } else {
            format!("{}:{}", self.listen_host, self.port)
        }
    }

    /// 디코더 모드
    pub fn frame_mode(&self) -> FrameMode {
        if self.enable_syslog_format_only {
            FrameMode::SyslogOnly
        } else {
            FrameMode::Framed
        }
    }

    /// 수신 타임아웃. 0이면 `None` (타임아웃 없음)
    pub fn recv_timeout(&self) -> Option<Duration> {
        (self.recv_timeout_ms > 0).then(|| Duration::from_millis(self.recv_timeout_ms))
    }

    /// 격리 퍼블리시 정책
    pub fn quarantine_policy(&self) -> QuarantinePolicy {
        QuarantinePolicy {
            publish_schema_invalid: self.publish_failed_schema_validation,
            publish_json_invalid: self.publish_failed_json_invalid,
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), IngestError> {
        const MAX_RECV_TIMEOUT_MS: u64 = 3_600_000; // 1 hour

        if self.listen_host.trim().is_empty() {
            return Err(IngestError::Config {
                field: "listen_host".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.max_message_size == 0 || self.max_message_size > MAX_UDP_PAYLOAD {
            return Err(IngestError::Config {
                field: "max_message_size".to_owned(),
                reason: format!("must be 1-{MAX_UDP_PAYLOAD}"),
            });
        }

        if self.recv_timeout_ms > MAX_RECV_TIMEOUT_MS {
            return Err(IngestError::Config {
                field: "recv_timeout_ms".to_owned(),
                reason: format!("must be 0-{MAX_RECV_TIMEOUT_MS}"),
            });
        }

        Ok(())
    }
}

/// 수집 설정 빌더
#[derive(Default)]
pub struct IngestConfigBuilder {
    config: IngestConfig,
}

impl IngestConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 수신 호스트를 설정합니다.
    pub fn listen_host(mut self, host: impl Into<String>) -> Self {
        self.config.listen_host = host.into();
        self
    }

    /// 수신 포트를 설정합니다.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// 수신 버퍼 크기를 설정합니다.
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.config.max_message_size = size;
        self
    }

    /// 수신 타임아웃(밀리초)을 설정합니다.
    pub fn recv_timeout_ms(mut self, ms: u64) -> Self {
        self.config.recv_timeout_ms = ms;
        self
    }

    /// json 스키마 검증 여부를 설정합니다.
    pub fn enable_json_validation(mut self, enabled: bool) -> Self {
        self.config.enable_json_validation = enabled;
        self
    }

    /// syslog 전용 모드를 설정합니다.
    pub fn enable_syslog_format_only(mut self, enabled: bool) -> Self {
        self.config.enable_syslog_format_only = enabled;
        self
    }

    /// 스키마 검증 실패 이벤트 퍼블리시 여부를 설정합니다.
    pub fn publish_failed_schema_validation(mut self, publish: bool) -> Self {
        self.config.publish_failed_schema_validation = publish;
        self
    }

    /// JSON 디코딩 실패 이벤트 퍼블리시 여부를 설정합니다.
    pub fn publish_failed_json_invalid(mut self, publish: bool) -> Self {
        self.config.publish_failed_json_invalid = publish;
        self
    }

    /// 설정을 검증하고 `IngestConfig`를 생성합니다.
    pub fn build(self) -> Result<IngestConfig, IngestError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
