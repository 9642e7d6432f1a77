//! udplog 수집 코어
//!
//! UDP 데이터그램을 받아 프레임을 디코딩하고, 필요하면 타입별 JSON Schema로 검증한 뒤,
//! 정규화된 [`Event`](udplog_core::Event)로 만들어 퍼블리셔에 넘깁니다.
//!
//! # 모듈 구성
//!
//! - [`frame`]: `<format>:<type>:<payload>` 프레임 디코더 및 syslog 전용 모드
//! - [`parser`]: `<PRI>` 접두어 syslog 추출기
//! - [`schema`]: 스키마 레지스트리, 검증기, 파일 로더
//! - [`builder`]: 격리(quarantine) 규칙을 포함한 이벤트 조립
//! - [`processor`]: 데이터그램 한 개의 처리 흐름과 카운터
//! - [`ingest`]: 소켓을 소유하는 수집 루프
//! - [`publisher`]: 채널/JSON Lines/메모리 퍼블리셔
//! - [`config`]: 수집 설정 (core 설정에서 파생)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! UdpSocket -> FrameDecoder -> SchemaValidator -> EventBuilder -> Publisher
//!                  |                 |                 |
//!             드롭(로그)        드롭(스키마 없음)    격리 태그
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod frame;
pub mod ingest;
pub mod processor;
pub mod publisher;

pub mod parser;
pub mod schema;

// --- 주요 타입 re-export ---

// 수집 루프
pub use ingest::IngestionLoop;
pub use processor::{DatagramProcessor, Disposition, DropReason, IngestStats, RawDatagram};

// 설정
pub use config::{IngestConfig, IngestConfigBuilder};

// 에러
pub use error::{FrameError, IngestError};

// 디코더
pub use frame::{FrameDecoder, FrameMode, LogFormat, ParsedFrame, decode, decode_syslog_only};
pub use parser::{SyslogLine, extract_syslog};

// 스키마
pub use schema::{SchemaLoader, SchemaRegistry, SchemaValidator, ValidationOutcome};

// 빌더
pub use builder::{EventBuilder, QuarantineReason};

// 퍼블리셔
pub use publisher::{ChannelPublisher, CollectingPublisher, JsonLinesPublisher};
