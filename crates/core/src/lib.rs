//! udplog 공통 크레이트
//!
//! 수집 코어(`udplog-ingest`)와 데몬(`udplog-daemon`)이 공유하는
//! 에러, 설정, 이벤트 레코드, 퍼블리셔 trait, 메트릭 이름을 정의합니다.

pub mod config;
pub mod error;
pub mod event;
pub mod metrics;
pub mod pipeline;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, SchemaError, UdplogError};

// 설정
pub use config::UdplogConfig;

// 이벤트
pub use event::{Event, QUARANTINE_TAG};

// 파이프라인 trait
pub use pipeline::Publisher;
