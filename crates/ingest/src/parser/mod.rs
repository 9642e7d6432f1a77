//! 페이로드 파서
//!
//! 프레임 디코딩 이후 페이로드 내용을 해석하는 파서를 모아 둡니다.
//!
//! - [`syslog`]: `<PRI>` 접두어에서 facility/severity 추출

pub mod syslog;

pub use syslog::{SyslogLine, extract as extract_syslog};
