//! Syslog PRI 추출기
//!
//! `<PRI>` 접두어가 붙은 syslog 스타일 라인에서 facility/severity/메시지를 분리합니다.
//! 타임스탬프·호스트명 등 PRI 이후의 헤더는 해석하지 않고 메시지에 그대로 남깁니다.
//!
//! # 입력 형식
//! ```text
//! <PRI>나머지 메시지
//! <34>Mar 1 foo        -> facility=4, severity=2, message="Mar 1 foo"
//! ```
//!
//! 추출 실패는 치명적 에러가 아닙니다. 호출자는 `None`을 받으면
//! 라인 전체를 메시지로 취급하는 경로로 내려갑니다.

/// 유효한 최대 PRI 값
/// facility 최댓값 23 * 8 + severity 최댓값 7 = 191
pub const MAX_SYSLOG_PRI: u8 = 191;

/// PRI 숫자의 최대 자릿수
const MAX_PRI_DIGITS: usize = 3;

/// PRI가 분리된 syslog 라인
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyslogLine<'a> {
    /// facility 코드 (PRI >> 3)
    pub facility: u8,
    /// severity 코드 (PRI & 7)
    pub severity: u8,
    /// `>` 이후의 나머지 라인 (공백 포함 원문 그대로)
    pub message: &'a str,
}

/// PRI 값에서 facility와 severity를 분리합니다.
///
/// PRI = facility * 8 + severity
pub fn decode_pri(pri: u8) -> (u8, u8) {
    (pri >> 3, pri & 7)
}

/// 라인에서 `<PRI>` 접두어를 추출합니다.
///
/// 다음 경우 `None`을 반환합니다.
/// - `<`로 시작하지 않음
/// - 처음 [`MAX_PRI_DIGITS`]+2 바이트 안에 `>`가 없음
/// - PRI가 비어 있거나 ASCII 숫자가 아닌 문자를 포함 (`+`, `-` 포함)
/// - PRI가 [`MAX_SYSLOG_PRI`]를 초과
///
/// 숫자로 파싱되기만 하면 받아들이지 않고 RFC 5424 범위(0..=191)로 제한합니다.
/// 예를 들어 `<200>hello`는 facility 25로 분해되지 않고 메시지 전체로 남습니다.
pub fn extract(line: &str) -> Option<SyslogLine<'_>> {
    let rest = line.strip_prefix('<')?;

    let digits_len = rest
        .bytes()
        .take(MAX_PRI_DIGITS + 1)
        .position(|b| b == b'>')?;
    if digits_len == 0 {
        return None;
    }

    let digits = &rest[..digits_len];
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let pri: u8 = digits.parse().ok()?;
    if pri > MAX_SYSLOG_PRI {
        return None;
    }

    let (facility, severity) = decode_pri(pri);
    Some(SyslogLine {
        facility,
        severity,
        message: &rest[digits_len + 1..],
    })
}
