//! 스키마 검증기
//!
//! json 형식 페이로드의 형태(shape)만 확인합니다. 필드를 디코딩해
//! 이벤트에 넣는 일은 [`EventBuilder`](crate::builder::EventBuilder)가 담당합니다.

use std::sync::Arc;

use super::SchemaRegistry;

/// 검증 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// 스키마를 만족함
    Valid,
    /// 스키마 위반 또는 JSON 파싱 실패 (사유 포함)
    Invalid(String),
    /// 해당 타입의 스키마가 레지스트리에 없음 (구성 누락, 데이터그램 드롭 대상)
    SchemaMissing,
}

impl ValidationOutcome {
    /// 검증 통과 여부
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// 레지스트리 기반 스키마 검증기
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    registry: Arc<SchemaRegistry>,
}

impl SchemaValidator {
    /// 이미 구성된 레지스트리로 검증기를 생성합니다.
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }

    /// 사용 중인 레지스트리를 반환합니다.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// 페이로드를 타입의 스키마로 검증합니다.
    ///
    /// 스키마 위반이 여러 개여도 첫 번째 위반만 사유로 보고합니다.
    pub fn validate(&self, type_name: &str, payload: &str) -> ValidationOutcome {
        let Some(schema) = self.registry.get(type_name) else {
            return ValidationOutcome::SchemaMissing;
        };

        let instance: serde_json::Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(e) => {
                return ValidationOutcome::Invalid(format!("payload is not valid JSON: {e}"));
            }
        };

        match schema.iter_errors(&instance).next() {
            None => ValidationOutcome::Valid,
            Some(error) => {
                let path = error.instance_path.to_string();
                let reason = if path.is_empty() {
                    error.to_string()
                } else {
                    format!("{path}: {error}")
                };
                ValidationOutcome::Invalid(reason)
            }
        }
    }
}
