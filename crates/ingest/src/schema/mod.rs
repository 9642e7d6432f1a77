//! 스키마 레지스트리 -- 이벤트 타입별 컴파일된 JSON Schema
//!
//! [`SchemaRegistry`]는 수집 루프 시작 전에 한 번 만들어지고 이후 변경되지 않습니다.
//! 수집 코어는 `Arc<SchemaRegistry>`로 전달받아 읽기만 합니다.
//! 스키마 파일을 어디서 어떻게 읽는지는 [`loader`]만 알고 있습니다.
//!
//! # 사용 예시
//! ```ignore
//! use serde_json::json;
//! use udplog_ingest::schema::SchemaRegistry;
//!
//! let registry = SchemaRegistry::builder()
//!     .schema("metrics", &json!({"type": "object", "required": ["cpu"]}))?
//!     .build();
//! assert!(registry.contains("metrics"));
//! ```

pub mod loader;
pub mod validator;

pub use loader::SchemaLoader;
pub use validator::{SchemaValidator, ValidationOutcome};

use std::collections::HashMap;
use std::fmt;

use udplog_core::error::SchemaError;

/// 이벤트 타입 -> 컴파일된 스키마 매핑
///
/// 키가 없는 것은 정상 상황입니다 (해당 타입에 스키마가 구성되지 않음).
pub struct SchemaRegistry {
    schemas: HashMap<String, jsonschema::Validator>,
}

impl SchemaRegistry {
    /// 빈 레지스트리를 생성합니다.
    pub fn empty() -> Self {
        Self {
            schemas: HashMap::new(),
        }
    }

    /// 레지스트리 빌더를 생성합니다.
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::default()
    }

    /// 타입에 해당하는 컴파일된 스키마를 반환합니다.
    pub fn get(&self, type_name: &str) -> Option<&jsonschema::Validator> {
        self.schemas.get(type_name)
    }

    /// 타입에 스키마가 등록되어 있는지 확인합니다.
    pub fn contains(&self, type_name: &str) -> bool {
        self.schemas.contains_key(type_name)
    }

    /// 등록된 스키마 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// 등록된 스키마가 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// 등록된 타입 이름 목록을 정렬하여 반환합니다.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}

/// 스키마 레지스트리 빌더
///
/// 스키마 문서를 컴파일하며 추가하고, [`build`](Self::build)로 불변 레지스트리를 만듭니다.
#[derive(Default)]
pub struct SchemaRegistryBuilder {
    schemas: HashMap<String, jsonschema::Validator>,
}

impl SchemaRegistryBuilder {
    /// 스키마 문서를 컴파일하여 추가합니다.
    ///
    /// 같은 타입을 다시 추가하면 이전 스키마를 대체합니다.
    pub fn schema(
        mut self,
        type_name: impl Into<String>,
        document: &serde_json::Value,
    ) -> Result<Self, SchemaError> {
        let type_name = type_name.into();
        let compiled =
            jsonschema::validator_for(document).map_err(|e| SchemaError::Compile {
                type_name: type_name.clone(),
                reason: e.to_string(),
            })?;
        self.schemas.insert(type_name, compiled);
        Ok(self)
    }

    /// 불변 레지스트리를 생성합니다.
    pub fn build(self) -> SchemaRegistry {
        SchemaRegistry {
            schemas: self.schemas,
        }
    }
}
