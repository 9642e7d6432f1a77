//! 스키마 파일 로더 -- 타입별 JSON Schema 문서를 디스크에서 읽습니다.
//!
//! 규칙 로더와 달리 개별 파일 실패를 건너뛰지 않습니다. 구성된 스키마가 하나라도
//! 빠지면 해당 타입의 모든 json 데이터그램이 조용히 드롭되므로, 시작 단계에서 실패시킵니다.

use std::collections::BTreeMap;
use std::path::Path;

use udplog_core::error::SchemaError;

use super::SchemaRegistry;

/// 스키마 파일 최대 크기
const MAX_SCHEMA_FILE_SIZE: u64 = 1024 * 1024; // 1MB

/// 스키마 파일 로더
pub struct SchemaLoader;

impl SchemaLoader {
    /// `type -> 스키마 파일 경로` 매핑으로 레지스트리를 구성합니다.
    ///
    /// # Errors
    /// - 파일을 읽을 수 없거나 크기 제한을 넘는 경우: [`SchemaError::Read`]
    /// - 파일 내용이 JSON이 아닌 경우: [`SchemaError::InvalidDocument`]
    /// - 스키마 컴파일에 실패한 경우: [`SchemaError::Compile`]
    pub async fn load(mapping: &BTreeMap<String, String>) -> Result<SchemaRegistry, SchemaError> {
        let mut builder = SchemaRegistry::builder();

        for (type_name, path) in mapping {
            let document = Self::load_file(type_name, path).await?;
            builder = builder.schema(type_name.as_str(), &document)?;
            tracing::debug!(type_name = %type_name, path = %path, "compiled schema");
        }

        let registry = builder.build();
        tracing::info!(count = registry.len(), "loaded json schemas");
        Ok(registry)
    }

    /// 단일 스키마 파일을 JSON 문서로 읽습니다.
    pub async fn load_file(
        type_name: &str,
        path: impl AsRef<Path>,
    ) -> Result<serde_json::Value, SchemaError> {
        let path = path.as_ref();
        let read_error = |reason: String| SchemaError::Read {
            type_name: type_name.to_owned(),
            path: path.display().to_string(),
            reason,
        };

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| read_error(format!("failed to read file metadata: {e}")))?;

        if !metadata.is_file() {
            return Err(read_error("not a regular file".to_owned()));
        }

        if metadata.len() > MAX_SCHEMA_FILE_SIZE {
            return Err(read_error(format!(
                "file too large: {} bytes (max {MAX_SCHEMA_FILE_SIZE})",
                metadata.len()
            )));
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| read_error(format!("failed to read file: {e}")))?;

        serde_json::from_str(&content).map_err(|e| SchemaError::InvalidDocument {
            type_name: type_name.to_owned(),
            reason: e.to_string(),
        })
    }
}
