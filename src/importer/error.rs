// ==========================================
// FatturaAnalyzer 导入核心 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 行级校验失败与批内重复是预览数据，不在此处
// ==========================================

use crate::domain::types::SessionState;
use crate::session::sink::SinkError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误（致命，需重新选择文件）=====
    #[error("File is empty: no parseable content")]
    EmptyFile,

    #[error("Missing required columns: {}", .missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    #[error("File read failed: {0}")]
    FileReadError(String),

    #[error("CSV parse failed: {0}")]
    CsvParseError(String),

    // ===== 配置错误 =====
    #[error("Config read failed (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    #[error("Invalid config value (key: {key}, value: {value}): {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },

    // ===== 会话错误 =====
    #[error("Operation '{operation}' not allowed in state {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    #[error("Selection index {index} out of range (valid records: {len})")]
    SelectionOutOfRange { index: usize, len: usize },

    #[error("Nothing selected for submission")]
    EmptySelection,

    #[error("Stale result for generation {ticket} (current: {current})")]
    StaleSession { ticket: u64, current: u64 },

    // ===== 提交错误（保留预览供重试）=====
    #[error("Submission rejected: {0}")]
    SinkRejection(#[from] SinkError),

    // ===== 通用错误 =====
    #[error("Internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 是否需要重新选择文件才能继续
    pub fn is_fatal_for_file(&self) -> bool {
        matches!(
            self,
            ImportError::EmptyFile
                | ImportError::SchemaMismatch { .. }
                | ImportError::FileReadError(_)
                | ImportError::CsvParseError(_)
        )
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::InternalError(format!("JSON error: {}", err))
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_mismatch_names_columns() {
        let err = ImportError::SchemaMismatch {
            missing: vec!["amount".to_string(), "description".to_string()],
        };
        assert_eq!(err.to_string(), "Missing required columns: amount, description");
        assert!(err.is_fatal_for_file());
    }

    #[test]
    fn test_sink_rejection_is_not_fatal_for_file() {
        let err: ImportError = SinkError::Network("connection reset".to_string()).into();
        assert!(matches!(err, ImportError::SinkRejection(_)));
        assert!(!err.is_fatal_for_file());
    }
}
