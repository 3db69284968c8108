// ==========================================
// FatturaAnalyzer 导入核心 - 领域模型层
// ==========================================
// 职责: 定义导入管道的实体与类型
// 红线: 不含 I/O，不含界面状态
// ==========================================

pub mod transaction;
pub mod types;

// 重导出核心类型
pub use transaction::{
    transaction_fingerprint, DuplicateFlag, FieldSchema, NormalizedRecord, ParsedFile,
    PreviewResult, PreviewStats, RawRow, RowOutcome, SkippedRow, ValidationFailure,
};
pub use types::{FieldKind, ImportType, SessionState};
