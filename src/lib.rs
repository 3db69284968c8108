// ==========================================
// FatturaAnalyzer 导入核心 - 核心库
// ==========================================
// 职责: 银行流水文件 → 校验 / 批内查重预览 → 勾选提交
// 技术栈: Rust + tokio + csv + rust_decimal
// 系统定位: 人工审阅后提交（核心不直接持久化）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 导入层 - 解析 / 校验 / 查重 / 预览
pub mod importer;

// 会话层 - 选择状态与提交协调
pub mod session;

// 配置层 - 导入配置
pub mod config;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{FieldKind, ImportType, SessionState};

// 领域实体
pub use domain::{
    DuplicateFlag, FieldSchema, NormalizedRecord, PreviewResult, PreviewStats, RawRow,
    SkippedRow, ValidationFailure,
};

// 导入管道
pub use importer::{ImportError, ImportResult, PreviewBuilder};

// 会话
pub use session::{
    Delivery, ImportSession, JsonLinesSink, RecordSink, SinkError, SinkOutcome, SubmissionReport,
};

// 配置
pub use config::{ConfigManager, ImportConfigReader};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "FatturaAnalyzer Import";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
