// ==========================================
// FatturaAnalyzer 导入核心 - 导入层
// ==========================================
// 职责: 文本 → 预览（有效 / 无效 / 批内重复 / 跳过的非业务行）
// 支持: 分隔文本（CSV / 分号 / 制表符）
// ==========================================

// 模块声明
pub mod conflict_handler;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod import_trait;
pub mod preview_builder;
pub mod row_filter;
pub mod row_validator;
pub mod schema;

// 重导出核心类型
pub use conflict_handler::BatchDuplicateDetector;
pub use error::{ImportError, ImportResult};
pub use field_mapper::ColumnMapping;
pub use file_parser::{DelimitedTextParser, Delimiter};
pub use preview_builder::{compute_stats, PreviewBuilder};
pub use row_filter::{KeywordRowFilter, DEFAULT_SKIP_KEYWORDS};
pub use row_validator::TransactionRowValidator;
pub use schema::{render_template, transaction_schema, StaticSchemaProvider};

// 重导出 Trait 接口
pub use import_trait::{DuplicateDetector, RowFilter, RowValidator, SchemaProvider, TextParser};
