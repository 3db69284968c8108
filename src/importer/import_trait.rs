// ==========================================
// FatturaAnalyzer 导入核心 - 导入管道 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 流程: 解析 → 列映射 → 非业务行过滤 → 行校验 → 批内查重 → 预览
// ==========================================

use crate::domain::transaction::{
    DuplicateFlag, FieldSchema, NormalizedRecord, ParsedFile, RawRow, RowOutcome,
};
use crate::domain::types::ImportType;
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::ColumnMapping;

// ==========================================
// SchemaProvider Trait
// ==========================================
// 用途: 提供导入类型的列契约
// 实现者: StaticSchemaProvider
pub trait SchemaProvider: Send + Sync {
    /// 获取导入类型的列定义（有序）
    ///
    /// # 参数
    /// - import_type: 导入类型
    ///
    /// # 返回
    /// - Vec<FieldSchema>: 列定义，required 列必须出现在表头
    fn required_columns(&self, import_type: ImportType) -> Vec<FieldSchema>;
}

// ==========================================
// TextParser Trait
// ==========================================
// 用途: 文本解析接口（阶段 0）
// 实现者: DelimitedTextParser
pub trait TextParser: Send + Sync {
    /// 解析原始文本为表头 + 数据行
    ///
    /// # 返回
    /// - Ok(ParsedFile): 表头与数据行（文件顺序）
    /// - Err(EmptyFile): 无任何非空行
    fn parse(&self, text: &str) -> ImportResult<ParsedFile>;
}

// ==========================================
// RowFilter Trait
// ==========================================
// 用途: 识别非业务行（余额行、期初 / 期末、印花税等），在校验前剔除
// 实现者: KeywordRowFilter
pub trait RowFilter: Send + Sync {
    /// 判断该行是否跳过
    ///
    /// # 返回
    /// - Some(原因): 非业务行，不进入校验
    /// - None: 正常校验
    fn skip_reason(&self, row: &RawRow, mapping: &ColumnMapping) -> Option<String>;
}

// ==========================================
// RowValidator Trait
// ==========================================
// 用途: 单行校验接口（阶段 1）
// 实现者: TransactionRowValidator
pub trait RowValidator: Send + Sync {
    /// 校验单行并规范化
    ///
    /// # 参数
    /// - row: 原始行
    /// - mapping: 表头 → 字段映射
    ///
    /// # 返回
    /// - RowOutcome::Valid: 规范化记录
    /// - RowOutcome::Invalid: 全部失败原因（按规则顺序累积）
    fn validate(&self, row: &RawRow, mapping: &ColumnMapping) -> RowOutcome;
}

// ==========================================
// DuplicateDetector Trait
// ==========================================
// 用途: 批内查重接口（阶段 2）
// 实现者: BatchDuplicateDetector
pub trait DuplicateDetector: Send + Sync {
    /// 检测同批次内重复记录
    ///
    /// # 参数
    /// - records: 校验通过的记录（文件顺序）
    ///
    /// # 返回
    /// - (保留的记录, 重复标记)，两者均保持文件顺序
    fn detect(&self, records: Vec<NormalizedRecord>) -> (Vec<NormalizedRecord>, Vec<DuplicateFlag>);
}
