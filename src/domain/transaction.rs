// ==========================================
// FatturaAnalyzer 导入核心 - 流水导入领域模型
// ==========================================
// 职责: 导入管道各阶段的数据结构
// 流程: RawRow → SkippedRow | NormalizedRecord / ValidationFailure → DuplicateFlag → PreviewResult
// ==========================================

use crate::domain::types::{FieldKind, ImportType};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ==========================================
// FieldSchema - 列定义
// ==========================================
// 用途: 导入类型的列契约（Schema Provider 输出）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,         // 规范列名（错误原因中使用）
    pub required: bool,       // 表头中是否必须出现
    pub kind: FieldKind,      // 语义类型
    pub aliases: Vec<String>, // 可接受的表头别名（不区分大小写）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub substitutes: Vec<String>, // 全部出现时可替代本列的其他列（如 借方 + 贷方 → 金额）
}

impl FieldSchema {
    pub fn new(name: &str, required: bool, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            required,
            kind,
            aliases: Vec::new(),
            substitutes: Vec::new(),
        }
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_substitutes(mut self, substitutes: &[&str]) -> Self {
        self.substitutes = substitutes.iter().map(|s| s.to_string()).collect();
        self
    }

    /// 表头名是否匹配本列（规范名或别名，忽略大小写和首尾空白）
    pub fn matches_header(&self, header: &str) -> bool {
        let header = header.trim();
        self.name.eq_ignore_ascii_case(header)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(header))
    }
}

// ==========================================
// RawRow - 解析后的原始行
// ==========================================
// 生命周期: 仅在导入流程内，解析后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    pub position: usize,    // 源文件行号（表头为第 1 行）
    pub cells: Vec<String>, // 已去引号的单元格
}

/// 文本解析输出: 表头 + 数据行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFile {
    pub header: Vec<String>,
    pub rows: Vec<RawRow>,
}

// ==========================================
// NormalizedRecord - 校验通过的流水
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub row: usize,           // 对应 RawRow.position
    pub date: NaiveDate,      // 记账日期
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value_date: Option<NaiveDate>, // 起息日（可选）
    pub amount: Decimal,      // 带符号金额（正 = 收入，负 = 支出）
    pub description: String,  // 描述（已 TRIM）
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub code: Option<i64>,    // 可选整数代码（ABI 因果码）
    pub fingerprint: String,  // 内容指纹，供服务端跨批次查重
}

impl NormalizedRecord {
    pub fn new(
        row: usize,
        date: NaiveDate,
        amount: Decimal,
        description: String,
        code: Option<i64>,
    ) -> Self {
        let fingerprint = transaction_fingerprint(date, amount, &description);
        Self {
            row,
            date,
            value_date: None,
            amount,
            description,
            code,
            fingerprint,
        }
    }

    /// 附加起息日（不参与指纹）
    pub fn with_value_date(mut self, value_date: Option<NaiveDate>) -> Self {
        self.value_date = value_date;
        self
    }

    pub fn is_income(&self) -> bool {
        self.amount >= Decimal::ZERO
    }
}

/// 计算流水内容指纹
///
/// 格式: SHA-256("TRX|YYYY-MM-DD|金额两位小数|规范化描述")
/// 金额: 两位小数，0.5 远离零舍入（0.125 → 0.13，-0.125 → -0.13）
/// 描述: 大写；字母、数字、'_'、'.'、'-' 之外的字符折叠为单个空格；截断 200 字符
pub fn transaction_fingerprint(date: NaiveDate, amount: Decimal, description: &str) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let amount_part = format!("{:.2}", rounded);

    let upper = description.trim().to_uppercase();
    let mut desc_part = String::with_capacity(upper.len());
    let mut last_space = false;
    for ch in upper.chars() {
        if ch.is_alphanumeric() || matches!(ch, '_' | '.' | '-') {
            desc_part.push(ch);
            last_space = false;
        } else if !last_space {
            desc_part.push(' ');
            last_space = true;
        }
    }
    let desc_part: String = desc_part.trim().chars().take(200).collect();

    let payload = format!("TRX|{}|{}|{}", date.format("%Y-%m-%d"), amount_part, desc_part);
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}

// ==========================================
// ValidationFailure - 行级校验失败
// ==========================================
// 保留全部原因，不仅是第一条
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub row: usize,
    pub reasons: Vec<String>,
}

/// 单行校验结果: 要么一条记录，要么一条失败，不会同时出现
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Valid(NormalizedRecord),
    Invalid(ValidationFailure),
}

// ==========================================
// DuplicateFlag - 批内重复标记
// ==========================================
// 数据不丢弃: 原记录随标记保留，便于展示
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateFlag {
    pub row: usize,          // 重复行行号
    pub reason: String,      // 重复原因
    pub duplicate_of: usize, // 与之碰撞的较早行行号
    pub record: NormalizedRecord,
}

// ==========================================
// SkippedRow - 跳过的非业务行
// ==========================================
// 余额行、印花税等：不校验、不提交，只在预览中列出
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub row: usize,
    pub reason: String,
}

// ==========================================
// PreviewStats - 预览汇总统计
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewStats {
    pub total_rows: usize,      // 数据行总数（不含表头）
    pub valid_count: usize,     // 去重后有效记录数
    pub invalid_count: usize,   // 校验失败行数
    pub duplicate_count: usize, // 批内重复行数
    pub skipped_count: usize,   // 跳过的非业务行数
    pub amount_sum: Decimal,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
    pub income_count: usize,  // amount >= 0
    pub expense_count: usize, // amount < 0
}

// ==========================================
// PreviewResult - 三分类预览
// ==========================================
// 生命周期: 每次选择文件新建，移除文件或提交成功后丢弃
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewResult {
    pub batch_id: String, // 批次 ID（UUID）
    pub import_type: ImportType,
    pub header: Vec<String>,
    pub valid: Vec<NormalizedRecord>,
    pub invalid: Vec<ValidationFailure>,
    pub duplicates: Vec<DuplicateFlag>,
    pub skipped: Vec<SkippedRow>,
    pub stats: PreviewStats,
}
