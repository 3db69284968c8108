// ==========================================
// FatturaAnalyzer 导入核心 - 领域类型定义
// ==========================================
// 职责: 导入类型 / 字段语义 / 会话状态等枚举
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 导入类型 (Import Type)
// ==========================================
// 当前仅银行流水走客户端解析流程
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ImportType {
    Transactions, // 银行流水
}

impl ImportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportType::Transactions => "transactions",
        }
    }
}

impl fmt::Display for ImportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 字段语义类型 (Field Kind)
// ==========================================
// 校验器按语义类型定位字段，不按列名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Date,          // 日期
    DecimalAmount, // 带符号金额
    FreeText,      // 自由文本（描述）
    IntegerCode,   // 整数代码（如 ABI 因果码）
    ValueDate,     // 起息日（可选日期）
    DebitAmount,   // 借方金额（支出，正数）
    CreditAmount,  // 贷方金额（收入，正数）
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Date => write!(f, "date"),
            FieldKind::DecimalAmount => write!(f, "decimal_amount"),
            FieldKind::FreeText => write!(f, "free_text"),
            FieldKind::IntegerCode => write!(f, "integer_code"),
            FieldKind::ValueDate => write!(f, "value_date"),
            FieldKind::DebitAmount => write!(f, "debit_amount"),
            FieldKind::CreditAmount => write!(f, "credit_amount"),
        }
    }
}

// ==========================================
// 导入会话状态 (Session State)
// ==========================================
// Idle → FileLoaded → Previewed → Submitting → Idle
// 提交失败: Submitting → Previewed（保留预览供重试）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Idle,       // 无文件
    FileLoaded, // 已选文件，等待内容
    Previewed,  // 预览已生成
    Submitting, // 提交中
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "IDLE"),
            SessionState::FileLoaded => write!(f, "FILE_LOADED"),
            SessionState::Previewed => write!(f, "PREVIEWED"),
            SessionState::Submitting => write!(f, "SUBMITTING"),
        }
    }
}
