// ==========================================
// FatturaAnalyzer 导入核心 - 行校验器实现
// ==========================================
// 职责: 单行规则校验 + 类型规范化
// 规则顺序: 日期 → 金额（或借方 / 贷方）→ 描述 → 可选代码 → 可选起息日
// 红线: 累积全部失败原因，不在第一条失败处短路
// ==========================================

use crate::config::config_manager::DEFAULT_DATE_FORMATS;
use crate::domain::transaction::{NormalizedRecord, RawRow, RowOutcome, ValidationFailure};
use crate::domain::types::FieldKind;
use crate::importer::field_mapper::ColumnMapping;
use crate::importer::import_trait::RowValidator;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

/// 金额绝对值上限，超出视为无效（保证合计与差值运算不溢出）
pub const MAX_ABS_AMOUNT: Decimal = dec!(1000000000000000);

/// 带时间部分的日期格式（兜底）
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

// ==========================================
// TransactionRowValidator 实现
// ==========================================
#[derive(Debug, Clone)]
pub struct TransactionRowValidator {
    date_formats: Vec<String>,
    decimal_comma: bool, // 小数逗号 → 小数点
}

impl TransactionRowValidator {
    pub fn new(date_formats: Vec<String>, decimal_comma: bool) -> Self {
        Self {
            date_formats,
            decimal_comma,
        }
    }

    /// 解析日期（按配置格式顺序尝试）
    pub fn parse_date(&self, value: &str) -> Option<NaiveDate> {
        let value = value.trim();
        self.date_formats
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
            .or_else(|| {
                DATETIME_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                    .map(|dt| dt.date())
            })
    }

    /// 解析金额
    ///
    /// # 规则
    /// - 去掉货币符号与空白
    /// - (12,50) 视为负数
    /// - 同时出现 '.' 与 ',' 时，靠后的一个是小数分隔符
    /// - 仅有 ',' 且启用小数逗号时，',' 视为小数点
    /// - 绝对值超过 MAX_ABS_AMOUNT 视为无法解析
    pub fn parse_amount(&self, value: &str) -> Option<Decimal> {
        let mut s: String = value
            .chars()
            .filter(|c| !c.is_whitespace() && !matches!(c, '€' | '$'))
            .collect();

        let mut negative = false;
        if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
            s = inner.to_string();
            negative = true;
        }
        if let Some(rest) = s.strip_prefix('+') {
            s = rest.to_string();
        }
        if s.is_empty() {
            return None;
        }

        let normalized = match (s.rfind('.'), s.rfind(',')) {
            (Some(dot), Some(comma)) if comma > dot => s.replace('.', "").replace(',', "."),
            (Some(_), Some(_)) => s.replace(',', ""),
            (None, Some(_)) if self.decimal_comma => s.replace(',', "."),
            (None, Some(_)) => s.replace(',', ""),
            _ => s,
        };

        let amount = normalized.parse::<Decimal>().ok()?;
        if amount.abs() > MAX_ABS_AMOUNT {
            return None;
        }
        Some(if negative { -amount } else { amount })
    }

    /// 借方 / 贷方两列合成带符号金额
    ///
    /// # 规则
    /// - 两列都为空: "amount required"
    /// - 单列为空按 0 计
    /// - 金额取绝对值: 贷方为收入，借方为支出
    /// - 任一列无法解析: "<列名> invalid"
    fn debit_credit_amount(
        &self,
        row: &RawRow,
        mapping: &ColumnMapping,
        reasons: &mut Vec<String>,
    ) -> Option<Decimal> {
        let debit_cell = mapping.cell(row, FieldKind::DebitAmount);
        let credit_cell = mapping.cell(row, FieldKind::CreditAmount);
        if debit_cell.is_none() && credit_cell.is_none() {
            reasons.push(format!("{} required", mapping.field_name(FieldKind::DecimalAmount)));
            return None;
        }

        let mut side = |kind: FieldKind, cell: Option<&str>| -> Option<Decimal> {
            match cell {
                None => Some(Decimal::ZERO),
                Some(value) => {
                    let parsed = self.parse_amount(value).map(|v| v.abs());
                    if parsed.is_none() {
                        reasons.push(format!("{} invalid", mapping.field_name(kind)));
                    }
                    parsed
                }
            }
        };
        let debit = side(FieldKind::DebitAmount, debit_cell);
        let credit = side(FieldKind::CreditAmount, credit_cell);

        credit?.checked_sub(debit?)
    }

    /// 解析可选整数代码；无法解析时视为缺失
    pub fn parse_code(value: &str) -> Option<i64> {
        value.trim().parse::<i64>().ok()
    }
}

impl Default for TransactionRowValidator {
    fn default() -> Self {
        Self::new(
            DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
            true,
        )
    }
}

impl RowValidator for TransactionRowValidator {
    fn validate(&self, row: &RawRow, mapping: &ColumnMapping) -> RowOutcome {
        let mut reasons = Vec::new();

        // 规则 1: 日期
        let date_field = mapping.field_name(FieldKind::Date);
        let date = match mapping.cell(row, FieldKind::Date) {
            None => {
                reasons.push(format!("{} required", date_field));
                None
            }
            Some(value) => {
                let parsed = self.parse_date(value);
                if parsed.is_none() {
                    reasons.push(format!("{} invalid", date_field));
                }
                parsed
            }
        };

        // 规则 2: 金额（金额列优先，否则 贷方 - 借方）
        let amount = if mapping.is_mapped(FieldKind::DecimalAmount) {
            let amount_field = mapping.field_name(FieldKind::DecimalAmount);
            match mapping.cell(row, FieldKind::DecimalAmount) {
                None => {
                    reasons.push(format!("{} required", amount_field));
                    None
                }
                Some(value) => {
                    let parsed = self.parse_amount(value);
                    if parsed.is_none() {
                        reasons.push(format!("{} invalid", amount_field));
                    }
                    parsed
                }
            }
        } else {
            self.debit_credit_amount(row, mapping, &mut reasons)
        };

        // 规则 3: 描述
        let description = mapping
            .cell(row, FieldKind::FreeText)
            .map(|v| v.to_string());
        if description.is_none() {
            reasons.push(format!("{} required", mapping.field_name(FieldKind::FreeText)));
        }

        // 规则 4: 可选代码（缺失或非整数都不报错）
        let code = mapping.cell(row, FieldKind::IntegerCode).and_then(|value| {
            let parsed = Self::parse_code(value);
            if parsed.is_none() {
                debug!(row = row.position, value = %value, "代码非整数，已忽略");
            }
            parsed
        });

        // 规则 5: 可选起息日（无法解析时忽略）
        let value_date = mapping
            .cell(row, FieldKind::ValueDate)
            .and_then(|value| self.parse_date(value));

        match (date, amount, description) {
            (Some(date), Some(amount), Some(description)) if reasons.is_empty() => {
                RowOutcome::Valid(
                    NormalizedRecord::new(row.position, date, amount, description, code)
                        .with_value_date(value_date),
                )
            }
            _ => RowOutcome::Invalid(ValidationFailure {
                row: row.position,
                reasons,
            }),
        }
    }
}
