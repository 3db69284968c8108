// ==========================================
// FatturaAnalyzer 导入核心 - 非业务行过滤
// ==========================================
// 职责: 剔除银行导出中的余额 / 费用汇总等非业务行
// 规则: 描述包含关键字（不区分大小写），或描述仅为货币代码 "EUR"
// 红线: 空描述不在此处理，交给行校验报 "description required"
// ==========================================

use crate::domain::transaction::RawRow;
use crate::domain::types::FieldKind;
use crate::importer::field_mapper::ColumnMapping;
use crate::importer::import_trait::RowFilter;
use tracing::debug;

/// 默认跳过关键字（意大利银行对账单常见的非业务行）
pub const DEFAULT_SKIP_KEYWORDS: [&str; 8] = [
    "Saldo iniziale",
    "Saldo contabile",
    "Saldo liquido",
    "Disponibilità al",
    "Giroconto",
    "Canone mensile",
    "Imposta di bollo",
    "Competenze",
];

/// 仅含货币代码的描述
const CURRENCY_ONLY: &str = "EUR";

// ==========================================
// KeywordRowFilter 实现
// ==========================================
#[derive(Debug, Clone)]
pub struct KeywordRowFilter {
    keywords: Vec<String>, // 已转小写
}

impl KeywordRowFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// 不过滤任何行
    pub fn disabled() -> Self {
        Self {
            keywords: Vec::new(),
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl Default for KeywordRowFilter {
    fn default() -> Self {
        Self::new(DEFAULT_SKIP_KEYWORDS)
    }
}

impl RowFilter for KeywordRowFilter {
    fn skip_reason(&self, row: &RawRow, mapping: &ColumnMapping) -> Option<String> {
        let description = mapping.cell(row, FieldKind::FreeText)?;

        if description.eq_ignore_ascii_case(CURRENCY_ONLY) {
            debug!(row = row.position, "仅含货币代码的行，已跳过");
            return Some("currency-only row".to_string());
        }

        let lowered = description.to_lowercase();
        let keyword = self.keywords.iter().find(|k| lowered.contains(k.as_str()))?;
        debug!(row = row.position, keyword = %keyword, "非业务行，已跳过");
        Some(format!("non-operational row ({})", keyword))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::schema::transaction_schema;

    fn mapping() -> ColumnMapping {
        let header: Vec<String> = ["date", "amount", "description"]
            .iter()
            .map(|n| n.to_string())
            .collect();
        ColumnMapping::build(&header, &transaction_schema()).unwrap()
    }

    fn row(description: &str) -> RawRow {
        RawRow {
            position: 3,
            cells: vec!["2024-03-01".into(), "".into(), description.into()],
        }
    }

    #[test]
    fn test_balance_rows_are_skipped() {
        let filter = KeywordRowFilter::default();

        assert_eq!(
            filter.skip_reason(&row("SALDO INIZIALE al 29/02/2024"), &mapping()),
            Some("non-operational row (saldo iniziale)".to_string())
        );
        assert!(filter
            .skip_reason(&row("Disponibilità al 31/03"), &mapping())
            .is_some());
        assert!(filter.skip_reason(&row("Imposta di bollo Q1"), &mapping()).is_some());
    }

    #[test]
    fn test_currency_only_row_is_skipped() {
        let filter = KeywordRowFilter::default();
        assert_eq!(
            filter.skip_reason(&row(" eur "), &mapping()),
            Some("currency-only row".to_string())
        );
        assert_eq!(filter.skip_reason(&row("Rimborso EUR 10"), &mapping()), None);
    }

    #[test]
    fn test_business_and_blank_rows_are_kept() {
        let filter = KeywordRowFilter::default();
        assert_eq!(filter.skip_reason(&row("Bonifico fornitore"), &mapping()), None);
        assert_eq!(filter.skip_reason(&row("   "), &mapping()), None);
    }

    #[test]
    fn test_custom_and_disabled_keywords() {
        let custom = KeywordRowFilter::new(["Storno", "  "]);
        assert_eq!(custom.keywords(), &["storno".to_string()]);
        assert!(custom.skip_reason(&row("storno commissioni"), &mapping()).is_some());
        assert_eq!(custom.skip_reason(&row("Giroconto"), &mapping()), None);

        let disabled = KeywordRowFilter::disabled();
        assert_eq!(disabled.skip_reason(&row("Saldo iniziale"), &mapping()), None);
        assert!(disabled.skip_reason(&row("EUR"), &mapping()).is_some());
    }
}
