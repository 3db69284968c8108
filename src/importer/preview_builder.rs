// ==========================================
// FatturaAnalyzer 导入核心 - 预览构建器
// ==========================================
// 职责: 整合导入管道，从文本到三分类预览
// 流程: 解析 → 列映射 → 非业务行过滤 → 逐行校验 → 批内查重 → 汇总统计
// 红线: 各阶段输出完全物化后才进入下一阶段；全程保持文件顺序
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::transaction::{
    NormalizedRecord, PreviewResult, PreviewStats, RowOutcome, SkippedRow,
};
use crate::domain::types::ImportType;
use crate::importer::conflict_handler::BatchDuplicateDetector;
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::ColumnMapping;
use crate::importer::file_parser::DelimitedTextParser;
use crate::importer::import_trait::{
    DuplicateDetector, RowFilter, RowValidator, SchemaProvider, TextParser,
};
use crate::importer::row_filter::KeywordRowFilter;
use crate::importer::row_validator::TransactionRowValidator;
use crate::importer::schema::StaticSchemaProvider;
use rust_decimal::Decimal;
use std::time::Instant;
use tracing::{debug, info, instrument, warn, Span};
use uuid::Uuid;

// ==========================================
// PreviewBuilder
// ==========================================
pub struct PreviewBuilder {
    schema_provider: Box<dyn SchemaProvider>,
    text_parser: Box<dyn TextParser>,
    row_filter: Box<dyn RowFilter>,
    row_validator: Box<dyn RowValidator>,
    duplicate_detector: Box<dyn DuplicateDetector>,
}

impl PreviewBuilder {
    /// 创建 PreviewBuilder
    ///
    /// # 参数
    /// - schema_provider: 列契约提供者
    /// - text_parser: 文本解析器
    /// - row_filter: 非业务行过滤器
    /// - row_validator: 行校验器
    /// - duplicate_detector: 批内查重器
    pub fn new(
        schema_provider: Box<dyn SchemaProvider>,
        text_parser: Box<dyn TextParser>,
        row_filter: Box<dyn RowFilter>,
        row_validator: Box<dyn RowValidator>,
        duplicate_detector: Box<dyn DuplicateDetector>,
    ) -> Self {
        Self {
            schema_provider,
            text_parser,
            row_filter,
            row_validator,
            duplicate_detector,
        }
    }

    /// 按配置组装默认组件
    pub async fn from_config<C>(config: &C) -> ImportResult<Self>
    where
        C: ImportConfigReader + ?Sized,
    {
        let delimiter = config.get_delimiter().await?;
        let tolerance = config.get_duplicate_tolerance().await?;
        let date_formats = config.get_date_formats().await?;
        let decimal_comma = config.get_decimal_comma().await?;
        let skip_keywords = config.get_skip_keywords().await?;

        debug!(
            ?delimiter,
            tolerance = %tolerance,
            formats = date_formats.len(),
            decimal_comma,
            skip_keywords = skip_keywords.len(),
            "预览构建器配置已读取"
        );

        Ok(Self::new(
            Box::new(StaticSchemaProvider::default()),
            Box::new(DelimitedTextParser::new(delimiter)),
            Box::new(KeywordRowFilter::new(skip_keywords)),
            Box::new(TransactionRowValidator::new(date_formats, decimal_comma)),
            Box::new(BatchDuplicateDetector::new(tolerance)),
        ))
    }

    /// 构建预览
    ///
    /// # 返回
    /// - Ok(PreviewResult): 有效 / 无效 / 重复 / 跳过 + 统计
    /// - Err(EmptyFile | SchemaMismatch): 整个文件被拒绝，不产生预览
    #[instrument(skip(self, text), fields(import_type = %import_type, batch_id))]
    pub fn build(&self, import_type: ImportType, text: &str) -> ImportResult<PreviewResult> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        Span::current().record("batch_id", batch_id.as_str());

        // === 步骤 1: 解析文本 ===
        let parsed = self.text_parser.parse(text)?;
        let total_rows = parsed.rows.len();
        debug!(total_rows, columns = parsed.header.len(), "文本解析完成");

        // === 步骤 2: 表头检查 ===
        let fields = self.schema_provider.required_columns(import_type);
        let mapping = ColumnMapping::build(&parsed.header, &fields)?;

        // === 步骤 3: 非业务行过滤 + 逐行校验 ===
        let mut records = Vec::with_capacity(total_rows);
        let mut invalid = Vec::new();
        let mut skipped = Vec::new();
        for row in &parsed.rows {
            if let Some(reason) = self.row_filter.skip_reason(row, &mapping) {
                skipped.push(SkippedRow {
                    row: row.position,
                    reason,
                });
                continue;
            }
            match self.row_validator.validate(row, &mapping) {
                RowOutcome::Valid(record) => records.push(record),
                RowOutcome::Invalid(failure) => invalid.push(failure),
            }
        }
        debug!(
            valid = records.len(),
            invalid = invalid.len(),
            skipped = skipped.len(),
            "逐行校验完成"
        );

        // === 步骤 4: 批内查重 ===
        let (valid, duplicates) = self.duplicate_detector.detect(records);

        // === 步骤 5: 汇总统计 ===
        let stats = compute_stats(
            total_rows,
            &valid,
            invalid.len(),
            duplicates.len(),
            skipped.len(),
        );

        info!(
            total = total_rows,
            valid = stats.valid_count,
            invalid = stats.invalid_count,
            duplicates = stats.duplicate_count,
            skipped = stats.skipped_count,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "导入预览生成完成"
        );

        Ok(PreviewResult {
            batch_id,
            import_type,
            header: parsed.header,
            valid,
            invalid,
            duplicates,
            skipped,
            stats,
        })
    }
}

impl Default for PreviewBuilder {
    fn default() -> Self {
        Self::new(
            Box::new(StaticSchemaProvider::default()),
            Box::new(DelimitedTextParser::default()),
            Box::new(KeywordRowFilter::default()),
            Box::new(TransactionRowValidator::default()),
            Box::new(BatchDuplicateDetector::default()),
        )
    }
}

/// 汇总统计（对去重后的有效记录单次遍历）
pub fn compute_stats(
    total_rows: usize,
    valid: &[NormalizedRecord],
    invalid_count: usize,
    duplicate_count: usize,
    skipped_count: usize,
) -> PreviewStats {
    let mut stats = PreviewStats {
        total_rows,
        valid_count: valid.len(),
        invalid_count,
        duplicate_count,
        skipped_count,
        amount_sum: Decimal::ZERO,
        ..PreviewStats::default()
    };

    for record in valid {
        stats.amount_sum = match stats.amount_sum.checked_add(record.amount) {
            Some(sum) => sum,
            None => {
                warn!(row = record.row, "金额合计溢出，已截断");
                stats.amount_sum.saturating_add(record.amount)
            }
        };
        stats.min_amount = Some(stats.min_amount.map_or(record.amount, |m| m.min(record.amount)));
        stats.max_amount = Some(stats.max_amount.map_or(record.amount, |m| m.max(record.amount)));
        stats.min_date = Some(stats.min_date.map_or(record.date, |d| d.min(record.date)));
        stats.max_date = Some(stats.max_date.map_or(record.date, |d| d.max(record.date)));
        if record.is_income() {
            stats.income_count += 1;
        } else {
            stats.expense_count += 1;
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::error::ImportError;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    const SCENARIO: &str = "date,amount,description\n2024-01-01,100.00,Rent\n2024-01-01,100.00,Rent\n2024-01-02,bad,Utilities\n";

    #[test]
    fn test_build_rent_scenario() {
        let preview = PreviewBuilder::default()
            .build(ImportType::Transactions, SCENARIO)
            .unwrap();

        assert_eq!(preview.valid.len(), 1);
        assert_eq!(preview.valid[0].row, 2);
        assert_eq!(preview.valid[0].amount, dec!(100.00));
        assert_eq!(preview.valid[0].description, "Rent");

        assert_eq!(preview.duplicates.len(), 1);
        assert_eq!(preview.duplicates[0].row, 3);
        assert_eq!(preview.duplicates[0].duplicate_of, 2);

        assert_eq!(preview.invalid.len(), 1);
        assert_eq!(preview.invalid[0].row, 4);
        assert!(preview.invalid[0].reasons.iter().any(|r| r.contains("amount")));

        assert_eq!(preview.stats.total_rows, 3);
        assert_eq!(preview.stats.valid_count, 1);
    }

    #[test]
    fn test_build_skips_non_operational_rows() {
        let text = "date,amount,description\n\
2024-01-01,0,Saldo iniziale\n\
2024-01-02,-2.00,Imposta di bollo\n\
2024-01-03,,EUR\n\
2024-01-04,10.00,Bonifico\n";

        let preview = PreviewBuilder::default()
            .build(ImportType::Transactions, text)
            .unwrap();

        let skipped: Vec<usize> = preview.skipped.iter().map(|s| s.row).collect();
        assert_eq!(skipped, vec![2, 3, 4]);
        assert_eq!(preview.valid.len(), 1);
        assert_eq!(preview.valid[0].row, 5);
        assert!(preview.invalid.is_empty());
        assert_eq!(preview.stats.total_rows, 4);
        assert_eq!(preview.stats.skipped_count, 3);
    }

    #[test]
    fn test_build_empty_file() {
        let err = PreviewBuilder::default()
            .build(ImportType::Transactions, "\n \n")
            .unwrap_err();
        assert!(matches!(err, ImportError::EmptyFile));
    }

    #[test]
    fn test_build_schema_mismatch() {
        let err = PreviewBuilder::default()
            .build(ImportType::Transactions, "date,note\n2024-01-01,x\n")
            .unwrap_err();

        match err {
            ImportError::SchemaMismatch { missing } => {
                assert_eq!(missing, vec!["amount", "description"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_compute_stats() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
        let valid = vec![
            NormalizedRecord::new(2, day(5), dec!(100), "A".into(), None),
            NormalizedRecord::new(3, day(1), dec!(-40.5), "B".into(), None),
            NormalizedRecord::new(4, day(9), dec!(0), "C".into(), None),
        ];

        let stats = compute_stats(6, &valid, 1, 1, 1);

        assert_eq!(stats.total_rows, 6);
        assert_eq!(stats.skipped_count, 1);
        assert_eq!(stats.valid_count, 3);
        assert_eq!(stats.amount_sum, dec!(59.5));
        assert_eq!(stats.min_amount, Some(dec!(-40.5)));
        assert_eq!(stats.max_amount, Some(dec!(100)));
        assert_eq!(stats.min_date, Some(day(1)));
        assert_eq!(stats.max_date, Some(day(9)));
        assert_eq!(stats.income_count, 2);
        assert_eq!(stats.expense_count, 1);
    }

    #[test]
    fn test_compute_stats_saturates_instead_of_overflowing() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let valid = vec![
            NormalizedRecord::new(2, day, Decimal::MAX, "A".into(), None),
            NormalizedRecord::new(3, day, Decimal::MAX, "B".into(), None),
        ];

        let stats = compute_stats(2, &valid, 0, 0, 0);

        assert_eq!(stats.amount_sum, Decimal::MAX);
        assert_eq!(stats.max_amount, Some(Decimal::MAX));
    }

    #[test]
    fn test_build_rejects_out_of_range_amounts() {
        let text = "date,amount,description\n\
2024-01-01,50000000000000000000000000000,A\n\
2024-01-01,50000000000000000000000000000,B\n\
2024-01-01,79228162514264337593543950335,C\n\
2024-01-01,-79228162514264337593543950335,C\n";

        let preview = PreviewBuilder::default()
            .build(ImportType::Transactions, text)
            .unwrap();

        assert!(preview.valid.is_empty());
        assert_eq!(preview.invalid.len(), 4);
        assert!(preview
            .invalid
            .iter()
            .all(|f| f.reasons == vec!["amount invalid".to_string()]));
    }

    #[test]
    fn test_compute_stats_empty() {
        let stats = compute_stats(0, &[], 0, 0, 0);
        assert_eq!(stats.min_amount, None);
        assert_eq!(stats.min_date, None);
        assert_eq!(stats.amount_sum, Decimal::ZERO);
    }
}
