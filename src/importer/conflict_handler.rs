// ==========================================
// FatturaAnalyzer 导入核心 - 批内查重实现
// ==========================================
// 职责: 检测同批次内重复流水（日期 + 描述 + 金额容差）
// 规则: 按文件顺序，较早出现者保留，后出现者标记为重复
// ==========================================

use crate::domain::transaction::{DuplicateFlag, NormalizedRecord};
use crate::importer::import_trait::DuplicateDetector;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

/// 默认金额容差（货币最小单位）
pub const DEFAULT_DUPLICATE_TOLERANCE: Decimal = dec!(0.01);

// ==========================================
// BatchDuplicateDetector 实现
// ==========================================
// 复杂度: 对有效记录 O(n²)。导入文件由人工逐批审阅，规模在千行以内；
// 超过低几千行时改为按 (日期, 描述) 分桶
#[derive(Debug, Clone)]
pub struct BatchDuplicateDetector {
    tolerance: Decimal,
}

impl BatchDuplicateDetector {
    pub fn new(tolerance: Decimal) -> Self {
        Self { tolerance }
    }

    /// 三键匹配: 同日期、同描述、金额差 < 容差
    ///
    /// 金额差溢出时视为不匹配
    pub fn is_match(&self, earlier: &NormalizedRecord, candidate: &NormalizedRecord) -> bool {
        earlier.date == candidate.date
            && earlier.description == candidate.description
            && earlier
                .amount
                .checked_sub(candidate.amount)
                .is_some_and(|diff| diff.abs() < self.tolerance)
    }
}

impl Default for BatchDuplicateDetector {
    fn default() -> Self {
        Self::new(DEFAULT_DUPLICATE_TOLERANCE)
    }
}

impl DuplicateDetector for BatchDuplicateDetector {
    fn detect(
        &self,
        records: Vec<NormalizedRecord>,
    ) -> (Vec<NormalizedRecord>, Vec<DuplicateFlag>) {
        let mut accepted: Vec<NormalizedRecord> = Vec::with_capacity(records.len());
        let mut duplicates = Vec::new();

        for record in records {
            // 首个匹配者胜出
            let earlier_row = accepted
                .iter()
                .find(|earlier| self.is_match(earlier, &record))
                .map(|earlier| earlier.row);

            match earlier_row {
                Some(earlier_row) => {
                    debug!(row = record.row, duplicate_of = earlier_row, "批内重复");
                    duplicates.push(DuplicateFlag {
                        row: record.row,
                        reason: format!("duplicate of row {}", earlier_row),
                        duplicate_of: earlier_row,
                        record,
                    });
                }
                None => accepted.push(record),
            }
        }

        (accepted, duplicates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(row: usize, day: u32, amount: Decimal, description: &str) -> NormalizedRecord {
        NormalizedRecord::new(
            row,
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            amount,
            description.to_string(),
            None,
        )
    }

    #[test]
    fn test_detect_duplicates_none() {
        let detector = BatchDuplicateDetector::default();
        let records = vec![
            record(2, 1, dec!(100.00), "Rent"),
            record(3, 2, dec!(100.00), "Rent"),
            record(4, 1, dec!(100.00), "Utilities"),
        ];

        let (valid, duplicates) = detector.detect(records);

        assert_eq!(valid.len(), 3);
        assert!(duplicates.is_empty());
    }

    #[test]
    fn test_detect_duplicates_found() {
        let detector = BatchDuplicateDetector::default();
        let records = vec![
            record(2, 1, dec!(100.00), "Rent"),
            record(3, 1, dec!(50.00), "Coffee"),
            record(4, 1, dec!(100.00), "Rent"), // 重复
        ];

        let (valid, duplicates) = detector.detect(records);

        assert_eq!(valid.iter().map(|r| r.row).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].row, 4);
        assert_eq!(duplicates[0].duplicate_of, 2);
        assert_eq!(duplicates[0].reason, "duplicate of row 2");
        assert_eq!(duplicates[0].record.description, "Rent");
    }

    #[test]
    fn test_earlier_record_wins_in_both_orders() {
        let detector = BatchDuplicateDetector::default();
        let a = record(2, 1, dec!(100.00), "Rent");
        let b = record(3, 1, dec!(100.005), "Rent");

        let (_, forward) = detector.detect(vec![a.clone(), b.clone()]);
        assert_eq!((forward[0].row, forward[0].duplicate_of), (3, 2));

        // 交换文件位置: B 在前
        let a_later = NormalizedRecord { row: 3, ..a };
        let b_earlier = NormalizedRecord { row: 2, ..b };
        let (valid, reverse) = detector.detect(vec![b_earlier, a_later]);
        assert_eq!((reverse[0].row, reverse[0].duplicate_of), (3, 2));
        assert_eq!(valid[0].amount, dec!(100.005));
    }

    #[test]
    fn test_tolerance_boundary() {
        let detector = BatchDuplicateDetector::default();
        let records = vec![
            record(2, 1, dec!(100.00), "Rent"),
            record(3, 1, dec!(100.01), "Rent"), // 差值 = 容差，不算重复
        ];

        let (valid, duplicates) = detector.detect(records);

        assert_eq!(valid.len(), 2);
        assert!(duplicates.is_empty());
    }

    #[test]
    fn test_multiple_duplicates_reference_first_occurrence() {
        let detector = BatchDuplicateDetector::default();
        let records = vec![
            record(2, 1, dec!(10), "Fee"),
            record(3, 1, dec!(10), "Fee"),
            record(4, 1, dec!(10), "Fee"),
        ];

        let (valid, duplicates) = detector.detect(records);

        assert_eq!(valid.len(), 1);
        assert_eq!(duplicates.len(), 2);
        assert!(duplicates.iter().all(|d| d.duplicate_of == 2));
    }

    #[test]
    fn test_overflowing_difference_is_not_a_match() {
        let detector = BatchDuplicateDetector::default();
        let records = vec![
            record(2, 1, Decimal::MAX, "Rent"),
            record(3, 1, Decimal::MIN, "Rent"),
        ];

        let (valid, duplicates) = detector.detect(records);

        assert_eq!(valid.len(), 2);
        assert!(duplicates.is_empty());
    }

    #[test]
    fn test_description_match_is_exact() {
        let detector = BatchDuplicateDetector::default();
        let records = vec![
            record(2, 1, dec!(10), "Fee"),
            record(3, 1, dec!(10), "fee"),
        ];

        let (valid, _) = detector.detect(records);
        assert_eq!(valid.len(), 2);
    }
}
