// ==========================================
// FatturaAnalyzer 导入核心 - 列映射器
// ==========================================
// 职责: 表头 → 字段定义映射 + 必填列检查
// 红线: 缺少必填列时整个文件拒绝，不进入逐行校验
// ==========================================

use crate::domain::transaction::{FieldSchema, RawRow};
use crate::domain::types::FieldKind;
use crate::importer::error::{ImportError, ImportResult};
use tracing::debug;

#[derive(Debug, Clone)]
struct MappedColumn {
    field: FieldSchema,
    index: Option<usize>, // 表头中的列下标（可选列可能缺失）
}

// ==========================================
// ColumnMapping - 表头映射
// ==========================================
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    columns: Vec<MappedColumn>,
}

impl ColumnMapping {
    /// 根据表头建立映射
    ///
    /// # 规则
    /// - 规范名或别名匹配（忽略大小写）
    /// - 同一表头列只分配给一个字段
    /// - 必填列缺失但其替代列全部出现时视为满足
    ///
    /// # 返回
    /// - Err(SchemaMismatch): 列出所有缺失的必填列（规范名）
    pub fn build(header: &[String], fields: &[FieldSchema]) -> ImportResult<Self> {
        let mut used = vec![false; header.len()];
        let mut columns = Vec::with_capacity(fields.len());

        for field in fields {
            let index = header
                .iter()
                .enumerate()
                .find(|(idx, name)| !used[*idx] && field.matches_header(name))
                .map(|(idx, _)| idx);

            match index {
                Some(idx) => {
                    used[idx] = true;
                    debug!(field = %field.name, column = %header[idx], "列已映射");
                }
                None => debug!(field = %field.name, required = field.required, "列缺失"),
            }

            columns.push(MappedColumn {
                field: field.clone(),
                index,
            });
        }

        let is_present = |name: &str| {
            columns
                .iter()
                .any(|c| c.field.name == name && c.index.is_some())
        };
        let missing: Vec<String> = columns
            .iter()
            .filter(|c| c.field.required && c.index.is_none())
            .filter(|c| {
                let substituted = !c.field.substitutes.is_empty()
                    && c.field.substitutes.iter().all(|name| is_present(name.as_str()));
                if substituted {
                    debug!(
                        field = %c.field.name,
                        substitutes = ?c.field.substitutes,
                        "由替代列满足"
                    );
                }
                !substituted
            })
            .map(|c| c.field.name.clone())
            .collect();

        if !missing.is_empty() {
            return Err(ImportError::SchemaMismatch { missing });
        }

        Ok(Self { columns })
    }

    /// 按语义类型查找字段定义（取第一个）
    pub fn field(&self, kind: FieldKind) -> Option<&FieldSchema> {
        self.column(kind).map(|c| &c.field)
    }

    /// 错误原因中使用的字段名
    pub fn field_name(&self, kind: FieldKind) -> String {
        self.field(kind)
            .map(|f| f.name.clone())
            .unwrap_or_else(|| kind.to_string())
    }

    /// 该语义类型的列是否出现在表头
    pub fn is_mapped(&self, kind: FieldKind) -> bool {
        self.column(kind).and_then(|c| c.index).is_some()
    }

    /// 读取单元格（TRIM 后为空视为缺失）
    pub fn cell<'a>(&self, row: &'a RawRow, kind: FieldKind) -> Option<&'a str> {
        let idx = self.column(kind)?.index?;
        row.cells
            .get(idx)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn column(&self, kind: FieldKind) -> Option<&MappedColumn> {
        self.columns.iter().find(|c| c.field.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::schema::transaction_schema;

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_mapping_by_alias() {
        let mapping = ColumnMapping::build(
            &header(&["Descrizione", "Data", "Importo"]),
            &transaction_schema(),
        )
        .unwrap();

        let row = RawRow {
            position: 2,
            cells: vec!["Rent".into(), "2024-01-01".into(), " 100,00 ".into()],
        };

        assert_eq!(mapping.cell(&row, FieldKind::Date), Some("2024-01-01"));
        assert_eq!(mapping.cell(&row, FieldKind::DecimalAmount), Some("100,00"));
        assert_eq!(mapping.cell(&row, FieldKind::FreeText), Some("Rent"));
        assert_eq!(mapping.cell(&row, FieldKind::IntegerCode), None);
        assert!(!mapping.is_mapped(FieldKind::IntegerCode));
        assert_eq!(mapping.field_name(FieldKind::DecimalAmount), "amount");
    }

    #[test]
    fn test_missing_required_columns_listed() {
        let err = ColumnMapping::build(&header(&["date", "note"]), &transaction_schema())
            .unwrap_err();

        match err {
            ImportError::SchemaMismatch { missing } => {
                assert_eq!(missing, vec!["amount".to_string(), "description".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_debit_and_credit_substitute_for_amount() {
        let mapping = ColumnMapping::build(
            &header(&["Data", "Valuta", "Dare", "Avere", "Descrizione operazione"]),
            &transaction_schema(),
        )
        .unwrap();

        assert!(!mapping.is_mapped(FieldKind::DecimalAmount));
        assert!(mapping.is_mapped(FieldKind::DebitAmount));
        assert!(mapping.is_mapped(FieldKind::CreditAmount));
        assert!(mapping.is_mapped(FieldKind::ValueDate));
    }

    #[test]
    fn test_debit_alone_does_not_replace_amount() {
        let err = ColumnMapping::build(
            &header(&["Data", "Dare", "Descrizione"]),
            &transaction_schema(),
        )
        .unwrap_err();

        match err {
            ImportError::SchemaMismatch { missing } => {
                assert_eq!(missing, vec!["amount".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_optional_column_is_fine() {
        let mapping =
            ColumnMapping::build(&header(&["date", "amount", "description"]), &transaction_schema());
        assert!(mapping.is_ok());
    }

    #[test]
    fn test_short_row_cell_is_missing() {
        let mapping =
            ColumnMapping::build(&header(&["date", "amount", "description"]), &transaction_schema())
                .unwrap();
        let row = RawRow {
            position: 2,
            cells: vec!["2024-01-01".into()],
        };

        assert_eq!(mapping.cell(&row, FieldKind::FreeText), None);
    }
}
