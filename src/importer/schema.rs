// ==========================================
// FatturaAnalyzer 导入核心 - 列契约提供者
// ==========================================
// 职责: 导入类型 → 列定义（含别名）+ 空白模板生成
// ==========================================

use crate::domain::transaction::FieldSchema;
use crate::domain::types::{FieldKind, ImportType};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::import_trait::SchemaProvider;
use csv::WriterBuilder;

/// 银行流水列定义
///
/// 别名覆盖常见的意大利银行导出表头。
/// 金额列缺失时，借方（Dare）+ 贷方（Avere）两列同时出现即可替代
pub fn transaction_schema() -> Vec<FieldSchema> {
    vec![
        FieldSchema::new("date", true, FieldKind::Date).with_aliases(&[
            "data",
            "data contabile",
            "data operazione",
            "datacontabile",
            "transaction date",
        ]),
        FieldSchema::new("amount", true, FieldKind::DecimalAmount)
            .with_aliases(&["importo", "importo eur", "transaction amount"])
            .with_substitutes(&["debit", "credit"]),
        FieldSchema::new("description", true, FieldKind::FreeText).with_aliases(&[
            "descrizione",
            "descrizione operazione",
            "dettagli",
            "details",
        ]),
        FieldSchema::new("code", false, FieldKind::IntegerCode).with_aliases(&[
            "causale",
            "causale abi",
            "codice causale",
            "abi code",
        ]),
        FieldSchema::new("value_date", false, FieldKind::ValueDate).with_aliases(&[
            "valuta",
            "data valuta",
            "value date",
        ]),
        FieldSchema::new("debit", false, FieldKind::DebitAmount)
            .with_aliases(&["dare", "addebiti", "uscite"]),
        FieldSchema::new("credit", false, FieldKind::CreditAmount)
            .with_aliases(&["avere", "accrediti", "entrate"]),
    ]
}

// ==========================================
// StaticSchemaProvider 实现
// ==========================================
#[derive(Debug, Clone)]
pub struct StaticSchemaProvider {
    transactions: Vec<FieldSchema>,
}

impl StaticSchemaProvider {
    /// 使用自定义流水列定义
    pub fn new(transactions: Vec<FieldSchema>) -> Self {
        Self { transactions }
    }
}

impl Default for StaticSchemaProvider {
    fn default() -> Self {
        Self::new(transaction_schema())
    }
}

impl SchemaProvider for StaticSchemaProvider {
    fn required_columns(&self, import_type: ImportType) -> Vec<FieldSchema> {
        match import_type {
            ImportType::Transactions => self.transactions.clone(),
        }
    }
}

/// 示例值（按字段语义，三行）
fn example_values(kind: FieldKind) -> [&'static str; 3] {
    match kind {
        FieldKind::Date => ["2024-01-01", "2024-01-02", "2024-01-03"],
        FieldKind::DecimalAmount => ["1500.00", "-800.00", "2200.00"],
        FieldKind::FreeText => [
            "Esempio pagamento cliente",
            "Pagamento fornitore",
            "Bonifico ricevuto",
        ],
        FieldKind::IntegerCode => ["48", "26", ""],
        FieldKind::ValueDate => ["2024-01-01", "2024-01-03", "2024-01-04"],
        FieldKind::DebitAmount => ["", "800.00", ""],
        FieldKind::CreditAmount => ["1500.00", "", "2200.00"],
    }
}

/// 生成空白导入模板（表头 + 示例行）
///
/// 仅用于帮助用户准备文件，运行时校验只依赖列定义。
/// 替代列（借方 / 贷方）不写入模板，模板统一使用带符号金额列
pub fn render_template(fields: &[FieldSchema], delimiter: u8) -> ImportResult<String> {
    let columns: Vec<&FieldSchema> = fields
        .iter()
        .filter(|f| !fields.iter().any(|other| other.substitutes.contains(&f.name)))
        .collect();

    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    writer.write_record(columns.iter().map(|f| f.name.as_str()))?;
    for idx in 0..3 {
        writer.write_record(columns.iter().map(|f| example_values(f.kind)[idx]))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ImportError::InternalError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ImportError::InternalError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::file_parser::DelimitedTextParser;
    use crate::importer::import_trait::TextParser;

    #[test]
    fn test_transaction_schema_required_columns() {
        let provider = StaticSchemaProvider::default();
        let fields = provider.required_columns(ImportType::Transactions);

        let required: Vec<&str> = fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(required, vec!["date", "amount", "description"]);
        assert!(fields.iter().any(|f| f.kind == FieldKind::IntegerCode && !f.required));
    }

    #[test]
    fn test_italian_headers_match() {
        let fields = transaction_schema();
        assert!(fields[0].matches_header("Data Operazione"));
        assert!(fields[1].matches_header("IMPORTO"));
        assert!(fields[3].matches_header("Causale ABI"));
        assert!(fields[4].matches_header("Valuta"));
        assert!(fields[5].matches_header("DARE"));
        assert!(fields[6].matches_header("Avere"));
    }

    #[test]
    fn test_render_template_parses_back() {
        let template = render_template(&transaction_schema(), b',').unwrap();
        let parsed = DelimitedTextParser::default().parse(&template).unwrap();

        assert_eq!(
            parsed.header,
            vec!["date", "amount", "description", "code", "value_date"]
        );
        assert_eq!(parsed.rows.len(), 3);
        assert_eq!(parsed.rows[1].cells[1], "-800.00");
    }
}
