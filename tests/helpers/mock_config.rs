// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use fattura_import::config::ImportConfigReader;
use fattura_import::importer::Delimiter;
use fattura_import::{ImportError, ImportResult};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub delimiter: Delimiter,
    pub duplicate_tolerance: Decimal,
    pub date_formats: Vec<String>,
    pub decimal_comma: bool,
    pub skip_keywords: Vec<String>,
    pub unreadable_key: Option<&'static str>, // 模拟读取失败的配置键
}

impl MockConfig {
    /// 创建默认配置
    pub fn default() -> Self {
        Self {
            delimiter: Delimiter::Auto,
            duplicate_tolerance: dec!(0.01),
            date_formats: vec!["%d/%m/%Y".to_string(), "%Y-%m-%d".to_string()],
            decimal_comma: true,
            skip_keywords: vec!["Saldo iniziale".to_string()],
            unreadable_key: None,
        }
    }

    /// 指定键读取失败
    pub fn failing_on(key: &'static str) -> Self {
        let mut config = Self::default();
        config.unreadable_key = Some(key);
        config
    }

    fn check(&self, key: &str) -> ImportResult<()> {
        match self.unreadable_key {
            Some(k) if k == key => Err(ImportError::ConfigReadError {
                key: key.to_string(),
                message: "mock read failure".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ImportConfigReader for MockConfig {
    async fn get_delimiter(&self) -> ImportResult<Delimiter> {
        self.check("delimiter")?;
        Ok(self.delimiter)
    }

    async fn get_duplicate_tolerance(&self) -> ImportResult<Decimal> {
        self.check("duplicate_tolerance")?;
        Ok(self.duplicate_tolerance)
    }

    async fn get_date_formats(&self) -> ImportResult<Vec<String>> {
        self.check("date_formats")?;
        Ok(self.date_formats.clone())
    }

    async fn get_decimal_comma(&self) -> ImportResult<bool> {
        self.check("decimal_comma")?;
        Ok(self.decimal_comma)
    }

    async fn get_skip_keywords(&self) -> ImportResult<Vec<String>> {
        self.check("skip_keywords")?;
        Ok(self.skip_keywords.clone())
    }
}
