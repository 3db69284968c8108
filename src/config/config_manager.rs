// ==========================================
// FatturaAnalyzer 导入核心 - 配置管理器
// ==========================================
// 职责: 配置加载、校验、查询
// 存储: JSON 文件（缺省时使用内置默认值）
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::Delimiter;
use crate::importer::row_filter::DEFAULT_SKIP_KEYWORDS;
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// 配置键名（与 JSON 字段一致）
pub mod config_keys {
    pub const DELIMITER: &str = "delimiter";
    pub const DUPLICATE_TOLERANCE: &str = "duplicate_tolerance";
    pub const DATE_FORMATS: &str = "date_formats";
    pub const DECIMAL_COMMA: &str = "decimal_comma";
    pub const SKIP_KEYWORDS: &str = "skip_keywords";
}

/// 默认日期格式
pub const DEFAULT_DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d", "%Y%m%d",
];

// ==========================================
// ImportSettings - 导入配置项
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    pub delimiter: String,
    #[serde(deserialize_with = "decimal_from_text_or_number")]
    pub duplicate_tolerance: Decimal, // 接受 "0.05" 或 0.05
    pub date_formats: Vec<String>,
    pub decimal_comma: bool,
    pub skip_keywords: Vec<String>, // 空列表 = 不按关键字过滤
}

/// JSON 中的十进制数: 字符串或数字均可
#[derive(Deserialize)]
#[serde(untagged)]
enum DecimalRepr {
    Text(String),
    Number(serde_json::Number),
}

fn decimal_from_text_or_number<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match DecimalRepr::deserialize(deserializer)? {
        DecimalRepr::Text(text) => text,
        DecimalRepr::Number(number) => number.to_string(),
    };
    Decimal::from_str(text.trim())
        .or_else(|_| Decimal::from_scientific(text.trim()))
        .map_err(serde::de::Error::custom)
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
            duplicate_tolerance: dec!(0.01),
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
            decimal_comma: true,
            skip_keywords: DEFAULT_SKIP_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Clone)]
pub struct ConfigManager {
    settings: ImportSettings,
    delimiter: Delimiter,
    source: Option<PathBuf>,
}

impl ConfigManager {
    /// 使用内置默认值
    pub fn new() -> Self {
        Self {
            settings: ImportSettings::default(),
            delimiter: Delimiter::Fixed(b','),
            source: None,
        }
    }

    /// 从配置项创建（会校验）
    pub fn from_settings(settings: ImportSettings) -> ImportResult<Self> {
        let delimiter = validate_settings(&settings)?;
        Ok(Self {
            settings,
            delimiter,
            source: None,
        })
    }

    /// 从 JSON 文件加载
    ///
    /// # 参数
    /// - path: 配置文件路径；缺少的字段取默认值
    pub fn load(path: &Path) -> ImportResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| ImportError::ConfigReadError {
            key: path.display().to_string(),
            message: e.to_string(),
        })?;

        let settings: ImportSettings =
            serde_json::from_str(&raw).map_err(|e| ImportError::ConfigReadError {
                key: path.display().to_string(),
                message: e.to_string(),
            })?;

        let mut manager = Self::from_settings(settings)?;
        manager.source = Some(path.to_path_buf());
        info!(path = %path.display(), "导入配置已加载");
        Ok(manager)
    }

    /// 从默认位置加载，文件不存在时使用默认值
    ///
    /// 位置: `<config_dir>/fattura-import/import.json`
    pub fn load_default() -> ImportResult<Self> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            other => {
                debug!(path = ?other, "未找到导入配置文件，使用默认值");
                Ok(Self::new())
            }
        }
    }

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    /// 配置来源文件（默认值时为 None）
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// 默认配置文件路径
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("fattura-import").join("import.json"))
}

/// 校验配置项，返回解析后的分隔符
fn validate_settings(settings: &ImportSettings) -> ImportResult<Delimiter> {
    let delimiter = Delimiter::from_config_str(&settings.delimiter).ok_or_else(|| {
        ImportError::ConfigValueError {
            key: config_keys::DELIMITER.to_string(),
            value: settings.delimiter.clone(),
            message: "expected a single ASCII character or \"auto\"".to_string(),
        }
    })?;

    if settings.duplicate_tolerance <= Decimal::ZERO {
        return Err(ImportError::ConfigValueError {
            key: config_keys::DUPLICATE_TOLERANCE.to_string(),
            value: settings.duplicate_tolerance.to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    if settings.date_formats.is_empty() {
        return Err(ImportError::ConfigValueError {
            key: config_keys::DATE_FORMATS.to_string(),
            value: "[]".to_string(),
            message: "at least one date format is required".to_string(),
        });
    }

    Ok(delimiter)
}

#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_delimiter(&self) -> ImportResult<Delimiter> {
        Ok(self.delimiter)
    }

    async fn get_duplicate_tolerance(&self) -> ImportResult<Decimal> {
        Ok(self.settings.duplicate_tolerance)
    }

    async fn get_date_formats(&self) -> ImportResult<Vec<String>> {
        Ok(self.settings.date_formats.clone())
    }

    async fn get_decimal_comma(&self) -> ImportResult<bool> {
        Ok(self.settings.decimal_comma)
    }

    async fn get_skip_keywords(&self) -> ImportResult<Vec<String>> {
        Ok(self.settings.skip_keywords.clone())
    }
}
