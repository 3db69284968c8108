// ==========================================
// FatturaAnalyzer 导入核心 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入管道所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::importer::error::ImportResult;
use crate::importer::file_parser::Delimiter;
use async_trait::async_trait;
use rust_decimal::Decimal;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: PreviewBuilder 构建时读取
// 实现者: ConfigManager（JSON 配置文件 + 默认值）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取字段分隔符
    ///
    /// # 默认值
    /// - ','（`auto` 表示按表头嗅探 ; , \t）
    async fn get_delimiter(&self) -> ImportResult<Delimiter>;

    /// 获取批内查重金额容差
    ///
    /// # 默认值
    /// - 0.01
    ///
    /// # 用途
    /// - |金额差| < 容差 视为同一笔
    async fn get_duplicate_tolerance(&self) -> ImportResult<Decimal>;

    /// 获取可接受的日期格式（chrono 格式串，按顺序尝试）
    ///
    /// # 默认值
    /// - ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d", "%Y%m%d"]
    async fn get_date_formats(&self) -> ImportResult<Vec<String>>;

    /// 是否把小数逗号规范化为小数点
    ///
    /// # 默认值
    /// - true
    async fn get_decimal_comma(&self) -> ImportResult<bool>;

    /// 获取非业务行关键字（描述包含任一关键字的行被跳过，不区分大小写）
    ///
    /// # 默认值
    /// - Saldo iniziale / Saldo contabile / Saldo liquido / Disponibilità al /
    ///   Giroconto / Canone mensile / Imposta di bollo / Competenze
    async fn get_skip_keywords(&self) -> ImportResult<Vec<String>>;
}
