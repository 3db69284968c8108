// ==========================================
// FatturaAnalyzer 导入核心 - 配置层
// ==========================================
// 职责: 导入配置加载与读取
// 存储: JSON 文件，缺省用内置默认值
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, default_config_path, ConfigManager, ImportSettings};
pub use import_config_trait::ImportConfigReader;
