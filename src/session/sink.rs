// ==========================================
// FatturaAnalyzer 导入核心 - 记录接收端
// ==========================================
// 职责: 接收已校验批次并返回逐条结果统计
// 接口: RecordSink（后端持久化服务 / 本地 JSON Lines 文件）
// ==========================================

use crate::domain::transaction::NormalizedRecord;
use crate::domain::types::ImportType;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

// ==========================================
// SinkOutcome - 提交结果统计
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkOutcome {
    pub accepted: usize,
    pub duplicates_on_server: usize, // 与已持久化数据重复
    pub rejected: usize,
}

impl SinkOutcome {
    pub fn total(&self) -> usize {
        self.accepted + self.duplicates_on_server + self.rejected
    }
}

/// 接收端错误（整批失败，调用方保留预览以便重试）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error (status {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Sink I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for SinkError {
    fn from(err: std::io::Error) -> Self {
        SinkError::Io(err.to_string())
    }
}

// ==========================================
// RecordSink Trait
// ==========================================
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// 提交一批已校验记录
    ///
    /// # 参数
    /// - import_type: 导入类型
    /// - records: 按文件顺序排列的记录
    ///
    /// # 返回
    /// - Ok(SinkOutcome): 批次已被处理（可能部分重复 / 拒绝）
    /// - Err(SinkError): 整批未被处理
    async fn submit(
        &self,
        import_type: ImportType,
        records: &[NormalizedRecord],
    ) -> Result<SinkOutcome, SinkError>;
}

#[async_trait]
impl<S: RecordSink + ?Sized> RecordSink for Arc<S> {
    async fn submit(
        &self,
        import_type: ImportType,
        records: &[NormalizedRecord],
    ) -> Result<SinkOutcome, SinkError> {
        (**self).submit(import_type, records).await
    }
}

// ==========================================
// JsonLinesSink - 本地 JSON Lines 文件
// ==========================================
// 每条记录一行；指纹已存在于文件中的记录计为 duplicates_on_server
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    path: PathBuf,
}

#[derive(Debug, Serialize)]
struct StoredLine<'a> {
    import_type: ImportType,
    #[serde(flatten)]
    record: &'a NormalizedRecord,
}

#[derive(Debug, Deserialize)]
struct StoredFingerprint {
    fingerprint: String,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取已持久化的指纹（文件不存在视为空）
    async fn existing_fingerprints(&self) -> Result<HashSet<String>, SinkError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(e) => return Err(e.into()),
        };

        let mut fingerprints = HashSet::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<StoredFingerprint>(line) {
                Ok(stored) => {
                    fingerprints.insert(stored.fingerprint);
                }
                Err(e) => warn!(line = idx + 1, error = %e, "无法解析的存储行，已跳过"),
            }
        }
        Ok(fingerprints)
    }
}

#[async_trait]
impl RecordSink for JsonLinesSink {
    #[instrument(skip(self, records), fields(path = %self.path.display(), count = records.len()))]
    async fn submit(
        &self,
        import_type: ImportType,
        records: &[NormalizedRecord],
    ) -> Result<SinkOutcome, SinkError> {
        let mut seen = self.existing_fingerprints().await?;
        let mut outcome = SinkOutcome::default();
        let mut buffer = String::new();

        for record in records {
            if !seen.insert(record.fingerprint.clone()) {
                debug!(row = record.row, "指纹已存在");
                outcome.duplicates_on_server += 1;
                continue;
            }
            let line = serde_json::to_string(&StoredLine {
                import_type,
                record,
            })
            .map_err(|e| SinkError::Io(e.to_string()))?;
            buffer.push_str(&line);
            buffer.push('\n');
            outcome.accepted += 1;
        }

        if !buffer.is_empty() {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            file.write_all(buffer.as_bytes()).await?;
            file.flush().await?;
        }

        info!(
            accepted = outcome.accepted,
            duplicates = outcome.duplicates_on_server,
            "记录已写入"
        );
        Ok(outcome)
    }
}
