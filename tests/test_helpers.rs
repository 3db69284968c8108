// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时文件、临时配置、模拟接收端
// ==========================================

#![allow(dead_code)]

use async_trait::async_trait;
use fattura_import::{ImportType, NormalizedRecord, RecordSink, SinkError, SinkOutcome};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::TempDir;

/// 意大利银行导出样例（分号分隔，小数逗号）
pub const ITALIAN_FIXTURE: &str = "tests/fixtures/estratto_conto_it.csv";

/// 借方 / 贷方分列的银行导出（含余额行、印花税、仅 EUR 行）
pub const DEBIT_CREDIT_FIXTURE: &str = "tests/fixtures/estratto_dare_avere.csv";

/// 在临时目录中写入文件
pub fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write temp file");
    path
}

/// 写入导入配置 JSON
pub fn write_config(dir: &TempDir, json: &str) -> PathBuf {
    write_file(dir, "import.json", json)
}

// ==========================================
// 模拟接收端
// ==========================================

/// 记录每次调用的载荷行号，按配置返回结果
pub struct MockSink {
    calls: AtomicUsize,
    payloads: Mutex<Vec<Vec<usize>>>,
    response: Result<SinkOutcome, SinkError>,
}

impl MockSink {
    /// 全部接受
    pub fn accepting() -> Self {
        Self::with_response(Ok(SinkOutcome::default()))
    }

    /// 网络失败
    pub fn failing() -> Self {
        Self::with_response(Err(SinkError::Network("connection refused".to_string())))
    }

    pub fn with_response(response: Result<SinkOutcome, SinkError>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            payloads: Mutex::new(Vec::new()),
            response,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 各次调用的载荷行号
    pub fn payload_rows(&self) -> Vec<Vec<usize>> {
        self.payloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordSink for MockSink {
    async fn submit(
        &self,
        _import_type: ImportType,
        records: &[NormalizedRecord],
    ) -> Result<SinkOutcome, SinkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payloads
            .lock()
            .unwrap()
            .push(records.iter().map(|r| r.row).collect());

        match &self.response {
            Ok(outcome) if outcome.total() == 0 => Ok(SinkOutcome {
                accepted: records.len(),
                ..SinkOutcome::default()
            }),
            other => other.clone(),
        }
    }
}
