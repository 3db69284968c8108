// ==========================================
// FatturaAnalyzer 导入核心 - 提交协调器
// ==========================================
// 职责: 导入会话状态机 + 选择子集提交
// 状态机: Idle → FileLoaded → Previewed → Submitting → Idle
//         提交失败: Submitting → Previewed（保留预览与选择以便重试）
// 过期结果: 每次选文件 / 重置递增代号，旧代号的结果直接丢弃
// ==========================================

use crate::domain::transaction::{NormalizedRecord, PreviewResult};
use crate::domain::types::{ImportType, SessionState};
use crate::i18n::t_with_args;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::preview_builder::PreviewBuilder;
use crate::session::selection::SelectionSet;
use crate::session::sink::{RecordSink, SinkError, SinkOutcome};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

// ==========================================
// 票据与投递结果
// ==========================================

/// 文件选择票据（绑定发放时的代号）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTicket {
    generation: u64,
}

impl FileTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// 提交票据（携带按文件顺序排列的提交载荷）
#[derive(Debug, Clone)]
pub struct SubmissionTicket {
    generation: u64,
    batch_id: String,
    import_type: ImportType,
    records: Vec<NormalizedRecord>,
}

impl SubmissionTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }

    pub fn import_type(&self) -> ImportType {
        self.import_type
    }

    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }
}

/// 异步结果投递
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery<T> {
    /// 结果已应用到当前会话
    Applied(T),
    /// 票据已过期，结果被丢弃，会话未改变
    Stale { ticket: u64, current: u64 },
}

impl<T> Delivery<T> {
    pub fn is_stale(&self) -> bool {
        matches!(self, Delivery::Stale { .. })
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Delivery::Applied(value) => Some(value),
            Delivery::Stale { .. } => None,
        }
    }

    /// 过期结果转换为 StaleSession 错误
    pub fn into_result(self) -> ImportResult<T> {
        match self {
            Delivery::Applied(value) => Ok(value),
            Delivery::Stale { ticket, current } => {
                Err(ImportError::StaleSession { ticket, current })
            }
        }
    }
}

/// 提交报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReport {
    pub batch_id: String,
    pub submitted: usize,
    pub outcome: SinkOutcome,
}

impl SubmissionReport {
    /// 本地化的提交结果摘要（由调用方决定如何展示）
    pub fn summary_message(&self) -> String {
        t_with_args(
            "submission.summary",
            &[
                ("accepted", self.outcome.accepted.to_string().as_str()),
                ("duplicates", self.outcome.duplicates_on_server.to_string().as_str()),
                ("rejected", self.outcome.rejected.to_string().as_str()),
            ],
        )
    }
}

/// 本地化的预览摘要
pub fn preview_summary(preview: &PreviewResult) -> String {
    let stats = &preview.stats;
    t_with_args(
        "preview.summary",
        &[
            ("total", stats.total_rows.to_string().as_str()),
            ("valid", stats.valid_count.to_string().as_str()),
            ("invalid", stats.invalid_count.to_string().as_str()),
            ("duplicates", stats.duplicate_count.to_string().as_str()),
            ("skipped", stats.skipped_count.to_string().as_str()),
        ],
    )
}

// ==========================================
// ImportSession - 导入会话
// ==========================================
pub struct ImportSession<S: RecordSink> {
    state: SessionState,
    generation: u64,
    import_type: ImportType,
    file_name: Option<String>,
    preview: Option<PreviewResult>,
    selection: SelectionSet,
    builder: PreviewBuilder,
    sink: S,
}

impl<S: RecordSink> ImportSession<S> {
    /// 创建 ImportSession
    ///
    /// # 参数
    /// - builder: 预览构建器
    /// - sink: 记录接收端
    pub fn new(builder: PreviewBuilder, sink: S) -> Self {
        Self {
            state: SessionState::Idle,
            generation: 0,
            import_type: ImportType::Transactions,
            file_name: None,
            preview: None,
            selection: SelectionSet::default(),
            builder,
            sink,
        }
    }

    pub fn with_import_type(mut self, import_type: ImportType) -> Self {
        self.import_type = import_type;
        self
    }

    // ==========================================
    // 只读访问
    // ==========================================

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn import_type(&self) -> ImportType {
        self.import_type
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn preview(&self) -> Option<&PreviewResult> {
        self.preview.as_ref()
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    // ==========================================
    // 文件选择
    // ==========================================

    /// 选择新文件，丢弃当前预览与任何在途结果
    pub fn begin_file(&mut self, file_name: &str) -> FileTicket {
        self.discard();
        self.file_name = Some(file_name.to_string());
        self.state = SessionState::FileLoaded;
        debug!(generation = self.generation, file = %file_name, "文件已选择");
        FileTicket {
            generation: self.generation,
        }
    }

    /// 应用读取完成的文件文本
    ///
    /// # 返回
    /// - Ok(Applied): 预览已生成，选择集已全选
    /// - Ok(Stale): 票据过期，会话未改变
    /// - Err(EmptyFile | SchemaMismatch): 文件被拒绝，会话回到 Idle
    #[instrument(skip(self, text), fields(ticket = ticket.generation))]
    pub fn apply_text(
        &mut self,
        ticket: FileTicket,
        text: &str,
    ) -> ImportResult<Delivery<&PreviewResult>> {
        if let Some(stale) = self.check_stale(ticket.generation) {
            return Ok(stale);
        }
        self.require_state("apply_text", SessionState::FileLoaded)?;

        match self.builder.build(self.import_type, text) {
            Ok(preview) => {
                self.selection = SelectionSet::seed_all(preview.valid.len());
                self.state = SessionState::Previewed;
                let preview = self.preview.insert(preview);
                Ok(Delivery::Applied(&*preview))
            }
            Err(e) => {
                warn!(error = %e, "文件被拒绝");
                self.discard();
                Err(e)
            }
        }
    }

    /// 读取文件并生成预览（begin_file + apply_text）
    pub async fn load_file(&mut self, path: &Path) -> ImportResult<&PreviewResult> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let ticket = self.begin_file(&file_name);

        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "文件读取失败");
                self.discard();
                return Err(e.into());
            }
        };

        self.apply_text(ticket, &text)?.into_result()
    }

    /// 移除文件（显式重置），丢弃任何在途结果
    pub fn remove_file(&mut self) {
        self.discard();
        info!(generation = self.generation, "导入会话已重置");
    }

    // ==========================================
    // 选择操作（仅 Previewed）
    // ==========================================

    pub fn select_all(&mut self) -> ImportResult<()> {
        self.require_state("select_all", SessionState::Previewed)?;
        self.selection.select_all();
        Ok(())
    }

    pub fn clear_selection(&mut self) -> ImportResult<()> {
        self.require_state("clear_selection", SessionState::Previewed)?;
        self.selection.clear();
        Ok(())
    }

    pub fn toggle(&mut self, index: usize) -> ImportResult<bool> {
        self.require_state("toggle", SessionState::Previewed)?;
        self.selection.toggle(index)
    }

    /// 已选记录（文件顺序，与勾选顺序无关）
    pub fn selected_records(&self) -> Vec<NormalizedRecord> {
        match &self.preview {
            Some(preview) => self
                .selection
                .indices()
                .filter_map(|idx| preview.valid.get(idx).cloned())
                .collect(),
            None => Vec::new(),
        }
    }

    // ==========================================
    // 提交
    // ==========================================

    /// 开始提交：组装载荷并进入 Submitting
    ///
    /// # 返回
    /// - Err(EmptySelection): 未选择任何记录，状态不变，接收端不会被调用
    pub fn begin_submission(&mut self) -> ImportResult<SubmissionTicket> {
        self.require_state("submit", SessionState::Previewed)?;
        if self.selection.is_empty() {
            return Err(ImportError::EmptySelection);
        }

        let batch_id = self
            .preview
            .as_ref()
            .map(|p| p.batch_id.clone())
            .ok_or_else(|| ImportError::InternalError("Previewed without preview".to_string()))?;
        let records = self.selected_records();
        self.state = SessionState::Submitting;

        info!(batch_id = %batch_id, count = records.len(), "开始提交");
        Ok(SubmissionTicket {
            generation: self.generation,
            batch_id,
            import_type: self.import_type,
            records,
        })
    }

    /// 应用接收端结果
    ///
    /// # 返回
    /// - Ok(Applied(report)): 提交成功，会话回到 Idle
    /// - Ok(Stale): 提交期间文件已被替换或重置，结果被丢弃
    /// - Err(SinkRejection): 回到 Previewed，预览与选择保留
    pub fn finish_submission(
        &mut self,
        ticket: SubmissionTicket,
        result: Result<SinkOutcome, SinkError>,
    ) -> ImportResult<Delivery<SubmissionReport>> {
        if let Some(stale) = self.check_stale(ticket.generation) {
            return Ok(stale);
        }
        self.require_state("finish_submission", SessionState::Submitting)?;

        match result {
            Ok(outcome) => {
                let report = SubmissionReport {
                    batch_id: ticket.batch_id,
                    submitted: ticket.records.len(),
                    outcome,
                };
                info!(
                    batch_id = %report.batch_id,
                    accepted = outcome.accepted,
                    duplicates = outcome.duplicates_on_server,
                    rejected = outcome.rejected,
                    "提交完成"
                );
                self.discard();
                Ok(Delivery::Applied(report))
            }
            Err(e) => {
                warn!(batch_id = %ticket.batch_id, error = %e, "提交失败，保留预览");
                self.state = SessionState::Previewed;
                Err(ImportError::SinkRejection(e))
            }
        }
    }

    /// 提交已选记录（begin_submission + sink + finish_submission）
    pub async fn submit(&mut self) -> ImportResult<SubmissionReport> {
        let ticket = self.begin_submission()?;
        let result = self
            .sink
            .submit(ticket.import_type(), ticket.records())
            .await;
        self.finish_submission(ticket, result)?.into_result()
    }

    // ==========================================
    // 内部工具
    // ==========================================

    /// 清空预览、选择、文件名，代号递增，回到 Idle
    fn discard(&mut self) {
        self.generation += 1;
        self.preview = None;
        self.selection.reset();
        self.file_name = None;
        self.state = SessionState::Idle;
    }

    fn check_stale<T>(&self, ticket: u64) -> Option<Delivery<T>> {
        if ticket == self.generation {
            return None;
        }
        debug!(ticket, current = self.generation, "丢弃过期结果");
        Some(Delivery::Stale {
            ticket,
            current: self.generation,
        })
    }

    fn require_state(&self, operation: &'static str, expected: SessionState) -> ImportResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ImportError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }
}
