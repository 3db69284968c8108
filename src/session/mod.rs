// ==========================================
// FatturaAnalyzer 导入核心 - 会话层
// ==========================================
// 职责: 选择状态 + 提交协调 + 记录接收端
// 红线: 会话不主动通知界面，所有结果以类型化返回值交给调用方
// ==========================================

pub mod coordinator;
pub mod selection;
pub mod sink;

pub use coordinator::{
    preview_summary, Delivery, FileTicket, ImportSession, SubmissionReport, SubmissionTicket,
};
pub use selection::SelectionSet;
pub use sink::{JsonLinesSink, RecordSink, SinkError, SinkOutcome};
