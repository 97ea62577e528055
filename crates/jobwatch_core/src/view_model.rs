use crate::{AnswerPhase, JobId, JobStatus, Progress, RequestId, ResultItem};

/// Snapshot handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub crawls: Vec<JobRowView>,
    pub indexing: Vec<JobRowView>,
    pub answer: Option<AnswerView>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRowView {
    pub job_id: JobId,
    pub status: JobStatus,
    pub progress: Progress,
    pub subscribed: bool,
    /// Failure indicator text: the newest log line, shown even when collapsed.
    pub last_log: Option<String>,
    /// Full log, empty while the console is collapsed.
    pub console: Vec<String>,
    pub console_visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerView {
    pub request_id: RequestId,
    pub query: String,
    pub phase: AnswerPhase,
    pub results: Vec<ResultItem>,
    pub answer_text: String,
}

impl AnswerView {
    /// True while a generated answer is still being streamed.
    pub fn is_summarizing(&self) -> bool {
        self.phase == AnswerPhase::Summarizing
    }
}
