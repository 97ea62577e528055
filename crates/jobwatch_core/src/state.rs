use crate::view_model::{AnswerView, AppViewModel, JobRowView};
use crate::{AnswerAssembler, JobKind, JobState, RequestId, TaskTracker};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    crawls: TaskTracker,
    indexing: TaskTracker,
    answers: AnswerAssembler,
    next_request: RequestId,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            crawls: TaskTracker::new(JobKind::Crawl),
            indexing: TaskTracker::new(JobKind::Index),
            answers: AnswerAssembler::new(),
            next_request: 1,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracker(&self, kind: JobKind) -> &TaskTracker {
        match kind {
            JobKind::Crawl => &self.crawls,
            JobKind::Index => &self.indexing,
        }
    }

    pub(crate) fn tracker_mut(&mut self, kind: JobKind) -> &mut TaskTracker {
        match kind {
            JobKind::Crawl => &mut self.crawls,
            JobKind::Index => &mut self.indexing,
        }
    }

    pub fn answers(&self) -> &AnswerAssembler {
        &self.answers
    }

    pub(crate) fn answers_mut(&mut self) -> &mut AnswerAssembler {
        &mut self.answers
    }

    pub(crate) fn allocate_request_id(&mut self) -> RequestId {
        let id = self.next_request;
        self.next_request += 1;
        id
    }

    fn is_dirty(&self) -> bool {
        self.crawls.is_dirty() || self.indexing.is_dirty() || self.answers.is_dirty()
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        let crawls = self.crawls.consume_dirty();
        let indexing = self.indexing.consume_dirty();
        let answers = self.answers.consume_dirty();
        crawls || indexing || answers
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            crawls: self.crawls.jobs().map(job_row).collect(),
            indexing: self.indexing.jobs().map(job_row).collect(),
            answer: self.answers.session().map(|session| AnswerView {
                request_id: session.request_id(),
                query: session.request().query.clone(),
                phase: session.phase(),
                results: session.results().to_vec(),
                answer_text: session.answer_text().to_string(),
            }),
            dirty: self.is_dirty(),
        }
    }
}

fn job_row(job: &JobState) -> JobRowView {
    JobRowView {
        job_id: job.id(),
        status: job.status(),
        progress: job.progress(),
        subscribed: job.is_subscribed(),
        last_log: job.last_log_line().map(ToOwned::to_owned),
        console: if job.console_visible() {
            job.log_lines().to_vec()
        } else {
            Vec::new()
        },
        console_visible: job.console_visible(),
    }
}
