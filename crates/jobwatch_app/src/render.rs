use std::collections::HashMap;
use std::io::{self, Write};

use jobwatch_core::{
    AnswerPhase, AnswerView, AppViewModel, JobId, JobKind, JobRowView, JobStatus, Progress,
    RequestId, ResultItem, ResultOrigin,
};

/// What has already been written for one job row.
#[derive(Debug, Default)]
struct JobCursor {
    lines: usize,
    progress: Option<Progress>,
    status: JobStatus,
}

#[derive(Debug, Default)]
struct AnswerCursor {
    request_id: Option<RequestId>,
    results: Option<Vec<ResultItem>>,
    text: String,
    phase: Option<AnswerPhase>,
}

/// Append-only terminal rendering of view snapshots.
///
/// Each call writes only what changed since the previous snapshot.
pub struct Renderer<W: Write> {
    out: W,
    jobs: HashMap<(JobKind, JobId), JobCursor>,
    answer: AnswerCursor,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            jobs: HashMap::new(),
            answer: AnswerCursor::default(),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn render(&mut self, view: &AppViewModel) -> io::Result<()> {
        for row in &view.crawls {
            self.render_job(JobKind::Crawl, row)?;
        }
        for row in &view.indexing {
            self.render_job(JobKind::Index, row)?;
        }
        if let Some(answer) = &view.answer {
            self.render_answer(answer)?;
        }
        self.out.flush()
    }

    pub fn notice(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "! {message}")?;
        self.out.flush()
    }

    fn render_job(&mut self, kind: JobKind, row: &JobRowView) -> io::Result<()> {
        let cursor = self.jobs.entry((kind, row.job_id)).or_default();
        let tag = format!("[{kind} {}]", row.job_id);

        // A restart begins a fresh log.
        if row.status == JobStatus::Running && cursor.status.is_terminal() {
            *cursor = JobCursor::default();
        }

        if row.console_visible {
            if row.console.len() < cursor.lines {
                cursor.lines = 0;
            }
            for line in &row.console[cursor.lines..] {
                writeln!(self.out, "{tag} {line}")?;
            }
            cursor.lines = row.console.len();
        }

        if row.progress.total > 0 && cursor.progress != Some(row.progress) {
            match row.progress.ratio() {
                Some(ratio) => writeln!(
                    self.out,
                    "{tag} progress {} ({:.0}%)",
                    row.progress,
                    ratio * 100.0
                )?,
                None => writeln!(self.out, "{tag} progress {}", row.progress)?,
            }
            cursor.progress = Some(row.progress);
        }

        if row.status != cursor.status {
            if row.status == JobStatus::Failed && !row.console_visible {
                if let Some(last) = &row.last_log {
                    writeln!(self.out, "{tag} {last}")?;
                }
            }
            if row.status.is_terminal() {
                writeln!(self.out, "{tag} {}", status_label(row.status))?;
            }
            cursor.status = row.status;
        }
        Ok(())
    }

    fn render_answer(&mut self, answer: &AnswerView) -> io::Result<()> {
        if self.answer.request_id != Some(answer.request_id) {
            self.answer = AnswerCursor {
                request_id: Some(answer.request_id),
                ..AnswerCursor::default()
            };
            writeln!(self.out, "Searching: {}", answer.query)?;
        }

        let results_changed = self.answer.results.as_deref() != Some(answer.results.as_slice());
        if results_changed && !answer.results.is_empty() {
            if !self.answer.text.is_empty() && !self.answer.text.ends_with('\n') {
                writeln!(self.out)?;
            }
            writeln!(self.out, "Sources ({}):", answer.results.len())?;
            for item in &answer.results {
                writeln!(self.out, "  - {}", describe(item))?;
            }
            self.answer.results = Some(answer.results.clone());
        }

        if answer.answer_text != self.answer.text {
            match answer.answer_text.strip_prefix(self.answer.text.as_str()) {
                Some(tail) => write!(self.out, "{tail}")?,
                // Replaced rather than extended, e.g. by an error message.
                None => write!(self.out, "\n{}", answer.answer_text)?,
            }
            self.answer.text = answer.answer_text.clone();
        }

        if answer.phase.is_terminal() && self.answer.phase != Some(answer.phase) {
            if !self.answer.text.is_empty() {
                writeln!(self.out)?;
            }
            self.answer.phase = Some(answer.phase);
        }
        Ok(())
    }
}

fn status_label(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Idle => "idle",
        JobStatus::Running => "running",
        JobStatus::Finished => "finished",
        JobStatus::Failed => "failed",
        JobStatus::Cancelled => "cancelled",
    }
}

fn describe(item: &ResultItem) -> String {
    match item.origin {
        ResultOrigin::Forum => format!("{} <{}>", item.title, item.url),
        ResultOrigin::Document => {
            let name = item.document_name.as_deref().unwrap_or(&item.title);
            match item.page_number {
                Some(page) => format!("{} ({name}, p. {page})", item.title),
                None => format!("{} ({name})", item.title),
            }
        }
    }
}
