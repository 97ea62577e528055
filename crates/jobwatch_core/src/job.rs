use std::fmt;

pub type JobId = u64;

/// Identifies one progress subscription attempt for a job.
///
/// Allocated on every accepted `start`; anything tagged with an older id is
/// stale and ignored.
pub type SubscriptionId = u64;

/// The two job families tracked by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JobKind {
    /// Forum data-source crawl followed by vector ingestion.
    Crawl,
    /// Document (PDF) indexing run.
    Index,
}

impl JobKind {
    /// First console line written when a job (re)starts.
    pub fn init_marker(self) -> &'static str {
        match self {
            JobKind::Crawl => "Initializing progress stream...",
            JobKind::Index => "Starting indexing...",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Crawl => write!(f, "crawl"),
            JobKind::Index => write!(f, "index"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobStatus {
    #[default]
    Idle,
    Running,
    Finished,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Finished | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

/// Progress counters as last reported by the producer. `total == 0` means unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub current: u64,
    pub total: u64,
}

impl Progress {
    pub fn new(current: u64, total: u64) -> Self {
        Self { current, total }
    }

    pub fn ratio(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.current as f64 / self.total as f64)
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total == 0 {
            write!(f, "Loading...")
        } else {
            write!(f, "{} / {}", self.current, self.total)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SubscriptionSlot {
    #[default]
    Closed,
    /// Begin request sent, stream not opened yet.
    Pending(SubscriptionId),
    Open(SubscriptionId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobState {
    id: JobId,
    status: JobStatus,
    log_lines: Vec<String>,
    progress: Progress,
    console_visible: bool,
    subscription: SubscriptionSlot,
}

impl JobState {
    pub(crate) fn new(id: JobId) -> Self {
        Self {
            id,
            status: JobStatus::Idle,
            log_lines: Vec::new(),
            progress: Progress::default(),
            console_visible: false,
            subscription: SubscriptionSlot::Closed,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn log_lines(&self) -> &[String] {
        &self.log_lines
    }

    pub fn last_log_line(&self) -> Option<&str> {
        self.log_lines.last().map(String::as_str)
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn console_visible(&self) -> bool {
        self.console_visible
    }

    /// Whether a progress stream is currently open for this job.
    pub fn is_subscribed(&self) -> bool {
        matches!(self.subscription, SubscriptionSlot::Open(_))
    }

    pub(crate) fn open_subscription_id(&self) -> Option<SubscriptionId> {
        match self.subscription {
            SubscriptionSlot::Open(id) => Some(id),
            _ => None,
        }
    }

    pub(crate) fn is_pending(&self, subscription: SubscriptionId) -> bool {
        self.subscription == SubscriptionSlot::Pending(subscription)
    }

    /// Full reset for a new running episode.
    pub(crate) fn restart(&mut self, marker: &str, subscription: SubscriptionId) {
        self.status = JobStatus::Running;
        self.log_lines.clear();
        self.log_lines.push(marker.to_string());
        self.progress = Progress::default();
        self.console_visible = true;
        self.subscription = SubscriptionSlot::Pending(subscription);
    }

    /// Promotes a pending subscription to open. False if `subscription` is stale.
    pub(crate) fn open_subscription(&mut self, subscription: SubscriptionId) -> bool {
        if self.is_pending(subscription) {
            self.subscription = SubscriptionSlot::Open(subscription);
            true
        } else {
            false
        }
    }

    /// Returns the id that was open, so the caller closes the stream exactly once.
    pub(crate) fn close_subscription(&mut self) -> Option<SubscriptionId> {
        match std::mem::take(&mut self.subscription) {
            SubscriptionSlot::Open(id) => Some(id),
            SubscriptionSlot::Pending(_) | SubscriptionSlot::Closed => None,
        }
    }

    pub(crate) fn append_log(&mut self, line: impl Into<String>) {
        self.log_lines.push(line.into());
    }

    pub(crate) fn set_progress(&mut self, progress: Progress) {
        self.progress = progress;
    }

    pub(crate) fn set_status(&mut self, status: JobStatus) {
        self.status = status;
    }

    pub(crate) fn toggle_console(&mut self) {
        self.console_visible = !self.console_visible;
    }
}
