use std::collections::BTreeMap;

use watch_logging::{watch_debug, watch_info, watch_warn};

use crate::{
    Effect, JobId, JobKind, JobState, JobStatus, Progress, ProgressFrame, StatusValue, StreamKey,
    SubscriptionId,
};

/// All jobs of one kind, keyed by id, with at most one live stream per job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskTracker {
    kind: JobKind,
    jobs: BTreeMap<JobId, JobState>,
    next_subscription: SubscriptionId,
    dirty: bool,
}

impl TaskTracker {
    pub fn new(kind: JobKind) -> Self {
        Self {
            kind,
            jobs: BTreeMap::new(),
            next_subscription: 1,
            dirty: false,
        }
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn job(&self, job_id: JobId) -> Option<&JobState> {
        self.jobs.get(&job_id)
    }

    /// Jobs in ascending id order.
    pub fn jobs(&self) -> impl Iterator<Item = &JobState> {
        self.jobs.values()
    }

    /// Number of jobs with an open progress stream.
    pub fn open_subscriptions(&self) -> usize {
        self.jobs.values().filter(|job| job.is_subscribed()).count()
    }

    pub(crate) fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn entry(&mut self, job_id: JobId) -> &mut JobState {
        self.jobs
            .entry(job_id)
            .or_insert_with(|| JobState::new(job_id))
    }

    /// Resets the job and asks the server to begin it.
    ///
    /// A job that is already running is left alone; no error is reported.
    pub fn start(&mut self, job_id: JobId) -> Vec<Effect> {
        let kind = self.kind;
        if self.entry(job_id).status() == JobStatus::Running {
            watch_debug!("{kind} job {job_id} already running, start ignored");
            return Vec::new();
        }

        let subscription = self.next_subscription;
        self.next_subscription += 1;
        self.entry(job_id).restart(kind.init_marker(), subscription);
        self.dirty = true;
        watch_info!("{kind} job {job_id} starting (subscription {subscription})");

        vec![Effect::BeginJob {
            kind,
            job_id,
            subscription,
        }]
    }

    /// Server accepted the begin request: open the progress stream.
    pub fn begin_accepted(&mut self, job_id: JobId, subscription: SubscriptionId) -> Vec<Effect> {
        let kind = self.kind;
        let opened = self
            .jobs
            .get_mut(&job_id)
            .is_some_and(|job| job.open_subscription(subscription));
        if !opened {
            watch_debug!("{kind} job {job_id}: stale begin ack for subscription {subscription}");
            return Vec::new();
        }
        self.dirty = true;
        vec![Effect::OpenProgressStream {
            kind,
            job_id,
            subscription,
        }]
    }

    /// Server refused the begin request: the job fails without a stream.
    pub fn begin_rejected(
        &mut self,
        job_id: JobId,
        subscription: SubscriptionId,
        message: &str,
    ) -> Vec<Effect> {
        let kind = self.kind;
        match self.jobs.get_mut(&job_id) {
            Some(job) if job.is_pending(subscription) => {
                job.close_subscription();
                job.append_log(format!("Failed to start {kind} job: {message}"));
                job.set_status(JobStatus::Failed);
                self.dirty = true;
                watch_warn!("{kind} job {job_id} failed to start: {message}");
            }
            _ => {
                watch_debug!("{kind} job {job_id}: stale begin rejection for subscription {subscription}");
            }
        }
        Vec::new()
    }

    /// Applies a frame to the job, creating it on first reference.
    ///
    /// The frame's origin is not checked; stream-fed frames go through
    /// [`dispatch_from`](Self::dispatch_from), which drops stale ones.
    pub fn dispatch(&mut self, job_id: JobId, frame: ProgressFrame) -> Vec<Effect> {
        self.apply_frame(job_id, frame)
    }

    /// Like [`dispatch`](Self::dispatch), but drops frames from a superseded stream.
    pub fn dispatch_from(
        &mut self,
        job_id: JobId,
        subscription: SubscriptionId,
        frame: ProgressFrame,
    ) -> Vec<Effect> {
        let open = self.jobs.get(&job_id).and_then(JobState::open_subscription_id);
        if open != Some(subscription) {
            watch_debug!(
                "{} job {job_id}: dropping frame from subscription {subscription} (open: {open:?})",
                self.kind
            );
            return Vec::new();
        }
        self.apply_frame(job_id, frame)
    }

    fn apply_frame(&mut self, job_id: JobId, frame: ProgressFrame) -> Vec<Effect> {
        let kind = self.kind;
        let job = self.entry(job_id);
        match frame {
            ProgressFrame::Log { message } => {
                job.append_log(message);
            }
            ProgressFrame::Progress { current, total } => {
                if current < job.progress().current {
                    watch_warn!(
                        "{kind} job {job_id}: progress went backwards ({} -> {current})",
                        job.progress().current
                    );
                }
                job.set_progress(Progress::new(current, total));
            }
            ProgressFrame::Status { value } => {
                let status = match value {
                    StatusValue::Running => return Vec::new(),
                    StatusValue::Finished => JobStatus::Finished,
                    StatusValue::Error => JobStatus::Failed,
                    StatusValue::Cancelled => JobStatus::Cancelled,
                };
                return self.terminate(job_id, status);
            }
        }
        self.dirty = true;
        Vec::new()
    }

    fn terminate(&mut self, job_id: JobId, status: JobStatus) -> Vec<Effect> {
        let kind = self.kind;
        let job = self.entry(job_id);
        let closed = job.close_subscription();
        job.set_status(status);
        self.dirty = true;
        watch_info!("{kind} job {job_id} ended: {status:?}");

        let mut effects = Vec::with_capacity(2);
        if let Some(subscription) = closed {
            effects.push(Effect::CloseStream {
                key: StreamKey::Progress { kind, job_id },
                subscription,
            });
        }
        effects.push(Effect::RefreshJobMetadata { kind, job_id });
        effects
    }

    /// Asks the server to stop the job. Local status is untouched: the
    /// outcome is whatever terminal status the stream reports next.
    pub fn cancel(&mut self, job_id: JobId) -> Vec<Effect> {
        let kind = self.kind;
        let status = self.entry(job_id).status();
        watch_info!("{kind} job {job_id}: stop requested (local status {status:?})");
        vec![Effect::StopJob { kind, job_id }]
    }

    /// The stop request failed; only the user is told.
    pub fn cancel_rejected(&mut self, job_id: JobId, message: &str) -> Vec<Effect> {
        let kind = self.kind;
        watch_warn!("{kind} job {job_id}: stop request failed: {message}");
        vec![Effect::Notify {
            message: format!("Could not stop {kind} job {job_id}: {message}"),
        }]
    }

    /// The stream died without a terminal status. No reconnection is attempted.
    pub fn transport_failed(
        &mut self,
        job_id: JobId,
        subscription: SubscriptionId,
        reason: &str,
    ) -> Vec<Effect> {
        let kind = self.kind;
        let Some(job) = self.jobs.get_mut(&job_id) else {
            return Vec::new();
        };
        if job.open_subscription_id() != Some(subscription) {
            watch_debug!("{kind} job {job_id}: ignoring failure of closed subscription {subscription}");
            return Vec::new();
        }

        job.close_subscription();
        job.append_log(format!("Progress stream lost: {reason}"));
        job.set_status(JobStatus::Failed);
        self.dirty = true;
        watch_warn!("{kind} job {job_id}: progress stream lost: {reason}");

        vec![Effect::CloseStream {
            key: StreamKey::Progress { kind, job_id },
            subscription,
        }]
    }

    pub fn toggle_console_visible(&mut self, job_id: JobId) {
        self.entry(job_id).toggle_console();
        self.dirty = true;
    }
}
