use crate::{
    AnswerFrame, JobId, JobKind, ProgressFrame, RequestId, SearchOptions, SubscriptionId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User asked to start (or restart) a job.
    StartJob { kind: JobKind, job_id: JobId },
    /// User asked to stop a job.
    CancelJob { kind: JobKind, job_id: JobId },
    /// User expanded or collapsed a job console.
    ToggleConsole { kind: JobKind, job_id: JobId },
    /// The begin request succeeded.
    BeginJobAccepted {
        kind: JobKind,
        job_id: JobId,
        subscription: SubscriptionId,
    },
    /// The begin request failed or was refused.
    BeginJobRejected {
        kind: JobKind,
        job_id: JobId,
        subscription: SubscriptionId,
        message: String,
    },
    /// The stop request failed or was refused.
    StopJobRejected {
        kind: JobKind,
        job_id: JobId,
        message: String,
    },
    /// A decoded frame from a job's progress stream.
    ProgressFrame {
        kind: JobKind,
        job_id: JobId,
        subscription: SubscriptionId,
        frame: ProgressFrame,
    },
    /// The progress stream broke or ended without a terminal status.
    ProgressStreamFailed {
        kind: JobKind,
        job_id: JobId,
        subscription: SubscriptionId,
        reason: String,
    },
    /// User submitted a search.
    SearchSubmitted {
        query: String,
        options: SearchOptions,
    },
    /// A decoded frame from an answer stream.
    AnswerFrame {
        request_id: RequestId,
        frame: AnswerFrame,
    },
    /// The answer stream broke or ended without `done`.
    AnswerStreamFailed {
        request_id: RequestId,
        reason: String,
    },
    /// User cleared the search panel.
    ClearSearch,
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
