use crate::{JobId, JobKind, RequestId, SearchRequest, SubscriptionId};

/// Identifies a stream slot in the effect runner; at most one stream per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKey {
    Progress { kind: JobKind, job_id: JobId },
    /// The single current answer stream.
    Answer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Ask the server to begin the job; reply with `BeginJobAccepted`/`Rejected`.
    BeginJob {
        kind: JobKind,
        job_id: JobId,
        subscription: SubscriptionId,
    },
    OpenProgressStream {
        kind: JobKind,
        job_id: JobId,
        subscription: SubscriptionId,
    },
    /// Ask the server to stop the job. The outcome arrives on the progress stream.
    StopJob { kind: JobKind, job_id: JobId },
    /// Job metadata (timestamps, counts) changed server-side.
    RefreshJobMetadata { kind: JobKind, job_id: JobId },
    OpenAnswerStream {
        request_id: RequestId,
        request: SearchRequest,
    },
    /// Close a stream if `subscription` is still the one open under `key`.
    CloseStream {
        key: StreamKey,
        subscription: SubscriptionId,
    },
    /// User-facing notice that changes no state.
    Notify { message: String },
}
