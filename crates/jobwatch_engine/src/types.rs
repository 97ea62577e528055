use jobwatch_core::{AnswerFrame, JobId, JobKind, ProgressFrame, RequestId, SubscriptionId};

/// Events reported back to the application thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    BeginAccepted {
        kind: JobKind,
        job_id: JobId,
        subscription: SubscriptionId,
    },
    BeginRejected {
        kind: JobKind,
        job_id: JobId,
        subscription: SubscriptionId,
        error: ControlError,
    },
    StopAccepted {
        kind: JobKind,
        job_id: JobId,
    },
    StopRejected {
        kind: JobKind,
        job_id: JobId,
        error: ControlError,
    },
    ProgressFrame {
        kind: JobKind,
        job_id: JobId,
        subscription: SubscriptionId,
        frame: ProgressFrame,
    },
    ProgressFailed {
        kind: JobKind,
        job_id: JobId,
        subscription: SubscriptionId,
        error: StreamError,
    },
    AnswerFrame {
        request_id: RequestId,
        frame: AnswerFrame,
    },
    AnswerFailed {
        request_id: RequestId,
        error: StreamError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    #[error("invalid endpoint: {0}")]
    InvalidUrl(String),
    #[error("invalid request body: {0}")]
    Body(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("read failed: {0}")]
    Read(String),
    #[error("stream closed without a terminal frame")]
    ClosedEarly,
    #[error("stream ended mid-frame ({0} bytes unparsed)")]
    Truncated(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    #[error("invalid endpoint: {0}")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("timed out")]
    Timeout,
    #[error("http status {0}")]
    HttpStatus(u16),
    /// The server answered but refused, e.g. `{"status": "error", "message": ...}`.
    #[error("{0}")]
    Rejected(String),
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid base url `{url}`: {message}")]
    BaseUrl { url: String, message: String },
    #[error("failed to build http client: {0}")]
    Client(String),
    #[error("failed to start engine runtime: {0}")]
    Runtime(String),
}
