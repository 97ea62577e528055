//! Jobwatch core: wire codec plus the pure job and answer state machines.
mod answer;
mod effect;
mod job;
mod msg;
mod options;
mod state;
mod tracker;
mod update;
mod view_model;
pub mod wire;

pub use answer::{
    AnswerAssembler, AnswerPhase, AnswerSession, RequestId, SearchRequest,
    TRANSPORT_FAILURE_MESSAGE,
};
pub use effect::{Effect, StreamKey};
pub use job::{JobId, JobKind, JobState, JobStatus, Progress, SubscriptionId};
pub use msg::Msg;
pub use options::{OriginFilter, ParseOptionError, SearchOptions, SummaryProvider};
pub use state::AppState;
pub use tracker::TaskTracker;
pub use update::update;
pub use view_model::{AnswerView, AppViewModel, JobRowView};
pub use wire::{AnswerFrame, ProgressFrame, ResultItem, ResultOrigin, StatusValue};
