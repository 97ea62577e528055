use watch_logging::watch_debug;

use crate::{AppState, Effect, Msg, SearchRequest};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::StartJob { kind, job_id } => state.tracker_mut(kind).start(job_id),
        Msg::CancelJob { kind, job_id } => state.tracker_mut(kind).cancel(job_id),
        Msg::ToggleConsole { kind, job_id } => {
            state.tracker_mut(kind).toggle_console_visible(job_id);
            Vec::new()
        }
        Msg::BeginJobAccepted {
            kind,
            job_id,
            subscription,
        } => state.tracker_mut(kind).begin_accepted(job_id, subscription),
        Msg::BeginJobRejected {
            kind,
            job_id,
            subscription,
            message,
        } => state
            .tracker_mut(kind)
            .begin_rejected(job_id, subscription, &message),
        Msg::StopJobRejected {
            kind,
            job_id,
            message,
        } => state.tracker_mut(kind).cancel_rejected(job_id, &message),
        Msg::ProgressFrame {
            kind,
            job_id,
            subscription,
            frame,
        } => state
            .tracker_mut(kind)
            .dispatch_from(job_id, subscription, frame),
        Msg::ProgressStreamFailed {
            kind,
            job_id,
            subscription,
            reason,
        } => state
            .tracker_mut(kind)
            .transport_failed(job_id, subscription, &reason),
        Msg::SearchSubmitted { query, options } => {
            let query = query.trim();
            if query.is_empty() {
                watch_debug!("blank search ignored");
                return (state, Vec::new());
            }
            let request_id = state.allocate_request_id();
            let request = SearchRequest::new(query, options.with_limit(options.limit));
            state.answers_mut().begin_session(request_id, request)
        }
        Msg::AnswerFrame { request_id, frame } => {
            state.answers_mut().dispatch_for(request_id, frame)
        }
        Msg::AnswerStreamFailed { request_id, reason } => {
            state.answers_mut().transport_failed(request_id, &reason)
        }
        Msg::ClearSearch => state.answers_mut().clear(),
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
