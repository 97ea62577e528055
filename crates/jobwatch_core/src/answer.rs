use watch_logging::{watch_debug, watch_info, watch_warn};

use crate::{AnswerFrame, Effect, ResultItem, SearchOptions, StreamKey};

pub type RequestId = u64;

/// Shown in place of the answer when the stream itself breaks.
pub const TRANSPORT_FAILURE_MESSAGE: &str =
    "Sorry, the search failed. Make sure the backend service is running.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub options: SearchOptions,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, options: SearchOptions) -> Self {
        Self {
            query: query.into(),
            options,
        }
    }
}

/// Coarse progress of one answer session. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AnswerPhase {
    AwaitingResults,
    Summarizing,
    Done,
    Errored,
}

impl AnswerPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, AnswerPhase::Done | AnswerPhase::Errored)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerSession {
    request_id: RequestId,
    request: SearchRequest,
    results: Vec<ResultItem>,
    answer_text: String,
    phase: AnswerPhase,
}

impl AnswerSession {
    fn new(request_id: RequestId, request: SearchRequest) -> Self {
        Self {
            request_id,
            request,
            results: Vec::new(),
            answer_text: String::new(),
            phase: AnswerPhase::AwaitingResults,
        }
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn request(&self) -> &SearchRequest {
        &self.request
    }

    pub fn results(&self) -> &[ResultItem] {
        &self.results
    }

    pub fn answer_text(&self) -> &str {
        &self.answer_text
    }

    pub fn phase(&self) -> AnswerPhase {
        self.phase
    }

    pub fn summarization_requested(&self) -> bool {
        self.request.options.provider.summarizes()
    }

    fn fail(&mut self, message: String) {
        self.answer_text = message;
        self.phase = AnswerPhase::Errored;
    }
}

/// Owns the current answer session and folds answer frames into it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnswerAssembler {
    session: Option<AnswerSession>,
    dirty: bool,
}

impl AnswerAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Option<&AnswerSession> {
        self.session.as_ref()
    }

    pub(crate) fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replaces any previous session and opens the answer stream for `request`.
    pub fn begin_session(&mut self, request_id: RequestId, request: SearchRequest) -> Vec<Effect> {
        let mut effects = self.close_live_session();
        watch_info!(
            "search {request_id}: limit={} provider={} filter={}",
            request.options.limit,
            request.options.provider,
            request.options.origin_filter
        );
        self.session = Some(AnswerSession::new(request_id, request.clone()));
        self.dirty = true;
        effects.push(Effect::OpenAnswerStream {
            request_id,
            request,
        });
        effects
    }

    /// Drops the current session, closing its stream if still live.
    pub fn clear(&mut self) -> Vec<Effect> {
        let effects = self.close_live_session();
        if self.session.take().is_some() {
            self.dirty = true;
        }
        effects
    }

    fn close_live_session(&mut self) -> Vec<Effect> {
        match &self.session {
            Some(session) if !session.phase.is_terminal() => {
                watch_debug!("search {} superseded", session.request_id);
                vec![close_effect(session.request_id)]
            }
            _ => Vec::new(),
        }
    }

    /// Applies a frame to the current session.
    pub fn dispatch(&mut self, frame: AnswerFrame) -> Vec<Effect> {
        let Some(session) = self.session.as_mut() else {
            watch_debug!("no answer session, dropping {frame:?}");
            return Vec::new();
        };
        if session.phase.is_terminal() {
            watch_debug!(
                "search {} already {:?}, dropping {frame:?}",
                session.request_id,
                session.phase
            );
            return Vec::new();
        }

        let request_id = session.request_id;
        match frame {
            AnswerFrame::Ping => return Vec::new(),
            AnswerFrame::Sources { items } => {
                watch_debug!("search {request_id}: {} results", items.len());
                let summarize = !items.is_empty() && session.summarization_requested();
                session.results = items;
                if summarize && session.phase == AnswerPhase::AwaitingResults {
                    session.phase = AnswerPhase::Summarizing;
                }
            }
            AnswerFrame::AnswerFragment { content } => {
                if session.phase == AnswerPhase::AwaitingResults {
                    watch_debug!("search {request_id}: answer text before results");
                    session.phase = AnswerPhase::Summarizing;
                }
                session.answer_text.push_str(&content);
            }
            AnswerFrame::Done => {
                session.phase = AnswerPhase::Done;
                self.dirty = true;
                watch_info!("search {request_id} done");
                return vec![close_effect(request_id)];
            }
            AnswerFrame::Error { message } => {
                watch_warn!("search {request_id} failed: {message}");
                session.fail(format!("Error: {message}"));
                self.dirty = true;
                return vec![close_effect(request_id)];
            }
        }
        self.dirty = true;
        Vec::new()
    }

    /// Applies a frame only if `request_id` is still the current session.
    pub fn dispatch_for(&mut self, request_id: RequestId, frame: AnswerFrame) -> Vec<Effect> {
        let current = self.session.as_ref().map(AnswerSession::request_id);
        if current != Some(request_id) {
            watch_debug!("search {request_id} superseded, dropping {frame:?}");
            return Vec::new();
        }
        self.dispatch(frame)
    }

    /// The answer stream broke; treated like an `error` frame with a generic message.
    pub fn transport_failed(&mut self, request_id: RequestId, reason: &str) -> Vec<Effect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if session.request_id != request_id || session.phase.is_terminal() {
            watch_debug!("search {request_id}: ignoring stream failure ({reason})");
            return Vec::new();
        }
        watch_warn!("search {request_id}: answer stream lost: {reason}");
        session.fail(TRANSPORT_FAILURE_MESSAGE.to_string());
        self.dirty = true;
        vec![close_effect(request_id)]
    }
}

fn close_effect(request_id: RequestId) -> Effect {
    Effect::CloseStream {
        key: StreamKey::Answer,
        subscription: request_id,
    }
}
