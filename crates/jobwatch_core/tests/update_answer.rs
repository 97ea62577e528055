use std::sync::Once;

use jobwatch_core::{
    update, AnswerFrame, AnswerPhase, AppState, Effect, Msg, ResultItem, SearchOptions,
    SearchRequest, StreamKey, SummaryProvider, TRANSPORT_FAILURE_MESSAGE,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(watch_logging::initialize_for_tests);
}

fn summarizing() -> SearchOptions {
    SearchOptions::default().with_provider(SummaryProvider::Local)
}

fn search(state: AppState, query: &str, options: SearchOptions) -> (AppState, u64) {
    let (state, effects) = update(
        state,
        Msg::SearchSubmitted {
            query: query.to_string(),
            options,
        },
    );
    let request_id = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::OpenAnswerStream { request_id, .. } => Some(*request_id),
            _ => None,
        })
        .expect("open answer stream effect");
    (state, request_id)
}

fn answer(state: AppState, request_id: u64, frame: AnswerFrame) -> (AppState, Vec<Effect>) {
    update(state, Msg::AnswerFrame { request_id, frame })
}

fn fragment(content: &str) -> AnswerFrame {
    AnswerFrame::AnswerFragment {
        content: content.to_string(),
    }
}

fn item_a() -> ResultItem {
    ResultItem::forum("Timeline sync", "https://forum.example/t/1", "Relink media...")
}

fn item_b() -> ResultItem {
    ResultItem::document("Manual", "manual.pdf", Some(3), "Chapter 2")
}

#[test]
fn end_to_end_answer_stream() {
    init_logging();
    let (state, id) = search(AppState::new(), "sync issue", summarizing());
    let (state, _) = answer(state, id, AnswerFrame::Ping);
    let (state, _) = answer(
        state,
        id,
        AnswerFrame::Sources {
            items: vec![item_a(), item_b()],
        },
    );
    assert_eq!(
        state.answers().session().unwrap().phase(),
        AnswerPhase::Summarizing
    );
    let (state, _) = answer(state, id, fragment("Hel"));
    let (state, _) = answer(state, id, fragment("lo"));
    let (state, _) = answer(state, id, fragment("!"));
    let (state, effects) = answer(state, id, AnswerFrame::Done);

    assert_eq!(
        effects,
        vec![Effect::CloseStream {
            key: StreamKey::Answer,
            subscription: id,
        }]
    );
    let session = state.answers().session().unwrap();
    assert_eq!(session.results(), [item_a(), item_b()]);
    assert_eq!(session.answer_text(), "Hello!");
    assert_eq!(session.phase(), AnswerPhase::Done);
}

#[test]
fn search_request_carries_explicit_options() {
    init_logging();
    let options = summarizing().with_limit(5);
    let (_, effects) = update(
        AppState::new(),
        Msg::SearchSubmitted {
            query: "  render codec  ".into(),
            options,
        },
    );
    assert_eq!(
        effects,
        vec![Effect::OpenAnswerStream {
            request_id: 1,
            request: SearchRequest::new("render codec", options),
        }]
    );
}

#[test]
fn blank_search_is_ignored() {
    init_logging();
    let (mut state, effects) = update(
        AppState::new(),
        Msg::SearchSubmitted {
            query: "   ".into(),
            options: SearchOptions::default(),
        },
    );
    assert!(effects.is_empty());
    assert!(state.answers().session().is_none());
    assert!(!state.consume_dirty());
}

#[test]
fn results_without_summarization_stay_awaiting_until_done() {
    init_logging();
    let (state, id) = search(AppState::new(), "q", SearchOptions::default());
    let (state, _) = answer(state, id, AnswerFrame::Sources { items: vec![item_a()] });
    assert_eq!(
        state.answers().session().unwrap().phase(),
        AnswerPhase::AwaitingResults
    );
    let (state, _) = answer(state, id, AnswerFrame::Done);
    let session = state.answers().session().unwrap();
    assert_eq!(session.phase(), AnswerPhase::Done);
    assert_eq!(session.results(), [item_a()]);
    assert!(session.answer_text().is_empty());
}

#[test]
fn empty_results_do_not_start_summarizing() {
    init_logging();
    let (state, id) = search(AppState::new(), "q", summarizing());
    let (state, _) = answer(state, id, AnswerFrame::Sources { items: vec![] });
    assert_eq!(
        state.answers().session().unwrap().phase(),
        AnswerPhase::AwaitingResults
    );
}

#[test]
fn sources_replace_previous_results() {
    init_logging();
    let (state, id) = search(AppState::new(), "q", summarizing());
    let (state, _) = answer(state, id, AnswerFrame::Sources { items: vec![item_a()] });
    let (state, _) = answer(state, id, AnswerFrame::Sources { items: vec![item_b()] });
    assert_eq!(state.answers().session().unwrap().results(), [item_b()]);
}

#[test]
fn fragment_before_results_is_handled() {
    init_logging();
    let (state, id) = search(AppState::new(), "q", SearchOptions::default());
    let (state, effects) = answer(state, id, fragment("early"));
    assert!(effects.is_empty());
    let session = state.answers().session().unwrap();
    assert_eq!(session.phase(), AnswerPhase::Summarizing);
    assert_eq!(session.answer_text(), "early");
}

#[test]
fn error_frame_replaces_partial_answer() {
    init_logging();
    let (state, id) = search(AppState::new(), "q", summarizing());
    let (state, _) = answer(state, id, AnswerFrame::Sources { items: vec![item_a()] });
    let (state, _) = answer(state, id, fragment("partial"));
    let (state, effects) = answer(
        state,
        id,
        AnswerFrame::Error {
            message: "model offline".into(),
        },
    );

    assert_eq!(effects.len(), 1);
    let session = state.answers().session().unwrap();
    assert_eq!(session.phase(), AnswerPhase::Errored);
    assert_eq!(session.answer_text(), "Error: model offline");
    assert_eq!(session.results(), [item_a()]);
}

#[test]
fn transport_failure_uses_generic_message() {
    init_logging();
    let (state, id) = search(AppState::new(), "q", summarizing());
    let (state, _) = answer(state, id, fragment("partial"));
    let (state, effects) = update(
        state,
        Msg::AnswerStreamFailed {
            request_id: id,
            reason: "http status 500".into(),
        },
    );

    assert_eq!(
        effects,
        vec![Effect::CloseStream {
            key: StreamKey::Answer,
            subscription: id,
        }]
    );
    let session = state.answers().session().unwrap();
    assert_eq!(session.phase(), AnswerPhase::Errored);
    assert_eq!(session.answer_text(), TRANSPORT_FAILURE_MESSAGE);
}

#[test]
fn phase_never_moves_backwards_after_done() {
    init_logging();
    let (state, id) = search(AppState::new(), "q", summarizing());
    let (state, _) = answer(state, id, AnswerFrame::Done);
    let (state, effects) = answer(state, id, fragment("late"));
    assert!(effects.is_empty());
    let (state, effects) = update(
        state,
        Msg::AnswerStreamFailed {
            request_id: id,
            reason: "closed".into(),
        },
    );
    assert!(effects.is_empty());

    let session = state.answers().session().unwrap();
    assert_eq!(session.phase(), AnswerPhase::Done);
    assert!(session.answer_text().is_empty());
}

#[test]
fn new_search_supersedes_live_session() {
    init_logging();
    let (state, first) = search(AppState::new(), "first", summarizing());
    let (state, effects) = update(
        state,
        Msg::SearchSubmitted {
            query: "second".into(),
            options: summarizing(),
        },
    );
    let second = first + 1;
    assert_eq!(
        effects,
        vec![
            Effect::CloseStream {
                key: StreamKey::Answer,
                subscription: first,
            },
            Effect::OpenAnswerStream {
                request_id: second,
                request: SearchRequest::new("second", summarizing()),
            },
        ]
    );

    let (state, effects) = answer(state, first, fragment("stale"));
    assert!(effects.is_empty());
    let (state, _) = answer(state, second, fragment("fresh"));
    let view = state.view();
    let answer_view = view.answer.expect("current session");
    assert_eq!(answer_view.request_id, second);
    assert_eq!(answer_view.query, "second");
    assert_eq!(answer_view.answer_text, "fresh");
    assert!(answer_view.is_summarizing());
}

#[test]
fn clear_closes_live_stream_once() {
    init_logging();
    let (state, id) = search(AppState::new(), "q", summarizing());
    let (state, effects) = update(state, Msg::ClearSearch);
    assert_eq!(
        effects,
        vec![Effect::CloseStream {
            key: StreamKey::Answer,
            subscription: id,
        }]
    );
    assert!(state.answers().session().is_none());

    let (_, effects) = update(state, Msg::ClearSearch);
    assert!(effects.is_empty());
}
