//! Byte chunks through the codec into the state machines.
use jobwatch_core::wire::{
    AnswerProtocol, ChunkBuffer, FrameDecoder, MalformedFrame, ProgressProtocol,
};
use jobwatch_core::{
    update, AnswerPhase, AppState, Effect, JobKind, JobStatus, Msg, Progress, SearchOptions,
    SummaryProvider, TaskTracker,
};
use pretty_assertions::assert_eq;

const PROGRESS_STREAM: &str = concat!(
    "data: {\"type\": \"log\", \"message\": \"start\"}\n\n",
    "data: {\"type\": \"bogus\"}\n\n",
    "data: {\"type\": \"progress\", \"message\": \"Progress update\", \"current\": 1, \"total\": 3}\n\n",
    "data: {\"type\": \"status\", \"message\": \"finished\"}\n\n",
);

fn drive_progress(chunks: &[&[u8]]) -> AppState {
    let decoder = FrameDecoder::<ProgressProtocol>::new();
    let mut buffer = ChunkBuffer::new();

    let (state, effects) = update(AppState::new(), Msg::StartJob { kind: JobKind::Crawl, job_id: 1 });
    let Some(Effect::BeginJob { subscription, .. }) = effects.first().cloned() else {
        panic!("begin effect");
    };
    let (mut state, _) = update(
        state,
        Msg::BeginJobAccepted {
            kind: JobKind::Crawl,
            job_id: 1,
            subscription,
        },
    );

    for chunk in chunks {
        for line in buffer.feed(chunk) {
            let Ok(frame) = decoder.decode(&line) else {
                continue;
            };
            let (next, _) = update(
                state,
                Msg::ProgressFrame {
                    kind: JobKind::Crawl,
                    job_id: 1,
                    subscription,
                    frame,
                },
            );
            state = next;
        }
    }
    assert_eq!(buffer.finish(), None);
    state
}

#[test]
fn progress_stream_reaches_same_state_for_any_chunking() {
    let bytes = PROGRESS_STREAM.as_bytes();
    let whole = drive_progress(&[bytes]);

    let job = whole.tracker(JobKind::Crawl).job(1).unwrap();
    assert_eq!(job.status(), JobStatus::Finished);
    assert_eq!(&job.log_lines()[1..], ["start".to_string()]);
    assert_eq!(job.progress(), Progress::new(1, 3));

    for size in [1, 2, 3, 7, 16, 64] {
        let chunks: Vec<&[u8]> = bytes.chunks(size).collect();
        assert_eq!(drive_progress(&chunks), whole, "chunk size {size}");
    }
}

#[test]
fn frames_fed_one_at_a_time_build_the_job() {
    let decoder = FrameDecoder::<ProgressProtocol>::new();
    let mut buffer = ChunkBuffer::new();
    let mut tracker = TaskTracker::new(JobKind::Crawl);

    let lines = [
        ": keep-alive\n",
        "data: {\"type\":\"log\",\"message\":\"start\"}\n",
        "data: {\"type\":\"progress\",\"current\":1,\"total\":3}\n",
        "data: {\"type\":\"status\",\"message\":\"finished\"}\n",
    ];
    for line in lines {
        for frame_line in buffer.feed(line.as_bytes()) {
            if let Some(frame) = decoder.decode_line(&frame_line).expect("well-formed frame") {
                tracker.dispatch(1, frame);
            }
        }
    }

    let job = tracker.job(1).expect("created on first frame");
    assert_eq!(job.status(), JobStatus::Finished);
    assert_eq!(job.log_lines(), ["start".to_string()]);
    assert_eq!(job.progress(), Progress::new(1, 3));
}

#[test]
fn non_data_lines_yield_nothing() {
    let decoder = FrameDecoder::<ProgressProtocol>::new();
    for line in ["{\"type\":\"log\",\"message\":\"x\"}", ": ping", "id: 4", ""] {
        assert_eq!(decoder.decode_line(line), Ok(None), "{line:?}");
    }
}

#[test]
fn malformed_line_does_not_stop_the_stream() {
    let decoder = FrameDecoder::<ProgressProtocol>::new();
    let mut buffer = ChunkBuffer::new();
    let lines = buffer.feed(PROGRESS_STREAM.as_bytes());

    let decoded: Vec<_> = lines.iter().map(|line| decoder.decode(line)).collect();
    assert_eq!(decoded.len(), 4);
    assert!(matches!(
        decoded[1],
        Err(MalformedFrame::UnknownType { .. })
    ));
    assert_eq!(decoded.iter().filter(|frame| frame.is_ok()).count(), 3);
}

#[test]
fn answer_stream_split_inside_multibyte_text() {
    let stream = concat!(
        "data: {\"type\": \"sources\", \"data\": [{\"title\": \"A\", \"url\": \"#\", \"snippet\": \"s\", \"filename\": \"a.pdf\", \"page\": 2}]}\n\n",
        "data: {\"type\": \"ping\"}\n\n",
        "data: {\"type\": \"answer\", \"content\": \"你\"}\n\n",
        "data: {\"type\": \"answer\", \"content\": \"好\"}\n\n",
        "data: {\"type\": \"done\"}\n\n",
    );
    let bytes = stream.as_bytes();
    let split = stream.find('好').unwrap() + 2;

    let decoder = FrameDecoder::<AnswerProtocol>::new();
    let mut buffer = ChunkBuffer::new();
    let options = SearchOptions::default().with_provider(SummaryProvider::DeepSeek);
    let (mut state, _) = update(
        AppState::new(),
        Msg::SearchSubmitted {
            query: "q".into(),
            options,
        },
    );

    for chunk in [&bytes[..split], &bytes[split..]] {
        for line in buffer.feed(chunk) {
            let frame = decoder.decode(&line).expect("valid frame");
            let (next, _) = update(state, Msg::AnswerFrame { request_id: 1, frame });
            state = next;
        }
    }

    let session = state.answers().session().unwrap();
    assert_eq!(session.answer_text(), "你好");
    assert_eq!(session.phase(), AnswerPhase::Done);
    assert_eq!(session.results()[0].document_name.as_deref(), Some("a.pdf"));
}
