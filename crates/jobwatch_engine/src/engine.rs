use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use jobwatch_core::wire::{AnswerProtocol, ProgressProtocol};
use jobwatch_core::{Effect, JobId, JobKind, RequestId, SearchRequest, StreamKey, SubscriptionId};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use watch_logging::{watch_debug, watch_info};

use crate::pump::{pump, PumpOutcome};
use crate::{
    ByteSource, ControlClient, EngineConfig, EngineError, EngineEvent, ReqwestControl,
    ReqwestSource, StreamRequest,
};

/// Runs effects on a background runtime and reports back through a channel.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<Effect>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

#[derive(Clone)]
struct Backends {
    source: Arc<dyn ByteSource>,
    control: Arc<dyn ControlClient>,
}

impl EngineHandle {
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        Self::with_backends(
            Arc::new(ReqwestSource::new(config)?),
            Arc::new(ReqwestControl::new(config)?),
        )
    }

    pub fn with_backends(
        source: Arc<dyn ByteSource>,
        control: Arc<dyn ControlClient>,
    ) -> Result<Self, EngineError> {
        let runtime = Runtime::new().map_err(|err| EngineError::Runtime(err.to_string()))?;
        let (cmd_tx, cmd_rx) = mpsc::channel::<Effect>();
        let (event_tx, event_rx) = mpsc::channel();
        let backends = Backends { source, control };

        thread::spawn(move || {
            let mut streams = StreamRegistry::default();
            while let Ok(effect) = cmd_rx.recv() {
                execute(&runtime, &backends, &mut streams, effect, &event_tx);
            }
            streams.cancel_all();
            watch_debug!("engine thread exiting");
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn run(&self, effect: Effect) {
        let _ = self.cmd_tx.send(effect);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

/// Live streams by key. Only the subscription that opened a slot can close it.
#[derive(Debug, Default)]
struct StreamRegistry {
    live: HashMap<StreamKey, (SubscriptionId, CancellationToken)>,
}

impl StreamRegistry {
    /// Registers a new stream under `key`, cancelling whatever held it before.
    fn replace(&mut self, key: StreamKey, subscription: SubscriptionId) -> CancellationToken {
        let token = CancellationToken::new();
        if let Some((previous, old)) = self.live.insert(key, (subscription, token.clone())) {
            watch_debug!("{key:?}: subscription {subscription} replaces {previous}");
            old.cancel();
        }
        token
    }

    fn close(&mut self, key: StreamKey, subscription: SubscriptionId) -> bool {
        match self.live.get(&key) {
            Some((current, _)) if *current == subscription => {
                if let Some((_, token)) = self.live.remove(&key) {
                    token.cancel();
                }
                true
            }
            _ => false,
        }
    }

    fn cancel_all(&mut self) {
        for (_, (_, token)) in self.live.drain() {
            token.cancel();
        }
    }
}

fn execute(
    runtime: &Runtime,
    backends: &Backends,
    streams: &mut StreamRegistry,
    effect: Effect,
    event_tx: &mpsc::Sender<EngineEvent>,
) {
    match effect {
        Effect::BeginJob {
            kind,
            job_id,
            subscription,
        } => {
            let control = backends.control.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                let event = match control.begin_job(kind, job_id).await {
                    Ok(()) => EngineEvent::BeginAccepted {
                        kind,
                        job_id,
                        subscription,
                    },
                    Err(error) => EngineEvent::BeginRejected {
                        kind,
                        job_id,
                        subscription,
                        error,
                    },
                };
                let _ = event_tx.send(event);
            });
        }
        Effect::StopJob { kind, job_id } => {
            let control = backends.control.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                let event = match control.stop_job(kind, job_id).await {
                    Ok(()) => EngineEvent::StopAccepted { kind, job_id },
                    Err(error) => EngineEvent::StopRejected {
                        kind,
                        job_id,
                        error,
                    },
                };
                let _ = event_tx.send(event);
            });
        }
        Effect::OpenProgressStream {
            kind,
            job_id,
            subscription,
        } => {
            let token = streams.replace(StreamKey::Progress { kind, job_id }, subscription);
            runtime.spawn(progress_stream(
                backends.source.clone(),
                kind,
                job_id,
                subscription,
                token,
                event_tx.clone(),
            ));
        }
        Effect::OpenAnswerStream {
            request_id,
            request,
        } => {
            let token = streams.replace(StreamKey::Answer, request_id);
            runtime.spawn(answer_stream(
                backends.source.clone(),
                request_id,
                request,
                token,
                event_tx.clone(),
            ));
        }
        Effect::CloseStream { key, subscription } => {
            if !streams.close(key, subscription) {
                watch_debug!("{key:?}: subscription {subscription} not live, close ignored");
            }
        }
        Effect::RefreshJobMetadata { kind, job_id } => {
            watch_debug!("{kind} job {job_id}: metadata refresh is handled by the caller");
        }
        Effect::Notify { message } => {
            watch_info!("{message}");
        }
    }
}

async fn progress_stream(
    source: Arc<dyn ByteSource>,
    kind: JobKind,
    job_id: JobId,
    subscription: SubscriptionId,
    token: CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let request = StreamRequest::Progress { kind, job_id };
    let opened = tokio::select! {
        _ = token.cancelled() => return,
        opened = source.open(&request) => opened,
    };
    let outcome = match opened {
        Ok(chunks) => {
            pump::<ProgressProtocol, _>(chunks, token, |frame| {
                let _ = event_tx.send(EngineEvent::ProgressFrame {
                    kind,
                    job_id,
                    subscription,
                    frame,
                });
            })
            .await
        }
        Err(error) => PumpOutcome::Failed(error),
    };
    if let PumpOutcome::Failed(error) = outcome {
        let _ = event_tx.send(EngineEvent::ProgressFailed {
            kind,
            job_id,
            subscription,
            error,
        });
    }
}

async fn answer_stream(
    source: Arc<dyn ByteSource>,
    request_id: RequestId,
    request: SearchRequest,
    token: CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let request = StreamRequest::Answer(request);
    let opened = tokio::select! {
        _ = token.cancelled() => return,
        opened = source.open(&request) => opened,
    };
    let outcome = match opened {
        Ok(chunks) => {
            pump::<AnswerProtocol, _>(chunks, token, |frame| {
                let _ = event_tx.send(EngineEvent::AnswerFrame { request_id, frame });
            })
            .await
        }
        Err(error) => PumpOutcome::Failed(error),
    };
    if let PumpOutcome::Failed(error) = outcome {
        let _ = event_tx.send(EngineEvent::AnswerFailed { request_id, error });
    }
}
