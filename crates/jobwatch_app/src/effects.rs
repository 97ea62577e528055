use std::time::Duration;

use jobwatch_core::{Effect, Msg};
use jobwatch_engine::{EngineConfig, EngineError, EngineEvent, EngineHandle};
use watch_logging::{watch_debug, watch_info};

/// Executes core effects: IO goes to the engine, the rest is handled here.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        Ok(Self {
            engine: EngineHandle::new(config)?,
        })
    }

    #[cfg(test)]
    pub fn with_engine(engine: EngineHandle) -> Self {
        Self { engine }
    }

    /// Runs `effects` in order and returns the notices meant for the user.
    pub fn run(&self, effects: Vec<Effect>) -> Vec<String> {
        let mut notices = Vec::new();
        for effect in effects {
            match effect {
                Effect::Notify { message } => notices.push(message),
                Effect::RefreshJobMetadata { kind, job_id } => {
                    // Nothing is cached locally; the next listing reads fresh data.
                    watch_info!("{kind} job {job_id} metadata changed on the server");
                }
                other => {
                    watch_debug!("engine <- {other:?}");
                    self.engine.run(other);
                }
            }
        }
        notices
    }

    pub fn next_event(&self, timeout: Duration) -> Option<EngineEvent> {
        self.engine.recv_timeout(timeout)
    }
}

/// Maps an engine report onto the message the core understands.
///
/// `StopAccepted` has no message: the outcome of a stop arrives on the
/// progress stream.
pub fn event_to_msg(event: EngineEvent) -> Option<Msg> {
    let msg = match event {
        EngineEvent::BeginAccepted {
            kind,
            job_id,
            subscription,
        } => Msg::BeginJobAccepted {
            kind,
            job_id,
            subscription,
        },
        EngineEvent::BeginRejected {
            kind,
            job_id,
            subscription,
            error,
        } => Msg::BeginJobRejected {
            kind,
            job_id,
            subscription,
            message: error.to_string(),
        },
        EngineEvent::StopAccepted { kind, job_id } => {
            watch_info!("{kind} job {job_id}: stop request accepted");
            return None;
        }
        EngineEvent::StopRejected {
            kind,
            job_id,
            error,
        } => Msg::StopJobRejected {
            kind,
            job_id,
            message: error.to_string(),
        },
        EngineEvent::ProgressFrame {
            kind,
            job_id,
            subscription,
            frame,
        } => Msg::ProgressFrame {
            kind,
            job_id,
            subscription,
            frame,
        },
        EngineEvent::ProgressFailed {
            kind,
            job_id,
            subscription,
            error,
        } => Msg::ProgressStreamFailed {
            kind,
            job_id,
            subscription,
            reason: error.to_string(),
        },
        EngineEvent::AnswerFrame { request_id, frame } => Msg::AnswerFrame { request_id, frame },
        EngineEvent::AnswerFailed { request_id, error } => Msg::AnswerStreamFailed {
            request_id,
            reason: error.to_string(),
        },
    };
    Some(msg)
}
