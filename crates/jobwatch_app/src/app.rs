use std::io::Write;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use jobwatch_core::{
    update, AnswerPhase, AppState, JobId, JobKind, JobStatus, Msg, SearchOptions,
};
use jobwatch_engine::EngineEvent;
use watch_logging::watch_debug;

use crate::effects::{event_to_msg, EffectRunner};
use crate::render::Renderer;

const TICK: Duration = Duration::from_millis(100);

/// Owns the core state and drives it with engine events.
pub struct App<W: Write> {
    state: AppState,
    runner: EffectRunner,
    renderer: Renderer<W>,
}

impl<W: Write> App<W> {
    pub fn new(runner: EffectRunner, out: W) -> Self {
        Self {
            state: AppState::new(),
            runner,
            renderer: Renderer::new(out),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.renderer.into_inner()
    }

    pub fn dispatch(&mut self, msg: Msg) -> Result<()> {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        for notice in self.runner.run(effects) {
            self.renderer.notice(&notice)?;
        }
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let view = self.state.view();
        if view.dirty {
            self.state.consume_dirty();
            self.renderer.render(&view)?;
        }
        Ok(())
    }

    fn deliver(&mut self, event: EngineEvent) -> Result<()> {
        match event_to_msg(event) {
            Some(msg) => self.dispatch(msg),
            None => Ok(()),
        }
    }

    /// Feeds engine events into the core until `done` holds.
    fn run_until(&mut self, mut done: impl FnMut(&AppState) -> bool) -> Result<()> {
        loop {
            self.render()?;
            if done(&self.state) {
                return Ok(());
            }
            match self.runner.next_event(TICK) {
                Some(event) => self.deliver(event)?,
                None => self.dispatch(Msg::Tick)?,
            }
        }
    }

    /// Starts a job and follows it until it ends.
    pub fn follow(&mut self, kind: JobKind, job_id: JobId, console: bool) -> Result<JobStatus> {
        self.dispatch(Msg::StartJob { kind, job_id })?;
        if !console {
            self.dispatch(Msg::ToggleConsole { kind, job_id })?;
        }

        let status_of = |state: &AppState| {
            state
                .tracker(kind)
                .job(job_id)
                .map(|job| job.status())
                .unwrap_or_default()
        };
        self.run_until(|state| status_of(state).is_terminal())?;

        match status_of(&self.state) {
            JobStatus::Failed => bail!("{kind} job {job_id} failed"),
            status => Ok(status),
        }
    }

    /// Sends a stop request and waits for the service to answer it.
    pub fn stop(&mut self, kind: JobKind, job_id: JobId, wait: Duration) -> Result<()> {
        self.dispatch(Msg::CancelJob { kind, job_id })?;

        let deadline = Instant::now() + wait;
        while let Some(left) = deadline.checked_duration_since(Instant::now()) {
            let Some(event) = self.runner.next_event(left.min(TICK)) else {
                continue;
            };
            match event {
                EngineEvent::StopAccepted {
                    kind: stopped_kind,
                    job_id: stopped_id,
                } if stopped_kind == kind && stopped_id == job_id => {
                    self.renderer
                        .notice(&format!("Stop requested for {kind} job {job_id}"))?;
                    return Ok(());
                }
                EngineEvent::StopRejected {
                    kind: stopped_kind,
                    job_id: stopped_id,
                    error,
                } if stopped_kind == kind && stopped_id == job_id => {
                    let reason = error.to_string();
                    self.dispatch(Msg::StopJobRejected {
                        kind,
                        job_id,
                        message: reason.clone(),
                    })?;
                    bail!("stop refused: {reason}");
                }
                other => {
                    watch_debug!("ignoring {other:?} while waiting for stop reply");
                }
            }
        }
        bail!("no reply to stop request for {kind} job {job_id}")
    }

    /// Streams one search and returns once the answer is complete.
    pub fn search(&mut self, query: &str, options: SearchOptions) -> Result<()> {
        self.dispatch(Msg::SearchSubmitted {
            query: query.to_string(),
            options,
        })?;
        if self.state.answers().session().is_none() {
            bail!("query is empty");
        }

        let phase_of = |state: &AppState| state.answers().session().map(|session| session.phase());
        self.run_until(|state| phase_of(state).is_some_and(AnswerPhase::is_terminal))?;

        match phase_of(&self.state) {
            Some(AnswerPhase::Errored) => bail!("search failed"),
            _ => Ok(()),
        }
    }
}
