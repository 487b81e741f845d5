// src/supervisor/state.rs

//! Pure run-state machine.
//!
//! No processes, channels or locks live here; `ProcessSupervisor` wraps a
//! `RunState` in a mutex and drives it. Keeping the transitions synchronous
//! makes the single-flight rule easy to test on its own.

use serde::Serialize;

use crate::errors::SupervisorError;
use crate::types::{RunId, RunOutcome, RunPhase};

/// Result of the most recent finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FinishedRun {
    pub run_id: RunId,
    pub outcome: RunOutcome,
    pub lines_emitted: u64,
}

/// Point-in-time view of the supervisor, as served by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunStatus {
    pub phase: RunPhase,
    /// Id of the active run, if any.
    pub run_id: Option<RunId>,
    /// Lines emitted so far by the active run.
    pub lines_emitted: u64,
    pub last_run: Option<FinishedRun>,
}

#[derive(Debug)]
pub struct RunState {
    phase: RunPhase,
    current: Option<RunId>,
    next_run_id: RunId,
    lines_emitted: u64,
    last_run: Option<FinishedRun>,
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

impl RunState {
    pub fn new() -> Self {
        Self {
            phase: RunPhase::Idle,
            current: None,
            next_run_id: 1,
            lines_emitted: 0,
            last_run: None,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn current_run(&self) -> Option<RunId> {
        self.current
    }

    /// `Idle -> Running`. Allocates the id for the new run.
    pub fn try_begin(&mut self) -> Result<RunId, SupervisorError> {
        if let (RunPhase::Running, Some(run_id)) = (self.phase, self.current) {
            return Err(SupervisorError::AlreadyRunning { run_id });
        }

        let run_id = self.next_run_id;
        self.next_run_id += 1;
        self.phase = RunPhase::Running;
        self.current = Some(run_id);
        self.lines_emitted = 0;
        Ok(run_id)
    }

    /// Count one emitted line for the active run. Stale ids are ignored.
    pub fn record_line(&mut self, run_id: RunId) {
        if self.current == Some(run_id) {
            self.lines_emitted += 1;
        }
    }

    /// `Running -> Succeeded | Failed`. Returns false for a stale id.
    pub fn finish(&mut self, run_id: RunId, outcome: RunOutcome) -> bool {
        if self.current != Some(run_id) || self.phase != RunPhase::Running {
            return false;
        }
        self.phase = outcome.into();
        self.last_run = Some(FinishedRun {
            run_id,
            outcome,
            lines_emitted: self.lines_emitted,
        });
        true
    }

    /// `Succeeded | Failed -> Idle`, once the completion event is out.
    pub fn settle(&mut self) {
        if matches!(self.phase, RunPhase::Succeeded | RunPhase::Failed) {
            self.phase = RunPhase::Idle;
            self.current = None;
            self.lines_emitted = 0;
        }
    }

    pub fn snapshot(&self) -> RunStatus {
        RunStatus {
            phase: self.phase,
            run_id: self.current,
            lines_emitted: self.lines_emitted,
            last_run: self.last_run,
        }
    }
}
