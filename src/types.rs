// src/types.rs

use std::fmt;

use serde::Serialize;

/// Identifier of one recovery run, assigned by the supervisor.
pub type RunId = u64;

/// Terminal result of a recovery run.
///
/// Decided only from the process exit status; output content is never
/// inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Succeeded,
    Failed,
}

impl RunOutcome {
    pub fn from_success(success: bool) -> Self {
        if success {
            RunOutcome::Succeeded
        } else {
            RunOutcome::Failed
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, RunOutcome::Succeeded)
    }
}

/// Where the supervisor currently is in its lifecycle.
///
/// `Succeeded` / `Failed` are only observable between publishing the
/// completion event and returning to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunPhase {
    Idle,
    Running,
    Succeeded,
    Failed,
}

impl From<RunOutcome> for RunPhase {
    fn from(outcome: RunOutcome) -> Self {
        match outcome {
            RunOutcome::Succeeded => RunPhase::Succeeded,
            RunOutcome::Failed => RunPhase::Failed,
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunPhase::Idle => "idle",
            RunPhase::Running => "running",
            RunPhase::Succeeded => "succeeded",
            RunPhase::Failed => "failed",
        };
        f.write_str(s)
    }
}
