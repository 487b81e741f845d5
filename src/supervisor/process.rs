// src/supervisor/process.rs

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use tokio::net::unix::pipe;
use tokio::process::Child;
use tracing::{debug, error, info, warn};

use crate::broadcast::{LogBroadcaster, LogEvent, LogSubscription};
use crate::errors::SupervisorError;
use crate::staging::{StagingLease, StagingStore};
use crate::types::{RunId, RunOutcome};

use super::launcher::{Launched, RecoverySettings};
use super::output::LineReader;
use super::state::{RunState, RunStatus};

/// Single-flight supervisor for the recovery executable.
///
/// Cheap to clone; clones share the same run state and broadcaster.
///
/// - `start` first takes the staging lease, then flips the state to
///   `Running` under a mutex and spawns without yielding in between. A caller
///   that drops the `start` future while it waits on the lease leaves no
///   trace in the run state.
/// - Each run gets one background task that owns the child process, its
///   staging lease and the output reader.
/// - The completion event is published with the state lock held, and the
///   state is back at `Idle` before the lock is released. An observer that
///   reacts to completion by starting again will therefore never see a stale
///   `AlreadyRunning`.
///
/// There is no timeout and no cancellation: a hung recovery keeps the
/// supervisor busy until it exits or the server stops.
#[derive(Debug, Clone)]
pub struct ProcessSupervisor {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    settings: RecoverySettings,
    staging: StagingStore,
    broadcaster: LogBroadcaster,
    state: Mutex<RunState>,
}

impl ProcessSupervisor {
    pub fn new(
        settings: RecoverySettings,
        staging: StagingStore,
        broadcaster: LogBroadcaster,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                settings,
                staging,
                broadcaster,
                state: Mutex::new(RunState::new()),
            }),
        }
    }

    /// Launch a recovery run.
    ///
    /// Returns as soon as the process is spawned; progress and the result
    /// arrive through the broadcaster. A launch failure is both returned here
    /// and broadcast as a failed completion.
    pub async fn start(&self) -> Result<RunId, SupervisorError> {
        // Leases are shared, so a second caller only waits here while an
        // upload holds the write side. No await point follows.
        let lease = self.inner.staging.lease().await;

        let run_id = self.inner.lock_state().try_begin()?;
        debug!(run_id, "run state is now running");

        match self.inner.settings.spawn(run_id, &lease) {
            Ok(launched) => {
                let inner = Arc::clone(&self.inner);
                tokio::spawn(async move {
                    inner.supervise(run_id, launched, lease).await;
                });
                Ok(run_id)
            }
            Err(err) => {
                error!(run_id, error = %err, "could not launch recovery process");
                drop(lease);
                self.inner.complete(run_id, RunOutcome::Failed, 0);
                Err(err)
            }
        }
    }

    pub fn status(&self) -> RunStatus {
        self.inner.lock_state().snapshot()
    }

    pub fn subscribe(&self) -> LogSubscription {
        self.inner.broadcaster.subscribe()
    }

    pub fn staging(&self) -> &StagingStore {
        &self.inner.staging
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Body of the per-run background task.
    async fn supervise(&self, run_id: RunId, launched: Launched, lease: StagingLease) {
        let Launched { child, output } = launched;
        let (outcome, next_seq) = match self.pump(run_id, child, output).await {
            Ok(result) => result,
            Err((err, next_seq)) => {
                error!(run_id, error = %err, "recovery supervision error");
                (RunOutcome::Failed, next_seq)
            }
        };

        drop(lease);
        self.complete(run_id, outcome, next_seq);
    }

    /// Forward output lines in pipe order until EOF, then reap the process.
    ///
    /// Returns the outcome and the next free sequence number.
    async fn pump(
        &self,
        run_id: RunId,
        mut child: Child,
        output: pipe::Receiver,
    ) -> std::result::Result<(RunOutcome, u64), (anyhow::Error, u64)> {
        let mut reader = LineReader::new(output);

        let mut seq = 0u64;
        loop {
            match reader.next_line().await {
                Ok(Some(text)) => {
                    debug!(run_id, seq, "{}", text);
                    self.publish_line(run_id, seq, text);
                    seq += 1;
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(run_id, error = %e, "output pipe read failed; waiting for exit");
                    break;
                }
            }
        }

        let status = wait_for_exit(&mut child).await.map_err(|e| (e, seq))?;
        let outcome = RunOutcome::from_success(status.success());

        info!(
            run_id,
            exit_code = ?status.code(),
            success = status.success(),
            lines = seq,
            "recovery process exited"
        );
        Ok((outcome, seq))
    }

    fn publish_line(&self, run_id: RunId, seq: u64, text: String) {
        self.broadcaster.publish(LogEvent::Line { run_id, seq, text });
        self.lock_state().record_line(run_id);
    }

    /// Publish the completion event and return the state to idle, atomically
    /// with respect to `start`.
    fn complete(&self, run_id: RunId, outcome: RunOutcome, seq: u64) {
        let mut state = self.lock_state();
        if !state.finish(run_id, outcome) {
            warn!(run_id, "completion for a run that is not active; ignoring");
            return;
        }

        let delivered = self.broadcaster.publish(LogEvent::Complete {
            run_id,
            seq,
            success: outcome.is_success(),
        });
        state.settle();

        info!(run_id, ?outcome, subscribers = delivered, "recovery run finished");
    }
}

async fn wait_for_exit(child: &mut Child) -> Result<std::process::ExitStatus> {
    child
        .wait()
        .await
        .context("waiting for recovery process to exit")
}
