// src/supervisor/mod.rs

//! Recovery process supervision.
//!
//! - [`state`]: the pure `Idle -> Running -> Succeeded | Failed -> Idle`
//!   machine and the status snapshot.
//! - [`launcher`]: how the recovery executable is spawned and what it is told
//!   about the staged inputs.
//! - [`output`]: the one pipe shared by stdout and stderr, and its line
//!   reader.
//! - [`process`]: the `ProcessSupervisor` tying these together and publishing
//!   into the log broadcaster.

pub mod launcher;
pub mod output;
pub mod process;
pub mod state;

pub use launcher::{
    ENV_BACKUP_DIR, ENV_DEFINITION_FILE, ENV_RUN_ID, ENV_STAGING_DIR, Launched, RecoverySettings,
};
pub use process::ProcessSupervisor;
pub use state::{FinishedRun, RunState, RunStatus};
