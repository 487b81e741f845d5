// src/supervisor/launcher.rs

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::net::unix::pipe;
use tokio::process::{Child, Command};
use tracing::info;

use crate::config::ConfigFile;
use crate::errors::SupervisorError;
use crate::staging::StagingLease;
use crate::types::RunId;

use super::output::{CombinedPipe, async_reader};

/// Environment variable carrying the staging directory.
pub const ENV_STAGING_DIR: &str = "RECOVERD_STAGING_DIR";
/// Environment variable carrying the staged definition file.
pub const ENV_DEFINITION_FILE: &str = "RECOVERD_DEFINITION_FILE";
/// Environment variable carrying the directory backups must be written to.
pub const ENV_BACKUP_DIR: &str = "RECOVERD_BACKUP_DIR";
/// Environment variable carrying the run id, for log correlation.
pub const ENV_RUN_ID: &str = "RECOVERD_RUN_ID";

/// How to launch the recovery executable.
#[derive(Debug, Clone)]
pub struct RecoverySettings {
    pub command: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub backup_dir: PathBuf,
}

/// A spawned recovery process and the read end of its combined output.
pub struct Launched {
    pub child: Child,
    pub output: pipe::Receiver,
}

impl RecoverySettings {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            command: cfg.recovery.command.clone(),
            args: cfg.recovery.args.clone(),
            working_dir: cfg.paths.working_dir.clone(),
            backup_dir: cfg.paths.backup_dir.clone(),
        }
    }

    /// Spawn the recovery process for `run_id` against the leased inputs.
    ///
    /// The command runs directly (no shell) with stdin closed. stdout and
    /// stderr share one pipe. The child is killed if its handle is dropped,
    /// which is what happens on server shutdown.
    pub fn spawn(&self, run_id: RunId, lease: &StagingLease) -> Result<Launched, SupervisorError> {
        let launch_err = |source| SupervisorError::LaunchFailure {
            command: self.command.clone(),
            source,
        };

        let CombinedPipe {
            reader,
            stdout,
            stderr,
        } = CombinedPipe::open().map_err(launch_err)?;

        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .current_dir(&self.working_dir)
            .env(ENV_STAGING_DIR, absolute(lease.dir()))
            .env(ENV_DEFINITION_FILE, absolute(lease.definition_path()))
            .env(ENV_BACKUP_DIR, absolute(&self.backup_dir))
            .env(ENV_RUN_ID, run_id.to_string())
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(launch_err)?;
        // The command still owns the parent's copies of the write end.
        drop(cmd);

        let output = match async_reader(reader) {
            Ok(output) => output,
            Err(e) => return Err(launch_err(e)),
        };

        info!(
            run_id,
            command = %self.command,
            pid = ?child.id(),
            staging = ?lease.dir(),
            "recovery process started"
        );
        Ok(Launched { child, output })
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
