// src/lib.rs

pub mod backup;
pub mod broadcast;
pub mod cli;
pub mod config;
pub mod errors;
pub mod fs;
pub mod http;
pub mod logging;
pub mod staging;
pub mod supervisor;
pub mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::backup::BackupLocator;
use crate::broadcast::LogBroadcaster;
use crate::cli::CliArgs;
use crate::config::ConfigFile;
use crate::fs::{FileSystem, RealFileSystem};
use crate::http::AppState;
use crate::staging::StagingStore;
use crate::supervisor::{ProcessSupervisor, RecoverySettings};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - the staging and backup directories
/// - supervisor, broadcaster and locator
/// - the HTTP server with Ctrl-C / SIGTERM shutdown
pub async fn run(args: CliArgs) -> Result<()> {
    let mut cfg = config::resolve(args.config.as_deref())?;
    apply_overrides(&mut cfg, &args);

    if args.check {
        print_check(&cfg)?;
        return Ok(());
    }

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let state = build_state(fs, cfg)?;

    let host = state.config.server.host.clone();
    let port = state.config.server.port;
    http::serve(&host, port, state.clone(), http::shutdown_signal()).await?;

    if let Some(run_id) = state.supervisor.status().run_id {
        info!(run_id, "shutting down with a recovery still running; it will be killed");
    }
    Ok(())
}

/// Create the on-disk layout and build every component from `cfg`.
pub fn build_state(fs: Arc<dyn FileSystem>, cfg: ConfigFile) -> Result<AppState> {
    let staging = StagingStore::from_config(Arc::clone(&fs), &cfg);
    staging.ensure_dir().context("creating staging directory")?;
    fs.create_dir_all(&cfg.paths.backup_dir)
        .context("creating backup directory")?;

    let locator = BackupLocator::from_config(Arc::clone(&fs), &cfg)?;
    let broadcaster = LogBroadcaster::new(cfg.broadcast.capacity);
    let supervisor =
        ProcessSupervisor::new(RecoverySettings::from_config(&cfg), staging, broadcaster);

    info!(
        staging = ?cfg.paths.staging_dir,
        backups = ?cfg.paths.backup_dir,
        command = %cfg.recovery.command,
        "components ready"
    );

    Ok(AppState::new(supervisor, locator, Arc::new(cfg)))
}

fn apply_overrides(cfg: &mut ConfigFile, args: &CliArgs) {
    if let Some(host) = &args.host {
        cfg.server.host = host.clone();
    }
    if let Some(port) = args.port {
        cfg.server.port = port;
    }
}

/// `--check` output: the effective configuration as TOML.
fn print_check(cfg: &ConfigFile) -> Result<()> {
    let rendered = toml::to_string_pretty(cfg).context("rendering configuration")?;
    println!("# recoverd effective configuration");
    println!("{rendered}");
    Ok(())
}
