// src/backup/locator.rs

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use tracing::{debug, info, warn};

use crate::config::ConfigFile;
use crate::errors::{LocatorError, Result};
use crate::fs::FileSystem;

use super::naming::{BackupNaming, NameMatch};
use super::BackupArtifact;

/// Outcome of one pass over the backup directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupScan {
    /// Artifacts following the naming convention, newest first.
    pub names: Vec<String>,
    /// Files with the prefix and suffix whose stamp failed validation.
    pub rejected: Vec<String>,
}

/// Finds the current backup artifact in the backup directory.
///
/// "Current" is the matching file with the greatest name. The locator never
/// writes; artifacts come from the recovery command.
#[derive(Debug, Clone)]
pub struct BackupLocator {
    fs: Arc<dyn FileSystem>,
    dir: PathBuf,
    naming: BackupNaming,
}

impl BackupLocator {
    pub fn new(fs: Arc<dyn FileSystem>, dir: impl Into<PathBuf>, naming: BackupNaming) -> Self {
        Self {
            fs,
            dir: dir.into(),
            naming,
        }
    }

    pub fn from_config(fs: Arc<dyn FileSystem>, cfg: &ConfigFile) -> Result<Self> {
        let naming = BackupNaming::from_config(&cfg.backup)?;
        Ok(Self::new(fs, cfg.paths.backup_dir.clone(), naming))
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    /// Names of all artifacts following the naming convention, newest first.
    ///
    /// A missing backup directory is reported as empty.
    pub fn list(&self) -> std::result::Result<Vec<String>, LocatorError> {
        Ok(self.scan()?.names)
    }

    /// Like [`list`](Self::list), but also reports the names that were
    /// rejected for a bad stamp.
    pub fn scan(&self) -> std::result::Result<BackupScan, LocatorError> {
        if !self.fs.is_dir(&self.dir) {
            debug!(dir = ?self.dir, "backup directory does not exist");
            return Ok(BackupScan::default());
        }

        let entries = self
            .fs
            .read_dir(&self.dir)
            .map_err(|source| LocatorError::Unreadable {
                name: self.dir.display().to_string(),
                source,
            })?;

        let mut scan = BackupScan::default();
        let mut stamp_widths = BTreeSet::new();

        for path in entries {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            match self.naming.classify(name) {
                NameMatch::Valid(stamp) => {
                    if self.fs.is_file(&path) {
                        stamp_widths.insert(stamp.len());
                        scan.names.push(name.to_string());
                    }
                }
                NameMatch::BadStamp(stamp) => {
                    warn!(
                        file = %name,
                        stamp = %stamp,
                        "backup file does not follow the stamp convention; ignoring"
                    );
                    scan.rejected.push(name.to_string());
                }
                NameMatch::Unrelated => {}
            }
        }

        if stamp_widths.len() > 1 {
            warn!(
                widths = ?stamp_widths,
                "backup stamps have different widths; name order may not be chronological"
            );
        }

        scan.names.sort_unstable_by(|a, b| b.cmp(a));
        scan.rejected.sort_unstable();
        Ok(scan)
    }

    /// Resolve the current artifact.
    ///
    /// - `NotFound` when nothing matches the convention.
    /// - `Unreadable` when the chosen file disappears before it can be
    ///   inspected; callers should treat this like a retryable not-found.
    pub fn latest(&self) -> std::result::Result<BackupArtifact, LocatorError> {
        let BackupScan { names, rejected } = self.scan()?;
        let Some(name) = names.into_iter().next() else {
            if !rejected.is_empty() {
                info!(
                    dir = ?self.dir,
                    rejected = ?rejected,
                    stamp_pattern = %self.naming.stamp_pattern(),
                    "no backup available; files with a non-matching stamp were skipped"
                );
            }
            return Err(LocatorError::NotFound(self.dir.display().to_string()));
        };

        let path = self.dir.join(&name);
        let size = self
            .fs
            .file_len(&path)
            .map_err(|source| LocatorError::Unreadable {
                name: name.clone(),
                source,
            })?;

        debug!(file = %name, size, "selected latest backup");
        Ok(BackupArtifact { name, path, size })
    }

    /// Resolve the current artifact and open it for streaming.
    ///
    /// Opening goes through `tokio::fs`, so this is only meaningful with the
    /// real filesystem.
    pub async fn open_latest(
        &self,
    ) -> std::result::Result<(BackupArtifact, tokio::fs::File), LocatorError> {
        let locator = self.clone();
        let artifact = tokio::task::spawn_blocking(move || locator.latest())
            .await
            .map_err(|e| LocatorError::Unreadable {
                name: self.dir.display().to_string(),
                source: anyhow!("backup listing worker failed: {e}"),
            })??;

        match tokio::fs::File::open(&artifact.path).await {
            Ok(file) => Ok((artifact, file)),
            Err(e) => Err(LocatorError::Unreadable {
                name: artifact.name,
                source: e.into(),
            }),
        }
    }
}
