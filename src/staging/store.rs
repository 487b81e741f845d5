// src/staging/store.rs

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use tokio::sync::{OwnedRwLockReadGuard, RwLock};
use tracing::{debug, info, warn};

use crate::config::ConfigFile;
use crate::errors::StagingError;
use crate::fs::FileSystem;

use super::names::{has_extension, sanitize_file_name};
use super::{StagedFile, StagedSource, StagingReceipt};

/// Owner of the single-slot staging directory.
///
/// The directory is guarded by a `RwLock`: a running recovery holds a read
/// [`StagingLease`] for its whole lifetime, and [`replace_inputs`] needs the
/// write side. Replacing while a run holds the lease fails with
/// [`StagingError::InUse`] instead of waiting for the run to end.
///
/// [`replace_inputs`]: StagingStore::replace_inputs
#[derive(Debug, Clone)]
pub struct StagingStore {
    fs: Arc<dyn FileSystem>,
    dir: PathBuf,
    definition_name: String,
    data_extension: String,
    guard: Arc<RwLock<()>>,
}

impl StagingStore {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        dir: impl Into<PathBuf>,
        definition_name: impl Into<String>,
        data_extension: impl Into<String>,
    ) -> Self {
        Self {
            fs,
            dir: dir.into(),
            definition_name: definition_name.into(),
            data_extension: data_extension.into(),
            guard: Arc::new(RwLock::new(())),
        }
    }

    pub fn from_config(fs: Arc<dyn FileSystem>, cfg: &ConfigFile) -> Self {
        Self::new(
            fs,
            cfg.paths.staging_dir.clone(),
            cfg.staging.definition_name.clone(),
            cfg.staging.data_extension.clone(),
        )
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn definition_path(&self) -> PathBuf {
        self.dir.join(&self.definition_name)
    }

    /// Create the staging directory if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<(), StagingError> {
        self.fs.create_dir_all(&self.dir).map_err(StagingError::Io)
    }

    /// Replace the whole staged input set.
    ///
    /// Clears the directory, then places the definition file under the
    /// configured definition name and every data file carrying the data
    /// extension. Spooled files are renamed into place; in-memory ones are
    /// written. Other data files are skipped. On `Io` the directory may be
    /// half-cleared or half-written; callers should upload again.
    pub async fn replace_inputs(
        &self,
        definition: Option<StagedFile>,
        data_files: Vec<StagedFile>,
    ) -> Result<StagingReceipt, StagingError> {
        let definition = match definition {
            Some(def) if !def.name.trim().is_empty() => def,
            _ => return Err(StagingError::MissingRequired("definition file")),
        };
        if data_files.is_empty() {
            return Err(StagingError::MissingRequired("data files"));
        }

        let write_guard = self
            .guard
            .clone()
            .try_write_owned()
            .map_err(|_| StagingError::InUse)?;

        let store = self.clone();
        let receipt = tokio::task::spawn_blocking(move || {
            let _held = write_guard;
            store.replace_blocking(definition, data_files)
        })
        .await
        .map_err(|e| StagingError::Io(anyhow!("staging worker panicked: {e}")))??;

        info!(
            dir = ?self.dir,
            data_files = receipt.data_files.len(),
            skipped = receipt.skipped.len(),
            "staging area replaced"
        );
        Ok(receipt)
    }

    /// Take a read lease on the staging directory for the duration of a run.
    ///
    /// Waits for an in-progress `replace_inputs` to finish first.
    pub async fn lease(&self) -> StagingLease {
        let guard = self.guard.clone().read_owned().await;
        StagingLease {
            _guard: guard,
            dir: self.dir.clone(),
            definition: self.definition_path(),
        }
    }

    /// Hold the write side as an in-progress upload would.
    #[cfg(test)]
    pub(crate) async fn hold_exclusive(&self) -> tokio::sync::OwnedRwLockWriteGuard<()> {
        self.guard.clone().write_owned().await
    }

    fn replace_blocking(
        &self,
        definition: StagedFile,
        data_files: Vec<StagedFile>,
    ) -> Result<StagingReceipt, StagingError> {
        self.clear().map_err(StagingError::Io)?;

        let definition_path = self.definition_path();
        self.place(definition.source, &definition_path)
            .map_err(StagingError::Io)?;
        debug!(
            original = %definition.name,
            path = ?definition_path,
            "stored definition file"
        );

        let mut stored = BTreeSet::new();
        let mut skipped = Vec::new();

        for file in data_files {
            let name = match sanitize_file_name(&file.name) {
                Some(name) if has_extension(&name, &self.data_extension) => name,
                _ => {
                    debug!(name = %file.name, "skipping non-qualifying data file");
                    skipped.push(file.name);
                    continue;
                }
            };

            let path = self.dir.join(&name);
            self.place(file.source, &path).map_err(StagingError::Io)?;
            debug!(path = ?path, "stored data file");
            stored.insert(name);
        }

        Ok(StagingReceipt {
            definition: self.definition_name.clone(),
            data_files: stored.into_iter().collect(),
            skipped,
        })
    }

    fn place(&self, source: StagedSource, dest: &Path) -> anyhow::Result<()> {
        match source {
            StagedSource::Memory(contents) => self.fs.write(dest, &contents),
            StagedSource::Spooled(from) => self.fs.rename(&from, dest),
        }
    }

    fn clear(&self) -> anyhow::Result<()> {
        if !self.fs.is_dir(&self.dir) {
            return self.fs.create_dir_all(&self.dir);
        }

        let entries = self
            .fs
            .read_dir(&self.dir)
            .with_context(|| format!("listing staging dir {:?}", self.dir))?;

        for entry in entries {
            if self.fs.is_dir(&entry) {
                warn!(path = ?entry, "removing unexpected directory from staging area");
                self.fs.remove_dir_all(&entry)?;
            } else {
                self.fs.remove_file(&entry)?;
            }
        }
        Ok(())
    }
}

/// Read lease on the staging directory, held by a run from launch to exit.
///
/// Carries the resolved paths so the supervisor never has to rediscover the
/// staging location by convention.
#[derive(Debug)]
pub struct StagingLease {
    _guard: OwnedRwLockReadGuard<()>,
    dir: PathBuf,
    definition: PathBuf,
}

impl StagingLease {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn definition_path(&self) -> &Path {
        &self.definition
    }
}
