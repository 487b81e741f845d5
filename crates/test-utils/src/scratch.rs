#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use recoverd::config::ConfigFile;
use recoverd::fs::RealFileSystem;
use recoverd::http::AppState;
use tempfile::TempDir;

use crate::builders::ConfigFileBuilder;

/// Throwaway on-disk layout for one test: `staging/`, `backup/`, `work/`.
///
/// Everything is removed when the value is dropped.
pub struct Scratch {
    root: TempDir,
}

impl Scratch {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("creating scratch dir");
        for sub in ["staging", "backup", "work"] {
            fs::create_dir_all(root.path().join(sub)).expect("creating scratch subdir");
        }
        Self { root }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.root.path().join("staging")
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.root.path().join("backup")
    }

    pub fn work_dir(&self) -> PathBuf {
        self.root.path().join("work")
    }

    /// Builder with all three paths pointing into this scratch area.
    pub fn config(&self) -> ConfigFileBuilder {
        ConfigFileBuilder::new()
            .with_staging_dir(self.staging_dir())
            .with_backup_dir(self.backup_dir())
            .with_working_dir(self.work_dir())
    }

    /// Fully wired application state on the real filesystem.
    pub fn state(&self, cfg: ConfigFile) -> AppState {
        recoverd::build_state(Arc::new(RealFileSystem), cfg).expect("building app state")
    }

    pub fn write_backup(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.backup_dir().join(name);
        fs::write(&path, contents).expect("writing backup fixture");
        path
    }

    /// Sorted file names currently in the staging directory.
    pub fn staged_names(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.staging_dir())
            .expect("listing staging dir")
            .map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

impl Default for Scratch {
    fn default() -> Self {
        Self::new()
    }
}
