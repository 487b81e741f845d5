// src/backup/mod.rs

//! Backup artifact discovery.
//!
//! - [`naming`] holds the `<prefix><stamp><suffix>` convention.
//! - [`locator`] scans the backup directory and ranks matching files.

pub mod locator;
pub mod naming;

use std::path::PathBuf;

pub use locator::{BackupLocator, BackupScan};
pub use naming::{BackupNaming, NameMatch};

/// A backup file selected by the locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupArtifact {
    /// Bare file name, also used as the download name.
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}
