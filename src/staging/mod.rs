// src/staging/mod.rs

//! Upload staging area.
//!
//! Exactly one input set (one definition file plus data files) lives in the
//! staging directory at a time. See [`StagingStore`] for the locking rules
//! that keep uploads and runs from stepping on each other.

pub mod names;
pub mod spool;
pub mod store;

use std::path::PathBuf;

use serde::Serialize;

pub use spool::UploadSpool;
pub use store::{StagingLease, StagingStore};

/// Where the bytes of an uploaded file currently live.
#[derive(Debug, Clone)]
pub enum StagedSource {
    /// Held in memory; written out when staged.
    Memory(Vec<u8>),
    /// Already on disk in an [`UploadSpool`]; moved into place when staged.
    Spooled(PathBuf),
}

/// One uploaded file.
#[derive(Debug, Clone)]
pub struct StagedFile {
    /// Name as supplied by the client; sanitized before use.
    pub name: String,
    pub source: StagedSource,
}

impl StagedFile {
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            source: StagedSource::Memory(contents.into()),
        }
    }

    pub fn spooled(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: StagedSource::Spooled(path.into()),
        }
    }
}

/// What a successful `replace_inputs` stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagingReceipt {
    /// Name the definition file was stored under.
    pub definition: String,
    /// Stored data file names, sorted.
    pub data_files: Vec<String>,
    /// Client names that were skipped for not qualifying.
    pub skipped: Vec<String>,
}
