// src/staging/spool.rs

use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tempfile::TempDir;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::errors::StagingError;

const SPOOL_PREFIX: &str = ".recoverd-upload-";

/// Private scratch directory an upload streams into before it is staged.
///
/// It sits next to the staging directory, on the same filesystem, so staged
/// files are moved into place by rename rather than copied. Files that are
/// never staged are removed with the directory when the spool is dropped.
#[derive(Debug)]
pub struct UploadSpool {
    dir: TempDir,
    next: u64,
}

impl UploadSpool {
    pub fn beside(staging_dir: &Path) -> Result<Self, StagingError> {
        let parent = match staging_dir.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let dir = tempfile::Builder::new()
            .prefix(SPOOL_PREFIX)
            .tempdir_in(parent)
            .with_context(|| format!("creating upload spool in {:?}", parent))
            .map_err(StagingError::Io)?;
        Ok(Self { dir, next: 0 })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Open a fresh spool file for writing.
    pub async fn create(&mut self) -> Result<SpoolFile, StagingError> {
        let path = self.dir.path().join(format!("part-{}", self.next));
        self.next += 1;
        let file = File::create(&path)
            .await
            .with_context(|| format!("creating spool file {:?}", path))
            .map_err(StagingError::Io)?;
        Ok(SpoolFile {
            path,
            file,
            written: 0,
        })
    }
}

/// One file being written into an [`UploadSpool`].
#[derive(Debug)]
pub struct SpoolFile {
    path: PathBuf,
    file: File,
    written: u64,
}

impl SpoolFile {
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StagingError> {
        self.file
            .write_all(chunk)
            .await
            .with_context(|| format!("writing spool file {:?}", self.path))
            .map_err(StagingError::Io)?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Flush to disk and hand back the path and byte count.
    pub async fn finish(mut self) -> Result<(PathBuf, u64), StagingError> {
        self.file.flush().await.map_err(|e| sync_error(&self.path, e))?;
        self.file.sync_all().await.map_err(|e| sync_error(&self.path, e))?;
        Ok((self.path, self.written))
    }
}

fn sync_error(path: &Path, e: std::io::Error) -> StagingError {
    StagingError::Io(anyhow!("syncing spool file {:?}: {e}", path))
}
