// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir,
}

#[derive(Debug, Default)]
struct MockState {
    entries: BTreeMap<PathBuf, MockEntry>,
    fail_writes: bool,
    fail_metadata: bool,
}

/// In-memory filesystem. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let fs = Self::default();
        fs.state
            .lock()
            .unwrap()
            .entries
            .insert(PathBuf::from("."), MockEntry::Dir);
        fs
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut state = self.state.lock().unwrap();
        if let Some(parent) = path.parent() {
            Self::ensure_dirs(&mut state.entries, parent);
        }
        state.entries.insert(path, MockEntry::File(content.into()));
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut state = self.state.lock().unwrap();
        Self::ensure_dirs(&mut state.entries, path.as_ref());
    }

    /// Make every subsequent `write` fail, to simulate a full or read-only disk.
    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_writes = fail;
    }

    /// Make every subsequent `file_len` fail, as if the file vanished or
    /// became unreadable after it was listed.
    pub fn fail_metadata(&self, fail: bool) {
        self.state.lock().unwrap().fail_metadata = fail;
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.state.lock().unwrap().entries.get(path.as_ref()) {
            Some(MockEntry::File(content)) => Some(content.clone()),
            _ => None,
        }
    }

    /// Names of the direct children of `dir`, sorted.
    pub fn file_names(&self, dir: impl AsRef<Path>) -> Vec<String> {
        let state = self.state.lock().unwrap();
        Self::children(&state.entries, dir.as_ref())
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect()
    }

    fn ensure_dirs(entries: &mut BTreeMap<PathBuf, MockEntry>, path: &Path) {
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            entries
                .entry(ancestor.to_path_buf())
                .or_insert(MockEntry::Dir);
        }
    }

    fn children<'a>(
        entries: &'a BTreeMap<PathBuf, MockEntry>,
        dir: &'a Path,
    ) -> impl Iterator<Item = PathBuf> + 'a {
        entries
            .keys()
            .filter(move |p| p.parent() == Some(dir))
            .cloned()
    }
}

impl FileSystem for MockFileSystem {
    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.add_dir(path);
        Ok(())
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if self.state.lock().unwrap().fail_writes {
            return Err(anyhow!("write refused by mock: {:?}", path));
        }
        self.add_file(path, contents);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.entries.get(path) {
            Some(MockEntry::File(_)) => {
                state.entries.remove(path);
                Ok(())
            }
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !matches!(state.entries.get(path), Some(MockEntry::Dir)) {
            return Err(anyhow!("Not a directory or not found: {:?}", path));
        }
        state.entries.retain(|p, _| !p.starts_with(path));
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(anyhow!("rename refused by mock: {:?}", to));
        }
        match state.entries.remove(from) {
            Some(MockEntry::File(content)) => {
                if let Some(parent) = to.parent() {
                    Self::ensure_dirs(&mut state.entries, parent);
                }
                state.entries.insert(to.to_path_buf(), MockEntry::File(content));
                Ok(())
            }
            Some(MockEntry::Dir) => {
                state.entries.insert(from.to_path_buf(), MockEntry::Dir);
                Err(anyhow!("Is a directory: {:?}", from))
            }
            None => Err(anyhow!("File not found: {:?}", from)),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.state.lock().unwrap().entries.contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(
            self.state.lock().unwrap().entries.get(path),
            Some(MockEntry::File(_))
        )
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(
            self.state.lock().unwrap().entries.get(path),
            Some(MockEntry::Dir)
        )
    }

    fn file_len(&self, path: &Path) -> Result<u64> {
        let state = self.state.lock().unwrap();
        if state.fail_metadata {
            return Err(anyhow!("metadata refused by mock: {:?}", path));
        }
        match state.entries.get(path) {
            Some(MockEntry::File(content)) => Ok(content.len() as u64),
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let state = self.state.lock().unwrap();
        match state.entries.get(path) {
            Some(MockEntry::Dir) => Ok(Self::children(&state.entries, path).collect()),
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}
