// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// In-memory filesystem for tests.
///
/// Only files are stored; a directory exists when it was created explicitly
/// via [`MockFileSystem::add_dir`] or when some file lives beneath it.
/// Paths are normalized (`./a/b` == `a/b`).
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Debug, Default)]
struct MockState {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = normalize(path.as_ref());
        self.state().files.insert(path, content.into());
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = normalize(path.as_ref());
        self.state().dirs.insert(path);
    }

    /// Snapshot of every file path currently stored, sorted.
    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.state().files.keys().cloned().collect()
    }
}

impl FileSystem for MockFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.state()
            .files
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| anyhow!("File not found: {:?}", path))
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.add_file(path, contents);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.state().files.contains_key(&normalize(path))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let path = normalize(path);
        if path.as_os_str().is_empty() {
            return true;
        }
        let state = self.state();
        state.dirs.iter().any(|d| d.starts_with(&path))
            || state.files.keys().any(|f| f != &path && f.starts_with(&path))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        if !self.is_dir(path) {
            return Err(anyhow!("Not a directory or not found: {:?}", path));
        }
        let dir = normalize(path);
        let state = self.state();
        let mut children = BTreeSet::new();
        for entry in state.files.keys().chain(state.dirs.iter()) {
            if let Ok(rest) = entry.strip_prefix(&dir) {
                if let Some(first) = rest.components().next() {
                    children.insert(dir.join(first.as_os_str()));
                }
            }
        }
        Ok(children.into_iter().collect())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        let dir = normalize(path);
        let mut state = self.state();
        state.files.retain(|f, _| !f.starts_with(&dir));
        state.dirs.retain(|d| !d.starts_with(&dir));
        Ok(())
    }
}
