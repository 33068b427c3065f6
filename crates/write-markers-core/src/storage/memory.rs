//! In-process storage backend.
//!
//! Keeps the directory tree as two sorted path sets. Useful for tests and for
//! exercising error paths: [`MemoryStorage::inject_failure`] makes a chosen
//! operation fail with [`StorageError::OtherIo`] until cleared.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use snafu::IntoError;

use super::{
    AlreadyExistsSnafu, BackendError, NotFoundSnafu, OtherIoSnafu, StorageBackend, StorageResult,
    trim_trailing_slash,
};

/// Identifies one [`StorageBackend`] primitive, for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageOp {
    /// [`StorageBackend::exists`]
    Exists,
    /// [`StorageBackend::delete_recursive`]
    DeleteRecursive,
    /// [`StorageBackend::create_dir_all`]
    CreateDirAll,
    /// [`StorageBackend::create_new`]
    CreateNew,
    /// [`StorageBackend::list_files_recursive`]
    ListFilesRecursive,
}

#[derive(Debug, Default)]
struct MemoryState {
    dirs: BTreeSet<String>,
    files: BTreeSet<String>,
    failures: HashMap<StorageOp, String>,
}

impl MemoryState {
    fn check(&self, op: StorageOp, path: &str) -> StorageResult<()> {
        match self.failures.get(&op) {
            Some(msg) => Err(OtherIoSnafu {
                path: path.to_string(),
            }
            .into_error(BackendError::Memory {
                op,
                reason: msg.clone(),
            })),
            None => Ok(()),
        }
    }

    fn is_dir(&self, path: &str) -> bool {
        path.is_empty() || path == "/" || self.dirs.contains(path)
    }
}

/// Proper ancestors of `path`, nearest last (`/a/b/c` -> `/a`, `/a/b`).
fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices('/')
        .map(|(i, _)| &path[..i])
        .filter(|p| !p.is_empty() && !p.ends_with(':') && !p.ends_with('/'))
}

fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(i) => &path[..i],
        None => "",
    }
}

/// [`StorageBackend`] held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: Mutex<MemoryState>,
}

impl MemoryStorage {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        // No operation leaves the sets half-updated, so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make every subsequent call of `op` fail with `message` until
    /// [`MemoryStorage::clear_failures`] is called.
    pub fn inject_failure(&self, op: StorageOp, message: impl Into<String>) {
        self.state().failures.insert(op, message.into());
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// Number of files currently stored.
    pub fn file_count(&self) -> usize {
        self.state().files.len()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn exists(&self, path: &str) -> StorageResult<bool> {
        let path = trim_trailing_slash(path);
        let state = self.state();
        state.check(StorageOp::Exists, path)?;
        Ok(state.dirs.contains(path) || state.files.contains(path))
    }

    async fn delete_recursive(&self, path: &str) -> StorageResult<bool> {
        let path = trim_trailing_slash(path);
        let mut state = self.state();
        state.check(StorageOp::DeleteRecursive, path)?;

        let prefix = format!("{path}/");
        let before = state.dirs.len() + state.files.len();
        state.dirs.retain(|p| p != path && !p.starts_with(&prefix));
        state.files.retain(|p| p != path && !p.starts_with(&prefix));
        Ok(state.dirs.len() + state.files.len() < before)
    }

    async fn create_dir_all(&self, path: &str) -> StorageResult<()> {
        let path = trim_trailing_slash(path);
        let mut state = self.state();
        state.check(StorageOp::CreateDirAll, path)?;

        if let Some(blocker) = ancestors(path)
            .chain(std::iter::once(path))
            .find(|p| state.files.contains(*p))
        {
            return Err(OtherIoSnafu {
                path: path.to_string(),
            }
            .into_error(BackendError::Memory {
                op: StorageOp::CreateDirAll,
                reason: format!("{blocker} exists and is not a directory"),
            }));
        }

        for dir in ancestors(path).chain(std::iter::once(path)) {
            state.dirs.insert(dir.to_string());
        }
        Ok(())
    }

    async fn create_new(&self, path: &str) -> StorageResult<()> {
        let path = trim_trailing_slash(path);
        let mut state = self.state();
        state.check(StorageOp::CreateNew, path)?;

        if state.files.contains(path) || state.dirs.contains(path) {
            return Err(AlreadyExistsSnafu {
                path: path.to_string(),
            }
            .into_error(BackendError::Memory {
                op: StorageOp::CreateNew,
                reason: "file exists".to_string(),
            }));
        }
        if !state.is_dir(parent(path)) {
            return Err(NotFoundSnafu {
                path: path.to_string(),
            }
            .into_error(BackendError::Memory {
                op: StorageOp::CreateNew,
                reason: "parent directory missing".to_string(),
            }));
        }

        state.files.insert(path.to_string());
        Ok(())
    }

    async fn list_files_recursive(&self, path: &str) -> StorageResult<Vec<String>> {
        let path = trim_trailing_slash(path);
        let state = self.state();
        state.check(StorageOp::ListFilesRecursive, path)?;

        let prefix = format!("{path}/");
        Ok(state
            .files
            .iter()
            .filter(|p| p.starts_with(&prefix))
            .cloned()
            .collect())
    }
}
