//! Local filesystem backend built on `tokio::fs`.

use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use url::Url;

use super::{StorageBackend, StorageError, StorageResult, join, trim_trailing_slash};

/// [`StorageBackend`] over the local filesystem.
///
/// Accepts plain paths as well as `file:` URIs (`file:///tmp/tbl`,
/// `file:/tmp/tbl`). Listing results keep whatever form the caller used.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl LocalStorage {
    /// Creates a new local filesystem backend.
    pub fn new() -> Self {
        LocalStorage
    }
}

/// Map a storage path onto a local filesystem path.
///
/// `file:` URIs are decoded through [`Url::to_file_path`]; anything else is
/// taken as a plain path.
fn local_path(path: &str) -> StorageResult<PathBuf> {
    if !path.starts_with("file:") {
        return Ok(PathBuf::from(path));
    }
    Url::parse(path)
        .ok()
        .and_then(|url| url.to_file_path().ok())
        .ok_or_else(|| {
            StorageError::from_local(
                path,
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "not a local file URI (remote host or malformed)",
                ),
            )
        })
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn exists(&self, path: &str) -> StorageResult<bool> {
        fs::try_exists(local_path(path)?)
            .await
            .map_err(|e| StorageError::from_local(path, e))
    }

    async fn delete_recursive(&self, path: &str) -> StorageResult<bool> {
        let abs = local_path(path)?;
        let meta = match fs::symlink_metadata(&abs).await {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(StorageError::from_local(path, e)),
        };

        let removed = if meta.is_dir() {
            fs::remove_dir_all(&abs).await
        } else {
            fs::remove_file(&abs).await
        };

        match removed {
            Ok(()) => Ok(true),
            // Lost a race with another deleter; nothing left for us to remove.
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::from_local(path, e)),
        }
    }

    async fn create_dir_all(&self, path: &str) -> StorageResult<()> {
        fs::create_dir_all(local_path(path)?)
            .await
            .map_err(|e| StorageError::from_local(path, e))
    }

    async fn create_new(&self, path: &str) -> StorageResult<()> {
        // Atomic "create only if not exists" on the target path.
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(local_path(path)?)
            .await
            .map_err(|e| StorageError::from_local(path, e))?;

        file.sync_all()
            .await
            .map_err(|e| StorageError::from_local(path, e))?;

        Ok(())
    }

    async fn list_files_recursive(&self, path: &str) -> StorageResult<Vec<String>> {
        let root = trim_trailing_slash(path).to_string();
        let mut files = Vec::new();
        let mut pending = vec![root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(local_path(&dir)?).await {
                Ok(rd) => rd,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    if dir == root {
                        return Ok(files);
                    }
                    // Subdirectory vanished between listing its parent and reading it.
                    continue;
                }
                Err(e) => return Err(StorageError::from_local(&dir, e)),
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| StorageError::from_local(&dir, e))?
            {
                let os_name = entry.file_name();
                let name = os_name.to_str().ok_or_else(|| {
                    StorageError::from_local(
                        &dir,
                        io::Error::other(format!("non UTF-8 file name {os_name:?}")),
                    )
                })?;
                let child = join(&dir, name);

                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| StorageError::from_local(&child, e))?;
                if file_type.is_dir() {
                    pending.push(child);
                } else {
                    files.push(child);
                }
            }
        }

        Ok(files)
    }
}
