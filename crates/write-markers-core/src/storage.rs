//! Storage capability layer.
//!
//! Marker bookkeeping needs only a handful of primitives from the underlying
//! store: an existence check, recursive delete, recursive directory creation,
//! exclusive ("create only if not exists") file creation, and a recursive
//! file listing. [`StorageBackend`] captures exactly that surface so the
//! marker logic can run unchanged against the local filesystem, an in-memory
//! store (tests, failure injection), or a future object-store adapter.
//!
//! Paths are `/`-separated strings. Backends accept fully-qualified forms
//! such as `file:///tmp/tbl` and must return listed paths in the same form
//! they were asked about, so callers can locate their own prefix inside the
//! results.
//!
//! No backend retries anything; every failure is surfaced immediately as a
//! [`StorageError`].

mod error;
pub mod local;
pub mod memory;

use async_trait::async_trait;

pub use error::{BackendError, StorageError};
pub(crate) use error::{AlreadyExistsSnafu, NotFoundSnafu, OtherIoSnafu};
pub use local::LocalStorage;
pub use memory::{MemoryStorage, StorageOp};

/// General result type used by storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Hierarchical, path-addressable store consumed by the marker subsystem.
///
/// Implementations must be safe to share across tasks: many writers of one
/// instant call [`StorageBackend::create_dir_all`] and
/// [`StorageBackend::create_new`] concurrently against the same directory.
#[async_trait]
pub trait StorageBackend: Send + Sync + std::fmt::Debug {
    /// Whether a file or directory exists at `path`.
    ///
    /// Absence is `Ok(false)`; only real access failures are errors.
    async fn exists(&self, path: &str) -> StorageResult<bool>;

    /// Recursively remove `path`.
    ///
    /// Returns `Ok(false)` when there was nothing to remove.
    async fn delete_recursive(&self, path: &str) -> StorageResult<bool>;

    /// Create `path` and any missing ancestors. Succeeds if it already exists,
    /// including when a concurrent caller created it first.
    async fn create_dir_all(&self, path: &str) -> StorageResult<()>;

    /// Atomically create an empty file at `path`, failing with
    /// [`StorageError::AlreadyExists`] if anything is already there.
    ///
    /// The parent directory must already exist.
    async fn create_new(&self, path: &str) -> StorageResult<()>;

    /// Every file (not directory) below `path`, at any depth.
    ///
    /// An absent `path` yields an empty list. Order is unspecified.
    async fn list_files_recursive(&self, path: &str) -> StorageResult<Vec<String>>;
}

/// Join `child` onto `parent` with exactly one `/` between them.
///
/// An empty `child` returns `parent` unchanged (trailing slash removed).
pub fn join(parent: &str, child: &str) -> String {
    let child = child.trim_matches('/');
    let parent = trim_trailing_slash(parent);
    if child.is_empty() {
        parent.to_string()
    } else if parent.is_empty() || parent == "/" {
        format!("/{child}")
    } else {
        format!("{parent}/{child}")
    }
}

/// Strip trailing slashes, keeping a lone root `/` intact.
pub(crate) fn trim_trailing_slash(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        "/"
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_inserts_single_separator() {
        assert_eq!(join("/tbl", "a/b"), "/tbl/a/b");
        assert_eq!(join("/tbl/", "/a/b/"), "/tbl/a/b");
        assert_eq!(join("/tbl", ""), "/tbl");
        assert_eq!(join("/", "x"), "/x");
        assert_eq!(join("file:///tbl", "x"), "file:///tbl/x");
    }

    #[test]
    fn trim_trailing_slash_keeps_root() {
        assert_eq!(trim_trailing_slash("/"), "/");
        assert_eq!(trim_trailing_slash("//"), "/");
        assert_eq!(trim_trailing_slash("/a//"), "/a");
        assert_eq!(trim_trailing_slash("rel/"), "rel");
    }
}
