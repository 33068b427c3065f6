use std::{error::Error, fmt, io};

use snafu::{Backtrace, IntoError, prelude::*};

use super::memory::StorageOp;

/// What a backend reported before [`StorageError`] classified it.
#[derive(Debug)]
pub enum BackendError {
    /// Raised by `tokio::fs` against the local filesystem.
    Local(io::Error),
    /// Refused by [`super::MemoryStorage`], either by its own bookkeeping or
    /// through an injected failure.
    Memory {
        /// The trait operation that was refused.
        op: StorageOp,
        /// Why it was refused.
        reason: String,
    },
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Local(e) => write!(f, "filesystem: {e}"),
            BackendError::Memory { op, reason } => write!(f, "in-memory store ({op:?}): {reason}"),
        }
    }
}

impl Error for BackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BackendError::Local(e) => Some(e),
            BackendError::Memory { .. } => None,
        }
    }
}

/// A storage call on a marker or marker directory path failed.
///
/// Callers branch on the variant: `AlreadyExists` is how exclusive marker
/// creation reports a duplicate, `NotFound` a missing parent directory.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StorageError {
    /// Nothing exists at `path` (or at a directory it needs).
    #[snafu(display("No such file or directory: {path}"))]
    NotFound {
        /// Path the call addressed.
        path: String,
        /// Backend detail.
        source: BackendError,
        /// Captured where the failure was classified.
        backtrace: Backtrace,
    },

    /// Exclusive creation found a file already at `path`.
    #[snafu(display("Refusing to overwrite existing file: {path}"))]
    AlreadyExists {
        /// Path the call addressed.
        path: String,
        /// Backend detail.
        source: BackendError,
        /// Captured where the failure was classified.
        backtrace: Backtrace,
    },

    /// Any other failure: permissions, throttling, a malformed `file:` URI.
    #[snafu(display("Storage call failed for {path}: {source}"))]
    OtherIo {
        /// Path the call addressed.
        path: String,
        /// Backend detail.
        source: BackendError,
        /// Captured where the failure was classified.
        backtrace: Backtrace,
    },
}

impl StorageError {
    /// Path the failing call addressed.
    pub fn path(&self) -> &str {
        match self {
            StorageError::NotFound { path, .. }
            | StorageError::AlreadyExists { path, .. }
            | StorageError::OtherIo { path, .. } => path,
        }
    }

    /// Classify a `tokio::fs` error raised while working on `path`.
    pub(crate) fn from_local(path: &str, e: io::Error) -> Self {
        let path = path.to_string();
        let kind = e.kind();
        let source = BackendError::Local(e);
        match kind {
            io::ErrorKind::NotFound => NotFoundSnafu { path }.into_error(source),
            io::ErrorKind::AlreadyExists => AlreadyExistsSnafu { path }.into_error(source),
            _ => OtherIoSnafu { path }.into_error(source),
        }
    }
}
