//! Error types and SNAFU context selectors for `markers`.
//!
//! Storage failures are kept apart from the validation errors so callers can
//! match on the kind: a [`MarkerError::StorageAccess`] may be worth retrying
//! at the orchestration layer, a malformed path never is.

use snafu::{Backtrace, prelude::*};

use crate::storage::StorageError;

/// Result alias for marker operations.
pub type MarkerResult<T> = Result<T, MarkerError>;

/// Errors from marker creation, enumeration and cleanup.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum MarkerError {
    /// The underlying store failed (network, permission, transient error).
    #[snafu(display("Storage access error during {operation} at {path}: {source}"))]
    StorageAccess {
        /// Which marker operation was running.
        operation: &'static str,
        /// Path the operation was addressing.
        path: String,
        /// Underlying storage error.
        #[snafu(source, backtrace)]
        source: StorageError,
    },

    /// A path that must carry the marker suffix does not.
    #[snafu(display("Malformed marker path (missing '{suffix}'): {path}"))]
    MalformedMarkerPath {
        /// The offending path.
        path: String,
        /// The suffix token that was expected.
        suffix: String,
        /// The backtrace captured when the error occurred.
        backtrace: Backtrace,
    },

    /// Prefix stripping was asked to handle something that is not a marker.
    #[snafu(display("Not a marker path (missing '{suffix}'): {path}"))]
    NotAMarkerPath {
        /// The offending path.
        path: String,
        /// The suffix token that was expected.
        suffix: String,
        /// The backtrace captured when the error occurred.
        backtrace: Backtrace,
    },

    /// A marker path does not live under the instant's marker root.
    #[snafu(display("Not in marker dir. Marker Path={path}, Expected Marker Root={root}"))]
    MarkerPathOutsideRoot {
        /// The offending path.
        path: String,
        /// The marker root it was expected to be under.
        root: String,
        /// The backtrace captured when the error occurred.
        backtrace: Backtrace,
    },

    /// Exclusive creation found a marker already recorded at this path.
    #[snafu(display("Marker already exists: {path}"))]
    MarkerAlreadyExists {
        /// The existing marker path.
        path: String,
        /// The store's report of the collision.
        source: StorageError,
    },

    /// The marker directory of this instant has already been deleted through
    /// this handle; a retry needs a fresh instant.
    #[snafu(display("Marker directory for instant {instant} was already deleted"))]
    MarkerDirDeleted {
        /// The finished instant.
        instant: String,
        /// The backtrace captured when the error occurred.
        backtrace: Backtrace,
    },
}

impl MarkerError {
    /// True for [`MarkerError::MarkerAlreadyExists`]; callers doing idempotent
    /// retries treat this as "already recorded".
    pub fn is_already_exists(&self) -> bool {
        matches!(self, MarkerError::MarkerAlreadyExists { .. })
    }

    /// True for [`MarkerError::StorageAccess`].
    pub fn is_storage(&self) -> bool {
        matches!(self, MarkerError::StorageAccess { .. })
    }
}
