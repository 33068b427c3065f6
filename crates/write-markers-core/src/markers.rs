//! Marker files for one write instant.
//!
//! Before a writer creates (or appends to) a data file it records an empty
//! marker file under the instant's marker directory. The set of markers is
//! the only crash-consistent record of which data files a partially-completed
//! write may have produced:
//!
//! - on commit, the orchestrator deletes the whole marker directory;
//! - on rollback, it asks for [`MarkerFiles::created_and_merged_data_paths`],
//!   deletes those data files, and then deletes the marker directory.
//!
//! Markers are only ever added. They are never rewritten and never removed
//! one by one; deleting the directory is the sole way they go away.
//!
//! ## Concurrency
//!
//! Many writer tasks share one marker directory. There is no in-process
//! locking: duplicate detection relies entirely on the backend's atomic
//! create-if-absent, and partition directory creation tolerates concurrent
//! creators. Enumeration while writers are still running may observe any
//! subset of in-flight markers, and deleting the directory must wait until
//! every writer of the instant has finished. Ordering those phases is the
//! caller's job.

pub mod codec;
mod create;
pub mod error;
pub mod io_type;
mod lifecycle;
mod listing;

#[cfg(test)]
pub(crate) mod test_util;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub use codec::MarkerEntry;
pub use error::{MarkerError, MarkerResult};
pub use io_type::{IoType, ParseIoTypeError};

use crate::layout::MarkerLayout;
use crate::markers::codec::normalize_path;
use crate::storage::StorageBackend;
use crate::table::TableMetaClient;

/// Handle on the marker directory of a single write instant.
///
/// The handle is cheap to share (`Arc<MarkerFiles>`) between the writer
/// tasks of an instant.
#[derive(Debug)]
pub struct MarkerFiles {
    storage: Arc<dyn StorageBackend>,
    base_path: String,
    marker_dir_path: String,
    marker_root: String,
    instant_time: String,
    layout: MarkerLayout,
    deleted: AtomicBool,
}

impl MarkerFiles {
    /// Markers of `instant_time` stored under `marker_dir_path`, using the
    /// default [`MarkerLayout`].
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        base_path: impl AsRef<str>,
        marker_dir_path: impl AsRef<str>,
        instant_time: impl Into<String>,
    ) -> Self {
        Self::with_layout(
            storage,
            base_path,
            marker_dir_path,
            instant_time,
            MarkerLayout::default(),
        )
    }

    /// Like [`MarkerFiles::new`] with explicit naming conventions.
    pub fn with_layout(
        storage: Arc<dyn StorageBackend>,
        base_path: impl AsRef<str>,
        marker_dir_path: impl AsRef<str>,
        instant_time: impl Into<String>,
        layout: MarkerLayout,
    ) -> Self {
        let base_path = normalize_path(base_path.as_ref());
        let instant_time = instant_time.into();
        let marker_root = layout.marker_root(&base_path, &instant_time);

        MarkerFiles {
            storage,
            marker_dir_path: normalize_path(marker_dir_path.as_ref()),
            marker_root,
            base_path,
            instant_time,
            layout,
            deleted: AtomicBool::new(false),
        }
    }

    /// Markers of `instant_time` for `table`, placed where the table's
    /// metadata says they belong.
    pub fn for_table<T>(storage: Arc<dyn StorageBackend>, table: &T, instant_time: &str) -> Self
    where
        T: TableMetaClient + ?Sized,
    {
        Self::with_layout(
            storage,
            table.base_path(),
            table.marker_folder_path(instant_time),
            instant_time,
            table.marker_layout().clone(),
        )
    }

    /// The write instant these markers belong to.
    pub fn instant_time(&self) -> &str {
        &self.instant_time
    }

    /// Table base path.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Marker directory as addressed on the storage backend.
    pub fn marker_dir_path(&self) -> &str {
        &self.marker_dir_path
    }

    /// Marker directory without scheme/authority; every listed marker path
    /// must contain it.
    pub fn marker_root(&self) -> &str {
        &self.marker_root
    }

    /// Naming conventions in use.
    pub fn layout(&self) -> &MarkerLayout {
        &self.layout
    }
}
