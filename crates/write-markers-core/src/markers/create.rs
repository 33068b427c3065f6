//! Recording a marker ahead of a data file write.

use std::sync::atomic::Ordering;

use log::info;
use snafu::prelude::*;

use crate::markers::error::{
    MalformedMarkerPathSnafu, MarkerDirDeletedSnafu, MarkerError, MarkerResult,
};
use crate::markers::{IoType, MarkerFiles, codec};
use crate::storage::{StorageError, join};

impl MarkerFiles {
    /// Record that `data_file_name` in `partition_path` is about to be
    /// written with `io_type`, returning the absolute marker path.
    ///
    /// The marker path is
    /// `<marker_dir>/<partition_path>/<data_file_name><suffix>.<IOTYPE>`.
    ///
    /// Creation is exclusive at the storage layer: if a marker for the same
    /// partition, file and I/O type is already recorded this fails with
    /// [`MarkerError::MarkerAlreadyExists`] and leaves the marker set as it
    /// was. Callers retrying a write idempotently can treat that error as
    /// "already recorded" (see [`MarkerError::is_already_exists`]).
    pub async fn create(
        &self,
        partition_path: &str,
        data_file_name: &str,
        io_type: IoType,
    ) -> MarkerResult<String> {
        ensure!(
            !self.deleted.load(Ordering::Acquire),
            MarkerDirDeletedSnafu {
                instant: &self.instant_time
            }
        );

        let suffix = self.layout.marker_suffix();
        let marker_name = codec::marker_file_name(data_file_name, io_type, suffix);
        ensure!(
            !data_file_name.is_empty() && !data_file_name.contains('/'),
            MalformedMarkerPathSnafu {
                path: join(partition_path, &marker_name),
                suffix,
            }
        );

        // Create the partition directory as needed.
        let dir = self.ensure_partition_dir(partition_path).await?;
        let marker_path = join(&dir, &marker_name);

        info!("Creating Marker Path={marker_path}");
        match self.storage.create_new(&marker_path).await {
            Ok(()) => Ok(marker_path),
            Err(source @ StorageError::AlreadyExists { .. }) => {
                Err(MarkerError::MarkerAlreadyExists {
                    path: marker_path,
                    source,
                })
            }
            Err(source) => Err(MarkerError::StorageAccess {
                operation: "create marker",
                path: marker_path,
                source,
            }),
        }
    }
}
