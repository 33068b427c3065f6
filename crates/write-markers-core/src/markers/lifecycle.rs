//! Marker directory lifecycle: existence, partition subdirectories, deletion.

use std::sync::atomic::Ordering;

use log::{info, warn};
use snafu::prelude::*;

use crate::markers::MarkerFiles;
use crate::markers::error::{MarkerResult, StorageAccessSnafu};
use crate::storage::join;

impl MarkerFiles {
    /// Whether the marker directory exists. Absence is `Ok(false)`.
    pub async fn does_marker_dir_exist(&self) -> MarkerResult<bool> {
        self.storage
            .exists(&self.marker_dir_path)
            .await
            .context(StorageAccessSnafu {
                operation: "check marker dir",
                path: &self.marker_dir_path,
            })
    }

    /// Recursively delete the marker directory of this instant.
    ///
    /// Returns `false` when there was nothing to delete. Once this succeeds
    /// the handle refuses to create further markers.
    pub async fn delete_marker_dir(&self) -> MarkerResult<bool> {
        let removed = self
            .storage
            .delete_recursive(&self.marker_dir_path)
            .await
            .context(StorageAccessSnafu {
                operation: "delete marker dir",
                path: &self.marker_dir_path,
            })?;

        self.deleted.store(true, Ordering::Release);
        if removed {
            info!("Removing marker directory at {}", self.marker_dir_path);
        } else {
            info!("No marker directory to delete at {}", self.marker_dir_path);
        }
        Ok(removed)
    }

    /// [`MarkerFiles::delete_marker_dir`] for best-effort cleanup paths:
    /// a failure is logged and swallowed.
    pub async fn quiet_delete_marker_dir(&self) {
        if let Err(e) = self.delete_marker_dir().await {
            warn!(
                "Error deleting marker directory for instant {}: {e}",
                self.instant_time
            );
        }
    }

    /// Absolute marker subdirectory for `partition_path` (the marker
    /// directory itself for an unpartitioned table).
    pub fn partition_marker_dir(&self, partition_path: &str) -> String {
        join(&self.marker_dir_path, partition_path)
    }

    /// Create the marker subdirectory for `partition_path` and any missing
    /// ancestors. Idempotent and safe to race with other writers.
    pub async fn ensure_partition_dir(&self, partition_path: &str) -> MarkerResult<String> {
        let dir = self.partition_marker_dir(partition_path);
        self.storage
            .create_dir_all(&dir)
            .await
            .context(StorageAccessSnafu {
                operation: "create marker partition dir",
                path: &dir,
            })?;
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use crate::markers::IoType;
    use crate::markers::error::MarkerError;
    use crate::markers::test_util::*;
    use crate::storage::{StorageBackend, StorageOp};

    #[tokio::test]
    async fn marker_dir_is_created_lazily() -> TestResult {
        let (storage, markers) = memory_markers();
        assert!(!markers.does_marker_dir_exist().await?);

        markers.create("2023/01/01", "f.parquet", IoType::Create).await?;
        assert!(markers.does_marker_dir_exist().await?);
        assert!(storage.exists(&markers.partition_marker_dir("2023/01/01")).await?);
        Ok(())
    }

    #[tokio::test]
    async fn delete_missing_dir_returns_false() -> TestResult {
        let (_storage, markers) = memory_markers();
        assert!(!markers.delete_marker_dir().await?);
        Ok(())
    }

    #[tokio::test]
    async fn delete_removes_every_marker_and_subdirectory() -> TestResult {
        let (storage, markers) = memory_markers();
        markers.create("2023/01/01", "a.parquet", IoType::Create).await?;
        markers.create("2023/01/02", "b.parquet", IoType::Merge).await?;
        markers.create("", "c.log", IoType::Append).await?;

        assert!(markers.delete_marker_dir().await?);
        assert!(!markers.does_marker_dir_exist().await?);
        assert_eq!(storage.file_count(), 0);
        assert!(markers.all_marker_file_paths().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn existence_check_failure_is_storage_access() -> TestResult {
        let (storage, markers) = memory_markers();
        storage.inject_failure(StorageOp::Exists, "permission denied");

        let err = markers
            .does_marker_dir_exist()
            .await
            .expect_err("injected failure");
        assert!(err.is_storage());
        Ok(())
    }

    #[tokio::test]
    async fn delete_failure_propagates() -> TestResult {
        let (storage, markers) = memory_markers();
        markers.create("p", "f", IoType::Create).await?;
        storage.inject_failure(StorageOp::DeleteRecursive, "store unavailable");

        let err = markers.delete_marker_dir().await.expect_err("injected failure");
        assert!(matches!(err, MarkerError::StorageAccess { .. }));

        storage.clear_failures();
        assert!(markers.does_marker_dir_exist().await?);
        // The failed delete did not finish the instant.
        markers.create("p", "g", IoType::Create).await?;
        Ok(())
    }

    #[tokio::test]
    async fn quiet_delete_swallows_storage_failures() -> TestResult {
        let (storage, markers) = memory_markers();
        markers.create("p", "f", IoType::Create).await?;
        storage.inject_failure(StorageOp::DeleteRecursive, "store unavailable");

        markers.quiet_delete_marker_dir().await;

        storage.clear_failures();
        assert!(markers.does_marker_dir_exist().await?);
        Ok(())
    }

    #[tokio::test]
    async fn quiet_delete_removes_dir_when_store_is_healthy() -> TestResult {
        let (_storage, markers) = memory_markers();
        markers.create("p", "f", IoType::Create).await?;

        markers.quiet_delete_marker_dir().await;
        assert!(!markers.does_marker_dir_exist().await?);
        Ok(())
    }

    #[tokio::test]
    async fn ensure_partition_dir_is_idempotent() -> TestResult {
        let (storage, markers) = memory_markers();
        let first = markers.ensure_partition_dir("2023/01/01").await?;
        let second = markers.ensure_partition_dir("/2023/01/01/").await?;
        assert_eq!(first, second);
        assert_eq!(first, format!("{MARKER_DIR}/2023/01/01"));
        assert!(storage.exists(&first).await?);
        Ok(())
    }

    #[tokio::test]
    async fn ensure_partition_dir_failure_is_storage_access() -> TestResult {
        let (storage, markers) = memory_markers();
        storage.inject_failure(StorageOp::CreateDirAll, "quota exceeded");

        let err = markers
            .ensure_partition_dir("p")
            .await
            .expect_err("injected failure");
        assert!(err.is_storage());
        assert!(err.to_string().contains("quota exceeded"));
        Ok(())
    }
}
