//! Enumerating the markers of an instant.
//!
//! Every call performs one full walk of the marker directory. Results are in
//! backend walk order, which is not stable across calls. A missing directory
//! is an empty result. A file whose name lacks the marker suffix fails the
//! whole call, and so does an unknown I/O type wherever markers are decoded:
//! a rollback set computed from a corrupt tree would target the wrong files.

use log::debug;
use snafu::prelude::*;

use crate::markers::codec::{self, MarkerEntry};
use crate::markers::error::{MalformedMarkerPathSnafu, MarkerResult, StorageAccessSnafu};
use crate::markers::MarkerFiles;

impl MarkerFiles {
    async fn walk_marker_dir(&self) -> MarkerResult<Vec<String>> {
        let files = self
            .storage
            .list_files_recursive(&self.marker_dir_path)
            .await
            .context(StorageAccessSnafu {
                operation: "list markers",
                path: &self.marker_dir_path,
            })?;
        debug!(
            "Listed {} marker files under {}",
            files.len(),
            self.marker_dir_path
        );
        Ok(files)
    }

    /// Validate a walked path and strip the marker root from it.
    fn relative_marker_path<'a>(&self, full_path: &'a str) -> MarkerResult<&'a str> {
        let suffix = self.layout.marker_suffix();
        ensure!(
            codec::has_marker_suffix(full_path, suffix),
            MalformedMarkerPathSnafu {
                path: full_path,
                suffix
            }
        );
        codec::strip_marker_dir_prefix(full_path, &self.marker_root, suffix)
    }

    /// Every marker path relative to the marker directory, e.g.
    /// `2023/01/01/file1.parquet.marker.CREATE`.
    pub async fn all_marker_file_paths(&self) -> MarkerResult<Vec<String>> {
        self.walk_marker_dir()
            .await?
            .iter()
            .map(|full| self.relative_marker_path(full).map(str::to_string))
            .collect()
    }

    /// Data file paths (relative to the table base path) a rollback of this
    /// instant has to delete.
    ///
    /// Markers recorded with [`crate::markers::IoType::Append`] are skipped:
    /// those files existed before the write and must survive the rollback.
    /// Every marker is fully decoded first, so an unknown I/O type fails the
    /// call instead of being rolled back.
    pub async fn created_and_merged_data_paths(&self) -> MarkerResult<Vec<String>> {
        Ok(self
            .marker_entries()
            .await?
            .into_iter()
            .filter(|entry| entry.io_type.is_rollback_candidate())
            .map(|entry| entry.data_path())
            .collect())
    }

    /// Every marker decoded into partition, data file name and I/O type.
    pub async fn marker_entries(&self) -> MarkerResult<Vec<MarkerEntry>> {
        let suffix = self.layout.marker_suffix();
        self.walk_marker_dir()
            .await?
            .iter()
            .map(|full| MarkerEntry::parse(self.relative_marker_path(full)?, suffix))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use crate::layout::MarkerLayout;
    use crate::markers::error::MarkerError;
    use crate::markers::test_util::*;
    use crate::markers::{IoType, MarkerEntry, MarkerFiles};
    use crate::storage::{MemoryStorage, StorageBackend, StorageOp, join};

    fn sorted(v: Vec<String>) -> Vec<String> {
        v.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
    }

    #[tokio::test]
    async fn create_scenario_lists_marker_and_data_path() -> TestResult {
        let (_storage, markers) = memory_markers();
        markers
            .create("2023/01/01", "file1.parquet", IoType::Create)
            .await?;

        assert_eq!(
            markers.all_marker_file_paths().await?,
            vec!["2023/01/01/file1.parquet.marker.CREATE".to_string()]
        );
        assert_eq!(
            markers.created_and_merged_data_paths().await?,
            vec!["2023/01/01/file1.parquet".to_string()]
        );
        Ok(())
    }

    #[tokio::test]
    async fn append_scenario_is_not_a_rollback_candidate() -> TestResult {
        let (_storage, markers) = memory_markers();
        markers
            .create("2023/01/01", "file1.parquet", IoType::Append)
            .await?;

        assert!(markers.created_and_merged_data_paths().await?.is_empty());
        assert_eq!(
            markers.all_marker_file_paths().await?,
            vec!["2023/01/01/file1.parquet.marker.APPEND".to_string()]
        );
        Ok(())
    }

    #[tokio::test]
    async fn rollback_set_holds_every_create_and_merge() -> TestResult {
        let (_storage, markers) = memory_markers();
        markers.create("a", "c1.parquet", IoType::Create).await?;
        markers.create("a", "m1.parquet", IoType::Merge).await?;
        markers.create("b/c", "c2.parquet", IoType::Create).await?;
        markers.create("b/c", "l1.log", IoType::Append).await?;
        markers.create("", "c3.parquet", IoType::Create).await?;

        let rollback = sorted(markers.created_and_merged_data_paths().await?);
        assert_eq!(
            rollback,
            vec!["a/c1.parquet", "a/m1.parquet", "b/c/c2.parquet", "c3.parquet"]
        );
        assert_eq!(markers.all_marker_file_paths().await?.len(), 5);
        Ok(())
    }

    #[tokio::test]
    async fn every_marker_round_trips_to_partition_and_file() -> TestResult {
        let (_storage, markers) = memory_markers();
        let cases = [
            ("2023/01/01", "f1.parquet", IoType::Create),
            ("2023/01/02", "f2.parquet", IoType::Merge),
            ("x", ".f3.log.1_0-1-0", IoType::Append),
        ];
        for (partition, file, io_type) in cases {
            markers.create(partition, file, io_type).await?;
        }

        let mut entries = markers.marker_entries().await?;
        entries.sort_by(|a, b| a.data_path().cmp(&b.data_path()));
        let expected: Vec<MarkerEntry> = cases
            .iter()
            .map(|(p, f, t)| MarkerEntry {
                partition_path: p.to_string(),
                data_file_name: f.to_string(),
                io_type: *t,
            })
            .collect();
        assert_eq!(entries, expected);
        Ok(())
    }

    #[tokio::test]
    async fn missing_marker_dir_lists_nothing() -> TestResult {
        let (_storage, markers) = memory_markers();
        assert!(markers.all_marker_file_paths().await?.is_empty());
        assert!(markers.created_and_merged_data_paths().await?.is_empty());
        assert!(markers.marker_entries().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn stray_file_fails_the_whole_listing() -> TestResult {
        let (storage, markers) = memory_markers();
        markers.create("p", "good.parquet", IoType::Create).await?;
        storage.create_new(&join(MARKER_DIR, "p/stray.tmp")).await?;

        let err = markers
            .all_marker_file_paths()
            .await
            .expect_err("stray file in marker dir");
        assert!(matches!(err, MarkerError::MalformedMarkerPath { .. }));

        let err = markers
            .created_and_merged_data_paths()
            .await
            .expect_err("stray file in marker dir");
        assert!(matches!(err, MarkerError::MalformedMarkerPath { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn undecodable_io_type_fails_rollback_listing() -> TestResult {
        for planted in ["p/old.log.marker.append", "p/x.parquet.marker.UPSERT"] {
            let (storage, markers) = memory_markers();
            markers.create("p", "good.parquet", IoType::Create).await?;
            storage.create_new(&join(MARKER_DIR, planted)).await?;

            let err = markers
                .created_and_merged_data_paths()
                .await
                .expect_err("unknown io type in marker dir");
            assert!(
                matches!(err, MarkerError::MalformedMarkerPath { .. }),
                "{planted}: {err}"
            );
        }
        Ok(())
    }

    #[tokio::test]
    async fn suffix_overlapping_io_type_lists_real_data_paths() -> TestResult {
        let storage: Arc<dyn StorageBackend> = Arc::new(MemoryStorage::new());
        let layout = MarkerLayout::new(".hoodie/.temp", ".M")?;
        let markers = MarkerFiles::with_layout(storage, BASE_PATH, MARKER_DIR, INSTANT, layout);
        markers.create("p", "f.parquet", IoType::Merge).await?;
        markers.create("p", "g.parquet", IoType::Create).await?;

        assert_eq!(
            sorted(markers.created_and_merged_data_paths().await?),
            vec!["p/f.parquet", "p/g.parquet"]
        );
        let entries = markers.marker_entries().await?;
        assert!(entries.iter().any(|e| e.io_type == IoType::Merge));
        Ok(())
    }

    #[tokio::test]
    async fn suffix_in_a_partition_name_does_not_hide_stray_files() -> TestResult {
        let (storage, markers) = memory_markers();
        markers.create("p.marker", "f.parquet", IoType::Create).await?;
        storage
            .create_new(&join(MARKER_DIR, "p.marker/garbage"))
            .await?;

        let err = markers
            .all_marker_file_paths()
            .await
            .expect_err("stray file under a partition named like a marker");
        assert!(matches!(err, MarkerError::MalformedMarkerPath { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn listing_failure_is_storage_access() -> TestResult {
        let (storage, markers) = memory_markers();
        storage.inject_failure(StorageOp::ListFilesRecursive, "connection reset");

        let err = markers
            .created_and_merged_data_paths()
            .await
            .expect_err("injected failure");
        assert!(err.is_storage());
        Ok(())
    }

    #[tokio::test]
    async fn mismatched_marker_dir_reports_outside_root() -> TestResult {
        let storage: Arc<dyn StorageBackend> = Arc::new(MemoryStorage::new());
        // Marker directory that does not follow <base>/<temp>/<instant>.
        let markers = MarkerFiles::new(storage, BASE_PATH, "/elsewhere/markers", INSTANT);
        markers.create("p", "f.parquet", IoType::Create).await?;

        let err = markers
            .all_marker_file_paths()
            .await
            .expect_err("marker outside the expected root");
        match err {
            MarkerError::MarkerPathOutsideRoot { path, root, .. } => {
                assert_eq!(path, "/elsewhere/markers/p/f.parquet.marker.CREATE");
                assert_eq!(root, MARKER_DIR);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn qualified_base_path_translates_listed_uris() -> TestResult {
        let storage: Arc<dyn StorageBackend> = Arc::new(MemoryStorage::new());
        let base = "s3://bucket/tbl";
        let markers = MarkerFiles::new(
            storage,
            base,
            format!("{base}/.hoodie/.temp/{INSTANT}"),
            INSTANT,
        );
        assert_eq!(markers.marker_root(), MARKER_DIR);

        markers.create("p", "f.parquet", IoType::Merge).await?;
        assert_eq!(
            markers.created_and_merged_data_paths().await?,
            vec!["p/f.parquet".to_string()]
        );
        Ok(())
    }
}
