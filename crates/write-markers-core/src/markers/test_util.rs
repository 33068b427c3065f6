use std::sync::Arc;

use crate::markers::MarkerFiles;
use crate::storage::{MemoryStorage, StorageBackend};

pub(crate) type TestResult = Result<(), Box<dyn std::error::Error>>;

pub(crate) const BASE_PATH: &str = "/tbl";
pub(crate) const INSTANT: &str = "20230101000000";
pub(crate) const MARKER_DIR: &str = "/tbl/.hoodie/.temp/20230101000000";

/// Markers for [`INSTANT`] under [`BASE_PATH`], backed by a fresh in-memory store.
pub(crate) fn memory_markers() -> (Arc<MemoryStorage>, MarkerFiles) {
    let storage = Arc::new(MemoryStorage::new());
    let backend: Arc<dyn StorageBackend> = storage.clone();
    let markers = MarkerFiles::new(backend, BASE_PATH, MARKER_DIR, INSTANT);
    (storage, markers)
}
