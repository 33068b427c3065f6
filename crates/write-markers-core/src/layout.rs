//! On-disk layout of marker directories.
//!
//! Marker files for one write instant live under
//!
//! ```text
//! <base_path>/<temp_root>/<instant>/<partition…>/<data_file_name><marker_suffix>.<IOTYPE>
//! ```
//!
//! with `temp_root = ".hoodie/.temp"` and `marker_suffix = ".marker"` unless a
//! table overrides them through [`MarkerLayout`]. Keeping the conventions here
//! means the rest of the crate never concatenates these names by hand.

use snafu::prelude::*;

use crate::markers::codec::{normalize_path, path_without_scheme_and_authority};
use crate::storage::join;

/// Table metadata directory under the base path.
pub const META_DIR_NAME: &str = ".hoodie";

/// Default temporary working directory, relative to the base path.
pub const TEMP_DIR_NAME: &str = ".hoodie/.temp";

/// Default token separating a data file name from the marker I/O type.
pub const MARKER_SUFFIX: &str = ".marker";

/// Errors from validating a [`MarkerLayout`].
#[derive(Debug, Snafu)]
pub enum LayoutError {
    /// The temporary root must name at least one directory.
    #[snafu(display("Marker temp root must not be empty"))]
    EmptyTempRoot,

    /// The marker suffix is what identifies marker files; it cannot be empty.
    #[snafu(display("Marker suffix must not be empty"))]
    EmptyMarkerSuffix,

    /// The marker suffix lands inside a file name, so it cannot contain `/`.
    #[snafu(display("Marker suffix must not contain '/': {suffix:?}"))]
    SuffixContainsSeparator {
        /// The rejected suffix.
        suffix: String,
    },
}

/// Naming conventions for marker directories and marker files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerLayout {
    temp_root: String,
    marker_suffix: String,
}

impl Default for MarkerLayout {
    fn default() -> Self {
        MarkerLayout {
            temp_root: TEMP_DIR_NAME.to_string(),
            marker_suffix: MARKER_SUFFIX.to_string(),
        }
    }
}

impl MarkerLayout {
    /// Build a layout with a custom temp root and marker suffix.
    pub fn new(
        temp_root: impl Into<String>,
        marker_suffix: impl Into<String>,
    ) -> Result<Self, LayoutError> {
        let temp_root = temp_root.into().trim_matches('/').to_string();
        let marker_suffix = marker_suffix.into();

        ensure!(!temp_root.is_empty(), EmptyTempRootSnafu);
        ensure!(!marker_suffix.is_empty(), EmptyMarkerSuffixSnafu);
        ensure!(
            !marker_suffix.contains('/'),
            SuffixContainsSeparatorSnafu {
                suffix: marker_suffix
            }
        );

        Ok(MarkerLayout {
            temp_root,
            marker_suffix,
        })
    }

    /// Temporary working directory relative to the base path.
    pub fn temp_root(&self) -> &str {
        &self.temp_root
    }

    /// Token appended to data file names to form marker names.
    pub fn marker_suffix(&self) -> &str {
        &self.marker_suffix
    }

    /// `<base_path>/<temp_root>/<instant>`, as handed to the storage backend.
    pub fn marker_dir_path(&self, base_path: &str, instant: &str) -> String {
        normalize_path(&join(&join(base_path, &self.temp_root), instant))
    }

    /// The marker directory with scheme and authority removed.
    ///
    /// This is what gets located inside listed paths when translating them
    /// back to relative marker paths.
    pub fn marker_root(&self, base_path: &str, instant: &str) -> String {
        path_without_scheme_and_authority(&self.marker_dir_path(base_path, instant))
    }
}
