//! Table metadata consumed by the marker subsystem.
//!
//! Markers only need three facts from the table: where it lives, how its
//! temporary directory and marker names are laid out, and (derived from
//! those) where a given instant keeps its markers.

use crate::layout::MarkerLayout;
use crate::markers::codec::normalize_path;

/// Read-only view of the table metadata the marker subsystem depends on.
pub trait TableMetaClient {
    /// Table base path, possibly fully qualified (`s3://bucket/tbl`).
    fn base_path(&self) -> &str;

    /// Naming conventions for the table's marker directories.
    fn marker_layout(&self) -> &MarkerLayout;

    /// `<base_path>/<temp_root>/<instant>`.
    fn marker_folder_path(&self, instant: &str) -> String {
        self.marker_layout()
            .marker_dir_path(self.base_path(), instant)
    }
}

/// Minimal [`TableMetaClient`] binding a base path to a layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableContext {
    base_path: String,
    layout: MarkerLayout,
}

impl TableContext {
    /// Table at `base_path` using the default marker layout.
    pub fn new(base_path: impl AsRef<str>) -> Self {
        Self::with_layout(base_path, MarkerLayout::default())
    }

    /// Table at `base_path` with a custom marker layout.
    pub fn with_layout(base_path: impl AsRef<str>, layout: MarkerLayout) -> Self {
        TableContext {
            base_path: normalize_path(base_path.as_ref()),
            layout,
        }
    }
}

impl TableMetaClient for TableContext {
    fn base_path(&self) -> &str {
        &self.base_path
    }

    fn marker_layout(&self) -> &MarkerLayout {
        &self.layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_folder_path_follows_layout() -> Result<(), Box<dyn std::error::Error>> {
        let table = TableContext::new("/tbl/");
        assert_eq!(table.base_path(), "/tbl");
        assert_eq!(
            table.marker_folder_path("20230101000000"),
            "/tbl/.hoodie/.temp/20230101000000"
        );

        let custom = TableContext::with_layout("/tbl", MarkerLayout::new("_staging", ".mk")?);
        assert_eq!(custom.marker_folder_path("7"), "/tbl/_staging/7");
        Ok(())
    }
}
