//! Marker path codec.
//!
//! Pure string translation between a marker file path and the data file it
//! stands for:
//!
//! ```text
//! <marker_root>/<partition…>/<data_file_name><suffix>.<IOTYPE>
//!               \__________ relative marker path __________/
//!               \______ data path ______/
//! ```

use snafu::prelude::*;
use url::{Position, Url};

use crate::markers::error::{
    MalformedMarkerPathSnafu, MarkerPathOutsideRootSnafu, MarkerResult, NotAMarkerPathSnafu,
};
use crate::markers::io_type::IoType;

/// Separator between the marker suffix and the I/O type name.
pub const IO_TYPE_SEPARATOR: char = '.';

/// Split `<data_path><suffix>.<TYPE>` into the data path and the type token.
///
/// The type token is cut first so a suffix that also matches inside the
/// type name (`.M` and `MERGE`) cannot shift the split.
fn split_marker_tail<'a>(path: &'a str, suffix: &str) -> Option<(&'a str, &'a str)> {
    let (head, type_name) = path.rsplit_once(IO_TYPE_SEPARATOR)?;
    if type_name.is_empty() || type_name.contains('/') {
        return None;
    }
    Some((head.strip_suffix(suffix)?, type_name))
}

/// Last component of a `/`-separated path.
fn file_name(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

/// Whether the file name of `path` carries the marker suffix token.
pub fn has_marker_suffix(path: &str, suffix: &str) -> bool {
    file_name(path).contains(suffix)
}

/// `path` with the marker suffix token and everything after it removed.
///
/// `"2023/01/01/f.parquet.marker.CREATE"` -> `"2023/01/01/f.parquet"`. A
/// trailing `.<TYPE>` is taken off before the suffix is matched; without
/// one the last occurrence of the suffix is used.
pub fn strip_marker_suffix<'a>(path: &'a str, suffix: &str) -> MarkerResult<&'a str> {
    split_marker_tail(path, suffix)
        .map(|(data_path, _)| data_path)
        .or_else(|| path.rfind(suffix).map(|end| &path[..end]))
        .context(MalformedMarkerPathSnafu { path, suffix })
}

/// `<data_file_name><suffix>.<IOTYPE>`
pub fn marker_file_name(data_file_name: &str, io_type: IoType, suffix: &str) -> String {
    format!("{data_file_name}{suffix}{IO_TYPE_SEPARATOR}{io_type}")
}

/// The part of `full_path` after `<marker_root>/`.
///
/// `full_path` may carry a scheme and authority (`s3://bucket/...`) that the
/// root does not; the root is located by substring search.
pub fn strip_marker_dir_prefix<'a>(
    full_path: &'a str,
    marker_root: &str,
    suffix: &str,
) -> MarkerResult<&'a str> {
    ensure!(
        has_marker_suffix(full_path, suffix),
        NotAMarkerPathSnafu {
            path: full_path,
            suffix
        }
    );

    full_path
        .match_indices(marker_root)
        .find_map(|(begin, _)| {
            full_path[begin + marker_root.len()..]
                .strip_prefix('/')
                .filter(|rest| !rest.is_empty())
        })
        .context(MarkerPathOutsideRootSnafu {
            path: full_path,
            root: marker_root,
        })
}

/// `path` parsed as a hierarchical URI, or `None` for plain paths.
fn qualified_uri(path: &str) -> Option<Url> {
    Url::parse(path).ok().filter(|url| !url.cannot_be_a_base())
}

/// Drop a leading `scheme:` or `scheme://authority`, keeping only the path.
///
/// `hdfs://nn:8020/tbl` -> `/tbl`, `file:/tbl` -> `/tbl`, `/tbl` -> `/tbl`.
/// URI paths stay percent-encoded, the same form [`normalize_path`] hands to
/// the storage backend.
pub fn path_without_scheme_and_authority(path: &str) -> String {
    match qualified_uri(path) {
        Some(url) if url.path().is_empty() => "/".to_string(),
        Some(url) => url.path().to_string(),
        None => path.to_string(),
    }
}

/// Collapse repeated slashes and drop trailing ones.
///
/// URIs are re-serialized through [`Url`], and only the part after
/// `scheme://authority` is touched.
pub fn normalize_path(path: &str) -> String {
    let url = qualified_uri(path);
    let (head, tail) = match &url {
        Some(url) => (&url[..Position::BeforePath], &url[Position::BeforePath..]),
        None => ("", path),
    };

    let mut out = String::with_capacity(path.len());
    out.push_str(head);
    let mut prev_slash = false;
    for c in tail.chars() {
        if c == '/' && prev_slash {
            continue;
        }
        prev_slash = c == '/';
        out.push(c);
    }
    while out.len() > head.len() + 1 && out.ends_with('/') {
        out.pop();
    }
    out
}

/// One marker, decoded back into the data file it guards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerEntry {
    /// Partition path relative to the table root; empty for unpartitioned tables.
    pub partition_path: String,
    /// Data file name within the partition.
    pub data_file_name: String,
    /// Why the marker was recorded.
    pub io_type: IoType,
}

impl MarkerEntry {
    /// Decode a marker path relative to the marker root.
    ///
    /// The I/O type must be one of the persisted names, matched exactly.
    pub fn parse(relative_marker_path: &str, suffix: &str) -> MarkerResult<Self> {
        let (data_path, io_type) = split_marker_tail(relative_marker_path, suffix)
            .and_then(|(data_path, name)| Some((data_path, name.parse::<IoType>().ok()?)))
            .context(MalformedMarkerPathSnafu {
                path: relative_marker_path,
                suffix,
            })?;

        let (partition_path, data_file_name) = match data_path.rfind('/') {
            Some(i) => (&data_path[..i], &data_path[i + 1..]),
            None => ("", data_path),
        };
        ensure!(
            !data_file_name.is_empty(),
            MalformedMarkerPathSnafu {
                path: relative_marker_path,
                suffix
            }
        );

        Ok(MarkerEntry {
            partition_path: partition_path.to_string(),
            data_file_name: data_file_name.to_string(),
            io_type,
        })
    }

    /// Data file path relative to the table root.
    pub fn data_path(&self) -> String {
        if self.partition_path.is_empty() {
            self.data_file_name.clone()
        } else {
            format!("{}/{}", self.partition_path, self.data_file_name)
        }
    }

    /// Marker path relative to the marker root.
    pub fn marker_path(&self, suffix: &str) -> String {
        let name = marker_file_name(&self.data_file_name, self.io_type, suffix);
        if self.partition_path.is_empty() {
            name
        } else {
            format!("{}/{}", self.partition_path, name)
        }
    }
}
