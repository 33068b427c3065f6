//! The reason a marker was recorded, persisted as the marker file extension.

use std::fmt;
use std::str::FromStr;

use snafu::Snafu;

/// Why a marker was recorded for a data file.
///
/// The literal name is persisted as the last extension of the marker file,
/// so the strings returned by [`IoType::as_str`] are part of the on-disk
/// format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoType {
    /// A brand-new data file.
    Create,
    /// A new file version produced by rewriting an existing file group.
    Merge,
    /// An existing file being appended to (log-style writers). The file
    /// pre-dates the write and must survive a rollback.
    Append,
}

impl IoType {
    /// All variants, in declaration order.
    pub const ALL: [IoType; 3] = [IoType::Create, IoType::Merge, IoType::Append];

    /// Persisted name: `CREATE`, `MERGE` or `APPEND`.
    pub fn as_str(self) -> &'static str {
        match self {
            IoType::Create => "CREATE",
            IoType::Merge => "MERGE",
            IoType::Append => "APPEND",
        }
    }

    /// Whether a rollback should delete the data file behind this marker.
    pub fn is_rollback_candidate(self) -> bool {
        !matches!(self, IoType::Append)
    }
}

impl fmt::Display for IoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown I/O type name.
#[derive(Debug, Snafu)]
#[snafu(display("Unknown marker I/O type '{value}' (expected CREATE, MERGE or APPEND)"))]
pub struct ParseIoTypeError {
    value: String,
}

impl FromStr for IoType {
    type Err = ParseIoTypeError;

    /// Exact match on the persisted name; `append` is not `APPEND`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IoType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseIoTypeError {
                value: s.to_string(),
            })
    }
}
