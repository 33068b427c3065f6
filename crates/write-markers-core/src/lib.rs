//! Marker-file ledger for in-flight writes of a table storage engine.
//!
//! Every data file a write instant creates, merges or appends to is preceded
//! by an empty marker file under `<base>/<temp-root>/<instant>/`. The markers
//! give rollback a complete list of files to remove after a failed write, and
//! are discarded wholesale once the instant commits.
//!
//! - [`markers::MarkerFiles`] creates, enumerates and deletes the markers of
//!   one instant (`markers` module), with the path codec in
//!   [`markers::codec`].
//! - [`storage::StorageBackend`] is the narrow capability interface to the
//!   underlying store, with local filesystem and in-memory implementations
//!   (`storage` module).
//! - [`layout::MarkerLayout`] and [`table::TableMetaClient`] carry the naming
//!   conventions a table uses for its marker directories.
//!
//! The crate only supplies bookkeeping; deciding when to roll back and
//! deleting the data files themselves belongs to the write orchestration.
#![deny(missing_docs)]
pub mod layout;
pub mod markers;
pub mod storage;
pub mod table;

pub use layout::MarkerLayout;
pub use markers::{IoType, MarkerEntry, MarkerError, MarkerFiles, MarkerResult};
pub use storage::{LocalStorage, MemoryStorage, StorageBackend, StorageError};
pub use table::{TableContext, TableMetaClient};
