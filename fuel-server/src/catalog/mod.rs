//! Station catalog.
//!
//! Owns every `GasStation` record, keyed by station identifier. The
//! enrichment pipeline writes to it; planning requests read immutable
//! snapshots with an R-tree index for radius queries. The catalog can be
//! persisted to a JSON file between runs.

mod error;
mod file;
mod snapshot;
mod store;

pub use error::CatalogError;
pub use file::CatalogFile;
pub use snapshot::CatalogSnapshot;
pub use store::{StationCatalog, StationUpdate, UpsertChange, UpsertOutcome};
