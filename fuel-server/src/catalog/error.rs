//! Station catalog error types.

use crate::domain::StationId;

/// Errors that can occur when reading or writing the station catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// No station with this identifier exists
    #[error("station {0} not found")]
    NotFound(StationId),

    /// Reading or writing the catalog file failed
    #[error("catalog file error: {message}")]
    File { message: String },
}
