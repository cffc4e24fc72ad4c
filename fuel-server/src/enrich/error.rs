//! Enrichment error types.

use crate::catalog::CatalogError;

/// A single input record that cannot be ingested. The batch continues.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid record: {message}")]
pub struct InvalidRecord {
    pub message: String,
}

impl InvalidRecord {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<csv::Error> for InvalidRecord {
    fn from(e: csv::Error) -> Self {
        Self::new(e.to_string())
    }
}

/// Errors that abort an enrichment run.
#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    /// The input file could not be opened or its header read
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Persisting the catalog failed
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
}
