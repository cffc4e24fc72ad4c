//! Enrichment pipeline.
//!
//! Reads price-feed records, upserts them into the [`StationCatalog`] and
//! geocodes any address that lacks a location. Geocoding is sequential and
//! paced; transient failures are retried with capped exponential backoff.
//!
//! [`StationCatalog`]: crate::catalog::StationCatalog

mod config;
mod error;
mod limiter;
mod pipeline;
mod record;

pub use config::EnrichConfig;
pub use error::{EnrichError, InvalidRecord};
pub use limiter::RateLimiter;
pub use pipeline::{EnrichReport, EnrichmentPipeline, RecordOutcome, RecordStatus, StopSignal};
pub use record::{StationRecord, from_reader, read_csv};
