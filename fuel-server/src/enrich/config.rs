//! Enrichment run configuration.

use std::time::Duration;

/// Retry, pacing and persistence settings for an enrichment run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichConfig {
    /// Maximum geocoding attempts per record, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound on any retry delay.
    pub max_backoff: Duration,
    /// Minimum gap between the starts of two geocoding requests.
    pub min_request_interval: Duration,
    /// Flush the catalog after this many records. Zero disables periodic
    /// flushing; the catalog is still flushed when the run ends.
    pub flush_every: usize,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            min_request_interval: Duration::from_secs(1),
            flush_every: 50,
        }
    }
}

impl EnrichConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    pub fn with_min_request_interval(mut self, interval: Duration) -> Self {
        self.min_request_interval = interval;
        self
    }

    pub fn with_flush_every(mut self, records: usize) -> Self {
        self.flush_every = records;
        self
    }

    /// Delay before retry number `attempt` (1-based): the initial backoff
    /// doubled for each earlier retry, capped at `max_backoff`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}
