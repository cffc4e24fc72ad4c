//! Geocoding client error types.

/// Errors from the geocoding HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limited by the geocoding service
    #[error("rate limited by geocoding service")]
    RateLimited,

    /// Service returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// The service found no match for the address
    #[error("address not found")]
    NotFound,

    /// A match was returned but its coordinates are unusable
    #[error("invalid result: {message}")]
    InvalidResult { message: String },
}

impl GeocodeError {
    /// Whether retrying the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            GeocodeError::Http(e) => !e.is_builder(),
            GeocodeError::RateLimited => true,
            GeocodeError::Api { status, .. } => *status >= 500,
            GeocodeError::Json { .. } | GeocodeError::NotFound | GeocodeError::InvalidResult { .. } => {
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(GeocodeError::NotFound.to_string(), "address not found");

        let err = GeocodeError::Api {
            status: 503,
            message: "Service Unavailable".into(),
        };
        assert_eq!(err.to_string(), "API error 503: Service Unavailable");
    }

    #[test]
    fn transient_classification() {
        assert!(GeocodeError::RateLimited.is_transient());
        assert!(
            GeocodeError::Api {
                status: 502,
                message: String::new()
            }
            .is_transient()
        );
        assert!(
            !GeocodeError::Api {
                status: 400,
                message: String::new()
            }
            .is_transient()
        );
        assert!(!GeocodeError::NotFound.is_transient());
        assert!(
            !GeocodeError::Json {
                message: "eof".into()
            }
            .is_transient()
        );
    }
}
