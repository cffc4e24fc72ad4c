//! Routing client error types.

/// Errors from the routing service client.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid API key
    #[error("unauthorized: check ORS_API_KEY")]
    Unauthorized,

    /// Rate limited by the routing service
    #[error("rate limited by routing service")]
    RateLimited,

    /// Service returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// Response parsed but does not describe a usable route
    #[error("invalid route response: {0}")]
    InvalidResponse(String),
}
