//! Routing service client adapter.
//!
//! Fetches a driving route between two coordinates and turns it into a
//! [`RawRoute`] with distances in miles.

mod client;
mod error;
mod types;

use std::future::Future;

use crate::domain::{Coordinate, RawRoute};

pub use client::{OrsClient, OrsConfig};
pub use error::RoutingError;

/// Source of driving routes.
pub trait RouteProvider: Send + Sync {
    /// Fetch the route from `start` to `end`.
    fn route(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> impl Future<Output = Result<RawRoute, RoutingError>> + Send;
}
