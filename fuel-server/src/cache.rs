//! Caching layer for routing service responses.
//!
//! Routes between the same pair of points rarely change, and the routing
//! API is both slow and quota-limited. Endpoints are quantized to about a
//! meter so that requests differing only by float noise share an entry.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;

use crate::domain::{Coordinate, RawRoute};
use crate::routing::{RouteProvider, RoutingError};

/// Quantization step for cache keys, in degrees (about 1.1 m of latitude).
const KEY_RESOLUTION_DEG: f64 = 1e-5;

/// Cache key for routes: (start lat, start lon, end lat, end lon), each in
/// units of `KEY_RESOLUTION_DEG`.
type RouteKey = (i64, i64, i64, i64);

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(600),
            max_capacity: 1000,
        }
    }
}

fn quantize(degrees: f64) -> i64 {
    (degrees / KEY_RESOLUTION_DEG).round() as i64
}

fn route_key(start: &Coordinate, end: &Coordinate) -> RouteKey {
    (
        quantize(start.lat()),
        quantize(start.lon()),
        quantize(end.lat()),
        quantize(end.lon()),
    )
}

/// Route provider with caching.
///
/// Wraps any `RouteProvider` and caches successful responses. Errors are
/// never cached.
pub struct CachedRouteProvider<P> {
    inner: P,
    routes: MokaCache<RouteKey, Arc<RawRoute>>,
}

impl<P: RouteProvider> CachedRouteProvider<P> {
    /// Create a new cached provider.
    pub fn new(inner: P, config: &CacheConfig) -> Self {
        let routes = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { inner, routes }
    }

    /// Access the underlying provider for requests that bypass the cache.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Invalidate all cached entries.
    pub fn invalidate_cache(&self) {
        self.routes.invalidate_all();
    }
}

impl<P: RouteProvider> RouteProvider for CachedRouteProvider<P> {
    async fn route(&self, start: Coordinate, end: Coordinate) -> Result<RawRoute, RoutingError> {
        let key = route_key(&start, &end);

        if let Some(cached) = self.routes.get(&key).await {
            return Ok(RawRoute::clone(&cached));
        }

        let route = self.inner.route(start, end).await?;
        self.routes.insert(key, Arc::new(route.clone())).await;

        Ok(route)
    }
}
