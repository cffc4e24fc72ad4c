//! Application state for the web layer.

use std::sync::Arc;

use crate::catalog::StationCatalog;
use crate::enrich::{EnrichmentPipeline, StopSignal};
use crate::geocode::Geocoder;
use crate::planner::TripPlanner;
use crate::routing::RouteProvider;

/// Shared application state.
///
/// Generic over the route provider and the geocoder so tests can run the
/// router against in-memory collaborators.
pub struct AppState<R, G> {
    /// Trip planner (owns a catalog handle)
    pub planner: Arc<TripPlanner<R>>,

    /// Station import pipeline (shares the planner's catalog)
    pub enrichment: Arc<EnrichmentPipeline<G>>,

    /// Raised on shutdown so running imports stop between records
    pub shutdown: StopSignal,
}

impl<R, G> Clone for AppState<R, G> {
    fn clone(&self) -> Self {
        Self {
            planner: Arc::clone(&self.planner),
            enrichment: Arc::clone(&self.enrichment),
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<R: RouteProvider, G: Geocoder> AppState<R, G> {
    /// Create a new app state.
    pub fn new(planner: TripPlanner<R>, enrichment: EnrichmentPipeline<G>) -> Self {
        Self {
            planner: Arc::new(planner),
            enrichment: Arc::new(enrichment),
            shutdown: StopSignal::new(),
        }
    }

    /// Use an existing stop signal, typically wired to Ctrl-C.
    pub fn with_shutdown(mut self, shutdown: StopSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn catalog(&self) -> &StationCatalog {
        self.planner.catalog()
    }
}
