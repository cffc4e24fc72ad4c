//! Batch ingestion of price-feed records into the station catalog.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::StationCatalog;
use crate::domain::{Coordinate, GeocodeState, StationId};
use crate::geocode::{GeocodeAttempt, Geocoder};

use super::config::EnrichConfig;
use super::error::{EnrichError, InvalidRecord};
use super::limiter::RateLimiter;
use super::record::StationRecord;

/// Cooperative stop request for a running enrichment batch.
///
/// Clones share the same flag. The pipeline checks it before each record,
/// so the record in progress always completes.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the pipeline to stop before the next record.
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What happened to one input record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum RecordStatus {
    /// Stored; the station already had a location for its address.
    Updated,
    /// Stored and its address resolved to a new location.
    Geocoded,
    /// Stored, but the address is unresolvable. Not retried.
    GeocodeFailedPermanent(String),
    /// Stored without a location; the geocoder kept failing transiently.
    GeocodeFailedTransientExhausted(String),
    /// Rejected before reaching the catalog.
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordOutcome {
    /// Absent when the record had no usable identifier.
    pub station_id: Option<StationId>,
    #[serde(flatten)]
    pub status: RecordStatus,
}

/// Summary of an enrichment run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnrichReport {
    pub processed: usize,
    pub updated: usize,
    pub geocoded: usize,
    pub failed_permanent: usize,
    pub failed_transient: usize,
    pub invalid: usize,
    /// The run ended on a stop request before reaching the last record.
    pub stopped_early: bool,
    pub outcomes: Vec<RecordOutcome>,
}

impl EnrichReport {
    fn record(&mut self, outcome: RecordOutcome) {
        self.processed += 1;
        match outcome.status {
            RecordStatus::Updated => self.updated += 1,
            RecordStatus::Geocoded => self.geocoded += 1,
            RecordStatus::GeocodeFailedPermanent(_) => self.failed_permanent += 1,
            RecordStatus::GeocodeFailedTransientExhausted(_) => self.failed_transient += 1,
            RecordStatus::Invalid(_) => self.invalid += 1,
        }
        self.outcomes.push(outcome);
    }
}

/// Result of a bounded retry loop against the geocoder.
enum Resolution {
    Resolved(Coordinate),
    Permanent(String),
    Exhausted { attempts: u32, last_error: String },
}

/// Upserts records into the catalog and geocodes addresses lacking a
/// location.
///
/// Records are processed strictly in order and geocoding requests go
/// through a shared [`RateLimiter`], so the geocoder never sees concurrent
/// requests from one pipeline.
pub struct EnrichmentPipeline<G> {
    catalog: StationCatalog,
    geocoder: G,
    config: EnrichConfig,
    limiter: RateLimiter,
}

impl<G: Geocoder> EnrichmentPipeline<G> {
    pub fn new(catalog: StationCatalog, geocoder: G, config: EnrichConfig) -> Self {
        let limiter = RateLimiter::new(config.min_request_interval);
        Self {
            catalog,
            geocoder,
            config,
            limiter,
        }
    }

    pub fn catalog(&self) -> &StationCatalog {
        &self.catalog
    }

    /// Process a batch of records.
    ///
    /// Per-record failures are recorded in the report. Only a failure to
    /// persist the catalog ends the run with an error.
    pub async fn run<I>(&self, records: I, stop: &StopSignal) -> Result<EnrichReport, EnrichError>
    where
        I: IntoIterator<Item = Result<StationRecord, InvalidRecord>>,
    {
        let mut report = EnrichReport::default();
        let mut since_flush = 0;

        for record in records {
            if stop.is_stopped() {
                info!(processed = report.processed, "stop requested, ending enrichment early");
                report.stopped_early = true;
                break;
            }

            let outcome = match record {
                Ok(record) => self.process_record(record).await?,
                Err(invalid) => RecordOutcome {
                    station_id: None,
                    status: RecordStatus::Invalid(invalid.message),
                },
            };
            if let RecordStatus::Invalid(reason) = &outcome.status {
                warn!(%reason, "skipping invalid record");
            }
            report.record(outcome);

            since_flush += 1;
            if self.config.flush_every > 0 && since_flush >= self.config.flush_every {
                let written = self.catalog.flush().await?;
                debug!(written, "periodic catalog flush");
                since_flush = 0;
            }
        }

        self.catalog.flush().await?;

        info!(
            processed = report.processed,
            updated = report.updated,
            geocoded = report.geocoded,
            failed_permanent = report.failed_permanent,
            failed_transient = report.failed_transient,
            invalid = report.invalid,
            stopped_early = report.stopped_early,
            "enrichment run finished"
        );

        Ok(report)
    }

    /// Upsert one record and geocode it if its location is missing.
    pub async fn process_record(&self, record: StationRecord) -> Result<RecordOutcome, EnrichError> {
        let raw_id = record.id.clone();
        let update = match record.into_update() {
            Ok(update) => update,
            Err(invalid) => {
                return Ok(RecordOutcome {
                    station_id: StationId::parse(&raw_id).ok(),
                    status: RecordStatus::Invalid(invalid.message),
                });
            }
        };

        let id = update.id.clone();
        let upserted = self.catalog.upsert(update).await;
        let station = upserted.station;

        let outcome = |status| RecordOutcome {
            station_id: Some(id.clone()),
            status,
        };

        if station.location.is_some() {
            return Ok(outcome(RecordStatus::Updated));
        }

        let address = station.full_address();

        if station.geocode == GeocodeState::Unresolvable {
            debug!(station = %id, "address previously unresolvable, not geocoding");
            return Ok(outcome(RecordStatus::GeocodeFailedPermanent(
                "address previously marked unresolvable".to_string(),
            )));
        }

        match self.resolve(&address).await {
            Resolution::Resolved(location) => {
                if self.catalog.set_location(&id, &address, location).await? {
                    debug!(station = %id, %location, "geocoded");
                    Ok(outcome(RecordStatus::Geocoded))
                } else {
                    debug!(station = %id, "address changed while geocoding, location discarded");
                    Ok(outcome(RecordStatus::Updated))
                }
            }
            Resolution::Permanent(reason) => {
                self.catalog.mark_unresolvable(&id, &address).await?;
                warn!(station = %id, %address, %reason, "address unresolvable");
                Ok(outcome(RecordStatus::GeocodeFailedPermanent(reason)))
            }
            Resolution::Exhausted {
                attempts,
                last_error,
            } => {
                warn!(
                    station = %id,
                    attempts,
                    error = %last_error,
                    "geocoding failed, leaving location empty"
                );
                Ok(outcome(RecordStatus::GeocodeFailedTransientExhausted(
                    last_error,
                )))
            }
        }
    }

    /// Geocode with bounded retries on transient failures.
    async fn resolve(&self, address: &str) -> Resolution {
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            self.limiter.acquire().await;

            match self.geocoder.geocode(address).await {
                GeocodeAttempt::Success(location) => return Resolution::Resolved(location),
                GeocodeAttempt::PermanentFailure(reason) => return Resolution::Permanent(reason),
                GeocodeAttempt::TransientFailure(reason) => {
                    debug!(%address, attempt, %reason, "transient geocoding failure");
                    last_error = reason;
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(self.config.backoff_delay(attempt)).await;
            }
        }

        Resolution::Exhausted {
            attempts: max_attempts,
            last_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogFile;
    use crate::geocode::ScriptedGeocoder;
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio::time::Instant;

    fn rec(id: &str, address: &str, price: Option<f64>) -> StationRecord {
        StationRecord {
            id: id.to_string(),
            name: format!("Stop {id}"),
            address: address.to_string(),
            city: "Tulsa".to_string(),
            state: "OK".to_string(),
            rack_id: None,
            price,
        }
    }

    fn full(address: &str) -> String {
        format!("{address}, Tulsa, OK, USA")
    }

    fn coord() -> Coordinate {
        Coordinate::new(36.15, -95.99).unwrap()
    }

    fn sid(s: &str) -> StationId {
        StationId::parse(s).unwrap()
    }

    fn ok(records: Vec<StationRecord>) -> Vec<Result<StationRecord, InvalidRecord>> {
        records.into_iter().map(Ok).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn new_station_is_geocoded() {
        let catalog = StationCatalog::new();
        let geocoder = ScriptedGeocoder::new();
        geocoder.always_resolve(&full("1 Main St"), coord());
        let pipeline = EnrichmentPipeline::new(catalog.clone(), geocoder, EnrichConfig::default());

        let report = pipeline
            .run(ok(vec![rec("1", "1 Main St", Some(3.1))]), &StopSignal::new())
            .await
            .unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.geocoded, 1);
        let station = catalog.get_by_id(&sid("1")).await.unwrap();
        assert_eq!(station.location, Some(coord()));
        assert_eq!(station.geocode, GeocodeState::Resolved);
    }

    #[tokio::test(start_paused = true)]
    async fn rerun_with_unreachable_geocoder_changes_nothing() {
        let catalog = StationCatalog::new();
        let batch = vec![
            rec("1", "1 Main St", Some(3.1)),
            rec("2", "2 Main St", Some(3.2)),
        ];

        let geocoder = ScriptedGeocoder::new();
        geocoder.always_resolve(&full("1 Main St"), coord());
        geocoder.always_resolve(&full("2 Main St"), coord());
        EnrichmentPipeline::new(catalog.clone(), geocoder, EnrichConfig::default())
            .run(ok(batch.clone()), &StopSignal::new())
            .await
            .unwrap();
        let before = catalog.snapshot().await;

        let unreachable = ScriptedGeocoder::new()
            .with_fallback(GeocodeAttempt::TransientFailure("connection refused".into()));
        let report = EnrichmentPipeline::new(catalog.clone(), unreachable.clone(), EnrichConfig::default())
            .run(ok(batch), &StopSignal::new())
            .await
            .unwrap();

        assert_eq!(report.updated, 2);
        assert_eq!(unreachable.call_count(), 0);
        let after = catalog.snapshot().await;
        assert_eq!(before.stations(), after.stations());
    }

    #[tokio::test(start_paused = true)]
    async fn later_price_wins_for_same_id() {
        let catalog = StationCatalog::new();
        let geocoder = ScriptedGeocoder::new();
        geocoder.always_resolve(&full("1 Main St"), coord());
        let pipeline = EnrichmentPipeline::new(catalog.clone(), geocoder.clone(), EnrichConfig::default());

        pipeline
            .run(ok(vec![rec("7", "1 Main St", Some(3.00))]), &StopSignal::new())
            .await
            .unwrap();
        pipeline
            .run(ok(vec![rec("7", "1 Main St", Some(3.25))]), &StopSignal::new())
            .await
            .unwrap();

        assert_eq!(catalog.len().await, 1);
        let station = catalog.get_by_id(&sid("7")).await.unwrap();
        assert_eq!(station.price, Some(3.25));
        assert_eq!(station.location, Some(coord()));
        // Second run found the location already present.
        assert_eq!(geocoder.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failure_is_not_retried() {
        let catalog = StationCatalog::new();
        let geocoder = ScriptedGeocoder::new();
        let pipeline = EnrichmentPipeline::new(catalog.clone(), geocoder.clone(), EnrichConfig::default());

        let report = pipeline
            .run(ok(vec![rec("1", "Nowhere Rd", Some(3.1))]), &StopSignal::new())
            .await
            .unwrap();

        assert_eq!(report.failed_permanent, 1);
        assert_eq!(geocoder.call_count(), 1);
        let station = catalog.get_by_id(&sid("1")).await.unwrap();
        assert_eq!(station.geocode, GeocodeState::Unresolvable);
        assert_eq!(station.price, Some(3.1));

        // A later run skips the geocoder for the same address.
        let report = pipeline
            .run(ok(vec![rec("1", "Nowhere Rd", Some(3.1))]), &StopSignal::new())
            .await
            .unwrap();
        assert_eq!(report.failed_permanent, 1);
        assert_eq!(geocoder.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn address_change_retries_unresolvable_station() {
        let catalog = StationCatalog::new();
        let geocoder = ScriptedGeocoder::new();
        geocoder.always_resolve(&full("3 Main St"), coord());
        let pipeline = EnrichmentPipeline::new(catalog.clone(), geocoder.clone(), EnrichConfig::default());

        pipeline
            .run(ok(vec![rec("1", "Nowhere Rd", None)]), &StopSignal::new())
            .await
            .unwrap();
        let report = pipeline
            .run(ok(vec![rec("1", "3 Main St", None)]), &StopSignal::new())
            .await
            .unwrap();

        assert_eq!(report.geocoded, 1);
        let station = catalog.get_by_id(&sid("1")).await.unwrap();
        assert_eq!(station.geocode, GeocodeState::Resolved);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_retry_with_backoff_then_give_up() {
        let catalog = StationCatalog::new();
        let geocoder = ScriptedGeocoder::new()
            .with_fallback(GeocodeAttempt::TransientFailure("503".into()));
        let config = EnrichConfig::default().with_min_request_interval(Duration::ZERO);
        let pipeline = EnrichmentPipeline::new(catalog.clone(), geocoder.clone(), config);

        let start = Instant::now();
        let report = pipeline
            .run(ok(vec![rec("1", "1 Main St", Some(3.1))]), &StopSignal::new())
            .await
            .unwrap();

        assert_eq!(geocoder.call_count(), 3);
        // 1 s then 2 s between the three attempts
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert_eq!(report.failed_transient, 1);
        assert_eq!(
            report.outcomes[0].status,
            RecordStatus::GeocodeFailedTransientExhausted("503".into())
        );

        let station = catalog.get_by_id(&sid("1")).await.unwrap();
        assert_eq!(station.location, None);
        assert_eq!(station.geocode, GeocodeState::Pending);
        assert_eq!(station.price, Some(3.1));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failure_then_success() {
        let catalog = StationCatalog::new();
        let geocoder = ScriptedGeocoder::new();
        geocoder.script(
            &full("1 Main St"),
            [
                GeocodeAttempt::TransientFailure("429".into()),
                GeocodeAttempt::Success(coord()),
            ],
        );
        let pipeline = EnrichmentPipeline::new(catalog.clone(), geocoder.clone(), EnrichConfig::default());

        let report = pipeline
            .run(ok(vec![rec("1", "1 Main St", None)]), &StopSignal::new())
            .await
            .unwrap();

        assert_eq!(report.geocoded, 1);
        assert_eq!(geocoder.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_records_do_not_abort_batch() {
        let catalog = StationCatalog::new();
        let geocoder = ScriptedGeocoder::new();
        geocoder.always_resolve(&full("2 Main St"), coord());
        let pipeline = EnrichmentPipeline::new(catalog.clone(), geocoder, EnrichConfig::default());

        let records = vec![
            Err(InvalidRecord::new("CSV deserialize error: record 1")),
            Ok(rec("  ", "1 Main St", Some(3.1))),
            Ok(rec("9", "9 Main St", Some(-2.0))),
            Ok(rec("2", "2 Main St", Some(3.2))),
        ];
        let report = pipeline.run(records, &StopSignal::new()).await.unwrap();

        assert_eq!(report.processed, 4);
        assert_eq!(report.invalid, 3);
        assert_eq!(report.geocoded, 1);
        assert_eq!(report.outcomes[2].station_id, Some(sid("9")));
        assert_eq!(catalog.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_address_is_invalid_and_never_geocoded() {
        let catalog = StationCatalog::new();
        let geocoder = ScriptedGeocoder::new();
        geocoder.always_resolve("USA", Coordinate::new(39.78, -100.44).unwrap());
        let pipeline =
            EnrichmentPipeline::new(catalog.clone(), geocoder.clone(), EnrichConfig::default());

        let mut blank = rec("99", "  ", Some(3.1));
        blank.city = String::new();
        blank.state = String::new();
        let report = pipeline.run(ok(vec![blank]), &StopSignal::new()).await.unwrap();

        assert_eq!(report.invalid, 1);
        assert_eq!(report.geocoded, 0);
        assert!(matches!(report.outcomes[0].status, RecordStatus::Invalid(_)));
        assert_eq!(geocoder.call_count(), 0);
        assert!(catalog.get_by_id(&sid("99")).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn requests_are_paced() {
        let catalog = StationCatalog::new();
        let geocoder = ScriptedGeocoder::new();
        for n in 1..=3 {
            geocoder.always_resolve(&full(&format!("{n} Main St")), coord());
        }
        let pipeline = EnrichmentPipeline::new(catalog, geocoder, EnrichConfig::default());

        let start = Instant::now();
        pipeline
            .run(
                ok((1..=3)
                    .map(|n| rec(&n.to_string(), &format!("{n} Main St"), None))
                    .collect()),
                &StopSignal::new(),
            )
            .await
            .unwrap();

        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    /// Geocoder that requests a stop as soon as it is first called.
    struct StopOnFirstCall {
        stop: StopSignal,
        inner: ScriptedGeocoder,
    }

    impl Geocoder for StopOnFirstCall {
        async fn geocode(&self, address: &str) -> GeocodeAttempt {
            self.stop.stop();
            self.inner.geocode(address).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stop_finishes_current_record_and_persists() {
        let dir = tempdir().unwrap();
        let file = CatalogFile::new(dir.path().join("stations.json"));
        let catalog = StationCatalog::open(file.clone()).unwrap();

        let stop = StopSignal::new();
        let inner = ScriptedGeocoder::new();
        inner.always_resolve(&full("1 Main St"), coord());
        let geocoder = StopOnFirstCall {
            stop: stop.clone(),
            inner: inner.clone(),
        };
        let pipeline = EnrichmentPipeline::new(catalog, geocoder, EnrichConfig::default());

        let report = pipeline
            .run(
                ok(vec![
                    rec("1", "1 Main St", Some(3.1)),
                    rec("2", "2 Main St", Some(3.2)),
                ]),
                &stop,
            )
            .await
            .unwrap();

        assert!(report.stopped_early);
        assert_eq!(report.processed, 1);
        assert_eq!(report.geocoded, 1);
        assert_eq!(inner.call_count(), 1);

        let saved = file.load().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].location, Some(coord()));
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_flush_writes_progress() {
        let dir = tempdir().unwrap();
        let file = CatalogFile::new(dir.path().join("stations.json"));
        let catalog = StationCatalog::open(file.clone()).unwrap();
        let config = EnrichConfig::default().with_flush_every(1);

        let stop = StopSignal::new();
        let pipeline = EnrichmentPipeline::new(catalog, ScriptedGeocoder::new(), config);
        stop.stop();
        let report = pipeline
            .run(ok(vec![rec("1", "1 Main St", None)]), &stop)
            .await
            .unwrap();
        assert_eq!(report.processed, 0);
        assert!(report.stopped_early);

        let report = pipeline
            .run(
                ok(vec![rec("1", "1 Main St", None), rec("2", "2 Main St", None)]),
                &StopSignal::new(),
            )
            .await
            .unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(file.load().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn sample_feed_with_fixture_geocoder() {
        let data = concat!(env!("CARGO_MANIFEST_DIR"), "/data");
        let records = crate::enrich::read_csv(format!("{data}/sample_fuel_prices.csv")).unwrap();
        let geocoder =
            ScriptedGeocoder::from_file(format!("{data}/geocoder_fixture.json")).unwrap();

        let pipeline =
            EnrichmentPipeline::new(StationCatalog::new(), geocoder, EnrichConfig::default());
        let report = pipeline.run(records, &StopSignal::new()).await.unwrap();

        assert_eq!(report.processed, 6);
        assert_eq!(report.geocoded, 6);
        assert_eq!(report.invalid, 0);

        let unpriced = pipeline.catalog().get_by_id(&sid("71")).await.unwrap();
        assert_eq!(unpriced.price, None);
        assert!(unpriced.location.is_some());
        let snapshot = pipeline.catalog().snapshot().await;
        let near_tulsa = snapshot.query_near(&coord(), 60.0);
        assert_eq!(near_tulsa.len(), 1);
        assert_eq!(near_tulsa[0].0.id, sid("7"));
    }

    #[test]
    fn outcome_serializes_flat() {
        let outcome = RecordOutcome {
            station_id: Some(sid("7")),
            status: RecordStatus::GeocodeFailedPermanent("address not found".into()),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "station_id": "7",
                "status": "geocode_failed_permanent",
                "reason": "address not found"
            })
        );

        let json = serde_json::to_value(RecordOutcome {
            station_id: Some(sid("7")),
            status: RecordStatus::Updated,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"station_id": "7", "status": "updated"}));
    }
}
