use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use fuel_server::cache::CachedRouteProvider;
use fuel_server::catalog::{CatalogError, CatalogFile, StationCatalog};
use fuel_server::config::{AppConfig, ConfigError};
use fuel_server::enrich::{EnrichError, EnrichmentPipeline, StopSignal, read_csv};
use fuel_server::geocode::{GeocodeError, GeocoderBackend, NominatimClient, ScriptedGeocoder};
use fuel_server::planner::TripPlanner;
use fuel_server::routing::{OrsClient, RoutingError};
use fuel_server::web::{AppState, create_router};

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "fuel_server=info,tower_http=info";

#[derive(Parser)]
#[command(author, version, about = "Plans fuel stops along driving routes")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Load a price feed CSV into the catalog, geocoding new addresses
    Import {
        /// Path to the CSV file
        csv: PathBuf,
    },
}

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Geocode(#[from] GeocodeError),
    #[error(transparent)]
    Routing(#[from] RoutingError),
    #[error(transparent)]
    Enrich(#[from] EnrichError),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Loads .env before the log filter is read
    let config = AppConfig::from_env();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match config {
        Ok(config) => match cli.command.unwrap_or(Command::Serve) {
            Command::Serve => serve(config).await,
            Command::Import { csv } => import(config, csv).await,
        },
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "fatal");
            ExitCode::FAILURE
        }
    }
}

async fn serve(config: AppConfig) -> Result<(), StartupError> {
    if config.ors.api_key.is_empty() {
        warn!("ORS_API_KEY not set, routing requests will fail");
    }

    let catalog = open_catalog(&config).await?;
    let routes = CachedRouteProvider::new(OrsClient::new(config.ors.clone())?, &config.cache);
    let planner = TripPlanner::new(routes, catalog.clone(), config.planner.clone());
    let enrichment = EnrichmentPipeline::new(catalog, geocoder(&config)?, config.enrich.clone());

    let shutdown = StopSignal::new();
    let state = AppState::new(planner, enrichment).with_shutdown(shutdown.clone());
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, strategy = %config.planner.strategy(), "fuel planner listening");
    info!("GET  /api/route?start=lon,lat&end=lon,lat");
    info!("GET  /api/stations/:id");
    info!("GET  /api/stations/near?point=lon,lat&radius_miles=r");
    info!("POST /api/stations/import");

    axum::serve(listener, app)
        .with_graceful_shutdown(ctrl_c(shutdown))
        .await?;
    info!("server stopped");
    Ok(())
}

async fn import(config: AppConfig, csv: PathBuf) -> Result<(), StartupError> {
    let catalog = open_catalog(&config).await?;
    let records = read_csv(&csv)?;
    info!(records = records.len(), path = %csv.display(), "read price feed");

    let pipeline = EnrichmentPipeline::new(catalog, geocoder(&config)?, config.enrich.clone());
    let stop = StopSignal::new();
    let watcher = tokio::spawn(ctrl_c(stop.clone()));

    let report = pipeline.run(records, &stop).await;
    watcher.abort();
    report?;
    Ok(())
}

async fn open_catalog(config: &AppConfig) -> Result<StationCatalog, CatalogError> {
    let catalog = StationCatalog::open(CatalogFile::new(&config.catalog_path))?;
    info!(
        stations = catalog.len().await,
        path = %config.catalog_path.display(),
        "loaded station catalog"
    );
    Ok(catalog)
}

fn geocoder(config: &AppConfig) -> Result<GeocoderBackend, GeocodeError> {
    match &config.geocoder_fixture {
        Some(path) => {
            info!(path = %path.display(), "using geocoder fixture instead of Nominatim");
            Ok(GeocoderBackend::Scripted(ScriptedGeocoder::from_file(path)?))
        }
        None => Ok(GeocoderBackend::Nominatim(NominatimClient::new(
            config.nominatim.clone(),
        )?)),
    }
}

/// Wait for Ctrl-C, then raise `stop`.
async fn ctrl_c(stop: StopSignal) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested, finishing in-flight work");
    stop.stop();
}
