//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::domain::{Coordinate, StationId};
use crate::enrich::{EnrichError, EnrichReport, InvalidRecord, StationRecord};
use crate::geocode::Geocoder;
use crate::planner::PlanError;
use crate::routing::RouteProvider;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router<R, G>(state: AppState<R, G>) -> Router
where
    R: RouteProvider + 'static,
    G: Geocoder + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/api/route", get(plan_route::<R, G>))
        .route("/api/stations/near", get(stations_near::<R, G>))
        .route("/api/stations/import", post(import_stations::<R, G>))
        .route("/api/stations/:id", get(get_station::<R, G>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Plan fuel stops between two points.
async fn plan_route<R: RouteProvider, G: Geocoder>(
    State(state): State<AppState<R, G>>,
    query: Result<Query<RouteQuery>, QueryRejection>,
) -> Result<Json<RoutePlanResponse>, AppError> {
    let Query(req) = query?;
    let start = parse_point("start", &req.start)?;
    let end = parse_point("end", &req.end)?;

    let plan = state.planner.plan(start, end).await?;
    Ok(Json(RoutePlanResponse::from_plan(&plan)))
}

/// Look up one station.
async fn get_station<R: RouteProvider, G: Geocoder>(
    State(state): State<AppState<R, G>>,
    Path(id): Path<String>,
) -> Result<Json<StationResult>, AppError> {
    let id = StationId::parse(&id).map_err(|e| AppError::InvalidInput {
        message: e.to_string(),
    })?;
    let station = state
        .catalog()
        .get_by_id(&id)
        .await
        .ok_or_else(|| AppError::NotFound {
            message: format!("station {id} not found"),
        })?;
    Ok(Json(StationResult::from(&station)))
}

/// Located stations around a point, nearest first.
async fn stations_near<R: RouteProvider, G: Geocoder>(
    State(state): State<AppState<R, G>>,
    query: Result<Query<NearQuery>, QueryRejection>,
) -> Result<Json<NearResponse>, AppError> {
    let Query(req) = query?;
    let point = parse_point("point", &req.point)?;
    let radius = req
        .radius_miles
        .unwrap_or_else(|| state.planner.config().proximity_miles());
    if !radius.is_finite() || radius < 0.0 {
        return Err(AppError::InvalidInput {
            message: "radius_miles must be a non-negative number".to_string(),
        });
    }

    let stations = state
        .catalog()
        .query_near(&point, radius)
        .await
        .into_iter()
        .map(|(station, distance_miles)| NearbyStation {
            station: StationResult::from(&station),
            distance_miles,
        })
        .collect();
    Ok(Json(NearResponse { stations }))
}

/// Import a JSON array of station records.
///
/// Each element is validated on its own; a malformed element becomes an
/// `invalid` outcome and the rest of the batch still runs.
async fn import_stations<R: RouteProvider, G: Geocoder>(
    State(state): State<AppState<R, G>>,
    body: Result<Json<Vec<serde_json::Value>>, JsonRejection>,
) -> Result<Json<EnrichReport>, AppError> {
    let Json(values) = body?;
    let records = values.into_iter().map(|value| {
        serde_json::from_value::<StationRecord>(value)
            .map_err(|e| InvalidRecord::new(e.to_string()))
    });

    let report = state.enrichment.run(records, &state.shutdown).await?;
    Ok(Json(report))
}

fn parse_point(name: &str, value: &str) -> Result<Coordinate, AppError> {
    Coordinate::parse_lon_lat(value).map_err(|e| AppError::InvalidInput {
        message: format!("{name}: {e}"),
    })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    InvalidInput { message: String },
    NotFound { message: String },
    FeasibilityUnreachable { message: String },
    UpstreamUnavailable { message: String },
    Internal { message: String },
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::FeasibilityUnreachable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::InvalidInput { .. } => "invalid_input",
            AppError::NotFound { .. } => "not_found",
            AppError::FeasibilityUnreachable { .. } => "feasibility_unreachable",
            AppError::UpstreamUnavailable { .. } => "upstream_unavailable",
            AppError::Internal { .. } => "internal",
        }
    }

    fn message(self) -> String {
        match self {
            AppError::InvalidInput { message }
            | AppError::NotFound { message }
            | AppError::FeasibilityUnreachable { message }
            | AppError::UpstreamUnavailable { message }
            | AppError::Internal { message } => message,
        }
    }
}

impl From<PlanError> for AppError {
    fn from(e: PlanError) -> Self {
        let message = e.to_string();
        match e {
            PlanError::UpstreamUnavailable(_) => AppError::UpstreamUnavailable { message },
            PlanError::FeasibilityUnreachable { .. } => {
                AppError::FeasibilityUnreachable { message }
            }
        }
    }
}

impl From<EnrichError> for AppError {
    fn from(e: EnrichError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(e: QueryRejection) -> Self {
        AppError::InvalidInput {
            message: e.body_text(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::InvalidInput {
            message: e.body_text(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let code = self.code();
        let message = self.message();

        if status.is_server_error() {
            error!(%status, code, %message, "request failed");
        } else {
            warn!(%status, code, %message, "request rejected");
        }

        let body = Json(ErrorResponse {
            error: message,
            code,
        });
        (status, body).into_response()
    }
}
