//! HTTP surface: the merge endpoint, the spot board and a health check.

use crate::conditions::DerivedSample;
use crate::forecast_client::{ForecastClient, ForecastError};
use crate::poller::{PollState, PollerHandle, SpotPoller};
use crate::spots::SpotRegistry;
use crate::{config::Config, Coordinate, CoordinateError, MergedForecast};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Body of `POST /api/weather`.
#[derive(Debug, Deserialize, Serialize)]
pub struct WeatherRequest {
    pub latitude: f64,
    pub longitude: f64,
}

/// Every way `POST /api/weather` can fail. All of them answer the same 500.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("bad request body: {0}")]
    Body(#[from] JsonRejection),

    #[error(transparent)]
    Coordinate(#[from] CoordinateError),

    #[error(transparent)]
    Forecast(#[from] ForecastError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Forecast(e) => {
                error!(kind = ?e.kind(), leg = ?e.leg(), "Weather API error: {}", e)
            }
            other => error!("Weather API error: {}", other),
        }
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "Failed to fetch weather data" })),
        )
            .into_response()
    }
}

/// Running pollers, one per registered spot, in registry order.
pub struct SpotBoard {
    registry: Arc<SpotRegistry>,
    pollers: Vec<PollerHandle>,
}

impl SpotBoard {
    /// Start one poller per spot. Must be called from within a tokio runtime.
    pub fn start(registry: Arc<SpotRegistry>, client: Arc<ForecastClient>, config: &Config) -> Self {
        let pollers = registry
            .iter()
            .map(|spot| SpotPoller::new(spot.clone(), Arc::clone(&client), &config.poller).start())
            .collect();
        SpotBoard { registry, pollers }
    }

    pub fn pollers(&self) -> &[PollerHandle] {
        &self.pollers
    }

    /// Current state of every spot, with conditions at the first timestamp when ready.
    pub fn summaries(&self) -> Vec<SpotSummary> {
        self.registry
            .iter()
            .zip(self.pollers.iter())
            .map(|(spot, poller)| {
                let snapshot = poller.snapshot();
                SpotSummary {
                    name: spot.name.clone(),
                    coordinate: spot.coordinate,
                    view_url: spot.view_url(),
                    state: snapshot.state,
                    error: snapshot.error,
                    updated_at: snapshot.updated_at,
                    current: snapshot.forecast.as_deref().and_then(|f| f.sample_at(0)),
                }
            })
            .collect()
    }
}

/// One row of `GET /api/spots`.
#[derive(Debug, Serialize)]
pub struct SpotSummary {
    pub name: String,
    pub coordinate: Coordinate,
    pub view_url: String,
    pub state: PollState,
    pub error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub current: Option<DerivedSample>,
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<ForecastClient>,
    pub board: Arc<SpotBoard>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/weather", post(weather))
        .route("/api/spots", get(spots))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Bind, start the pollers and serve until the process exits.
pub async fn serve(config: Config, registry: Arc<SpotRegistry>) -> anyhow::Result<()> {
    let client = Arc::new(ForecastClient::new(&config.upstream)?);
    let board = Arc::new(SpotBoard::start(registry, Arc::clone(&client), &config));
    let app = router(AppState { client, board });

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Fetch and merge wind + wave data for an arbitrary coordinate.
async fn weather(
    State(state): State<AppState>,
    body: Result<Json<WeatherRequest>, JsonRejection>,
) -> Result<Json<MergedForecast>, ApiError> {
    let Json(request) = body?;
    let coordinate = Coordinate::new(request.latitude, request.longitude)?;

    let forecast = state.client.fetch_merged(coordinate).await?;
    info!(
        lat = coordinate.latitude,
        lon = coordinate.longitude,
        keys = forecast.series.len(),
        "Served merged forecast"
    );
    Ok(Json(forecast))
}

async fn spots(State(state): State<AppState>) -> Json<Vec<SpotSummary>> {
    Json(state.board.summaries())
}
