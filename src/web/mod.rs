mod assets;

use std::{
    convert::Infallible,
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Response,
    },
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{net::TcpListener, sync::broadcast};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::{error, info, warn};

use crate::{
    alerts::{
        catalog::{self, CatalogError},
        summarize, AlertFeed, AlertFilter, AlertSummary, ProducerSize, ProfileError, ScoredAlert,
        Severity, Tab, UserProfile,
    },
    entities::CropForm,
    farm::{CellInput, Farm, FarmError, FarmEvent},
    forms::{validate_crop_form, FieldError, CROP_FORM_STEPS},
    grid::{CellPos, FarmCell, FarmStats, GridError},
    risk::{RiskAssessment, RiskThresholds},
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unprocessable(String),
    #[error("form has invalid fields")]
    Invalid(Vec<FieldError>),
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldError>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unprocessable(_) | ApiError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let error = self.to_string();
        let fields = match self {
            ApiError::Invalid(fields) => fields,
            _ => Vec::new(),
        };
        (status, Json(ErrorBody { error, fields })).into_response()
    }
}

impl From<FarmError> for ApiError {
    fn from(err: FarmError) -> Self {
        match err {
            FarmError::Invalid(fields) => ApiError::Invalid(fields),
            FarmError::Grid(err @ GridError::OutOfBounds { .. }) => {
                ApiError::NotFound(err.to_string())
            }
            FarmError::Grid(err) => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<ProfileError> for ApiError {
    fn from(err: ProfileError) -> Self {
        ApiError::Unprocessable(err.to_string())
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

fn lock<T>(mutex: &Mutex<T>) -> std::result::Result<MutexGuard<'_, T>, ApiError> {
    mutex
        .lock()
        .map_err(|_| ApiError::Internal("state lock poisoned".to_string()))
}

pub struct AppState {
    farm: Mutex<Farm>,
    profile: Mutex<UserProfile>,
    alerts: Mutex<AlertFeed>,
    broadcaster: broadcast::Sender<String>,
    web_search_delay: Duration,
}

impl AppState {
    pub fn new(farm: Farm, alerts: AlertFeed, web_search_delay: Duration) -> Arc<Self> {
        let (tx, _) = broadcast::channel::<String>(256);
        Arc::new(Self {
            farm: Mutex::new(farm),
            profile: Mutex::new(UserProfile::default()),
            alerts: Mutex::new(alerts),
            broadcaster: tx,
            web_search_delay,
        })
    }

    fn publish(&self, event: &FarmEvent) {
        match serde_json::to_string(event) {
            // no subscribers is fine
            Ok(payload) => {
                let _ = self.broadcaster.send(payload);
            }
            Err(err) => warn!("failed to encode farm event: {err}"),
        }
    }
}

pub struct WebServerConfig {
    pub farm: Farm,
    pub alerts: AlertFeed,
    pub web_search_delay: Duration,
    pub host: String,
    pub port: u16,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/styles.css", get(styles))
        .route("/app.js", get(script))
        .route("/api/farm", get(farm_state))
        .route("/api/farm/stats", get(farm_stats))
        .route(
            "/api/farm/cells/:row/:col",
            put(save_cell).delete(reset_cell),
        )
        .route("/api/risk", post(score_risk))
        .route("/api/crops/validate", post(validate_crop))
        .route("/api/profile", get(get_profile).put(put_profile))
        .route("/api/alerts", get(list_alerts))
        .route("/api/alerts/web-search", post(search_web))
        .route("/api/events", get(stream_events))
        .with_state(state)
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig {
        farm,
        alerts,
        web_search_delay,
        host,
        port,
    } = config;

    let state = AppState::new(farm, alerts, web_search_delay);
    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;

    info!("granja dashboard live at http://{} (Ctrl+C to stop)", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for ctrl-c: {err}");
    }
    info!("shutting down");
}

async fn index() -> Html<&'static str> {
    Html(assets::INDEX_HTML)
}

async fn styles() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        assets::STYLES_CSS,
    )
}

async fn script() -> impl IntoResponse {
    (
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        assets::APP_JS,
    )
}

#[derive(Serialize)]
struct FarmEnvelope {
    rows: u32,
    cols: u32,
    risk_model: String,
    thresholds: RiskThresholds,
    cells: Vec<FarmCell>,
    stats: FarmStats,
}

async fn farm_state(State(state): State<Arc<AppState>>) -> ApiResult<FarmEnvelope> {
    let farm = lock(&state.farm)?;
    let grid = farm.grid();
    Ok(Json(FarmEnvelope {
        rows: grid.rows(),
        cols: grid.cols(),
        risk_model: farm.scorer().model_name().to_string(),
        thresholds: farm.scorer().thresholds(),
        cells: grid.cells().to_vec(),
        stats: farm.stats(),
    }))
}

async fn farm_stats(State(state): State<Arc<AppState>>) -> ApiResult<FarmStats> {
    Ok(Json(lock(&state.farm)?.stats()))
}

async fn save_cell(
    State(state): State<Arc<AppState>>,
    Path((row, col)): Path<(u32, u32)>,
    Json(input): Json<CellInput>,
) -> ApiResult<FarmEvent> {
    let event = lock(&state.farm)?.save(CellPos::new(row, col), input)?;
    state.publish(&event);
    Ok(Json(event))
}

async fn reset_cell(
    State(state): State<Arc<AppState>>,
    Path((row, col)): Path<(u32, u32)>,
) -> ApiResult<FarmEvent> {
    let event = lock(&state.farm)?.reset(CellPos::new(row, col))?;
    state.publish(&event);
    Ok(Json(event))
}

async fn score_risk(
    State(state): State<Arc<AppState>>,
    Json(form): Json<CropForm>,
) -> ApiResult<RiskAssessment> {
    Ok(Json(lock(&state.farm)?.assess(&form)))
}

#[derive(Deserialize)]
struct StepQuery {
    step: Option<u8>,
}

#[derive(Serialize)]
struct StepValidation {
    step: u8,
    valid: bool,
    errors: Vec<FieldError>,
}

async fn validate_crop(
    Query(query): Query<StepQuery>,
    Json(form): Json<CropForm>,
) -> ApiResult<StepValidation> {
    let step = query.step.unwrap_or(CROP_FORM_STEPS);
    if !(1..=CROP_FORM_STEPS).contains(&step) {
        return Err(ApiError::BadRequest(format!(
            "step must be between 1 and {CROP_FORM_STEPS}"
        )));
    }
    let errors = validate_crop_form(&form, step);
    Ok(Json(StepValidation {
        step,
        valid: errors.is_empty(),
        errors,
    }))
}

async fn get_profile(State(state): State<Arc<AppState>>) -> ApiResult<UserProfile> {
    Ok(Json(lock(&state.profile)?.clone()))
}

#[derive(Deserialize)]
struct ProfileRequest {
    #[serde(default)]
    location: String,
    #[serde(default)]
    crops: Vec<String>,
    #[serde(default)]
    producer_size: ProducerSize,
}

async fn put_profile(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProfileRequest>,
) -> ApiResult<UserProfile> {
    let profile =
        UserProfile::configure(&request.location, request.crops, request.producer_size)?;
    info!(location = %profile.location, crops = profile.crops.len(), "profile configured");
    *lock(&state.profile)? = profile.clone();
    Ok(Json(profile))
}

#[derive(Debug, Default, Deserialize)]
struct AlertQuery {
    tab: Option<String>,
    severity: Option<String>,
    location: Option<String>,
    q: Option<String>,
    #[serde(default)]
    current: bool,
}

/// Blank and "all" style values mean no constraint.
fn constraint(value: Option<String>) -> Option<String> {
    value.filter(|v| {
        let v = v.trim().to_lowercase();
        !(v.is_empty() || v == "all" || v == "todas")
    })
}

impl AlertQuery {
    fn into_filter(self) -> std::result::Result<AlertFilter, ApiError> {
        let tab = match self.tab {
            Some(tab) => tab.parse::<Tab>().map_err(ApiError::BadRequest)?,
            None => Tab::All,
        };
        let severity = constraint(self.severity)
            .map(|s| s.parse::<Severity>())
            .transpose()
            .map_err(ApiError::BadRequest)?;
        Ok(AlertFilter {
            tab,
            severity,
            location: constraint(self.location),
            query: constraint(self.q),
            current_at: self.current.then(Utc::now),
        })
    }
}

#[derive(Serialize)]
struct AlertsEnvelope {
    profile_configured: bool,
    summary: AlertSummary,
    alerts: Vec<ScoredAlert>,
}

async fn list_alerts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AlertQuery>,
) -> ApiResult<AlertsEnvelope> {
    let filter = query.into_filter()?;
    let profile = lock(&state.profile)?.clone();
    let ranked = lock(&state.alerts)?.personalized(&profile);
    let summary = summarize(&ranked);
    Ok(Json(AlertsEnvelope {
        profile_configured: profile.configured,
        summary,
        alerts: filter.apply(ranked),
    }))
}

#[derive(Serialize)]
struct WebSearchResult {
    found: usize,
    summary: AlertSummary,
}

async fn search_web(State(state): State<Arc<AppState>>) -> ApiResult<WebSearchResult> {
    let profile = lock(&state.profile)?.clone();
    let found = catalog::web_search(&profile, state.web_search_delay).await?;
    let count = found.len();
    let mut alerts = lock(&state.alerts)?;
    alerts.set_web_results(found);
    let summary = summarize(&alerts.personalized(&profile));
    Ok(Json(WebSearchResult {
        found: count,
        summary,
    }))
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let rx = state.broadcaster.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok(Event::default().event("farm").data(payload))),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
