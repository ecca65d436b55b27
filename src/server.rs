//! HTTP API server: axum router and request handlers.
//!
//! Handlers are thin: they translate JSON to scheduler calls and scheduler
//! errors to status codes. `start` and `stop` may block while the previous
//! effect winds down, so they run on tokio's blocking pool.

use crate::color::Color;
use crate::effects::Args;
use crate::scheduler::{Scheduler, SchedulerError, SchedulerStatus};
use crate::settings::SettingsError;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// ── App State ────────────────────────────────────────────────────────

/// Shared application state, passed to every handler via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<Scheduler>,
}

impl AppState {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler: Arc::new(scheduler),
        }
    }
}

// ── OpenAPI Documentation ────────────────────────────────────────────

#[derive(OpenApi)]
#[openapi(
    paths(get_status, get_effects, post_start, post_stop, get_settings, post_settings),
    components(schemas(
        SchedulerStatus,
        StartRequest,
        SettingsBody,
        SettingsUpdate,
        MessageResponse,
        ErrorResponse,
    )),
    tags(
        (name = "effects", description = "Effect control endpoints"),
        (name = "settings", description = "Palette and frame delay"),
        (name = "system", description = "System status endpoints"),
    ),
    info(
        title = "LED Strip API",
        version = env!("CARGO_PKG_VERSION"),
        description = "HTTP API for running effects on an addressable LED strip"
    )
)]
pub struct ApiDoc;

// ── Request/Response types ───────────────────────────────────────────

#[derive(Deserialize, utoipa::ToSchema)]
pub struct StartRequest {
    /// Registered effect name. Use GET /api/v1/effects to list them.
    #[schema(example = "rainbow_wave")]
    effect: String,
    /// Positional arguments passed through to the effect
    #[serde(default)]
    #[schema(value_type = Vec<Object>, example = json!([20, 2]))]
    args: Vec<Value>,
}

/// Current runtime settings.
#[derive(Debug, PartialEq, Serialize, utoipa::ToSchema)]
pub struct SettingsBody {
    /// Palette as hex strings
    #[schema(example = json!(["#ff0000", "#00ff00", "#0000ff"]))]
    colors: Vec<String>,
    /// Frame delay in milliseconds
    #[schema(example = 50)]
    delay: u64,
}

/// Partial settings update; omitted fields are left alone.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SettingsUpdate {
    /// New palette as hex strings, at least one
    #[serde(default)]
    #[schema(example = json!(["#ff8800", "#0088ff"]))]
    colors: Option<Vec<String>>,
    /// New frame delay in milliseconds
    #[serde(default)]
    #[schema(example = 30)]
    delay: Option<u64>,
}

#[derive(Debug, PartialEq, Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    message: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    error: String,
}

fn message(text: impl Into<String>) -> Json<MessageResponse> {
    Json(MessageResponse { message: text.into() })
}

// ── Errors ───────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
}

impl ApiError {
    fn new(status: StatusCode, error: impl ToString) -> Self {
        Self {
            status,
            error: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.error })).into_response()
    }
}

impl From<SchedulerError> for ApiError {
    fn from(e: SchedulerError) -> Self {
        let status = match e {
            SchedulerError::UnknownEffect(_) => StatusCode::NOT_FOUND,
            SchedulerError::NoActiveEffect => StatusCode::BAD_REQUEST,
            SchedulerError::Spawn(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e)
    }
}

impl From<SettingsError> for ApiError {
    fn from(e: SettingsError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, e)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        tracing::error!("Blocking scheduler call failed: {}", e);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "scheduler task failed")
    }
}

// ── Router ───────────────────────────────────────────────────────────

/// Build the axum router with all API endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(
            SwaggerUi::new("/docs")
                .url("/api-docs/openapi.json", ApiDoc::openapi())
                .config(utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"]).validator_url("none")),
        )
        .route("/api/v1/status", get(get_status))
        .route("/api/v1/effects", get(get_effects))
        .route("/api/v1/effects/start", post(post_start))
        .route("/api/v1/effects/stop", post(post_stop))
        .route("/api/v1/settings", get(get_settings).post(post_settings))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Handlers ─────────────────────────────────────────────────────────

/// GET /api/v1/status: what is running right now
#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "system",
    responses(
        (status = 200, description = "Current scheduler status", body = SchedulerStatus)
    )
)]
async fn get_status(State(state): State<AppState>) -> Json<SchedulerStatus> {
    Json(state.scheduler.status())
}

/// GET /api/v1/effects: list registered effect names
#[utoipa::path(
    get,
    path = "/api/v1/effects",
    tag = "effects",
    responses(
        (status = 200, description = "Sorted effect names", body = Vec<String>)
    )
)]
async fn get_effects(State(state): State<AppState>) -> Json<Vec<String>> {
    let names = state.scheduler.registry().names();
    Json(names.into_iter().map(String::from).collect())
}

/// POST /api/v1/effects/start: stop whatever runs and start an effect
#[utoipa::path(
    post,
    path = "/api/v1/effects/start",
    tag = "effects",
    request_body = StartRequest,
    responses(
        (status = 200, description = "Effect started", body = MessageResponse),
        (status = 404, description = "Unknown effect", body = ErrorResponse)
    )
)]
async fn post_start(
    State(state): State<AppState>,
    Json(req): Json<StartRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let scheduler = Arc::clone(&state.scheduler);
    let name = req.effect.clone();
    tokio::task::spawn_blocking(move || scheduler.start(&name, Args::from(req.args))).await??;
    Ok(message(format!("Effect '{}' started", req.effect)))
}

/// POST /api/v1/effects/stop: stop the running effect and wait for it
#[utoipa::path(
    post,
    path = "/api/v1/effects/stop",
    tag = "effects",
    responses(
        (status = 200, description = "Effect stopped", body = MessageResponse),
        (status = 400, description = "Nothing was running", body = ErrorResponse)
    )
)]
async fn post_stop(State(state): State<AppState>) -> Result<Json<MessageResponse>, ApiError> {
    let scheduler = Arc::clone(&state.scheduler);
    tokio::task::spawn_blocking(move || scheduler.stop()).await??;
    Ok(message("Effect stopped"))
}

/// GET /api/v1/settings: current palette and frame delay
#[utoipa::path(
    get,
    path = "/api/v1/settings",
    tag = "settings",
    responses(
        (status = 200, description = "Current settings", body = SettingsBody)
    )
)]
async fn get_settings(State(state): State<AppState>) -> Json<SettingsBody> {
    Json(current_settings(&state))
}

/// POST /api/v1/settings: replace the palette and/or frame delay
///
/// The whole request is validated before anything is applied. The running
/// effect picks the change up on its next frame.
#[utoipa::path(
    post,
    path = "/api/v1/settings",
    tag = "settings",
    request_body = SettingsUpdate,
    responses(
        (status = 200, description = "Settings after the update", body = SettingsBody),
        (status = 400, description = "Empty palette or malformed color", body = ErrorResponse)
    )
)]
async fn post_settings(
    State(state): State<AppState>,
    Json(req): Json<SettingsUpdate>,
) -> Result<Json<SettingsBody>, ApiError> {
    let palette = req
        .colors
        .map(|colors| {
            colors
                .iter()
                .map(|c| c.parse::<Color>())
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e))?;

    let settings = state.scheduler.settings();
    if let Some(palette) = palette {
        settings.set_palette(palette)?;
    }
    if let Some(delay) = req.delay {
        settings.set_frame_delay(Duration::from_millis(delay));
    }
    tracing::info!("Settings updated");
    Ok(Json(current_settings(&state)))
}

fn current_settings(state: &AppState) -> SettingsBody {
    let snapshot = state.scheduler.settings().snapshot();
    SettingsBody {
        colors: snapshot.palette.iter().map(Color::to_string).collect(),
        delay: u64::try_from(snapshot.frame_delay.as_millis()).unwrap_or(u64::MAX),
    }
}
