use crate::actors::profile_controller::{controller_stats, current_state, fetch_user_data};
use crate::actors::ProfileControllerMessage;
use crate::error::Result;
use crate::models::ControllerStats;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use ractor::ActorRef;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Health check status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ControllerStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Liveness probe response (minimal, just indicates the process is running)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchAccepted {
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Shared state for the status routes
#[derive(Clone)]
pub struct StatusState {
    pub controller: ActorRef<ProfileControllerMessage>,
    pub start_time: Instant,
}

impl StatusState {
    pub fn new(controller: ActorRef<ProfileControllerMessage>) -> Self {
        Self {
            controller,
            start_time: Instant::now(),
        }
    }
}

pub fn create_status_router(state: StatusState) -> Router {
    Router::new()
        .route("/state", get(get_state))
        .route("/stats", get(get_stats))
        .route("/fetch/:username", post(trigger_fetch))
        .route("/healthz", get(health_check))
        .route("/livez", get(liveness_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the status routes until the listener fails
pub async fn start_status_server(state: StatusState, port: u16) -> Result<()> {
    let app = create_status_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Status server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn unavailable(message: String) -> axum::response::Response {
    (StatusCode::SERVICE_UNAVAILABLE, Json(ErrorResponse { error: message })).into_response()
}

/// Current state snapshot
async fn get_state(State(state): State<StatusState>) -> impl IntoResponse {
    match current_state(&state.controller).await {
        Ok(app_state) => (StatusCode::OK, Json(app_state)).into_response(),
        Err(e) => {
            error!("Failed to read controller state: {}", e);
            unavailable(format!("Failed to read state: {}", e))
        }
    }
}

async fn get_stats(State(state): State<StatusState>) -> impl IntoResponse {
    match controller_stats(&state.controller).await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => unavailable(format!("Failed to get controller statistics: {}", e)),
    }
}

/// Starts a fetch cycle; progress is observed through `/state`
async fn trigger_fetch(
    State(state): State<StatusState>,
    Path(username): Path<String>,
) -> impl IntoResponse {
    let username = username.trim().to_string();
    if username.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Username must not be blank".to_string(),
            }),
        )
            .into_response();
    }

    match fetch_user_data(&state.controller, &username) {
        Ok(()) => (StatusCode::ACCEPTED, Json(FetchAccepted { username })).into_response(),
        Err(e) => {
            error!("Failed to dispatch fetch: {}", e);
            unavailable(e.to_string())
        }
    }
}

async fn health_check(State(state): State<StatusState>) -> impl IntoResponse {
    let uptime = state.start_time.elapsed().as_secs();

    let (status, stats, message) = match controller_stats(&state.controller).await {
        Ok(stats) => (HealthStatus::Healthy, Some(stats), None),
        Err(e) => (
            HealthStatus::Unhealthy,
            None,
            Some(format!("Profile controller not responding: {}", e)),
        ),
    };

    let status_code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
        stats,
        message,
    };

    (status_code, Json(response))
}

async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(LivenessResponse {
            status: "alive".to_string(),
        }),
    )
}
