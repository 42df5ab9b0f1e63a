use axum::{Json, Router, http::StatusCode, routing::get};
use chrono::Utc;
use serde::Serialize;
use util::{config, state::AppState};

use crate::response::ApiResponse;

#[derive(Serialize, Default)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub timestamp: String,
}

/// GET /health
///
/// Public liveness probe.
pub async fn health() -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    (
        StatusCode::OK,
        Json(ApiResponse::success(
            HealthResponse {
                status: "ok".into(),
                service: config::project_name(),
                timestamp: Utc::now().to_rfc3339(),
            },
            "Service is healthy",
        )),
    )
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health))
}
