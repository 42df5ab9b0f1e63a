//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → liveness probe (public)
//! - `/auth` → registration, login, current-principal lookup
//! - `/attendance` → session issuance (teachers) and redemption (students)

use axum::Router;
use util::state::AppState;

pub mod attendance;
pub mod auth;
pub mod health;

/// Builds the complete application router for all HTTP endpoints.
///
/// The returned router has `AppState` as its state type; the caller nests it
/// (typically under `/api`) and applies the state.
pub fn routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/health", health::health_routes())
        .nest("/auth", auth::auth_routes(app_state.clone()))
        .nest("/attendance", attendance::attendance_routes(app_state))
}
