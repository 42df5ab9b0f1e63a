#![allow(dead_code)]

use std::sync::Once;

use axum::{
    Router,
    body::Body,
    http::{Request, header},
    response::Response,
};
use db::models::user::{Model as UserModel, Role};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use util::{config::AppConfig, state::AppState};

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

static CONFIG_INIT: Once = Once::new();

/// Seeds the process-global configuration once. Every test in a binary uses
/// the same values so parallel tests never observe a half-written config.
pub fn seed_config() {
    CONFIG_INIT.call_once(|| {
        // SAFETY: runs once, before any test has read the environment.
        unsafe {
            std::env::set_var("DATABASE_PATH", "data/integration-test.db");
            std::env::set_var("JWT_SECRET", TEST_JWT_SECRET);
        }
        AppConfig::set_jwt_secret(TEST_JWT_SECRET);
        AppConfig::set_jwt_duration_minutes(60);
        AppConfig::set_attendance_jwt_secret(None);
        AppConfig::set_attendance_max_duration_minutes(60);
    });
}

/// Fresh application state over an isolated in-memory database.
pub async fn test_state() -> AppState {
    seed_config();
    AppState::new(db::test_utils::setup_test_db().await)
}

/// Builds the full application router the same way `main` does, minus the
/// listener and the logging layers.
pub fn make_app(state: &AppState) -> Router {
    Router::new()
        .nest("/api", api::routes::routes(state.clone()))
        .with_state(state.clone())
}

/// Creates a user and returns it with a valid identity token.
pub async fn seed_user(
    db: &DatabaseConnection,
    username: &str,
    role: Role,
) -> (UserModel, String) {
    let email = format!("{username}@test.com");
    let user = UserModel::create(db, username, &email, "password123", role)
        .await
        .expect("Failed to create test user");
    let (token, _) = api::auth::generate_jwt(user.id, user.role);
    (user, token)
}

/// JSON request with an optional bearer token.
pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let body = match body {
        Some(value) => Body::from(value.to_string()),
        None => Body::empty(),
    };

    builder.body(body).expect("Failed to build request")
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&bytes).expect("Response body was not valid JSON")
}
