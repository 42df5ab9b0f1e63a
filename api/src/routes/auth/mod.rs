//! Routes for the `/auth` endpoint group.
//!
//! - `POST /auth/register` → `register`
//! - `POST /auth/login` → `login`
//! - `GET /auth/me` → `me` (behind the identity verifier)

pub mod get;
pub mod post;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get as get_route, post as post_route},
};
use util::state::AppState;

use crate::auth::middleware::require_auth;
use get::me;
use post::{login, register};

pub fn auth_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/register", post_route(register))
        .route("/login", post_route(login))
        .route(
            "/me",
            get_route(me).route_layer(from_fn_with_state(app_state, require_auth)),
        )
}
