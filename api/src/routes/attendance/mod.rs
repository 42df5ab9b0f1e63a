//! Routes for the `/attendance` endpoint group.
//!
//! - `POST /attendance/generate-qr` → `generate_qr` (teacher/admin)
//! - `POST /attendance/scan` → `scan` (student)
//! - `GET /attendance/student` → `student_report` (student)
//! - `GET /attendance/teacher/{subject}` → `teacher_report` (teacher/admin)
//!
//! Every route sits behind the identity verifier; the role guards run after
//! it, reading the verified principal from request extensions.

pub mod common;
pub mod get;
pub mod post;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get as get_route, post as post_route},
};
use util::state::AppState;

use crate::auth::guards::{require_student, require_teacher};
use crate::auth::middleware::require_auth;
use get::{student_report, teacher_report};
use post::{generate_qr, scan};

pub fn attendance_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/generate-qr",
            post_route(generate_qr).route_layer(from_fn(require_teacher)),
        )
        .route("/scan", post_route(scan).route_layer(from_fn(require_student)))
        .route(
            "/student",
            get_route(student_report).route_layer(from_fn(require_student)),
        )
        .route(
            "/teacher/{subject}",
            get_route(teacher_report).route_layer(from_fn(require_teacher)),
        )
        .route_layer(from_fn_with_state(app_state, require_auth))
}
