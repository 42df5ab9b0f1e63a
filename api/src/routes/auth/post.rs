use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use db::models::user::{Model as UserModel, Role};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::SqlErr;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use util::{format_validation_errors, state::AppState};
use validator::Validate;

use crate::auth::generate_jwt;
use crate::response::ApiResponse;

static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[A-Za-z0-9_.-]{3,32}$").expect("username regex"));

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(regex(
        path = *USERNAME_REGEX,
        message = "Username must be 3-32 characters (letters, digits, '_', '.', '-')"
    ))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Defaults to `student` when unspecified.
    pub role: Option<Role>,
}

#[derive(Debug, Serialize, Default)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub token: String,
    pub expires_at: String,
}

impl UserResponse {
    fn from_user(user: &UserModel, token: String, expires_at: String) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.to_string(),
            token,
            expires_at,
        }
    }
}

/// POST /auth/register
///
/// Register a new user and issue an identity token.
///
/// ### Responses
/// - `201 Created` with the user profile and token
/// - `400 Bad Request` on validation failure
/// - `409 Conflict` when the username or email is already taken
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> (StatusCode, Json<ApiResponse<UserResponse>>) {
    if let Err(validation_errors) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format_validation_errors(
                &validation_errors,
            ))),
        );
    }

    let db = state.db();

    match UserModel::find_by_username(db, &req.username).await {
        Ok(Some(_)) => {
            return (
                StatusCode::CONFLICT,
                Json(ApiResponse::error(
                    "A user with this username already exists",
                )),
            );
        }
        Ok(None) => {}
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    }

    if let Ok(Some(_)) = UserModel::find_by_email(db, &req.email).await {
        return (
            StatusCode::CONFLICT,
            Json(ApiResponse::error("A user with this email already exists")),
        );
    }

    let role = req.role.unwrap_or(Role::Student);

    match UserModel::create(db, &req.username, &req.email, &req.password, role).await {
        Ok(user) => {
            let (token, expiry) = generate_jwt(user.id, user.role);
            info!(user = user.id, role = %user.role, "User registered");
            (
                StatusCode::CREATED,
                Json(ApiResponse::success(
                    UserResponse::from_user(&user, token, expiry),
                    "User registered successfully",
                )),
            )
        }
        // The unique constraints decide races the pre-checks missed.
        Err(e) => match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                let message = if detail.contains("email") {
                    "A user with this email already exists"
                } else {
                    "A user with this username already exists"
                };
                (StatusCode::CONFLICT, Json(ApiResponse::error(message)))
            }
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            ),
        },
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /auth/login
///
/// Authenticate an existing user and issue an identity token.
///
/// ### Responses
/// - `200 OK` with the user profile and token
/// - `401 Unauthorized` on bad credentials
/// - `403 Forbidden` when the account is deactivated
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> (StatusCode, Json<ApiResponse<UserResponse>>) {
    let db = state.db();

    let user = match UserModel::verify_credentials(db, &req.username, &req.password).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::error_code(
                    "Invalid username or password",
                    "UNAUTHENTICATED",
                )),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };

    if !user.active {
        return (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error_code(
                "User account not found or deactivated",
                "USER_INACTIVE",
            )),
        );
    }

    let (token, expiry) = generate_jwt(user.id, user.role);

    // Best-effort login stamp, off the request path.
    let db_clone = state.db_clone();
    let user_id = user.id;
    tokio::spawn(async move {
        if let Err(e) = UserModel::touch_last_activity(&db_clone, user_id, Utc::now()).await {
            warn!(error = %e, user = user_id, "Could not update last activity");
        }
    });

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            UserResponse::from_user(&user, token, expiry),
            "Login successful",
        )),
    )
}
