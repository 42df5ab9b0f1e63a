//! Failure taxonomy for verification, issuance, and redemption.
//!
//! Each variant is resolved at the component that detects it and translated
//! into a stable code plus an HTTP status at the boundary; nothing in here is
//! retried automatically.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::response::{ApiResponse, Empty};

/// Identity verification and authorization failures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuthError {
    #[error("Authentication required. Please login first.")]
    MissingToken,

    #[error("Invalid or malformed authentication token")]
    InvalidToken,

    #[error("Session expired. Please login again.")]
    TokenExpired,

    #[error("Token not yet valid")]
    TokenNotActive,

    #[error("User account not found")]
    UserNotFound,

    #[error("User account not found or deactivated")]
    UserInactive,

    #[error("Password was changed. Please login again.")]
    PasswordChanged,

    #[error("Access denied. This action requires {0} role.")]
    RolePermissionDenied(String),

    #[error("Authentication system error")]
    Internal(String),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "AUTH_REQUIRED",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::TokenNotActive => "TOKEN_NOT_ACTIVE",
            AuthError::UserNotFound => "USER_NOT_FOUND",
            AuthError::UserInactive => "USER_INACTIVE",
            AuthError::PasswordChanged => "PASSWORD_CHANGED",
            AuthError::RolePermissionDenied(_) => "ROLE_PERMISSION_DENIED",
            AuthError::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::RolePermissionDenied(_) => StatusCode::FORBIDDEN,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(ApiResponse::<Empty>::error_code(self.to_string(), self.code()));
        (self.status(), body).into_response()
    }
}

/// Attendance session token failures, surfaced issuer-side as
/// "generate a new session".
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionTokenError {
    #[error("Invalid attendance session token")]
    InvalidFormat,

    #[error("Attendance session has expired")]
    Expired,
}

impl SessionTokenError {
    pub fn code(&self) -> &'static str {
        match self {
            SessionTokenError::InvalidFormat => "INVALID_SESSION_FORMAT",
            SessionTokenError::Expired => "SESSION_EXPIRED",
        }
    }
}

impl IntoResponse for SessionTokenError {
    fn into_response(self) -> Response {
        let body = Json(ApiResponse::<Empty>::error_code(self.to_string(), self.code()));
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

/// Redemption failures. `Duplicate` is a benign, expected race outcome:
/// the caller should treat it as "already marked".
#[derive(Debug, Error)]
pub enum RedeemError {
    #[error(transparent)]
    Session(#[from] SessionTokenError),

    #[error("Attendance already marked for this session")]
    Duplicate,

    #[error("Failed to record attendance")]
    Store(#[from] sea_orm::DbErr),
}

impl RedeemError {
    pub fn code(&self) -> &'static str {
        match self {
            RedeemError::Session(e) => e.code(),
            RedeemError::Duplicate => "DUPLICATE_REDEMPTION",
            RedeemError::Store(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RedeemError::Session(_) => StatusCode::BAD_REQUEST,
            RedeemError::Duplicate => StatusCode::CONFLICT,
            RedeemError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RedeemError {
    fn into_response(self) -> Response {
        let body = Json(ApiResponse::<Empty>::error_code(self.to_string(), self.code()));
        (self.status(), body).into_response()
    }
}
