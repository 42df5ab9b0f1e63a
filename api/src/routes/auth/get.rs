use axum::{Json, extract::State, http::StatusCode};
use db::models::user::Model as UserModel;
use serde::Serialize;
use util::state::AppState;

use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;

#[derive(Debug, Serialize, Default)]
pub struct ProfileResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub active: bool,
    pub created_at: String,
}

/// GET /auth/me
///
/// Returns the profile of the verified caller. The identity verifier runs
/// ahead of this handler, so a missing user here means the account vanished
/// between verification and lookup.
pub async fn me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> (StatusCode, Json<ApiResponse<ProfileResponse>>) {
    match UserModel::find_by_id(state.db(), claims.sub).await {
        Ok(Some(user)) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                ProfileResponse {
                    id: user.id,
                    username: user.username,
                    email: user.email,
                    role: user.role.to_string(),
                    active: user.active,
                    created_at: user.created_at.to_rfc3339(),
                },
                "Profile retrieved successfully",
            )),
        ),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error_code("User not found", "USER_NOT_FOUND")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {e}"))),
        ),
    }
}
