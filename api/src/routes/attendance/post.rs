use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use db::models::attendance_record::{InsertOutcome, Model as RecordModel};
use db::models::user::Model as UserModel;
use tracing::{info, warn};
use util::{format_validation_errors, state::AppState};
use validator::Validate;

use crate::auth::claims::AuthUser;
use crate::auth::error::RedeemError;
use crate::auth::session::{issue_session, verify_session_token};
use crate::response::ApiResponse;
use crate::routes::attendance::common::{
    AttendanceRecordResponse, GenerateQrRequest, GenerateQrResponse, ScanRequest,
};

/// POST /attendance/generate-qr
///
/// Mints an attendance session token for one subject. Teacher/admin only
/// (enforced by the route guard). The session lives entirely inside the
/// signed token; nothing is stored until a student redeems it.
///
/// ### Responses
/// - `201 Created` with the token, session id, and expiry
/// - `400 Bad Request` on validation failure
pub async fn generate_qr(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(req): Json<GenerateQrRequest>,
) -> (StatusCode, Json<ApiResponse<GenerateQrResponse>>) {
    if let Err(validation_errors) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format_validation_errors(
                &validation_errors,
            ))),
        );
    }

    let issuer_name = match UserModel::find_by_id(state.db(), claims.sub).await {
        Ok(Some(user)) => user.username,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error_code("User not found", "USER_NOT_FOUND")),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {e}"))),
            );
        }
    };

    let issued = issue_session(
        claims.sub,
        &issuer_name,
        &req.subject,
        req.duration_minutes,
        Utc::now(),
    );

    info!(
        session = %issued.session_id,
        issuer = claims.sub,
        subject = %req.subject,
        duration_minutes = issued.duration_minutes,
        "Attendance session issued"
    );

    (
        StatusCode::CREATED,
        Json(ApiResponse::success(
            GenerateQrResponse {
                token: issued.token,
                session_id: issued.session_id,
                subject: req.subject,
                duration_minutes: issued.duration_minutes,
                expires_at: issued.expires_at.to_rfc3339(),
            },
            "Attendance session created",
        )),
    )
}

/// POST /attendance/scan
///
/// Redeems a session token for the calling student. At most one record ever
/// exists per (session, student) pair; a repeat scan is rejected with
/// `DUPLICATE_REDEMPTION` and leaves the original record untouched.
///
/// ### Responses
/// - `200 OK` with the new attendance record
/// - `400 Bad Request` for malformed or expired session tokens
/// - `409 Conflict` when attendance was already marked for this session
pub async fn scan(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(req): Json<ScanRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AttendanceRecordResponse>>), RedeemError> {
    let now = Utc::now();

    let session = verify_session_token(&req.token, now).map_err(|e| {
        warn!(user = claims.sub, error = %e, "Session token rejected");
        e
    })?;

    let outcome = RecordModel::insert_if_absent(
        state.db(),
        &session.sid,
        claims.sub,
        &session.subject,
        session.sub,
        now,
    )
    .await?;

    match outcome {
        InsertOutcome::Inserted(record) => {
            info!(
                session = %session.sid,
                user = claims.sub,
                subject = %session.subject,
                "Attendance marked"
            );
            Ok((
                StatusCode::OK,
                Json(ApiResponse::success(
                    record.into(),
                    "Attendance marked successfully",
                )),
            ))
        }
        InsertOutcome::AlreadyExists => {
            info!(
                session = %session.sid,
                user = claims.sub,
                "Duplicate redemption attempt"
            );
            Err(RedeemError::Duplicate)
        }
    }
}
