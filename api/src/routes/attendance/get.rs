use std::collections::HashSet;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use db::models::attendance_record::Model as RecordModel;
use serde::Deserialize;
use util::state::AppState;

use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;
use crate::routes::attendance::common::{
    AttendanceStats, StudentReportResponse, SubjectReportResponse, to_record_responses,
};

#[derive(Debug, Deserialize)]
pub struct StudentReportQuery {
    /// Optional subject filter; omitted means all subjects.
    pub subject: Option<String>,
}

/// GET /attendance/student
///
/// A student's own attendance history plus summary stats, optionally
/// narrowed to one subject via `?subject=`.
pub async fn student_report(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(query): Query<StudentReportQuery>,
) -> (StatusCode, Json<ApiResponse<StudentReportResponse>>) {
    match RecordModel::find_for_user(state.db(), claims.sub, query.subject.as_deref()).await {
        Ok(records) => {
            let stats = AttendanceStats::from_records(&records);
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    StudentReportResponse {
                        stats,
                        records: to_record_responses(records),
                    },
                    "Attendance report retrieved",
                )),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {e}"))),
        ),
    }
}

/// GET /attendance/teacher/{subject}
///
/// All attendance records for one subject, for teachers and admins.
pub async fn teacher_report(
    State(state): State<AppState>,
    Path(subject): Path<String>,
) -> (StatusCode, Json<ApiResponse<SubjectReportResponse>>) {
    match RecordModel::find_by_subject(state.db(), &subject).await {
        Ok(records) => {
            let unique_students = records
                .iter()
                .map(|r| r.user_id)
                .collect::<HashSet<_>>()
                .len() as u64;
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    SubjectReportResponse {
                        subject,
                        total_records: records.len() as u64,
                        unique_students,
                        records: to_record_responses(records),
                    },
                    "Subject report retrieved",
                )),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {e}"))),
        ),
    }
}
