//! Request/response DTOs shared by the attendance handlers.

use db::models::attendance_record::Model as RecordModel;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateQrRequest {
    #[validate(length(min = 1, max = 128, message = "Subject must be 1-128 characters"))]
    pub subject: String,

    /// Session lifetime in minutes. Defaults to 10, clamped to the configured
    /// maximum.
    pub duration_minutes: Option<u64>,
}

#[derive(Debug, Serialize, Default)]
pub struct GenerateQrResponse {
    pub token: String,
    pub session_id: String,
    pub subject: String,
    pub duration_minutes: u64,
    pub expires_at: String,
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub token: String,
}

#[derive(Debug, Serialize, Default)]
pub struct AttendanceRecordResponse {
    pub session_id: String,
    pub user_id: i64,
    pub subject: String,
    pub status: String,
    pub marked_by: i64,
    pub recorded_at: String,
}

impl From<RecordModel> for AttendanceRecordResponse {
    fn from(record: RecordModel) -> Self {
        Self {
            session_id: record.session_id,
            user_id: record.user_id,
            subject: record.subject,
            status: record.status.to_string(),
            marked_by: record.marked_by,
            recorded_at: record.recorded_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct AttendanceStats {
    pub total: u64,
    pub present: u64,
    pub absent: u64,
    pub late: u64,
    /// Share of records marked present, as a percentage rounded to two
    /// decimal places. Zero when there are no records.
    pub percentage: f64,
}

impl AttendanceStats {
    pub fn from_records(records: &[RecordModel]) -> Self {
        use db::models::attendance_record::AttendanceStatus;

        let total = records.len() as u64;
        let present = records
            .iter()
            .filter(|r| r.status == AttendanceStatus::Present)
            .count() as u64;
        let absent = records
            .iter()
            .filter(|r| r.status == AttendanceStatus::Absent)
            .count() as u64;
        let late = records
            .iter()
            .filter(|r| r.status == AttendanceStatus::Late)
            .count() as u64;

        let percentage = if total == 0 {
            0.0
        } else {
            ((present as f64 / total as f64) * 10_000.0).round() / 100.0
        };

        Self {
            total,
            present,
            absent,
            late,
            percentage,
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct StudentReportResponse {
    pub stats: AttendanceStats,
    pub records: Vec<AttendanceRecordResponse>,
}

#[derive(Debug, Serialize, Default)]
pub struct SubjectReportResponse {
    pub subject: String,
    pub total_records: u64,
    pub unique_students: u64,
    pub records: Vec<AttendanceRecordResponse>,
}

pub fn to_record_responses(records: Vec<RecordModel>) -> Vec<AttendanceRecordResponse> {
    records.into_iter().map(Into::into).collect()
}
