//! End-to-end attendance flow: issue a session, redeem it, read reports.

mod helpers;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use db::models::attendance_record::Model as RecordModel;
use db::models::user::Role;
use serde_json::json;
use tower::ServiceExt;

use api::auth::session::issue_session;
use helpers::{body_json, json_request, make_app, seed_user, test_state};

#[tokio::test]
async fn issue_then_scan_marks_attendance() {
    let state = test_state().await;
    let (teacher, teacher_token) = seed_user(state.db(), "t_issue", Role::Teacher).await;
    let (student, student_token) = seed_user(state.db(), "s_issue", Role::Student).await;
    let app = make_app(&state);

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/attendance/generate-qr",
            Some(&teacher_token),
            Some(json!({ "subject": "Algorithms", "duration_minutes": 15 })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    let issued = body_json(res).await;
    assert_eq!(issued["data"]["subject"], "Algorithms");
    assert_eq!(issued["data"]["duration_minutes"], 15);
    let session_token = issued["data"]["token"].as_str().unwrap().to_owned();
    let session_id = issued["data"]["session_id"].as_str().unwrap().to_owned();
    assert!(session_id.starts_with("QR_"));

    let res = app
        .oneshot(json_request(
            "POST",
            "/api/attendance/scan",
            Some(&student_token),
            Some(json!({ "token": session_token })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let marked = body_json(res).await;
    assert_eq!(marked["data"]["session_id"], session_id.as_str());
    assert_eq!(marked["data"]["user_id"], student.id);
    assert_eq!(marked["data"]["subject"], "Algorithms");
    assert_eq!(marked["data"]["status"], "present");
    assert_eq!(marked["data"]["marked_by"], teacher.id);

    let record = RecordModel::find_for_session_user(state.db(), &session_id, student.id)
        .await
        .unwrap();
    assert!(record.is_some());
}

#[tokio::test]
async fn duplicate_scan_is_conflict_and_keeps_one_row() {
    let state = test_state().await;
    let (_, teacher_token) = seed_user(state.db(), "t_dup", Role::Teacher).await;
    let (student, student_token) = seed_user(state.db(), "s_dup", Role::Student).await;
    let app = make_app(&state);

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/attendance/generate-qr",
            Some(&teacher_token),
            Some(json!({ "subject": "Networks" })),
        ))
        .await
        .unwrap();
    let session_token = body_json(res).await["data"]["token"]
        .as_str()
        .unwrap()
        .to_owned();

    let scan = json_request(
        "POST",
        "/api/attendance/scan",
        Some(&student_token),
        Some(json!({ "token": session_token })),
    );
    let first = app.clone().oneshot(scan).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(json_request(
            "POST",
            "/api/attendance/scan",
            Some(&student_token),
            Some(json!({ "token": session_token })),
        ))
        .await
        .unwrap();

    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(second).await["code"], "DUPLICATE_REDEMPTION");

    let rows = RecordModel::find_for_user(state.db(), student.id, None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn expired_session_token_is_rejected() {
    let state = test_state().await;
    let (teacher, _) = seed_user(state.db(), "t_exp", Role::Teacher).await;
    let (student, student_token) = seed_user(state.db(), "s_exp", Role::Student).await;
    let app = make_app(&state);

    // Minted in the past so its one-minute window is long over.
    let stale = issue_session(
        teacher.id,
        "t_exp",
        "History",
        Some(1),
        Utc::now() - Duration::minutes(10),
    );

    let res = app
        .oneshot(json_request(
            "POST",
            "/api/attendance/scan",
            Some(&student_token),
            Some(json!({ "token": stale.token })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["code"], "SESSION_EXPIRED");

    let rows = RecordModel::find_for_user(state.db(), student.id, None)
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn malformed_session_token_is_rejected() {
    let state = test_state().await;
    let (_, student_token) = seed_user(state.db(), "s_bad", Role::Student).await;
    let app = make_app(&state);

    let res = app
        .oneshot(json_request(
            "POST",
            "/api/attendance/scan",
            Some(&student_token),
            Some(json!({ "token": "garbage" })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["code"], "INVALID_SESSION_FORMAT");
}

#[tokio::test]
async fn identity_token_is_not_a_session_token() {
    let state = test_state().await;
    let (_, student_token) = seed_user(state.db(), "s_cross", Role::Student).await;
    let app = make_app(&state);

    // The student's own login token must not redeem as a session.
    let res = app
        .oneshot(json_request(
            "POST",
            "/api/attendance/scan",
            Some(&student_token),
            Some(json!({ "token": student_token })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["code"], "INVALID_SESSION_FORMAT");
}

#[tokio::test]
async fn requested_duration_is_clamped() {
    let state = test_state().await;
    let (_, teacher_token) = seed_user(state.db(), "t_clamp", Role::Teacher).await;
    let app = make_app(&state);

    let res = app
        .oneshot(json_request(
            "POST",
            "/api/attendance/generate-qr",
            Some(&teacher_token),
            Some(json!({ "subject": "Maths", "duration_minutes": 9999 })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(body_json(res).await["data"]["duration_minutes"], 60);
}

#[tokio::test]
async fn duration_defaults_to_ten_minutes() {
    let state = test_state().await;
    let (_, teacher_token) = seed_user(state.db(), "t_default", Role::Teacher).await;
    let app = make_app(&state);

    let res = app
        .oneshot(json_request(
            "POST",
            "/api/attendance/generate-qr",
            Some(&teacher_token),
            Some(json!({ "subject": "Maths" })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(body_json(res).await["data"]["duration_minutes"], 10);
}

#[tokio::test]
async fn empty_subject_is_rejected() {
    let state = test_state().await;
    let (_, teacher_token) = seed_user(state.db(), "t_empty", Role::Teacher).await;
    let app = make_app(&state);

    let res = app
        .oneshot(json_request(
            "POST",
            "/api/attendance/generate-qr",
            Some(&teacher_token),
            Some(json!({ "subject": "" })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn student_report_filters_and_counts() {
    let state = test_state().await;
    let (teacher, _) = seed_user(state.db(), "t_report", Role::Teacher).await;
    let (student, student_token) = seed_user(state.db(), "s_report", Role::Student).await;
    let app = make_app(&state);

    let now = Utc::now();
    RecordModel::insert_if_absent(state.db(), "QR_1_rep", student.id, "Algorithms", teacher.id, now)
        .await
        .unwrap();
    RecordModel::insert_if_absent(state.db(), "QR_2_rep", student.id, "Networks", teacher.id, now)
        .await
        .unwrap();

    let res = app
        .clone()
        .oneshot(json_request(
            "GET",
            "/api/attendance/student",
            Some(&student_token),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let all = body_json(res).await;
    assert_eq!(all["data"]["stats"]["total"], 2);
    assert_eq!(all["data"]["stats"]["present"], 2);
    assert_eq!(all["data"]["stats"]["percentage"], 100.0);

    let res = app
        .oneshot(json_request(
            "GET",
            "/api/attendance/student?subject=Algorithms",
            Some(&student_token),
            None,
        ))
        .await
        .unwrap();

    let filtered = body_json(res).await;
    assert_eq!(filtered["data"]["stats"]["total"], 1);
    assert_eq!(filtered["data"]["records"][0]["subject"], "Algorithms");
}

#[tokio::test]
async fn teacher_subject_report_counts_unique_students() {
    let state = test_state().await;
    let (teacher, teacher_token) = seed_user(state.db(), "t_subject", Role::Teacher).await;
    let (s1, _) = seed_user(state.db(), "s_subject1", Role::Student).await;
    let (s2, _) = seed_user(state.db(), "s_subject2", Role::Student).await;
    let app = make_app(&state);

    let now = Utc::now();
    for (sid, uid) in [("QR_1_sub", s1.id), ("QR_2_sub", s1.id), ("QR_2_sub2", s2.id)] {
        RecordModel::insert_if_absent(state.db(), sid, uid, "Physics", teacher.id, now)
            .await
            .unwrap();
    }

    let res = app
        .oneshot(json_request(
            "GET",
            "/api/attendance/teacher/Physics",
            Some(&teacher_token),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["data"]["subject"], "Physics");
    assert_eq!(json["data"]["total_records"], 3);
    assert_eq!(json["data"]["unique_students"], 2);
}
