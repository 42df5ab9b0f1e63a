//! Identity verification through the `/api/auth/me` endpoint: token
//! extraction order, signature/expiry checks, and principal re-resolution.

mod helpers;

use axum::http::{StatusCode, header};
use chrono::{Duration, Utc};
use db::models::user::{Model as UserModel, Role};
use jsonwebtoken::{EncodingKey, Header, encode};
use tower::ServiceExt;

use api::auth::Claims;
use helpers::{TEST_JWT_SECRET, body_json, json_request, make_app, seed_user, test_state};

fn signed_token(claims: &Claims) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Token encoding failed")
}

#[tokio::test]
async fn valid_token_returns_profile() {
    let state = test_state().await;
    let (user, token) = seed_user(state.db(), "alice", Role::Student).await;
    let app = make_app(&state);

    let res = app
        .oneshot(json_request("GET", "/api/auth/me", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["id"], user.id);
    assert_eq!(json["data"]["username"], "alice");
    assert_eq!(json["data"]["role"], "student");
}

#[tokio::test]
async fn missing_token_is_auth_required() {
    let state = test_state().await;
    let app = make_app(&state);

    let res = app
        .oneshot(json_request("GET", "/api/auth/me", None, None))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(res).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "AUTH_REQUIRED");
}

#[tokio::test]
async fn garbage_token_is_invalid() {
    let state = test_state().await;
    let app = make_app(&state);

    let res = app
        .oneshot(json_request(
            "GET",
            "/api/auth/me",
            Some("not.a.token"),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let state = test_state().await;
    let (user, _) = seed_user(state.db(), "bob", Role::Student).await;
    let app = make_app(&state);

    let past = Utc::now() - Duration::hours(2);
    let token = signed_token(&Claims {
        sub: user.id,
        role: user.role,
        iat: past.timestamp() as usize,
        exp: (past + Duration::hours(1)).timestamp() as usize,
    });

    let res = app
        .oneshot(json_request("GET", "/api/auth/me", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["code"], "TOKEN_EXPIRED");
}

#[tokio::test]
async fn password_rotation_invalidates_older_tokens() {
    let state = test_state().await;
    let (user, _) = seed_user(state.db(), "carol", Role::Student).await;
    let app = make_app(&state);

    // Issued a minute before the rotation below.
    let issued = Utc::now() - Duration::seconds(60);
    let token = signed_token(&Claims {
        sub: user.id,
        role: user.role,
        iat: issued.timestamp() as usize,
        exp: (issued + Duration::hours(1)).timestamp() as usize,
    });

    UserModel::set_password(state.db(), user.id, "rotated-pass-1")
        .await
        .unwrap();

    let res = app
        .oneshot(json_request("GET", "/api/auth/me", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["code"], "PASSWORD_CHANGED");
}

#[tokio::test]
async fn deactivated_account_is_rejected() {
    let state = test_state().await;
    let (user, token) = seed_user(state.db(), "dave", Role::Student).await;
    let app = make_app(&state);

    UserModel::set_active(state.db(), user.id, false)
        .await
        .unwrap();

    let res = app
        .oneshot(json_request("GET", "/api/auth/me", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["code"], "USER_INACTIVE");
}

#[tokio::test]
async fn token_for_deleted_user_is_rejected() {
    let state = test_state().await;
    let app = make_app(&state);

    let (token, _) = api::auth::generate_jwt(999_999, Role::Student);

    let res = app
        .oneshot(json_request("GET", "/api/auth/me", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["code"], "USER_NOT_FOUND");
}

#[tokio::test]
async fn token_in_query_param_is_accepted() {
    let state = test_state().await;
    let (_, token) = seed_user(state.db(), "erin", Role::Student).await;
    let app = make_app(&state);

    let res = app
        .oneshot(json_request(
            "GET",
            &format!("/api/auth/me?token={token}"),
            None,
            None,
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn token_in_x_auth_token_header_is_accepted() {
    let state = test_state().await;
    let (_, token) = seed_user(state.db(), "frank", Role::Student).await;
    let app = make_app(&state);

    let req = axum::http::Request::builder()
        .method("GET")
        .uri("/api/auth/me")
        .header("x-auth-token", &token)
        .body(axum::body::Body::empty())
        .unwrap();

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn token_in_cookie_is_accepted() {
    let state = test_state().await;
    let (_, token) = seed_user(state.db(), "grace", Role::Student).await;
    let app = make_app(&state);

    let req = axum::http::Request::builder()
        .method("GET")
        .uri("/api/auth/me")
        .header(header::COOKIE, format!("theme=dark; token={token}"))
        .body(axum::body::Body::empty())
        .unwrap();

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn authorization_header_wins_over_query_param() {
    let state = test_state().await;
    let (_, good) = seed_user(state.db(), "heidi", Role::Student).await;
    let app = make_app(&state);

    // A bad header credential must not be rescued by a good query one.
    let req = axum::http::Request::builder()
        .method("GET")
        .uri(format!("/api/auth/me?token={good}"))
        .header(header::AUTHORIZATION, "Bearer bogus")
        .body(axum::body::Body::empty())
        .unwrap();

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["code"], "INVALID_TOKEN");
}
