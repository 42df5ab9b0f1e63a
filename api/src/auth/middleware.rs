use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Method, Request},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use db::models::user;
use std::net::SocketAddr;
use std::time::Instant;
use tracing::{info, warn};
use util::state::AppState;

use crate::auth::claims::AuthUser;
use crate::auth::error::AuthError;
use crate::auth::extractors::{decode_identity_token, extract_token};

/// Logs method, path, IP address, and user ID (if a decodable token is
/// present) for each incoming HTTP request. Skips CORS preflight `OPTIONS`
/// requests.
pub async fn log_request(req: Request<Body>, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        return next.run(req).await;
    }

    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".into());

    let (parts, body) = req.into_parts();
    let user_id = extract_token(&parts)
        .and_then(|t| decode_identity_token(&t).ok())
        .map(|c| c.sub);

    info!(
        method = ?parts.method,
        path = %parts.uri.path(),
        ip = %ip,
        user = user_id.unwrap_or(0),
        "Incoming request"
    );

    next.run(Request::from_parts(parts, body)).await
}

/// The identity verifier.
///
/// Extracts the bearer credential (header, query, `x-auth-token`, cookie — in
/// that order), verifies signature and expiry, then re-resolves the principal
/// from the store: the account must exist, be active, and must not have
/// rotated its password after the token was issued. On success the verified
/// `AuthUser` lands in request extensions and a best-effort last-activity
/// stamp is spawned off the request path.
///
/// Every attempt — success or failure — is logged with its outcome code, the
/// principal id when known, and latency.
pub async fn require_auth(
    State(app_state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let started = Instant::now();
    let (mut parts, body) = req.into_parts();
    let path = parts.uri.path().to_owned();

    let token = match extract_token(&parts) {
        Some(token) => token,
        None => {
            let err = AuthError::MissingToken;
            log_attempt(err.code(), false, None, &path, started);
            return Err(err);
        }
    };

    let claims = decode_identity_token(&token).map_err(|err| {
        log_attempt(err.code(), false, None, &path, started);
        err
    })?;

    let user = user::Model::find_by_id(app_state.db(), claims.sub)
        .await
        .map_err(|db_err| {
            let err = AuthError::Internal(db_err.to_string());
            warn!(error = %db_err, user = claims.sub, path = %path, "DB error during identity verification");
            log_attempt(err.code(), false, Some(claims.sub), &path, started);
            err
        })?;

    let Some(user) = user else {
        let err = AuthError::UserNotFound;
        log_attempt(err.code(), false, Some(claims.sub), &path, started);
        return Err(err);
    };

    if !user.active {
        let err = AuthError::UserInactive;
        log_attempt(err.code(), false, Some(user.id), &path, started);
        return Err(err);
    }

    // A rotation event invalidates every token issued before it, without a
    // revocation list.
    if let Some(changed_at) = user.password_changed_at {
        if (claims.iat as i64) < changed_at.timestamp() {
            let err = AuthError::PasswordChanged;
            log_attempt(err.code(), false, Some(user.id), &path, started);
            return Err(err);
        }
    }

    // Best-effort activity stamp; failure must not fail the request.
    let db = app_state.db_clone();
    let user_id = user.id;
    tokio::spawn(async move {
        if let Err(e) = user::Model::touch_last_activity(&db, user_id, Utc::now()).await {
            warn!(error = %e, user = user_id, "Could not update last activity");
        }
    });

    parts.extensions.insert(AuthUser(claims));
    log_attempt("SUCCESS", true, Some(user.id), &path, started);

    Ok(next.run(Request::from_parts(parts, body)).await)
}

fn log_attempt(outcome: &str, success: bool, user_id: Option<i64>, path: &str, started: Instant) {
    let latency_ms = started.elapsed().as_millis() as u64;
    if success {
        info!(outcome, user = user_id.unwrap_or(0), path, latency_ms, "Auth attempt");
    } else {
        warn!(outcome, user = user_id.unwrap_or(0), path, latency_ms, "Auth attempt");
    }
}
