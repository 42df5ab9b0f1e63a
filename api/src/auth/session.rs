//! Attendance session tokens: issuance and verification.
//!
//! A session exists only as a signed token — there is no server-side session
//! row until a redemption lands. Tokens are signed with the attendance secret
//! (`ATTENDANCE_JWT_SECRET`, falling back to the identity secret) and expire
//! by explicit timestamp comparison against a caller-supplied clock, so no
//! background sweep is needed and expiry is testable with a simulated `now`.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use util::config;

use crate::auth::error::SessionTokenError;

/// Default session lifetime when the issuer does not specify one.
pub const DEFAULT_SESSION_MINUTES: u64 = 10;

/// Claims carried by an attendance session token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionClaims {
    /// Globally unique session id (`QR_<unix-millis>_<suffix>`).
    pub sid: String,
    /// Issuing teacher's user id.
    pub sub: i64,
    pub teacher_name: String,
    /// Free-text activity label (class/subject name).
    pub subject: String,
    pub iat: usize,
    pub exp: usize,
}

/// A freshly minted session credential plus the plain facts the issuer needs
/// to display alongside it.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
    pub duration_minutes: u64,
}

fn new_session_id(now: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|c| (c as char).to_ascii_lowercase())
        .collect();
    format!("QR_{}_{}", now.timestamp_millis(), suffix)
}

/// Mints a session token scoped to one activity label and one expiry instant.
///
/// `duration_minutes` defaults to [`DEFAULT_SESSION_MINUTES`] and is clamped
/// to `1..=ATTENDANCE_MAX_DURATION_MINUTES` so a typo cannot produce an
/// indefinitely valid credential. Role gating happens at the route guard;
/// this function only mints.
pub fn issue_session(
    issuer_id: i64,
    issuer_name: &str,
    subject: &str,
    duration_minutes: Option<u64>,
    now: DateTime<Utc>,
) -> IssuedSession {
    let duration = duration_minutes
        .unwrap_or(DEFAULT_SESSION_MINUTES)
        .clamp(1, config::attendance_max_duration_minutes());

    let session_id = new_session_id(now);
    let expires_at = now + Duration::minutes(duration as i64);

    let claims = SessionClaims {
        sid: session_id.clone(),
        sub: issuer_id,
        teacher_name: issuer_name.to_owned(),
        subject: subject.to_owned(),
        iat: now.timestamp() as usize,
        exp: expires_at.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config::attendance_jwt_secret().as_bytes()),
    )
    .expect("Session token encoding failed");

    IssuedSession {
        token,
        session_id,
        expires_at,
        duration_minutes: duration,
    }
}

/// Parses and verifies a session token against the supplied clock.
///
/// Signature failures and structural problems surface as `InvalidFormat`;
/// expiry is checked here by plain timestamp comparison (the library's own
/// exp validation is disabled so the clock can be injected).
pub fn verify_session_token(
    token: &str,
    now: DateTime<Utc>,
) -> Result<SessionClaims, SessionTokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.leeway = 0;

    let claims = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(config::attendance_jwt_secret().as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| SessionTokenError::InvalidFormat)?;

    if now.timestamp() as usize > claims.exp {
        return Err(SessionTokenError::Expired);
    }

    Ok(claims)
}
