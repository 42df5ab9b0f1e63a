use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};
use headers::{Authorization, Cookie, HeaderMapExt, authorization::Bearer};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use util::config;

use crate::auth::claims::{AuthUser, Claims};
use crate::auth::error::AuthError;

/// Pulls the raw identity token out of a request, checking the supported
/// locations in a fixed priority order; the first non-empty match wins:
///
/// 1. `Authorization: Bearer <token>` header
/// 2. `token` query parameter
/// 3. `x-auth-token` header
/// 4. `token` cookie
pub fn extract_token(parts: &Parts) -> Option<String> {
    if let Some(Authorization(bearer)) = parts.headers.typed_get::<Authorization<Bearer>>() {
        let token = bearer.token();
        if !token.is_empty() {
            return Some(token.to_owned());
        }
    }

    if let Some(query) = parts.uri.query() {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if key == "token" && !value.is_empty() {
                return Some(value.into_owned());
            }
        }
    }

    if let Some(value) = parts.headers.get("x-auth-token") {
        if let Ok(token) = value.to_str() {
            if !token.is_empty() {
                return Some(token.to_owned());
            }
        }
    }

    if let Some(cookie) = parts.headers.typed_get::<Cookie>() {
        if let Some(token) = cookie.get("token") {
            if !token.is_empty() {
                return Some(token.to_owned());
            }
        }
    }

    None
}

/// Decodes and verifies an identity token (signature + expiry, zero leeway),
/// mapping the library's error kinds onto the failure taxonomy.
pub fn decode_identity_token(token: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config::jwt_secret().as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|err| match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::ImmatureSignature => AuthError::TokenNotActive,
        _ => AuthError::InvalidToken,
    })
}

/// Stateless extraction of `AuthUser` from request parts.
///
/// Prefers the principal the auth middleware already verified and stored in
/// extensions; otherwise decodes the token directly. Note that this path does
/// not consult the database — routes that need the active/rotation checks
/// must sit behind `require_auth`.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let token = extract_token(parts).ok_or(AuthError::MissingToken)?;
        let claims = decode_identity_token(&token)?;
        Ok(AuthUser(claims))
    }
}
