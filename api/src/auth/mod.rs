pub mod claims;
pub mod error;
pub mod extractors;
pub mod guards;
pub mod middleware;
pub mod session;

pub use claims::{AuthUser, Claims};
pub use error::{AuthError, RedeemError, SessionTokenError};

use chrono::{Duration, Utc};
use db::models::user::Role;
use jsonwebtoken::{EncodingKey, Header, encode};
use util::config;

/// Generates an identity JWT and its expiry timestamp for a given user.
pub fn generate_jwt(user_id: i64, role: Role) -> (String, String) {
    let now = Utc::now();
    let expiry = now + Duration::minutes(config::jwt_duration_minutes() as i64);

    let claims = Claims {
        sub: user_id,
        role,
        iat: now.timestamp() as usize,
        exp: expiry.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config::jwt_secret().as_bytes()),
    )
    .expect("Token encoding failed");

    (token, expiry.to_rfc3339())
}
