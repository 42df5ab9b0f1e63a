use db::models::user::Role;
use serde::{Deserialize, Serialize};

/// Identity token claims: who the caller is, what role they hold, and the
/// issue/expiry instants (unix seconds).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: i64,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
}

/// Verified principal inserted into request extensions by the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);
