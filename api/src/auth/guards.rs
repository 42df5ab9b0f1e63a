//! Role-based access guards.
//!
//! One base guard over a closed set of allowed roles; the named wrappers are
//! what routes actually mount. All guards assume `require_auth` already ran
//! and inserted the verified `AuthUser` into request extensions.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use db::models::user::Role;
use tracing::warn;

use crate::auth::claims::AuthUser;
use crate::auth::error::AuthError;

fn roles_label(allowed: &[Role]) -> String {
    allowed
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Passes the request through when the caller holds any of `allowed`;
/// otherwise rejects with `ROLE_PERMISSION_DENIED`. An empty set denies
/// (fail-safe).
async fn require_role_base(
    req: Request<Body>,
    next: Next,
    allowed: &'static [Role],
) -> Result<Response, AuthError> {
    let user = req
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or(AuthError::MissingToken)?;

    if allowed.contains(&user.0.role) {
        Ok(next.run(req).await)
    } else {
        warn!(
            user = user.0.sub,
            role = %user.0.role,
            required = %roles_label(allowed),
            path = %req.uri().path(),
            "Role denied"
        );
        Err(AuthError::RolePermissionDenied(roles_label(allowed)))
    }
}

/// Basic guard to ensure the request carries a verified principal.
pub async fn require_authenticated(
    req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    if req.extensions().get::<AuthUser>().is_none() {
        return Err(AuthError::MissingToken);
    }
    Ok(next.run(req).await)
}

/// Students only (attendance redemption).
pub async fn require_student(req: Request<Body>, next: Next) -> Result<Response, AuthError> {
    require_role_base(req, next, &[Role::Student]).await
}

/// Teachers and admins (session issuance, subject reports).
pub async fn require_teacher(req: Request<Body>, next: Next) -> Result<Response, AuthError> {
    require_role_base(req, next, &[Role::Teacher, Role::Admin]).await
}

/// Admin-only guard.
pub async fn require_admin(req: Request<Body>, next: Next) -> Result<Response, AuthError> {
    require_role_base(req, next, &[Role::Admin]).await
}
