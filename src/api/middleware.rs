//! Auth middleware.
//!
//! The identity provider's session was verified upstream; requests arrive
//! with the established user id in `X-User-Id` (and optionally a display
//! name in `X-User-Name`). This layer rejects requests without an id, loads
//! the mirrored role from the store, and injects `AuthUser` for handlers.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use axum::Extension;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthUser};
use crate::auth::AuthClaims;
use crate::db;
use crate::models::Role;

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_NAME_HEADER: &str = "X-User-Name";

pub async fn require_user(
    Extension(ctx): Extension<ApiContext>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = AuthClaims {
        user_id: request
            .headers()
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(ApiError::Unauthorized)?
            .to_string(),
        name: request
            .headers()
            .get(USER_NAME_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };

    // Unknown users act as patients until a login mirrors their profile.
    let role = match ctx.state.open_store() {
        Ok(conn) => db::get_user(&conn, &claims.user_id)
            .ok()
            .flatten()
            .map(|profile| profile.role)
            .unwrap_or(Role::Patient),
        Err(e) => {
            tracing::warn!(error = %e, "role lookup failed, treating user as patient");
            Role::Patient
        }
    };

    request.extensions_mut().insert(AuthUser {
        id: claims.user_id,
        name: claims.name,
        role,
    });

    Ok(next.run(request).await)
}
