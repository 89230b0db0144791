//! Auth endpoints: profile mirroring and provider-error localization.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthUser};
use crate::auth::localized_provider_message;
use crate::db;
use crate::models::UserProfile;

#[derive(Deserialize, Default)]
pub struct LoginRequest {
    /// Display name as known to the provider, if the client has one.
    #[serde(default)]
    pub name: Option<String>,
}

/// `POST /api/auth/login` — mirror the provider profile.
///
/// Creates the profile document on first login, refreshes `last_login` (and
/// the name when provided) afterwards. The stored role is never changed here.
pub async fn login(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    body: Option<Json<LoginRequest>>,
) -> Result<Json<UserProfile>, ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let name = request.name.or(user.name);

    let conn = ctx.state.open_store()?;
    let profile = db::upsert_user_login(&conn, &user.id, name.as_deref())?;
    tracing::info!(user_id = %profile.id, role = profile.role.as_str(), "login mirrored");
    Ok(Json(profile))
}

#[derive(Serialize)]
pub struct ProviderMessageResponse {
    pub code: String,
    pub message: &'static str,
}

/// `GET /api/auth/provider-message/:code` — Arabic message for a provider
/// error code. Unauthenticated: sign-in failures have no user yet.
pub async fn provider_message(Path(code): Path<String>) -> Json<ProviderMessageResponse> {
    let message = localized_provider_message(&code);
    Json(ProviderMessageResponse { code, message })
}
