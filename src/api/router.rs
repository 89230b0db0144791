//! API router.
//!
//! Returns a composable `Router`. Routes live under `/api/`; everything
//! except health and provider-error localization requires an authenticated
//! user. The outermost layer is the supervisory boundary: any handler panic
//! becomes a static recovery response instead of a dropped connection.

use std::any::Any;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Extension, Json, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::AppState;

/// Build the API router.
pub fn api_router(state: Arc<AppState>) -> Router {
    let ctx = ApiContext::new(state);
    build_router(ctx)
}

fn build_router(ctx: ApiContext) -> Router {
    // Protected routes — authenticated user required.
    let protected = Router::new()
        .route(
            "/records",
            post(endpoints::records::submit).get(endpoints::records::list_own),
        )
        .route("/records/:id/report.pdf", get(endpoints::records::report_pdf))
        .route("/chat", post(endpoints::chat::send))
        .route("/auth/login", post(endpoints::auth::login))
        .route("/admin/records", get(endpoints::admin::list_all))
        .route("/admin/records/:id", delete(endpoints::admin::delete))
        .route("/admin/export.csv", get(endpoints::admin::export_csv))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::require_user))
        // Extension must be outermost so the middleware can extract ApiContext.
        .layer(Extension(ctx.clone()));

    // Unprotected routes: liveness, and provider-error localization (a failed
    // sign-in has no user yet).
    let unprotected = Router::new()
        .route("/health", get(endpoints::health::check))
        .route(
            "/auth/provider-message/:code",
            get(endpoints::auth::provider_message),
        )
        .with_state(ctx);

    Router::new()
        .nest("/api", protected)
        .nest("/api", unprotected)
        .layer(CatchPanicLayer::custom(recovery_response))
        .layer(CorsLayer::permissive())
}

/// Supervisory boundary: one static recovery response for any panic below.
/// In-memory view state is gone at this point; the client reloads.
fn recovery_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("handler panicked, returning recovery response");
    let body = serde_json::json!({
        "error": {
            "code": "UNEXPECTED",
            "message": "Something went wrong. Reload the page and try again."
        }
    });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
