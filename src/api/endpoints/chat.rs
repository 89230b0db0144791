//! Chat endpoint.
//!
//! `POST /api/chat` streams the assistant's reply body as text fragments, in
//! the order the model produces them. The session lives in the registry for
//! follow-up turns; a failed stream discards it so the next message starts a
//! fresh session with a freshly computed history summary.

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;

use crate::ai::{summarize_history, FIRST_VISIT_SENTINEL};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthUser};
use crate::db;

const MAX_MESSAGE_CHARS: usize = 2000;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// `POST /api/chat` — send one message, stream the reply.
pub async fn send(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, ApiError> {
    let message = request.message.trim().to_string();
    if message.is_empty() {
        return Err(ApiError::BadRequest("Message cannot be empty".into()));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Message too long (max {MAX_MESSAGE_CHARS} chars)"
        )));
    }

    let state = ctx.state.clone();
    let user_id = user.id.clone();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Result<Bytes, std::convert::Infallible>>();

    tokio::task::spawn_blocking(move || {
        let mut session = {
            let mut registry = state.lock_chat();
            registry.take_or_create(&user_id, || {
                // Seeded once, at session creation. A store failure degrades
                // to the first-visit sentinel rather than blocking the chat.
                match state.open_store() {
                    Ok(conn) => summarize_history(&db::list_records_for_user(&conn, &user_id)),
                    Err(e) => {
                        tracing::warn!(error = %e, "history summary unavailable for chat seed");
                        FIRST_VISIT_SENTINEL.to_string()
                    }
                }
            })
        };

        let client = state.ai();
        let result = session.send_message(
            client.as_ref(),
            &state.config.chat_model,
            &message,
            &mut |fragment| {
                let _ = tx.send(Ok(Bytes::from(fragment.to_owned())));
            },
        );

        match result {
            Ok(_) => state.lock_chat().restore(&user_id, session),
            Err(e) => {
                // Session dropped here; the next message reseeds.
                tracing::warn!(user_id = %user_id, error = %e, "chat stream failed, session discarded");
            }
        }
    });

    let stream = futures_util::stream::poll_fn(move |cx| rx.poll_recv(cx));
    let response = (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(stream),
    )
        .into_response();
    Ok(response)
}
