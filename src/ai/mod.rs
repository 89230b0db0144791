//! AI service integration: assessment requests, history summaries, and the
//! conversational assistant. The actual risk reasoning happens inside the
//! external model; this layer owns the prompt/schema contract and the
//! validation of what comes back.

pub mod assessment;
pub mod chat;
pub mod client;
pub mod history;
pub mod prompt;

pub use assessment::{parse_assessment_reply, request_assessment};
pub use chat::{ChatRegistry, ChatSession};
pub use client::{ChatRole, ChatTurn, GenAiClient, GenerationOptions, MockAiClient, OllamaClient};
pub use history::{summarize_history, FIRST_VISIT_SENTINEL};

/// Errors from AI service operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AiError {
    #[error("Could not reach the AI service at {0}")]
    Unreachable(String),

    #[error("AI request timed out after {0} seconds")]
    Timeout(u64),

    #[error("AI service returned an error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("AI reply could not be parsed: {0}")]
    MalformedReply(String),

    #[error("AI reply is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Network error: {0}")]
    Network(String),
}

/// The three user-facing failure categories. No finer distinction is
/// surfaced: either the service was unreachable, or it replied in an
/// unexpected shape, or something else went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    Connectivity,
    UnexpectedShape,
    Other,
}

impl AiError {
    pub fn category(&self) -> FailureCategory {
        match self {
            AiError::Unreachable(_) | AiError::Timeout(_) => FailureCategory::Connectivity,
            AiError::MalformedReply(_) | AiError::MissingField(_) => FailureCategory::UnexpectedShape,
            AiError::Api { .. } | AiError::Network(_) => FailureCategory::Other,
        }
    }
}
