//! HTTP client for the generative-AI service.
//!
//! Two call shapes are consumed: single-shot structured generation with an
//! enforced output schema, and multi-turn streaming chat. Both run on the
//! blocking client; callers on the async runtime wrap them in blocking tasks.

use std::io::{BufRead, BufReader};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::AiError;

/// Speaker of one conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One turn of a chat conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Generation parameters. Low temperature by default — assessments must be
/// reproducible, not creative.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i32>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            top_p: 0.9,
            top_k: 40,
            num_predict: None,
        }
    }
}

/// Generative-AI service abstraction (allows mocking).
pub trait GenAiClient: Send + Sync {
    /// Single-shot generation. `format` is the JSON schema the service is
    /// asked to enforce on its output. Returns the raw reply text.
    fn generate_structured(
        &self,
        model: &str,
        system: &str,
        prompt: &str,
        format: &serde_json::Value,
        options: &GenerationOptions,
    ) -> Result<String, AiError>;

    /// Multi-turn streaming chat. Each produced text fragment is pushed to
    /// `on_fragment` as it arrives; the concatenated reply is returned once
    /// the stream ends.
    fn chat_stream(
        &self,
        model: &str,
        turns: &[ChatTurn],
        options: &GenerationOptions,
        on_fragment: &mut dyn FnMut(&str),
    ) -> Result<String, AiError>;
}

// ═══════════════════════════════════════════════════════════
// OllamaClient
// ═══════════════════════════════════════════════════════════

/// Ollama HTTP client.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaClient {
    /// Create a client pointing at the given Ollama instance.
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        }
    }

    /// Default local instance at localhost:11434 with 5-minute timeout.
    pub fn default_local() -> Self {
        Self::new("http://localhost:11434", 300)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn send_error(&self, e: reqwest::Error) -> AiError {
        if e.is_connect() {
            AiError::Unreachable(self.base_url.clone())
        } else if e.is_timeout() {
            AiError::Timeout(self.timeout_secs)
        } else {
            AiError::Network(e.to_string())
        }
    }
}

/// Request body for `/api/generate`.
#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    format: &'a serde_json::Value,
    options: &'a GenerationOptions,
}

/// Response body from `/api/generate`.
#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Request body for `/api/chat`.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    stream: bool,
    options: &'a GenerationOptions,
}

/// One NDJSON line of a streaming `/api/chat` response.
#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: Option<ChatChunkMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ChatChunkMessage {
    content: String,
}

impl GenAiClient for OllamaClient {
    fn generate_structured(
        &self,
        model: &str,
        system: &str,
        prompt: &str,
        format: &serde_json::Value,
        options: &GenerationOptions,
    ) -> Result<String, AiError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model,
            prompt,
            system,
            stream: false,
            format,
            options,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| AiError::MalformedReply(e.to_string()))?;

        Ok(parsed.response)
    }

    fn chat_stream(
        &self,
        model: &str,
        turns: &[ChatTurn],
        options: &GenerationOptions,
        on_fragment: &mut dyn FnMut(&str),
    ) -> Result<String, AiError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = ChatRequest {
            model,
            messages: turns,
            stream: true,
            options,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let mut full = String::new();
        let reader = BufReader::new(response);
        for line in reader.lines() {
            let line = line.map_err(|e| AiError::Network(e.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }
            let chunk: ChatChunk = serde_json::from_str(&line)
                .map_err(|e| AiError::MalformedReply(e.to_string()))?;
            if let Some(error) = chunk.error {
                return Err(AiError::Api {
                    status: status.as_u16(),
                    body: error,
                });
            }
            if let Some(message) = chunk.message {
                if !message.content.is_empty() {
                    on_fragment(&message.content);
                    full.push_str(&message.content);
                }
            }
            if chunk.done {
                break;
            }
        }

        Ok(full)
    }
}

// ═══════════════════════════════════════════════════════════
// MockAiClient — for tests
// ═══════════════════════════════════════════════════════════

/// Mock AI client: configurable replies, captured prompts.
pub struct MockAiClient {
    generate_reply: Result<String, AiError>,
    chat_fragments: Vec<String>,
    chat_error: Option<AiError>,
    captured: Mutex<Vec<CapturedCall>>,
}

/// One captured `generate_structured` or `chat_stream` invocation.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub system: String,
    pub prompt: String,
}

impl MockAiClient {
    pub fn new(generate_reply: &str) -> Self {
        Self {
            generate_reply: Ok(generate_reply.to_string()),
            chat_fragments: vec!["مرحباً".to_string()],
            chat_error: None,
            captured: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: AiError) -> Self {
        Self {
            generate_reply: Err(error.clone()),
            chat_fragments: Vec::new(),
            chat_error: Some(error),
            captured: Mutex::new(Vec::new()),
        }
    }

    pub fn with_chat_fragments(mut self, fragments: Vec<String>) -> Self {
        self.chat_fragments = fragments;
        self
    }

    /// Emit the configured fragments, then fail the stream.
    pub fn with_chat_error(mut self, error: AiError) -> Self {
        self.chat_error = Some(error);
        self
    }

    /// Every call captured so far, oldest first.
    pub fn captured_calls(&self) -> Vec<CapturedCall> {
        self.captured.lock().expect("mock lock").clone()
    }
}

impl GenAiClient for MockAiClient {
    fn generate_structured(
        &self,
        _model: &str,
        system: &str,
        prompt: &str,
        _format: &serde_json::Value,
        _options: &GenerationOptions,
    ) -> Result<String, AiError> {
        self.captured.lock().expect("mock lock").push(CapturedCall {
            system: system.to_string(),
            prompt: prompt.to_string(),
        });
        self.generate_reply.clone()
    }

    fn chat_stream(
        &self,
        _model: &str,
        turns: &[ChatTurn],
        _options: &GenerationOptions,
        on_fragment: &mut dyn FnMut(&str),
    ) -> Result<String, AiError> {
        let system = turns
            .iter()
            .find(|t| t.role == ChatRole::System)
            .map(|t| t.content.clone())
            .unwrap_or_default();
        let prompt = turns
            .iter()
            .rev()
            .find(|t| t.role == ChatRole::User)
            .map(|t| t.content.clone())
            .unwrap_or_default();
        self.captured
            .lock()
            .expect("mock lock")
            .push(CapturedCall { system, prompt });

        let mut full = String::new();
        for fragment in &self.chat_fragments {
            on_fragment(fragment);
            full.push_str(fragment);
        }
        if let Some(error) = &self.chat_error {
            return Err(error.clone());
        }
        Ok(full)
    }
}
