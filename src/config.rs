//! Application configuration: constants, data directory, and environment
//! overrides. Every knob has a default that works for a local deployment.

use std::net::SocketAddr;
use std::path::PathBuf;

pub const APP_NAME: &str = "Hawwa";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> &'static str {
    "info,hawwa=debug"
}

/// Application data directory: ~/Hawwa/ (user-visible).
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join(APP_NAME)
}

#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP bind address.
    pub bind_addr: SocketAddr,
    /// Path of the record store.
    pub db_path: PathBuf,
    /// Base URL of the generative-AI service.
    pub ai_base_url: String,
    /// Model for assessment requests.
    pub assessment_model: String,
    /// Model for the chat assistant.
    pub chat_model: String,
    /// AI request timeout in seconds.
    pub ai_timeout_secs: u64,
    /// Chat session registry bound (LRU eviction beyond this).
    pub chat_sessions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8787".parse().expect("static addr"),
            db_path: app_data_dir().join("hawwa.db"),
            ai_base_url: "http://localhost:11434".to_string(),
            assessment_model: "medgemma:4b".to_string(),
            chat_model: "medgemma:4b".to_string(),
            ai_timeout_secs: 300,
            chat_sessions: crate::ai::chat::DEFAULT_SESSION_CAPACITY,
        }
    }
}

impl Config {
    /// Build from `HAWWA_*` environment variables, falling back to defaults.
    /// Malformed values are logged and ignored rather than aborting startup.
    pub fn from_env() -> Self {
        let mut config = Config::default();

        if let Ok(bind) = std::env::var("HAWWA_BIND") {
            match bind.parse() {
                Ok(addr) => config.bind_addr = addr,
                Err(_) => tracing::warn!(%bind, "ignoring malformed HAWWA_BIND"),
            }
        }
        if let Ok(path) = std::env::var("HAWWA_DB") {
            config.db_path = PathBuf::from(path);
        }
        if let Ok(url) = std::env::var("HAWWA_AI_URL") {
            config.ai_base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(model) = std::env::var("HAWWA_AI_MODEL") {
            config.assessment_model = model.clone();
            config.chat_model = model;
        }
        if let Ok(model) = std::env::var("HAWWA_CHAT_MODEL") {
            config.chat_model = model;
        }
        if let Ok(timeout) = std::env::var("HAWWA_AI_TIMEOUT_SECS") {
            match timeout.parse() {
                Ok(secs) => config.ai_timeout_secs = secs,
                Err(_) => tracing::warn!(%timeout, "ignoring malformed HAWWA_AI_TIMEOUT_SECS"),
            }
        }
        if let Ok(sessions) = std::env::var("HAWWA_CHAT_SESSIONS") {
            match sessions.parse() {
                Ok(n) => config.chat_sessions = n,
                Err(_) => tracing::warn!(%sessions, "ignoring malformed HAWWA_CHAT_SESSIONS"),
            }
        }

        config
    }
}
