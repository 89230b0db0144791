//! Process-lifetime application state.
//!
//! Owned by the server for its whole lifetime and shared via `Arc`: the
//! configuration, one AI client, and the per-user chat session registry.
//! Store connections are opened per operation; SQLite handles the file-level
//! coordination.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::ai::{ChatRegistry, GenAiClient, OllamaClient};
use crate::config::Config;
use crate::db::{self, DatabaseError};

pub struct AppState {
    pub config: Config,
    ai: Arc<dyn GenAiClient>,
    chat: Mutex<ChatRegistry>,
}

impl AppState {
    /// Production state: AI calls go to the configured service.
    pub fn new(config: Config) -> Self {
        let ai = Arc::new(OllamaClient::new(&config.ai_base_url, config.ai_timeout_secs));
        Self::with_client(config, ai)
    }

    /// State with an injected AI client (tests use a mock here).
    pub fn with_client(config: Config, ai: Arc<dyn GenAiClient>) -> Self {
        let chat = Mutex::new(ChatRegistry::new(config.chat_sessions));
        Self { config, ai, chat }
    }

    /// The shared AI client.
    pub fn ai(&self) -> Arc<dyn GenAiClient> {
        Arc::clone(&self.ai)
    }

    /// Lock the chat registry. A poisoned lock is unrecoverable state
    /// corruption, so sessions are reset rather than propagating the panic.
    pub fn lock_chat(&self) -> MutexGuard<'_, ChatRegistry> {
        match self.chat.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("chat registry lock poisoned, resetting sessions");
                let mut guard = poisoned.into_inner();
                *guard = ChatRegistry::new(self.config.chat_sessions);
                guard
            }
        }
    }

    /// Open a store connection.
    pub fn open_store(&self) -> Result<Connection, DatabaseError> {
        db::open_store(&self.config.db_path)
    }
}
