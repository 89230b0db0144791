//! Conversational assistant sessions.
//!
//! One live session per user id, created lazily and seeded once with the
//! fixed scope instruction plus that user's history summary as computed at
//! creation time. The summary is not refreshed per message; a failed stream
//! discards the session so the next message starts fresh with a new summary.
//!
//! The registry is bounded: least-recently-used sessions are evicted once the
//! configured capacity is reached.

use std::collections::{HashMap, VecDeque};

use super::client::{ChatTurn, GenAiClient, GenerationOptions};
use super::prompt::chat_system_instruction;
use super::AiError;

pub const DEFAULT_SESSION_CAPACITY: usize = 64;

/// One ongoing multi-turn conversation.
pub struct ChatSession {
    system: String,
    turns: Vec<ChatTurn>,
}

impl ChatSession {
    /// Seed a new session with the user's history summary.
    pub fn new(history_summary: &str) -> Self {
        Self {
            system: chat_system_instruction(history_summary),
            turns: Vec::new(),
        }
    }

    /// Number of user/assistant turns recorded so far.
    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    /// Send one message; fragments stream through `on_fragment` as they
    /// arrive. On success the exchange is appended to the session history and
    /// the concatenated reply returned. On failure the session must be
    /// discarded by the caller (the registry's `restore` is simply skipped).
    pub fn send_message<C: GenAiClient + ?Sized>(
        &mut self,
        client: &C,
        model: &str,
        text: &str,
        on_fragment: &mut dyn FnMut(&str),
    ) -> Result<String, AiError> {
        let mut request_turns = Vec::with_capacity(self.turns.len() + 2);
        request_turns.push(ChatTurn::system(self.system.clone()));
        request_turns.extend(self.turns.iter().cloned());
        request_turns.push(ChatTurn::user(text));

        let reply = client.chat_stream(model, &request_turns, &GenerationOptions::default(), on_fragment)?;

        self.turns.push(ChatTurn::user(text));
        self.turns.push(ChatTurn::assistant(reply.clone()));
        Ok(reply)
    }
}

/// Per-user session registry with LRU eviction.
///
/// Lifecycle per message: `take_or_create` removes the session from the
/// registry (creating it from the seed closure when absent), the caller runs
/// the send outside the registry lock, then `restore`s on success. A failed
/// send never restores, which is exactly the discard-on-failure policy.
pub struct ChatRegistry {
    capacity: usize,
    sessions: HashMap<String, ChatSession>,
    recency: VecDeque<String>,
}

impl ChatRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            sessions: HashMap::new(),
            recency: VecDeque::new(),
        }
    }

    /// Remove the user's session for use, creating it when absent.
    ///
    /// `seed_summary` is only invoked on creation — an existing session keeps
    /// the history summary it was born with.
    pub fn take_or_create(
        &mut self,
        user_id: &str,
        seed_summary: impl FnOnce() -> String,
    ) -> ChatSession {
        self.recency.retain(|id| id != user_id);
        match self.sessions.remove(user_id) {
            Some(session) => session,
            None => ChatSession::new(&seed_summary()),
        }
    }

    /// Put a session back after a successful send, evicting the
    /// least-recently-used session if the registry is over capacity.
    pub fn restore(&mut self, user_id: &str, session: ChatSession) {
        self.sessions.insert(user_id.to_string(), session);
        self.recency.push_back(user_id.to_string());

        while self.sessions.len() > self.capacity {
            let Some(oldest) = self.recency.pop_front() else {
                break;
            };
            if self.sessions.remove(&oldest).is_some() {
                tracing::debug!(user_id = %oldest, "evicted least-recently-used chat session");
            }
        }
    }

    /// Drop a user's session outright (e.g. on logout).
    pub fn discard(&mut self, user_id: &str) {
        self.sessions.remove(user_id);
        self.recency.retain(|id| id != user_id);
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.sessions.contains_key(user_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for ChatRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockAiClient;

    #[test]
    fn session_created_lazily_and_seeded_once() {
        let mut registry = ChatRegistry::new(4);
        let mut seeds = 0;

        let session = registry.take_or_create("u1", || {
            seeds += 1;
            "summary v1".to_string()
        });
        registry.restore("u1", session);
        assert_eq!(seeds, 1);

        let session = registry.take_or_create("u1", || {
            seeds += 1;
            "summary v2".to_string()
        });
        assert_eq!(seeds, 1, "existing session must not reseed");
        assert!(session.system.contains("summary v1"));
    }

    #[test]
    fn send_appends_turns_and_streams_fragments() {
        let client = MockAiClient::new("").with_chat_fragments(vec![
            "الوزن ".to_string(),
            "طبيعي".to_string(),
        ]);
        let mut session = ChatSession::new("First visit.");

        let mut streamed = String::new();
        let reply = session
            .send_message(&client, "medgemma:4b", "هل وزني طبيعي؟", &mut |fragment| {
                streamed.push_str(fragment)
            })
            .unwrap();

        assert_eq!(reply, "الوزن طبيعي");
        assert_eq!(streamed, reply, "fragments concatenate to the full reply");
        assert_eq!(session.turn_count(), 2);
    }

    #[test]
    fn request_carries_system_history_and_prior_turns() {
        let client = MockAiClient::new("").with_chat_fragments(vec!["رد".to_string()]);
        let mut session = ChatSession::new("Previous visits: weight 68 kg");

        session
            .send_message(&client, "m", "سؤال أول", &mut |_| {})
            .unwrap();
        session
            .send_message(&client, "m", "سؤال ثانٍ", &mut |_| {})
            .unwrap();

        let calls = client.captured_calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].system.contains("weight 68 kg"));
        assert_eq!(calls[1].prompt, "سؤال ثانٍ");
        assert_eq!(session.turn_count(), 4);
    }

    #[test]
    fn failed_send_leaves_session_unrestored() {
        let client = MockAiClient::new("")
            .with_chat_fragments(vec!["جزء".to_string()])
            .with_chat_error(AiError::Network("reset".into()));
        let mut registry = ChatRegistry::new(4);

        let mut session = registry.take_or_create("u1", || "summary v1".to_string());
        let result = session.send_message(&client, "m", "سؤال", &mut |_| {});
        assert!(result.is_err());
        // Discard-on-failure: do not restore.
        drop(session);
        assert!(!registry.contains("u1"));

        // Next message starts a fresh session with a fresh summary.
        let session = registry.take_or_create("u1", || "summary v2".to_string());
        assert!(session.system.contains("summary v2"));
        assert_eq!(session.turn_count(), 0);
    }

    #[test]
    fn registry_bounds_sessions_with_lru_eviction() {
        let mut registry = ChatRegistry::new(2);
        for user in ["u1", "u2", "u3"] {
            let session = registry.take_or_create(user, || "s".to_string());
            registry.restore(user, session);
        }
        assert_eq!(registry.len(), 2);
        assert!(!registry.contains("u1"), "oldest session evicted");
        assert!(registry.contains("u2"));
        assert!(registry.contains("u3"));
    }

    #[test]
    fn touching_a_session_protects_it_from_eviction() {
        let mut registry = ChatRegistry::new(2);
        for user in ["u1", "u2"] {
            let session = registry.take_or_create(user, || "s".to_string());
            registry.restore(user, session);
        }
        // Touch u1 so u2 becomes the LRU entry.
        let session = registry.take_or_create("u1", || "s".to_string());
        registry.restore("u1", session);

        let session = registry.take_or_create("u3", || "s".to_string());
        registry.restore("u3", session);

        assert!(registry.contains("u1"));
        assert!(!registry.contains("u2"));
        assert!(registry.contains("u3"));
    }

    #[test]
    fn discard_removes_session() {
        let mut registry = ChatRegistry::new(4);
        let session = registry.take_or_create("u1", || "s".to_string());
        registry.restore("u1", session);
        registry.discard("u1");
        assert!(registry.is_empty());
    }
}
