//! In-memory conversation history, keyed by session id.
//!
//! Sessions are created on first turn, bounded to a sliding window of
//! recent entries, cleared on an explicit reset, and never persisted —
//! history dies with the process. Concurrent resets and writes to the same
//! session id are last-write-wins, which is acceptable because sessions are
//! per-tab/per-client.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use visage_types::{ConversationTurn, Role};

/// Maximum retained entries per session (user and assistant turns both
/// count); oldest entries drop first.
const MAX_HISTORY_ENTRIES: usize = 10;

/// Concurrency-safe store for per-session conversation history.
///
/// Uses `std::sync::RwLock` intentionally: all lock acquisitions are brief
/// HashMap operations that never span `.await` points, making a synchronous
/// lock safe and more efficient than `tokio::sync::RwLock`.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, Vec<ConversationTurn>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prior turns for a session; empty for unknown ids.
    pub fn history(&self, session_id: &str) -> Vec<ConversationTurn> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Records one exchange: the user turn followed by the assistant turn,
    /// then trims the session to the most recent entries.
    pub fn append_exchange(&self, session_id: &str, user_text: &str, assistant_text: &str) {
        let mut sessions = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let history = sessions.entry(session_id.to_string()).or_default();
        history.push(ConversationTurn::new(Role::User, user_text));
        history.push(ConversationTurn::new(Role::Assistant, assistant_text));
        if history.len() > MAX_HISTORY_ENTRIES {
            let excess = history.len() - MAX_HISTORY_ENTRIES;
            history.drain(..excess);
        }
    }

    /// Drops a session's history entirely.
    pub fn reset(&self, session_id: &str) {
        self.inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(session_id);
    }
}
