//! Per-session conversation history.

use crate::rag::types::ChatTurn;
use docchat_core::ChatConfig;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

struct Conversation {
    turns: VecDeque<ChatTurn>,
    last_active: Instant,
}

/// Session-keyed chat histories with idle expiry and a session cap.
///
/// A session exists once its first turn is recorded. Sessions idle for
/// longer than the TTL are dropped; when the cap is exceeded the least
/// recently active session goes first.
pub struct ConversationStore {
    sessions: Mutex<HashMap<String, Conversation>>,
    ttl: Duration,
    max_sessions: usize,
    max_history_turns: Option<usize>,
}

impl ConversationStore {
    pub fn new(ttl: Duration, max_sessions: usize, max_history_turns: Option<usize>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
            max_sessions: max_sessions.max(1),
            max_history_turns,
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(
            config.session_ttl(),
            config.max_sessions,
            config.max_history_turns,
        )
    }

    /// Snapshot of a session's turns, oldest first.
    pub fn history(&self, session: &str) -> Vec<ChatTurn> {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        self.evict_expired(&mut sessions, Instant::now());

        sessions
            .get(session)
            .map(|c| c.turns.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Append a turn, creating the session on first use.
    pub fn record(&self, session: &str, turn: ChatTurn) {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        self.evict_expired(&mut sessions, now);

        let conversation = sessions
            .entry(session.to_string())
            .or_insert_with(|| Conversation {
                turns: VecDeque::new(),
                last_active: now,
            });
        conversation.turns.push_back(turn);
        conversation.last_active = now;

        if let Some(cap) = self.max_history_turns {
            while conversation.turns.len() > cap {
                conversation.turns.pop_front();
            }
        }

        while sessions.len() > self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, c)| c.last_active)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    tracing::debug!(session = %id, "Evicting least recently active session");
                    sessions.remove(&id);
                }
                None => break,
            }
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn evict_expired(&self, sessions: &mut HashMap<String, Conversation>, now: Instant) {
        let before = sessions.len();
        sessions.retain(|_, c| now.duration_since(c.last_active) <= self.ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!("Evicted {} idle sessions", evicted);
        }
    }
}

/// Render turns as `Human: q\nAI: a` blocks separated by blank lines.
pub fn format_chat_history(turns: &[ChatTurn]) -> String {
    turns
        .iter()
        .map(|t| format!("Human: {}\nAI: {}", t.question, t.answer))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ConversationStore {
        ConversationStore::new(Duration::from_secs(60), 10, None)
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(format_chat_history(&[]), "");
    }

    #[test]
    fn test_format_turns() {
        let turns = vec![ChatTurn::new("q1", "a1"), ChatTurn::new("q2", "a2")];
        assert_eq!(
            format_chat_history(&turns),
            "Human: q1\nAI: a1\n\nHuman: q2\nAI: a2"
        );
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = store();
        store.record("alice", ChatTurn::new("q", "a"));

        assert_eq!(store.history("alice").len(), 1);
        assert!(store.history("bob").is_empty());
        assert_eq!(store.session_count(), 1);
    }

    #[test]
    fn test_history_keeps_order() {
        let store = store();
        for i in 0..3 {
            store.record("s", ChatTurn::new(format!("q{}", i), format!("a{}", i)));
        }
        let questions: Vec<String> = store.history("s").into_iter().map(|t| t.question).collect();
        assert_eq!(questions, vec!["q0", "q1", "q2"]);
    }

    #[test]
    fn test_turn_cap_drops_oldest() {
        let store = ConversationStore::new(Duration::from_secs(60), 10, Some(2));
        for i in 0..4 {
            store.record("s", ChatTurn::new(format!("q{}", i), "a"));
        }
        let history = store.history("s");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].question, "q2");
    }

    #[test]
    fn test_capacity_evicts_least_recent() {
        let store = ConversationStore::new(Duration::from_secs(60), 2, None);
        store.record("first", ChatTurn::new("q", "a"));
        std::thread::sleep(Duration::from_millis(5));
        store.record("second", ChatTurn::new("q", "a"));
        std::thread::sleep(Duration::from_millis(5));
        store.record("third", ChatTurn::new("q", "a"));

        assert_eq!(store.session_count(), 2);
        assert!(store.history("first").is_empty());
        assert_eq!(store.history("third").len(), 1);
    }

    #[test]
    fn test_idle_sessions_expire() {
        let store = ConversationStore::new(Duration::from_millis(10), 10, None);
        store.record("s", ChatTurn::new("q", "a"));
        std::thread::sleep(Duration::from_millis(30));

        assert!(store.history("s").is_empty());
        assert_eq!(store.session_count(), 0);
    }
}
