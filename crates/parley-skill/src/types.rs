//! Domain types shared by the interpreter, session manager and composer.

use serde::{Deserialize, Serialize};

// =============================================================================
// Chat history
// =============================================================================

/// Speaker of a chat history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One entry of the chat history carried in session attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub role: ChatRole,
    pub text: String,
}

impl ChatEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
        }
    }
}

// =============================================================================
// Session state
// =============================================================================

/// Conversation memory reconstructed from the platform's session attributes.
///
/// `chat_history` always alternates user/assistant starting with user, and
/// holds whole pairs only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub chat_history: Vec<ChatEntry>,
    #[serde(default)]
    pub followup_questions: Vec<String>,
    /// Consecutive unrecognized turns; reset by any recognized turn.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub unrecognized_count: u32,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

impl SessionState {
    /// Number of complete user/assistant pairs in the history.
    pub fn turn_count(&self) -> usize {
        self.chat_history.len() / 2
    }

    /// Whether the history satisfies the alternation invariant.
    pub fn is_well_formed(&self) -> bool {
        self.chat_history.len() % 2 == 0
            && self.chat_history.iter().enumerate().all(|(i, entry)| {
                let expected = if i % 2 == 0 {
                    ChatRole::User
                } else {
                    ChatRole::Assistant
                };
                entry.role == expected
            })
    }
}

// =============================================================================
// Interpreted turns
// =============================================================================

/// One inbound query turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub session_id: String,
    pub utterance: String,
    pub is_new_session: bool,
}

/// Non-query intents, routed to canned responses instead of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    Stop,
    Help,
    Unrecognized,
}

/// What an inbound request asks the skill to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// The user opened the skill without a question.
    Launch,
    /// A free-text question for the model.
    Query(Turn),
    /// A built-in or unknown intent.
    Control(ControlSignal),
    /// The platform closed the session (timeout, user exit, error).
    SessionEnded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatEntry::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","text":"hi"}"#);
        let json = serde_json::to_string(&ChatEntry::assistant("hello")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","text":"hello"}"#);
    }

    #[test]
    fn test_default_state_is_empty() {
        let state = SessionState::default();
        assert!(state.chat_history.is_empty());
        assert!(state.followup_questions.is_empty());
        assert_eq!(state.unrecognized_count, 0);
        assert!(state.is_well_formed());
    }

    #[test]
    fn test_zero_unrecognized_count_is_omitted() {
        let value = serde_json::to_value(SessionState::default()).unwrap();
        assert!(value.get("unrecognized_count").is_none());
        assert!(value.get("chat_history").is_some());
        assert!(value.get("followup_questions").is_some());
    }

    #[test]
    fn test_well_formed_detects_orphan_and_order() {
        let mut state = SessionState {
            chat_history: vec![ChatEntry::user("q"), ChatEntry::assistant("a")],
            ..Default::default()
        };
        assert!(state.is_well_formed());
        assert_eq!(state.turn_count(), 1);

        state.chat_history.push(ChatEntry::user("orphan"));
        assert!(!state.is_well_formed());

        state.chat_history = vec![ChatEntry::assistant("a"), ChatEntry::user("q")];
        assert!(!state.is_well_formed());
    }
}
