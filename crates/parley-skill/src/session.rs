//! Session state management.
//!
//! Rebuilds conversation memory from the platform's session attributes,
//! applies the per-turn updates, and serializes it back. State is an owned
//! value threaded through `load -> append_turn / set_followups -> serialize`;
//! nothing is cached between turns.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::SkillError;
use crate::types::{ChatEntry, SessionState};

// =============================================================================
// SessionManager
// =============================================================================

/// Loads, updates and serializes [`SessionState`] under fixed size limits.
#[derive(Debug, Clone)]
pub struct SessionManager {
    /// Maximum user/assistant pairs kept in history.
    pub max_turns: usize,
    /// Maximum follow-up questions kept per turn.
    pub max_followups: usize,
}

impl SessionManager {
    pub fn new(max_turns: usize, max_followups: usize) -> Self {
        Self {
            max_turns,
            max_followups,
        }
    }

    /// Rebuild state from raw attributes.
    ///
    /// Never fails: corrupt attributes are logged and replaced by an empty
    /// state so the conversation carries on.
    pub fn load(&self, raw: Option<&Value>) -> SessionState {
        match self.try_load(raw) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(error = %e, "Resetting session state");
                SessionState::default()
            }
        }
    }

    /// Rebuild state from raw attributes, reporting corruption.
    pub fn try_load(&self, raw: Option<&Value>) -> Result<SessionState, SkillError> {
        let raw = match raw {
            None | Some(Value::Null) => return Ok(SessionState::default()),
            Some(raw) => raw,
        };
        if !raw.is_object() {
            return Err(SkillError::CorruptSessionState(
                "attributes are not an object".to_string(),
            ));
        }

        let state: SessionState = serde_json::from_value(raw.clone())
            .map_err(|e| SkillError::CorruptSessionState(e.to_string()))?;

        if !state.is_well_formed() {
            return Err(SkillError::CorruptSessionState(
                "chat history does not alternate user/assistant".to_string(),
            ));
        }

        let followups = state.followup_questions.clone();
        Ok(self.set_followups(self.truncate(state), followups))
    }

    /// Append a user/assistant pair, evicting the oldest pairs beyond the cap.
    pub fn append_turn(
        &self,
        mut state: SessionState,
        user: &str,
        assistant: &str,
    ) -> SessionState {
        state.chat_history.push(ChatEntry::user(user));
        state.chat_history.push(ChatEntry::assistant(assistant));
        self.truncate(state)
    }

    /// Replace pending follow-ups wholesale.
    ///
    /// Entries are trimmed, blanks dropped, and the list capped at
    /// `max_followups`.
    pub fn set_followups(&self, mut state: SessionState, followups: Vec<String>) -> SessionState {
        state.followup_questions = followups
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .take(self.max_followups)
            .collect();
        state
    }

    /// Serialize state into outbound session attributes.
    pub fn serialize(&self, state: &SessionState) -> Map<String, Value> {
        match serde_json::to_value(state) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                tracing::error!(kind = ?other, "Session state did not serialize to an object");
                Map::new()
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize session state");
                Map::new()
            }
        }
    }

    fn truncate(&self, mut state: SessionState) -> SessionState {
        let cap = self.max_turns.saturating_mul(2);
        let len = state.chat_history.len();
        if len > cap {
            // Round up so eviction always removes whole pairs.
            let excess = (len - cap + 1) / 2 * 2;
            state.chat_history.drain(..excess.min(len));
            tracing::debug!(
                evicted = excess / 2,
                kept = state.turn_count(),
                "Trimmed chat history"
            );
        }
        state
    }
}

// =============================================================================
// FollowupResolver
// =============================================================================

static ORDINAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:(?:ask|the|number|question|option)\s+)*(first|second|third|fourth|fifth|1st|2nd|3rd|4th|5th|one|two|three|four|five|[1-5])(?:\s+(?:one|question|option))?\s*[.!?]?\s*$",
    )
    .expect("Invalid ordinal regex")
});

/// Resolves utterances that pick one of the offered follow-ups by position.
pub struct FollowupResolver;

impl FollowupResolver {
    /// Return the follow-up selected by `utterance`, if any.
    ///
    /// Recognizes "the first one", "number two", "3", "second question" and
    /// similar. Returns `None` when the utterance is not a selection or the
    /// position is out of range.
    pub fn resolve(&self, utterance: &str, pending: &[String]) -> Option<String> {
        if pending.is_empty() {
            return None;
        }
        let caps = ORDINAL_PATTERN.captures(utterance)?;
        let index = ordinal_index(&caps[1].to_lowercase())?;
        pending.get(index).cloned()
    }
}

fn ordinal_index(word: &str) -> Option<usize> {
    match word {
        "first" | "1st" | "one" | "1" => Some(0),
        "second" | "2nd" | "two" | "2" => Some(1),
        "third" | "3rd" | "three" | "3" => Some(2),
        "fourth" | "4th" | "four" | "4" => Some(3),
        "fifth" | "5th" | "five" | "5" => Some(4),
        _ => None,
    }
}

// =============================================================================
// Tests
// =============================================================================
