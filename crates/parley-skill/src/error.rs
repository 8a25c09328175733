//! Error types for the skill core.

use std::time::Duration;

/// Errors raised while handling a turn.
///
/// None of these escape the turn boundary: the handler maps each one to a
/// spoken reply.
#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error("corrupt session state: {0}")]
    CorruptSessionState(String),
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("model timed out after {0:?}")]
    ModelTimeout(Duration),
    #[error("unknown intent: {0}")]
    UnknownIntent(String),
}

/// Failures reported by a language-model collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("model unavailable: {0}")]
    Unavailable(String),
    #[error("model timed out after {0:?}")]
    Timeout(Duration),
}

impl From<ModelError> for SkillError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Unavailable(msg) => SkillError::ModelUnavailable(msg),
            ModelError::Timeout(budget) => SkillError::ModelTimeout(budget),
        }
    }
}
