//! Language-model collaborator interface.
//!
//! The skill treats the model as an opaque `generate(query, history)` call.
//! [`generate_within`] applies the per-turn time budget so a slow backend
//! surfaces as [`ModelError::Timeout`] instead of hanging the turn.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ModelError;
use crate::types::ChatEntry;

/// A model answer with optional suggested next questions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelAnswer {
    pub answer: String,
    pub followups: Vec<String>,
}

impl ModelAnswer {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            followups: Vec::new(),
        }
    }

    pub fn with_followups(mut self, followups: Vec<String>) -> Self {
        self.followups = followups;
        self
    }
}

/// A backend that answers a query given the conversation so far.
///
/// Implementations must not retry internally on behalf of the skill; any
/// retry policy belongs to the backend client itself.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn generate(
        &self,
        query: &str,
        history: &[ChatEntry],
    ) -> Result<ModelAnswer, ModelError>;
}

/// Run `model.generate` under a time budget.
pub async fn generate_within(
    model: &dyn LanguageModel,
    query: &str,
    history: &[ChatEntry],
    budget: Duration,
) -> Result<ModelAnswer, ModelError> {
    match tokio::time::timeout(budget, model.generate(query, history)).await {
        Ok(result) => result,
        Err(_) => Err(ModelError::Timeout(budget)),
    }
}

// =============================================================================
// EchoModel
// =============================================================================

/// Offline model that repeats the query back.
///
/// Used when no backend is configured and for local smoke tests.
#[derive(Debug, Clone, Default)]
pub struct EchoModel;

#[async_trait]
impl LanguageModel for EchoModel {
    fn name(&self) -> &str {
        "echo"
    }

    async fn generate(
        &self,
        query: &str,
        history: &[ChatEntry],
    ) -> Result<ModelAnswer, ModelError> {
        tracing::debug!(history_len = history.len(), "Echo model answering");
        Ok(ModelAnswer::new(format!("You said: {}", query)))
    }
}
