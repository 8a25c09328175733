//! OpenAI-compatible chat-completions backend.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use parley_core::config::ModelConfig;
use parley_core::error::{ParleyError, Result};
use parley_skill::error::ModelError;
use parley_skill::model::{LanguageModel, ModelAnswer};
use parley_skill::types::{ChatEntry, ChatRole};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::followups::parse_followups;

const FOLLOWUP_MAX_TOKENS: u32 = 150;

/// Part of the turn budget kept back after the follow-up call so the answer
/// still reaches the caller before its own deadline.
const FOLLOWUP_MARGIN: Duration = Duration::from_millis(250);

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

// =============================================================================
// OpenAiChatModel
// =============================================================================

/// Chat-completions client implementing [`LanguageModel`].
///
/// One call produces the answer; when `followup_count > 0` a second call asks
/// for suggested next questions. The follow-up call only gets what is left of
/// `timeout_ms` after the answer, and a failed or late follow-up call never
/// fails the turn.
pub struct OpenAiChatModel {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    system_prompt: String,
    max_tokens: u32,
    temperature: f32,
    followup_count: usize,
    budget: Duration,
}

impl OpenAiChatModel {
    /// Build from config, reading the API key from `config.api_key_env`.
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            ParleyError::Config(format!(
                "environment variable {} is not set; export an API key or use provider = \"echo\"",
                config.api_key_env
            ))
        })?;
        Self::new(config, api_key)
    }

    /// Build with an explicit API key.
    pub fn new(config: &ModelConfig, api_key: impl Into<String>) -> Result<Self> {
        let budget = Duration::from_millis(config.timeout_ms);
        let client = Client::builder()
            .timeout(budget)
            .build()
            .map_err(|e| ParleyError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            followup_count: config.followup_count,
            budget,
        })
    }

    fn answer_messages(&self, query: &str, history: &[ChatEntry]) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        if !self.system_prompt.is_empty() {
            messages.push(ChatMessage::new("system", self.system_prompt.as_str()));
        }
        for entry in history {
            let role = match entry.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "assistant",
            };
            messages.push(ChatMessage::new(role, entry.text.as_str()));
        }
        messages.push(ChatMessage::new("user", query));
        messages
    }

    fn followup_messages(&self, query: &str, answer: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::new(
                "system",
                format!(
                    "Suggest {} short follow-up questions the user might ask next. \
                     Reply with only a JSON array of strings.",
                    self.followup_count
                ),
            ),
            ChatMessage::new("user", format!("Question: {}\nAnswer: {}", query, answer)),
        ]
    }

    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        max_tokens: u32,
    ) -> std::result::Result<String, ModelError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
            max_tokens,
            temperature: self.temperature,
        };

        tracing::debug!(
            model = %self.model,
            messages = body.messages.len(),
            "Sending chat completion"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Unavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ModelError::Unavailable(format!(
                "backend returned {}: {}",
                status,
                truncate(&error_body, 200)
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Unavailable(format!("unparsable response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| ModelError::Unavailable("empty completion".to_string()))
    }

    /// Ask for follow-ups within `deadline`. Any failure yields an empty list.
    async fn suggest_followups(
        &self,
        query: &str,
        answer: &str,
        deadline: Duration,
    ) -> Vec<String> {
        if deadline.is_zero() {
            tracing::warn!("No budget left for follow-up generation");
            return Vec::new();
        }

        let call = self.complete(self.followup_messages(query, answer), FOLLOWUP_MAX_TOKENS);
        match tokio::time::timeout(deadline, call).await {
            Ok(Ok(content)) => parse_followups(&content, self.followup_count),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Follow-up generation failed");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(
                    deadline_ms = deadline.as_millis() as u64,
                    "Follow-up generation timed out"
                );
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAiChatModel {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(
        &self,
        query: &str,
        history: &[ChatEntry],
    ) -> std::result::Result<ModelAnswer, ModelError> {
        let started = Instant::now();
        let answer = self
            .complete(self.answer_messages(query, history), self.max_tokens)
            .await?;

        let followups = if self.followup_count > 0 {
            let deadline = self
                .budget
                .saturating_sub(started.elapsed())
                .saturating_sub(FOLLOWUP_MARGIN);
            self.suggest_followups(query, &answer, deadline).await
        } else {
            Vec::new()
        };

        Ok(ModelAnswer::new(answer).with_followups(followups))
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// =============================================================================
// Tests
// =============================================================================
