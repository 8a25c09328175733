//! Language-model backends for Parley.
//!
//! [`OpenAiChatModel`] talks to any chat-completions compatible API;
//! [`build_model`] picks a backend from configuration.

pub mod followups;
pub mod openai;

use std::sync::Arc;

use parley_core::config::ModelConfig;
use parley_core::error::{ParleyError, Result};
use parley_skill::model::{EchoModel, LanguageModel};

pub use followups::parse_followups;
pub use openai::OpenAiChatModel;

/// Build the configured backend.
///
/// `provider = "echo"` needs no network or key. Anything else is an error.
pub fn build_model(config: &ModelConfig) -> Result<Arc<dyn LanguageModel>> {
    match config.provider.as_str() {
        "openai" => {
            let model = OpenAiChatModel::from_config(config)?;
            tracing::info!(
                model = %config.model,
                base_url = %config.base_url,
                "Using OpenAI-compatible backend"
            );
            Ok(Arc::new(model))
        }
        "echo" => {
            tracing::info!("Using offline echo backend");
            Ok(Arc::new(EchoModel))
        }
        other => Err(ParleyError::Config(format!(
            "unknown model provider '{}' (expected \"openai\" or \"echo\")",
            other
        ))),
    }
}
