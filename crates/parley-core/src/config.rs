use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;

/// Top-level configuration for Parley.
///
/// Loaded from `~/.parley/config.toml` by default. Every section is optional
/// in the file and falls back to its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParleyConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub skill: SkillConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
}

impl ParleyConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ParleyConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level used when `RUST_LOG` is unset: trace, debug, info, warn, error.
    pub log_level: String,
    /// Port for the skill endpoint.
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            port: 3040,
        }
    }
}

/// Skill interaction model and session policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillConfig {
    /// Intent that carries the free-text query.
    pub query_intent: String,
    /// Slot name holding the utterance within `query_intent`.
    pub query_slot: String,
    /// Maximum user/assistant pairs kept in chat history.
    pub max_turns: usize,
    /// Maximum follow-up questions offered per turn.
    pub max_followups: usize,
    /// Consecutive unrecognized turns that are re-asked before the session ends.
    pub unrecognized_retries: u32,
}

impl Default for SkillConfig {
    fn default() -> Self {
        Self {
            query_intent: "GptQueryIntent".to_string(),
            query_slot: "query".to_string(),
            max_turns: 10,
            max_followups: 3,
            unrecognized_retries: 2,
        }
    }
}

/// Language-model backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Backend: "openai" (any chat-completions compatible API) or "echo".
    pub provider: String,
    /// API base URL, without the `/chat/completions` suffix.
    pub base_url: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Time budget for one `generate` call, in milliseconds.
    pub timeout_ms: u64,
    /// Completion token limit for answers.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Follow-up questions to request per answer. Zero disables the extra call.
    pub followup_count: usize,
    /// System prompt prepended to every conversation.
    pub system_prompt: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_ms: 7_000,
            max_tokens: 300,
            temperature: 0.7,
            followup_count: 3,
            system_prompt: "You are a helpful voice assistant. Answer in a few short, \
                            plain sentences suitable for being read aloud. Do not use \
                            markdown, lists or code blocks."
                .to_string(),
        }
    }
}

/// Canned speech used by the response composer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub welcome: String,
    pub help: String,
    pub farewell: String,
    pub clarification: String,
    pub apology: String,
    /// Lead-in spoken before the follow-up questions.
    pub followup_lead: String,
    /// Nudge played when the user stays silent after follow-ups were offered.
    pub reprompt: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            welcome: "Chat mode activated. What would you like to ask?".to_string(),
            help: "You can ask me any question, and I will answer it. \
                   To finish, just say stop."
                .to_string(),
            farewell: "Goodbye!".to_string(),
            clarification: "Sorry, I didn't catch that. What would you like to ask?"
                .to_string(),
            apology: "Sorry, I couldn't get an answer right now. Please try again in a moment."
                .to_string(),
            followup_lead: "You might also ask:".to_string(),
            reprompt: "Are you still there? You can ask another question.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use crate::error::ParleyError;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = ParleyConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.port, 3040);
        assert_eq!(config.skill.query_intent, "GptQueryIntent");
        assert_eq!(config.skill.query_slot, "query");
        assert_eq!(config.skill.max_turns, 10);
        assert_eq!(config.skill.unrecognized_retries, 2);
        assert_eq!(config.model.provider, "openai");
        assert_eq!(config.model.timeout_ms, 7_000);
        assert_eq!(config.speech.followup_lead, "You might also ask:");
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
log_level = "debug"
port = 8080

[skill]
query_intent = "AskIntent"
query_slot = "question"
max_turns = 4
max_followups = 2
unrecognized_retries = 1

[model]
provider = "echo"
timeout_ms = 2500
followup_count = 0

[speech]
farewell = "See you later."
"#;
        let file = create_temp_config(content);
        let config = ParleyConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.general.port, 8080);
        assert_eq!(config.skill.query_intent, "AskIntent");
        assert_eq!(config.skill.query_slot, "question");
        assert_eq!(config.skill.max_turns, 4);
        assert_eq!(config.skill.max_followups, 2);
        assert_eq!(config.skill.unrecognized_retries, 1);
        assert_eq!(config.model.provider, "echo");
        assert_eq!(config.model.timeout_ms, 2500);
        assert_eq!(config.model.followup_count, 0);
        assert_eq!(config.speech.farewell, "See you later.");
        // Unset fields in a present section keep their defaults
        assert_eq!(config.model.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.speech.welcome, SpeechConfig::default().welcome);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[general]
log_level = "warn"
"#;
        let file = create_temp_config(content);
        let config = ParleyConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.skill.max_turns, 10);
        assert_eq!(config.model.model, "gpt-4o-mini");
    }

    #[test]
    fn test_config_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = ParleyConfig::load(file.path()).unwrap();
        assert_eq!(config.general.port, 3040);
        assert_eq!(config.skill.max_followups, 3);
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        let result = ParleyConfig::load(file.path());
        assert!(matches!(result, Err(ParleyError::Config(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = ParleyConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.skill.query_intent, "GptQueryIntent");
    }

    #[test]
    fn test_save_creates_parent_dirs_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");

        let mut config = ParleyConfig::default();
        config.skill.max_turns = 6;
        config.speech.help = "Ask anything & I'll answer.".to_string();
        config.save(&path).unwrap();

        assert!(path.exists());
        let reloaded = ParleyConfig::load(&path).unwrap();
        assert_eq!(reloaded.skill.max_turns, 6);
        assert_eq!(reloaded.speech.help, "Ask anything & I'll answer.");
        assert!((reloaded.model.temperature - 0.7).abs() < f32::EPSILON);
    }
}
