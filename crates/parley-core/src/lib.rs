pub mod config;
pub mod error;

pub use config::{GeneralConfig, ModelConfig, ParleyConfig, SkillConfig, SpeechConfig};
pub use error::{ParleyError, Result};
