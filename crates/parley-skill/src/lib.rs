//! Voice-assistant skill turn handling for Parley.
//!
//! Interprets platform request envelopes, threads conversation memory through
//! session attributes, asks a [`LanguageModel`] for answers and renders the
//! result as speech markup.

pub mod envelope;
pub mod error;
pub mod handler;
pub mod model;
pub mod phase;
pub mod request;
pub mod response;
pub mod session;
pub mod ssml;
pub mod types;

pub use envelope::{OutputSpeech, Reprompt, ResponseBody, SkillRequest, SkillResponse};
pub use error::{ModelError, SkillError};
pub use handler::SkillHandler;
pub use model::{generate_within, EchoModel, LanguageModel, ModelAnswer};
pub use phase::{ConversationPhase, PhasePolicy, TurnEvent};
pub use request::RequestInterpreter;
pub use response::{Outcome, Reply, ResponseComposer};
pub use session::{FollowupResolver, SessionManager};
pub use ssml::Ssml;
pub use types::{ChatEntry, ChatRole, ControlSignal, Inbound, SessionState, Turn};
