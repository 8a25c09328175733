//! Response composition.
//!
//! Turns the outcome of a turn into a spoken [`Reply`]: speech markup,
//! optional reprompt, session attributes and the end-of-session flag.

use parley_core::config::SpeechConfig;
use serde_json::{Map, Value};

use crate::envelope::{Reprompt, ResponseBody, SkillResponse};
use crate::phase::ConversationPhase;
use crate::ssml::Ssml;
use crate::types::ControlSignal;

/// Pause between an answer and the follow-up prompt.
const FOLLOWUP_PAUSE_MS: u32 = 400;

/// What a turn produced, before it is rendered as speech.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Welcome,
    Answer { text: String, followups: Vec<String> },
    Control(ControlSignal),
    ModelFailure,
    Malformed,
    SessionEnded,
}

/// A complete reply for the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub speech: Ssml,
    pub reprompt: Option<Ssml>,
    pub session_attributes: Map<String, Value>,
    pub should_end_session: bool,
}

impl From<Reply> for SkillResponse {
    fn from(reply: Reply) -> Self {
        SkillResponse {
            version: "1.0".to_string(),
            session_attributes: reply.session_attributes,
            response: ResponseBody {
                output_speech: reply.speech.into(),
                reprompt: reply.reprompt.map(|ssml| Reprompt {
                    output_speech: ssml.into(),
                }),
                should_end_session: reply.should_end_session,
            },
        }
    }
}

/// Renders [`Outcome`]s using the configured canned speech.
pub struct ResponseComposer {
    speech: SpeechConfig,
}

impl ResponseComposer {
    pub fn new(speech: SpeechConfig) -> Self {
        Self { speech }
    }

    /// Build the reply for `outcome` given the phase the turn ends in.
    ///
    /// An `Ended` phase always closes the session and never carries a
    /// reprompt.
    pub fn compose(
        &self,
        outcome: &Outcome,
        phase: ConversationPhase,
        session_attributes: Map<String, Value>,
    ) -> Reply {
        let ended = phase == ConversationPhase::Ended;
        let (speech, reprompt) = match outcome {
            Outcome::Welcome => (
                Ssml::from_text(&self.speech.welcome),
                Some(Ssml::from_text(&self.speech.help)),
            ),
            Outcome::Answer { text, followups } => self.answer(text, followups),
            Outcome::Control(ControlSignal::Stop) => (Ssml::from_text(&self.speech.farewell), None),
            Outcome::Control(ControlSignal::Help) => (
                Ssml::from_text(&self.speech.help),
                Some(Ssml::from_text(&self.speech.reprompt)),
            ),
            Outcome::Control(ControlSignal::Unrecognized) if ended => {
                (Ssml::from_text(&self.speech.farewell), None)
            }
            Outcome::Control(ControlSignal::Unrecognized) | Outcome::Malformed => (
                Ssml::from_text(&self.speech.clarification),
                Some(Ssml::from_text(&self.speech.clarification)),
            ),
            Outcome::ModelFailure => (Ssml::from_text(&self.speech.apology), None),
            Outcome::SessionEnded => (Ssml::empty(), None),
        };

        Reply {
            speech,
            reprompt: if ended { None } else { reprompt },
            session_attributes,
            should_end_session: ended,
        }
    }

    fn answer(&self, text: &str, followups: &[String]) -> (Ssml, Option<Ssml>) {
        if followups.is_empty() {
            return (Ssml::from_text(text), None);
        }

        let speech = Ssml::builder()
            .text(text)
            .pause(FOLLOWUP_PAUSE_MS)
            .text(&self.speech.followup_lead)
            .text(&followups.join(" "))
            .build();
        (speech, Some(Ssml::from_text(&self.speech.reprompt)))
    }
}

// =============================================================================
// Tests
// =============================================================================
