//! Request interpretation.
//!
//! Classifies an inbound envelope into an [`Inbound`] variant: a launch, a
//! free-text query, a control signal or a session end.

use crate::envelope::{
    Intent, SkillRequest, INTENT_REQUEST, LAUNCH_REQUEST, SESSION_ENDED_REQUEST,
};
use crate::error::SkillError;
use crate::types::{ControlSignal, Inbound, Turn};

pub const STOP_INTENT: &str = "AMAZON.StopIntent";
pub const CANCEL_INTENT: &str = "AMAZON.CancelIntent";
pub const NO_INTENT: &str = "AMAZON.NoIntent";
pub const HELP_INTENT: &str = "AMAZON.HelpIntent";
pub const FALLBACK_INTENT: &str = "AMAZON.FallbackIntent";

/// Pure parser from request envelopes to [`Inbound`].
#[derive(Debug, Clone)]
pub struct RequestInterpreter {
    query_intent: String,
    query_slot: String,
}

impl RequestInterpreter {
    /// `query_intent` carries the free-text utterance in `query_slot`.
    pub fn new(query_intent: impl Into<String>, query_slot: impl Into<String>) -> Self {
        Self {
            query_intent: query_intent.into(),
            query_slot: query_slot.into(),
        }
    }

    pub fn interpret(&self, request: &SkillRequest) -> Result<Inbound, SkillError> {
        let session_id = session_id(request)?;
        match request.request.kind.as_str() {
            LAUNCH_REQUEST => Ok(Inbound::Launch),
            SESSION_ENDED_REQUEST => Ok(Inbound::SessionEnded),
            INTENT_REQUEST => {
                let intent = request.request.intent.as_ref().ok_or_else(|| {
                    SkillError::MalformedRequest("intent request without an intent".to_string())
                })?;
                if intent.name == self.query_intent {
                    let is_new_session = request.session.as_ref().is_some_and(|s| s.new);
                    self.query_turn(intent, session_id, is_new_session)
                } else {
                    Ok(Inbound::Control(control_signal(&intent.name)))
                }
            }
            other => Err(SkillError::MalformedRequest(format!(
                "unsupported request type '{}'",
                other
            ))),
        }
    }

    fn query_turn(
        &self,
        intent: &Intent,
        session_id: &str,
        is_new_session: bool,
    ) -> Result<Inbound, SkillError> {
        let utterance = intent
            .slots
            .get(&self.query_slot)
            .and_then(|slot| slot.value.as_deref())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                SkillError::MalformedRequest(format!(
                    "slot '{}' is missing or empty",
                    self.query_slot
                ))
            })?;

        Ok(Inbound::Query(Turn {
            session_id: session_id.to_string(),
            utterance: utterance.to_string(),
            is_new_session,
        }))
    }
}

fn session_id(request: &SkillRequest) -> Result<&str, SkillError> {
    request
        .session
        .as_ref()
        .and_then(|s| s.session_id.as_deref())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| SkillError::MalformedRequest("missing sessionId".to_string()))
}

/// Map a non-query intent name to its control signal.
pub fn control_signal(intent_name: &str) -> ControlSignal {
    match intent_name {
        STOP_INTENT | CANCEL_INTENT | NO_INTENT => ControlSignal::Stop,
        HELP_INTENT => ControlSignal::Help,
        FALLBACK_INTENT => ControlSignal::Unrecognized,
        other => {
            tracing::info!(
                error = %SkillError::UnknownIntent(other.to_string()),
                "Routing as unrecognized"
            );
            ControlSignal::Unrecognized
        }
    }
}
