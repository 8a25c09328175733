//! Turn handler: central coordinator wiring interpreter, session state,
//! model and composer.
//!
//! Every path returns a well-formed [`SkillResponse`]; errors are logged and
//! turned into speech, never propagated to the platform.

use std::sync::Arc;
use std::time::Duration;

use parley_core::config::ParleyConfig;
use serde_json::Value;

use crate::envelope::{SkillRequest, SkillResponse};
use crate::error::SkillError;
use crate::model::{generate_within, LanguageModel};
use crate::phase::{ConversationPhase, PhasePolicy, TurnEvent};
use crate::request::RequestInterpreter;
use crate::response::{Outcome, ResponseComposer};
use crate::session::{FollowupResolver, SessionManager};
use crate::types::{ControlSignal, Inbound, SessionState, Turn};

/// Handles one platform turn at a time. Holds no per-session state, so a
/// single instance can serve concurrent turns.
pub struct SkillHandler {
    interpreter: RequestInterpreter,
    sessions: SessionManager,
    followups: FollowupResolver,
    composer: ResponseComposer,
    policy: PhasePolicy,
    model: Arc<dyn LanguageModel>,
    model_budget: Duration,
}

impl SkillHandler {
    pub fn new(config: &ParleyConfig, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            interpreter: RequestInterpreter::new(
                config.skill.query_intent.clone(),
                config.skill.query_slot.clone(),
            ),
            sessions: SessionManager::new(config.skill.max_turns, config.skill.max_followups),
            followups: FollowupResolver,
            composer: ResponseComposer::new(config.speech.clone()),
            policy: PhasePolicy::new(config.skill.unrecognized_retries),
            model,
            model_budget: Duration::from_millis(config.model.timeout_ms),
        }
    }

    /// Handle a raw JSON envelope.
    ///
    /// An envelope that does not decode still gets a spoken clarification;
    /// its session attributes are carried over when they can be found.
    pub async fn handle_value(&self, raw: &Value) -> SkillResponse {
        match serde_json::from_value::<SkillRequest>(raw.clone()) {
            Ok(request) => self.handle(&request).await,
            Err(e) => {
                let err = SkillError::MalformedRequest(e.to_string());
                tracing::warn!(error = %err, "Undecodable request envelope");
                let attributes = raw.get("session").and_then(|s| s.get("attributes"));
                let state = clear_followups(&self.sessions, self.sessions.load(attributes));
                self.finish(
                    Outcome::Malformed,
                    TurnEvent::Malformed,
                    ConversationPhase::Active,
                    state,
                )
            }
        }
    }

    /// Handle a decoded envelope.
    pub async fn handle(&self, request: &SkillRequest) -> SkillResponse {
        let mut state = self.sessions.load(request.attributes());
        let from = if request.session.as_ref().map_or(true, |s| s.new) {
            ConversationPhase::New
        } else {
            ConversationPhase::Active
        };

        let inbound = match self.interpreter.interpret(request) {
            Ok(inbound) => inbound,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    request_type = %request.request.kind,
                    "Malformed request"
                );
                let state = clear_followups(&self.sessions, state);
                return self.finish(Outcome::Malformed, TurnEvent::Malformed, from, state);
            }
        };

        match inbound {
            Inbound::Query(turn) => self.answer(turn, state, from).await,
            Inbound::Launch => {
                state.unrecognized_count = 0;
                let state = clear_followups(&self.sessions, state);
                self.finish(Outcome::Welcome, TurnEvent::Launch, from, state)
            }
            Inbound::Control(signal) => {
                let event = match signal {
                    ControlSignal::Stop => TurnEvent::Stop,
                    ControlSignal::Help => {
                        state.unrecognized_count = 0;
                        TurnEvent::Help
                    }
                    ControlSignal::Unrecognized => {
                        state.unrecognized_count = state.unrecognized_count.saturating_add(1);
                        TurnEvent::Unrecognized {
                            consecutive: state.unrecognized_count,
                        }
                    }
                };
                let state = clear_followups(&self.sessions, state);
                self.finish(Outcome::Control(signal), event, from, state)
            }
            Inbound::SessionEnded => {
                tracing::debug!(reason = ?request.request.reason, "Session ended by platform");
                let state = clear_followups(&self.sessions, state);
                self.finish(Outcome::SessionEnded, TurnEvent::SessionEnded, from, state)
            }
        }
    }

    async fn answer(
        &self,
        turn: Turn,
        mut state: SessionState,
        from: ConversationPhase,
    ) -> SkillResponse {
        state.unrecognized_count = 0;

        let query = match self.followups.resolve(&turn.utterance, &state.followup_questions) {
            Some(selected) => {
                tracing::debug!(
                    utterance = %turn.utterance,
                    selected = %selected,
                    "Follow-up selected"
                );
                selected
            }
            None => turn.utterance,
        };

        let result = generate_within(
            self.model.as_ref(),
            &query,
            &state.chat_history,
            self.model_budget,
        )
        .await
        .map_err(SkillError::from)
        .and_then(|answer| {
            if answer.answer.trim().is_empty() {
                Err(SkillError::ModelUnavailable("empty answer".to_string()))
            } else {
                Ok(answer)
            }
        });

        match result {
            Ok(answer) => {
                let text = answer.answer.trim().to_string();
                let state = self.sessions.append_turn(state, &query, &text);
                let state = self.sessions.set_followups(state, answer.followups);
                let followups = state.followup_questions.clone();
                tracing::debug!(
                    session_id = %turn.session_id,
                    model = self.model.name(),
                    followups = followups.len(),
                    "Model answered"
                );
                self.finish(Outcome::Answer { text, followups }, TurnEvent::Answered, from, state)
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %turn.session_id,
                    model = self.model.name(),
                    error = %e,
                    "Model call failed"
                );
                let state = clear_followups(&self.sessions, state);
                self.finish(Outcome::ModelFailure, TurnEvent::ModelFailed, from, state)
            }
        }
    }

    fn finish(
        &self,
        outcome: Outcome,
        event: TurnEvent,
        from: ConversationPhase,
        state: SessionState,
    ) -> SkillResponse {
        let phase = self.policy.next(from, event);
        let attributes = self.sessions.serialize(&state);
        let reply = self.composer.compose(&outcome, phase, attributes);
        tracing::info!(
            event = ?event,
            phase = ?phase,
            turns = state.turn_count(),
            end_session = reply.should_end_session,
            "Turn handled"
        );
        reply.into()
    }
}

/// Follow-ups only live for the turn right after they were offered.
fn clear_followups(sessions: &SessionManager, state: SessionState) -> SessionState {
    sessions.set_followups(state, Vec::new())
}

// =============================================================================
// Tests
// =============================================================================
