//! Conversation phase machine.
//!
//! New -> Active -> Active | Ended. `Ended` is terminal and is reached on
//! Stop, on the platform closing the session, or once consecutive
//! unrecognized turns exceed the retry budget.

/// Where a session stands at the end of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationPhase {
    New,
    Active,
    Ended,
}

/// What happened during a turn, as far as the phase machine cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEvent {
    Launch,
    Answered,
    ModelFailed,
    Help,
    Stop,
    /// An unrecognized turn; `consecutive` includes this one.
    Unrecognized { consecutive: u32 },
    Malformed,
    SessionEnded,
}

/// Transition policy for [`ConversationPhase`].
#[derive(Debug, Clone, Copy)]
pub struct PhasePolicy {
    /// Unrecognized turns re-asked before the session ends.
    pub unrecognized_retries: u32,
}

impl PhasePolicy {
    pub fn new(unrecognized_retries: u32) -> Self {
        Self {
            unrecognized_retries,
        }
    }

    /// Phase after `event` is applied in phase `from`.
    pub fn next(&self, from: ConversationPhase, event: TurnEvent) -> ConversationPhase {
        match (from, event) {
            (ConversationPhase::Ended, _) => ConversationPhase::Ended,
            (_, TurnEvent::Stop) | (_, TurnEvent::SessionEnded) => ConversationPhase::Ended,
            (_, TurnEvent::Unrecognized { consecutive })
                if consecutive > self.unrecognized_retries =>
            {
                ConversationPhase::Ended
            }
            _ => ConversationPhase::Active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConversationPhase::*;

    fn policy() -> PhasePolicy {
        PhasePolicy::new(2)
    }

    // =====================================================================
    // Staying open
    // =====================================================================

    #[test]
    fn test_new_to_active_on_launch() {
        assert_eq!(policy().next(New, TurnEvent::Launch), Active);
    }

    #[test]
    fn test_new_to_active_on_answer() {
        assert_eq!(policy().next(New, TurnEvent::Answered), Active);
    }

    #[test]
    fn test_active_self_loops() {
        for event in [
            TurnEvent::Answered,
            TurnEvent::ModelFailed,
            TurnEvent::Help,
            TurnEvent::Malformed,
            TurnEvent::Unrecognized { consecutive: 1 },
        ] {
            assert_eq!(policy().next(Active, event), Active, "{:?}", event);
        }
    }

    #[test]
    fn test_unrecognized_within_budget_stays_active() {
        assert_eq!(
            policy().next(Active, TurnEvent::Unrecognized { consecutive: 2 }),
            Active
        );
    }

    // =====================================================================
    // Ending
    // =====================================================================

    #[test]
    fn test_stop_ends_from_any_open_phase() {
        assert_eq!(policy().next(New, TurnEvent::Stop), Ended);
        assert_eq!(policy().next(Active, TurnEvent::Stop), Ended);
    }

    #[test]
    fn test_session_ended_request_ends() {
        assert_eq!(policy().next(Active, TurnEvent::SessionEnded), Ended);
    }

    #[test]
    fn test_unrecognized_over_budget_ends() {
        assert_eq!(
            policy().next(Active, TurnEvent::Unrecognized { consecutive: 3 }),
            Ended
        );
    }

    #[test]
    fn test_zero_budget_ends_on_first_unrecognized() {
        let p = PhasePolicy::new(0);
        assert_eq!(p.next(New, TurnEvent::Unrecognized { consecutive: 1 }), Ended);
    }

    #[test]
    fn test_ended_is_terminal() {
        assert_eq!(policy().next(Ended, TurnEvent::Answered), Ended);
        assert_eq!(policy().next(Ended, TurnEvent::Launch), Ended);
    }
}
