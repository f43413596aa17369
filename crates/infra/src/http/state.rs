//! Lifecycle of one outbound call
//!
//! ```text
//! Pending -> Authenticating -> InFlight -> Success
//!                                 |
//!                                 +-> Retrying -> Authenticating -> ...
//!                                 +-> Failed
//! ```
//!
//! `Failed` and `Success` are terminal. Any non-terminal state may fail.
//! A token provider failing with a transient error may also retry straight
//! from `Authenticating`.

use std::fmt;

use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallState {
    Pending,
    Authenticating,
    InFlight,
    Retrying,
    Success,
    Failed,
}

impl CallState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Authenticating => "authenticating",
            Self::InFlight => "in_flight",
            Self::Retrying => "retrying",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }

    /// Whether `self -> next` is a legal step.
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Pending | Self::Retrying, Self::Authenticating)
            | (Self::Authenticating, Self::InFlight)
            | (Self::InFlight, Self::Success | Self::Retrying)
            | (Self::Authenticating, Self::Retrying) => true,
            (from, Self::Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks and logs the state of a single call.
#[derive(Debug, Clone)]
pub struct CallTracker {
    correlation_id: String,
    state: CallState,
    history: Vec<CallState>,
}

impl CallTracker {
    pub fn new(correlation_id: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            state: CallState::Pending,
            history: vec![CallState::Pending],
        }
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    /// Every state visited, in order.
    pub fn history(&self) -> &[CallState] {
        &self.history
    }

    pub fn advance(&mut self, next: CallState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal call transition {} -> {}",
            self.state,
            next
        );
        trace!(
            correlation_id = %self.correlation_id,
            from = %self.state,
            to = %next,
            "Call state transition"
        );
        self.state = next;
        self.history.push(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_transitions() {
        use CallState::*;
        assert!(Pending.can_transition_to(Authenticating));
        assert!(Authenticating.can_transition_to(InFlight));
        assert!(InFlight.can_transition_to(Success));
        assert!(InFlight.can_transition_to(Retrying));
        assert!(Retrying.can_transition_to(Authenticating));
        assert!(Authenticating.can_transition_to(Failed));
        assert!(InFlight.can_transition_to(Failed));
    }

    #[test]
    fn terminal_states_are_final() {
        use CallState::*;
        for next in [Pending, Authenticating, InFlight, Retrying, Success, Failed] {
            assert!(!Success.can_transition_to(next));
            assert!(!Failed.can_transition_to(next));
        }
        assert!(!Pending.can_transition_to(InFlight));
        assert!(!Retrying.can_transition_to(InFlight));
    }

    #[test]
    fn tracker_records_history() {
        let mut tracker = CallTracker::new("corr");
        tracker.advance(CallState::Authenticating);
        tracker.advance(CallState::InFlight);
        tracker.advance(CallState::Retrying);
        tracker.advance(CallState::Authenticating);
        tracker.advance(CallState::InFlight);
        tracker.advance(CallState::Success);

        assert_eq!(tracker.state(), CallState::Success);
        assert_eq!(tracker.history().len(), 7);
        assert_eq!(tracker.history()[3], CallState::Retrying);
    }
}
