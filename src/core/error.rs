//! Error taxonomy for rule loading and state transitions.

use crate::rules::RuleViolation;
use thiserror::Error;

/// Boxed cause carried by store failures.
pub type StoreCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by rule stores, rule managers and state machines.
///
/// Everything except [`StateError::Rejected`] is the "base" state error:
/// either a configuration problem or an event that no rule accepts.
/// `Rejected` is a business veto raised from a state's `process_event` hook.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("State [{state}] is not defined for state machine [{machine}]")]
    UnknownState { machine: String, state: String },

    #[error("State [{state}] is mapped to class [{class}], which is not registered")]
    UnknownStateClass { state: String, class: String },

    #[error("Failed to construct state [{state}] from class [{class}]: {source}")]
    StateConstruction {
        state: String,
        class: String,
        #[source]
        source: Box<StateError>,
    },

    #[error("Invalid event published to state machine. Event: [{event}] is not legal in state: [{state}]")]
    IllegalTransition { state: String, event: String },

    #[error("State [{state}] rejected the transition: {reason}")]
    Rejected { state: String, reason: String },

    #[error("State machine [{machine}] has no current state")]
    Uninitialized { machine: String },

    #[error("Rules for state machine [{machine}] failed validation ({} violation(s))", .violations.len())]
    InvalidRules {
        machine: String,
        violations: Vec<RuleViolation>,
    },

    #[error("Rule store query for state machine [{machine}] failed: {source}")]
    Store {
        machine: String,
        #[source]
        source: StoreCause,
    },

    #[error("Rule store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    #[error("State construction failed: {0}")]
    Construction(String),
}

impl StateError {
    /// Veto raised by a state that refuses an otherwise legal transition.
    pub fn rejected(state: impl Into<String>, reason: impl Into<String>) -> Self {
        StateError::Rejected {
            state: state.into(),
            reason: reason.into(),
        }
    }

    /// True for a business veto, false for every base state error.
    pub fn is_rejection(&self) -> bool {
        matches!(self, StateError::Rejected { .. })
    }

    /// True when no rule accepts the event in the current state.
    pub fn is_illegal_transition(&self) -> bool {
        matches!(self, StateError::IllegalTransition { .. })
    }

    /// True for failures caused by rule configuration or the rule store.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            StateError::UnknownState { .. }
                | StateError::UnknownStateClass { .. }
                | StateError::StateConstruction { .. }
                | StateError::InvalidRules { .. }
                | StateError::Store { .. }
                | StateError::StoreUnavailable { .. }
                | StateError::Construction(_)
        )
    }
}
