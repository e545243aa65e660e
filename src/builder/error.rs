//! Build errors for rule table builders.

use thiserror::Error;

/// Errors that can occur when building rule tables.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Machine name is empty")]
    EmptyMachineName,

    #[error("State name is empty. Every .state() and .transition() needs a name")]
    EmptyStateName,

    #[error("State [{state}] has an empty class name")]
    EmptyClassName { state: String },

    #[error("Transition from [{from}] has an empty event name")]
    EmptyEventName { from: String },

    #[error("No states defined. Add at least one state with .state()")]
    NoStates,
}
