//! Core state types.
//!
//! This module contains the pieces every other module builds on:
//! - State behavior via the `State` trait
//! - The `StateError` taxonomy
//! - Immutable transition history

mod error;
mod history;
mod state;

pub use error::{StateError, StoreCause};
pub use history::{StateHistory, TransitionRecord};
pub use state::{FromStateName, PassiveState, State, StateContext, Transaction};
