//! Rule loading, indexing and caching.
//!
//! - `StateClassRegistry` turns class names from the state-class table into
//!   state instances
//! - `RuleManager` is the immutable per-machine index answering
//!   "where does this event lead from here?"
//! - `RuleManagerRegistry` caches managers by machine name
//! - `validate_rule_rows` checks rows before they are indexed

mod classes;
mod manager;
mod registry;
mod validation;

pub use classes::{StateClassRegistry, StateConstructor, PASSIVE_STATE_CLASS};
pub use manager::{AcceptingState, EventRule, RuleManager, TransitionTable};
pub use registry::RuleManagerRegistry;
pub use validation::{validate_rule_rows, RuleViolation};
