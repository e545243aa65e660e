//! Builder API for declaring rule tables and state types.
//!
//! This module provides a fluent builder for rule rows and a macro for
//! state types, so small machines and tests need neither a database nor
//! hand-written rows.

pub mod error;
pub mod macros;
pub mod rules;

pub use error::BuildError;
pub use rules::RuleTablesBuilder;

use crate::store::InMemoryRuleStore;

/// Build rule tables and load them into a fresh in-memory store.
///
/// # Example
///
/// ```
/// use statewise::builder::{in_memory_store, RuleTablesBuilder};
///
/// let store = in_memory_store(
///     RuleTablesBuilder::new("Order")
///         .passive_states(["NEW", "SUBMITTED"])
///         .transition("NEW", "submit", "SUBMITTED"),
/// )
/// .unwrap();
/// assert_eq!(store.open_sessions(), 0);
/// ```
pub fn in_memory_store(builder: RuleTablesBuilder) -> Result<InMemoryRuleStore, BuildError> {
    Ok(InMemoryRuleStore::with_tables(builder.build()?))
}
