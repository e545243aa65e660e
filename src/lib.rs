//! Statewise: a table-driven state machine engine
//!
//! Which states exist, which behavior each state has and which event leads
//! where are all data: two rule tables kept in a [`store::RuleStore`]. The
//! engine loads them once per machine name, indexes them in an immutable
//! [`rules::RuleManager`] and shares that index between every
//! [`machine::StateMachine`] instance of the same machine.
//!
//! # Core Concepts
//!
//! - **State**: behavior hooks (`enter`, `exit`, `process_event`) via the `State` trait
//! - **Rule tables**: state-to-class mappings and `(from, event) -> to` rules
//! - **Rule manager**: validated, read-only index over one machine's rules
//! - **Registry**: per-machine cache of rule managers with explicit invalidation
//! - **History**: immutable record of committed transitions
//!
//! # Example
//!
//! ```rust
//! use statewise::builder::{in_memory_store, RuleTablesBuilder};
//! use statewise::{RuleLoadConfig, RuleManagerRegistry, StateClassRegistry, StateMachine};
//! use std::sync::Arc;
//!
//! let store = in_memory_store(
//!     RuleTablesBuilder::new("Order")
//!         .passive_states(["NEW", "SUBMITTED", "CANCELLED"])
//!         .transition("NEW", "submit", "SUBMITTED")
//!         .transition("SUBMITTED", "cancel", "CANCELLED"),
//! )
//! .unwrap();
//!
//! let registry = RuleManagerRegistry::new(
//!     Arc::new(store),
//!     StateClassRegistry::with_defaults(),
//!     RuleLoadConfig::default(),
//! );
//!
//! let mut order = StateMachine::from_registry(&registry, "Order", Some("NEW")).unwrap();
//! assert!(!order.is_valid_event("cancel"));
//!
//! order.process_event("submit", &mut (), &mut ()).unwrap();
//! assert_eq!(order.current_state_name(), Some("SUBMITTED"));
//! assert_eq!(order.history().get_path(), vec!["NEW", "SUBMITTED"]);
//! ```

pub mod builder;
pub mod checkpoint;
pub mod config;
pub mod core;
pub mod machine;
pub mod rules;
pub mod store;

// Re-export commonly used types
pub use checkpoint::{CheckpointError, MachineCheckpoint};
pub use config::{DuplicateRulePolicy, EngineConfig, RuleLoadConfig};
pub use crate::core::{FromStateName, PassiveState, State, StateError, StateHistory};
pub use machine::StateMachine;
pub use rules::{RuleManager, RuleManagerRegistry, StateClassRegistry};
pub use store::{InMemoryRuleStore, JsonRuleStore, RuleStore};
