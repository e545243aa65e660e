//! Rule stores: where state-class mappings and transition rules come from.
//!
//! A store hands out sessions. A session is the unit of acquisition (think
//! database connection) and is released when dropped, so whoever opens one
//! gets release on every return path for free. Stores never cache; every
//! session query reads the backing tables again.

mod json;
mod memory;

pub use json::JsonRuleStore;
pub use memory::InMemoryRuleStore;

use crate::core::StateError;
use serde::{Deserialize, Serialize};

/// Row of the state-class table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateClassRow {
    pub machine_name: String,
    pub state_name: String,
    pub state_class_name: String,
}

impl StateClassRow {
    pub fn new(
        machine_name: impl Into<String>,
        state_name: impl Into<String>,
        state_class_name: impl Into<String>,
    ) -> Self {
        Self {
            machine_name: machine_name.into(),
            state_name: state_name.into(),
            state_class_name: state_class_name.into(),
        }
    }
}

/// Row of the transition-rule table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRuleRow {
    pub machine_name: String,
    pub from_state_name: String,
    pub event: String,
    pub to_state_name: String,
}

impl TransitionRuleRow {
    pub fn new(
        machine_name: impl Into<String>,
        from_state_name: impl Into<String>,
        event: impl Into<String>,
        to_state_name: impl Into<String>,
    ) -> Self {
        Self {
            machine_name: machine_name.into(),
            from_state_name: from_state_name.into(),
            event: event.into(),
            to_state_name: to_state_name.into(),
        }
    }
}

/// Both rule tables, for any number of machines.
///
/// This is also the on-disk document format read by [`JsonRuleStore`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleTables {
    #[serde(default)]
    pub state_classes: Vec<StateClassRow>,
    #[serde(default)]
    pub transition_rules: Vec<TransitionRuleRow>,
}

impl RuleTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every row of `other`, keeping load order.
    pub fn merge(mut self, other: RuleTables) -> Self {
        self.state_classes.extend(other.state_classes);
        self.transition_rules.extend(other.transition_rules);
        self
    }

    /// Rows of the state-class table that belong to `machine`.
    pub fn state_classes_for(&self, machine: &str) -> Vec<StateClassRow> {
        self.state_classes
            .iter()
            .filter(|row| row.machine_name == machine)
            .cloned()
            .collect()
    }

    /// Rows of the transition-rule table that belong to `machine`.
    pub fn transition_rules_for(&self, machine: &str) -> Vec<TransitionRuleRow> {
        self.transition_rules
            .iter()
            .filter(|row| row.machine_name == machine)
            .cloned()
            .collect()
    }
}

/// An acquired handle on the rule tables. Dropping it releases it.
pub trait RuleSession {
    /// All state-class rows for `machine`, in load order.
    fn state_classes(&mut self, machine: &str) -> Result<Vec<StateClassRow>, StateError>;

    /// All transition-rule rows for `machine`, in load order.
    fn transition_rules(&mut self, machine: &str) -> Result<Vec<TransitionRuleRow>, StateError>;
}

/// Source of rule tables.
pub trait RuleStore: Send + Sync {
    fn open_session(&self) -> Result<Box<dyn RuleSession + '_>, StateError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_filter_by_machine() {
        let tables = RuleTables {
            state_classes: vec![
                StateClassRow::new("Order", "NEW", "passive"),
                StateClassRow::new("Invoice", "OPEN", "passive"),
            ],
            transition_rules: vec![
                TransitionRuleRow::new("Order", "NEW", "submit", "SUBMITTED"),
                TransitionRuleRow::new("Invoice", "OPEN", "pay", "PAID"),
            ],
        };

        assert_eq!(tables.state_classes_for("Order").len(), 1);
        assert_eq!(tables.transition_rules_for("Invoice")[0].event, "pay");
        assert!(tables.transition_rules_for("Unknown").is_empty());
    }

    #[test]
    fn merge_keeps_load_order() {
        let first = RuleTables {
            transition_rules: vec![TransitionRuleRow::new("Order", "NEW", "submit", "SUBMITTED")],
            ..RuleTables::default()
        };
        let second = RuleTables {
            transition_rules: vec![TransitionRuleRow::new("Order", "NEW", "submit", "CANCELLED")],
            ..RuleTables::default()
        };

        let merged = first.merge(second);
        let rules = merged.transition_rules_for("Order");
        assert_eq!(rules[0].to_state_name, "SUBMITTED");
        assert_eq!(rules[1].to_state_name, "CANCELLED");
    }

    #[test]
    fn document_tolerates_missing_tables() {
        let tables: RuleTables = serde_json::from_str("{}").unwrap();
        assert_eq!(tables, RuleTables::default());
    }
}
