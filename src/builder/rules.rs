//! Builder for rule tables.

use crate::builder::error::BuildError;
use crate::rules::PASSIVE_STATE_CLASS;
use crate::store::{RuleTables, StateClassRow, TransitionRuleRow};

/// Fluent builder producing the rows of one machine's rule tables.
///
/// Rows are emitted in the order they were added, duplicates included, so
/// the result loads exactly like the same rows coming from a database.
pub struct RuleTablesBuilder {
    machine: String,
    states: Vec<(String, String)>,
    transitions: Vec<(String, String, String)>,
}

impl RuleTablesBuilder {
    /// Create a new builder for `machine`.
    pub fn new(machine: impl Into<String>) -> Self {
        Self {
            machine: machine.into(),
            states: Vec::new(),
            transitions: Vec::new(),
        }
    }

    /// Map `state` to behavior class `class`.
    pub fn state(mut self, state: impl Into<String>, class: impl Into<String>) -> Self {
        self.states.push((state.into(), class.into()));
        self
    }

    /// Map `state` to the passive default class.
    pub fn passive_state(self, state: impl Into<String>) -> Self {
        self.state(state, PASSIVE_STATE_CLASS)
    }

    /// Map every name in `states` to the passive default class.
    pub fn passive_states<I, S>(self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        states
            .into_iter()
            .fold(self, |builder, state| builder.passive_state(state))
    }

    /// Add the rule `from --event--> to`.
    pub fn transition(
        mut self,
        from: impl Into<String>,
        event: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.transitions
            .push((from.into(), event.into(), to.into()));
        self
    }

    /// Build the rows. Returns an error if any name is empty.
    pub fn build(self) -> Result<RuleTables, BuildError> {
        if self.machine.is_empty() {
            return Err(BuildError::EmptyMachineName);
        }
        if self.states.is_empty() {
            return Err(BuildError::NoStates);
        }

        let mut tables = RuleTables::new();
        for (state, class) in self.states {
            if state.is_empty() {
                return Err(BuildError::EmptyStateName);
            }
            if class.is_empty() {
                return Err(BuildError::EmptyClassName { state });
            }
            tables
                .state_classes
                .push(StateClassRow::new(self.machine.as_str(), state, class));
        }

        for (from, event, to) in self.transitions {
            if from.is_empty() || to.is_empty() {
                return Err(BuildError::EmptyStateName);
            }
            if event.is_empty() {
                return Err(BuildError::EmptyEventName { from });
            }
            tables
                .transition_rules
                .push(TransitionRuleRow::new(self.machine.as_str(), from, event, to));
        }

        Ok(tables)
    }
}
