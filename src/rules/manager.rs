//! Per-machine rule index.

use super::classes::StateClassRegistry;
use super::validation::{into_result, validate_rule_rows};
use crate::config::{DuplicateRulePolicy, RuleLoadConfig};
use crate::core::{State, StateError};
use crate::store::{RuleStore, StateClassRow, TransitionRuleRow};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// An event accepted by a state and the state it leads to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRule {
    pub event: String,
    pub next_state: String,
}

/// A state that accepts some event and the state it leads to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptingState {
    pub state: String,
    pub next_state: String,
}

/// Read-only `from_state -> event -> to_state` table.
///
/// Only [`RuleManager`] builds one; afterwards it exposes no way to change
/// it, so sharing it across threads needs no locking.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransitionTable {
    rules: BTreeMap<String, BTreeMap<String, String>>,
}

impl TransitionTable {
    fn insert(&mut self, from: &str, event: &str, to: &str) -> Option<String> {
        self.rules
            .entry(from.to_string())
            .or_default()
            .insert(event.to_string(), to.to_string())
    }

    pub fn destination(&self, from: &str, event: &str) -> Option<&str> {
        self.rules
            .get(from)
            .and_then(|events| events.get(event))
            .map(String::as_str)
    }

    /// Events of `from` and their targets, ordered by event name.
    pub fn rules_for(&self, from: &str) -> Option<&BTreeMap<String, String>> {
        self.rules.get(from)
    }

    pub fn from_states(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Number of `(from, event)` keys.
    pub fn len(&self) -> usize {
        self.rules.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Immutable index of one machine's state classes and transition rules.
///
/// Built once from a rule store and shared by `Arc` between every state
/// machine using the same machine name.
#[derive(Debug)]
pub struct RuleManager {
    machine_name: String,
    state_classes: HashMap<String, String>,
    transitions: TransitionTable,
    classes: Arc<StateClassRegistry>,
}

impl RuleManager {
    /// Load the rows for `machine` from `store` and index them.
    ///
    /// The store session is held only while querying and is released on
    /// every path, including query failures.
    pub fn load(
        machine: &str,
        store: &dyn RuleStore,
        classes: Arc<StateClassRegistry>,
        config: &RuleLoadConfig,
    ) -> Result<Self, StateError> {
        tracing::debug!(machine = machine, "loading state transition rules");

        let (state_classes, transition_rules) = {
            let mut session = store.open_session()?;
            let state_classes = session.state_classes(machine)?;
            let transition_rules = session.transition_rules(machine)?;
            (state_classes, transition_rules)
        };

        Self::from_rows(machine, state_classes, transition_rules, classes, config)
    }

    /// Index rows that were already loaded.
    pub fn from_rows(
        machine: &str,
        state_classes: Vec<StateClassRow>,
        transition_rules: Vec<TransitionRuleRow>,
        classes: Arc<StateClassRegistry>,
        config: &RuleLoadConfig,
    ) -> Result<Self, StateError> {
        into_result(
            machine,
            validate_rule_rows(machine, &state_classes, &transition_rules, &classes, config),
        )?;

        let mut class_map = HashMap::with_capacity(state_classes.len());
        for row in state_classes {
            if let Some(previous) = class_map.insert(row.state_name.clone(), row.state_class_name.clone()) {
                if previous != row.state_class_name {
                    tracing::warn!(
                        machine = machine,
                        state = %row.state_name,
                        replaced = %previous,
                        class = %row.state_class_name,
                        "state mapped twice; keeping the last mapping"
                    );
                }
            }
        }

        let mut transitions = TransitionTable::default();
        for row in &transition_rules {
            let replaced = transitions.insert(&row.from_state_name, &row.event, &row.to_state_name);
            if let Some(previous) = replaced {
                // Reject already failed validation above, so only LastWins gets here.
                debug_assert_eq!(config.duplicate_rules, DuplicateRulePolicy::LastWins);
                tracing::warn!(
                    machine = machine,
                    from = %row.from_state_name,
                    event = %row.event,
                    replaced = %previous,
                    to = %row.to_state_name,
                    "duplicate transition rule; keeping the last one loaded"
                );
            }
        }

        tracing::info!(
            machine = machine,
            states = class_map.len(),
            rules = transitions.len(),
            "state transition rules loaded"
        );

        Ok(Self {
            machine_name: machine.to_string(),
            state_classes: class_map,
            transitions,
            classes,
        })
    }

    pub fn machine_name(&self) -> &str {
        &self.machine_name
    }

    pub fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    /// Class configured for `state`, if any.
    pub fn state_class(&self, state: &str) -> Option<&str> {
        self.state_classes.get(state).map(String::as_str)
    }

    /// Every state with a class mapping, sorted.
    pub fn state_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.state_classes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Construct a fresh instance of the state called `name`.
    pub fn state_for_name(&self, name: &str) -> Result<Box<dyn State>, StateError> {
        let class = self
            .state_classes
            .get(name)
            .ok_or_else(|| StateError::UnknownState {
                machine: self.machine_name.clone(),
                state: name.to_string(),
            })?;

        self.classes.construct(class, name)
    }

    /// The state `event` leads to from `from`, or `None` if no rule
    /// accepts the event there.
    pub fn destination_state(
        &self,
        from: &dyn State,
        event: &str,
    ) -> Result<Option<Box<dyn State>>, StateError> {
        match self.transitions.destination(from.state_name(), event) {
            Some(next) => self.state_for_name(next).map(Some),
            None => Ok(None),
        }
    }

    /// Rules defined for `state`, ordered by event, or `None` if it has none.
    pub fn transition_rules_for_state(&self, state: &str) -> Option<Vec<EventRule>> {
        self.transitions.rules_for(state).map(|events| {
            events
                .iter()
                .map(|(event, next)| EventRule {
                    event: event.clone(),
                    next_state: next.clone(),
                })
                .collect()
        })
    }

    /// Every state accepting `event`, ordered by state name.
    pub fn states_that_accept_event(&self, event: &str) -> Vec<AcceptingState> {
        self.transitions
            .from_states()
            .filter_map(|state| {
                self.transitions
                    .destination(state, event)
                    .map(|next| AcceptingState {
                        state: state.to_string(),
                        next_state: next.to_string(),
                    })
            })
            .collect()
    }
}
