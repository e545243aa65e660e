//! Load-time validation of rule rows.
//!
//! Every check runs and every violation is collected, so a bad rule table
//! is reported in one pass instead of one error per reload.

use super::classes::StateClassRegistry;
use crate::config::{DuplicateRulePolicy, RuleLoadConfig};
use crate::core::StateError;
use crate::store::{StateClassRow, TransitionRuleRow};
use std::collections::{BTreeSet, HashMap};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// A single problem found in a machine's rule rows.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleViolation {
    #[error("Row for state machine [{found}] returned while loading [{expected}]")]
    ForeignRow { expected: String, found: String },

    #[error("State [{state}] is mapped to both [{first}] and [{second}]")]
    DuplicateStateClass {
        state: String,
        first: String,
        second: String,
    },

    #[error("Event [{event}] in state [{from_state}] leads to both [{first}] and [{second}]")]
    DuplicateRule {
        from_state: String,
        event: String,
        first: String,
        second: String,
    },

    #[error("State [{state}] is used by a transition rule but has no class mapping")]
    UnmappedState { state: String },

    #[error("State [{state}] is mapped to unregistered class [{class}]")]
    UnregisteredClass { state: String, class: String },
}

type Checked = Validation<(), NonEmptyVec<RuleViolation>>;

fn check(violation: Option<RuleViolation>) -> Checked {
    match violation {
        Some(violation) => Validation::fail(violation),
        None => Validation::success(()),
    }
}

/// Validate the rows loaded for `machine` under `config`.
///
/// Rows belonging to another machine are always a violation. Duplicate keys
/// are violations under [`DuplicateRulePolicy::Reject`]. Reference checks
/// run only when `validate_references` is set.
pub fn validate_rule_rows(
    machine: &str,
    state_classes: &[StateClassRow],
    transition_rules: &[TransitionRuleRow],
    classes: &StateClassRegistry,
    config: &RuleLoadConfig,
) -> Checked {
    let mut checks: Vec<Checked> = Vec::new();

    let foreign_classes = state_classes.iter().map(|row| &row.machine_name);
    let foreign_rules = transition_rules.iter().map(|row| &row.machine_name);
    for found in foreign_classes.chain(foreign_rules) {
        checks.push(check((found != machine).then(|| RuleViolation::ForeignRow {
            expected: machine.to_string(),
            found: found.clone(),
        })));
    }

    let reject_duplicates = config.duplicate_rules == DuplicateRulePolicy::Reject;

    let mut mapped: HashMap<&str, &str> = HashMap::new();
    for row in state_classes {
        let previous = mapped.insert(&row.state_name, &row.state_class_name);
        if reject_duplicates {
            checks.push(check(previous.filter(|first| *first != row.state_class_name).map(
                |first| RuleViolation::DuplicateStateClass {
                    state: row.state_name.clone(),
                    first: first.to_string(),
                    second: row.state_class_name.clone(),
                },
            )));
        }
    }

    if reject_duplicates {
        let mut seen: HashMap<(&str, &str), &str> = HashMap::new();
        for row in transition_rules {
            let key = (row.from_state_name.as_str(), row.event.as_str());
            let previous = seen.insert(key, &row.to_state_name);
            checks.push(check(previous.map(|first| RuleViolation::DuplicateRule {
                from_state: row.from_state_name.clone(),
                event: row.event.clone(),
                first: first.to_string(),
                second: row.to_state_name.clone(),
            })));
        }
    }

    if config.validate_references {
        let referenced: BTreeSet<&str> = transition_rules
            .iter()
            .flat_map(|row| [row.from_state_name.as_str(), row.to_state_name.as_str()])
            .collect();
        for state in referenced {
            checks.push(check((!mapped.contains_key(state)).then(|| {
                RuleViolation::UnmappedState {
                    state: state.to_string(),
                }
            })));
        }

        for row in state_classes {
            checks.push(check((!classes.contains(&row.state_class_name)).then(|| {
                RuleViolation::UnregisteredClass {
                    state: row.state_name.clone(),
                    class: row.state_class_name.clone(),
                }
            })));
        }
    }

    Validation::all_vec(checks).map(|_| ())
}

/// Collapse a validation outcome into the error returned by rule loading.
pub(crate) fn into_result(machine: &str, validation: Checked) -> Result<(), StateError> {
    match validation {
        Validation::Success(_) => Ok(()),
        Validation::Failure(errors) => Err(StateError::InvalidRules {
            machine: machine.to_string(),
            violations: errors.iter().cloned().collect(),
        }),
    }
}
