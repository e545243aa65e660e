//! State machine driving named states through rule-table transitions.

use crate::core::{State, StateContext, StateError, StateHistory, Transaction, TransitionRecord};
use crate::rules::{AcceptingState, EventRule, RuleManager, RuleManagerRegistry};
use chrono::Utc;
use std::sync::Arc;
use tracing::Level;

/// One instance of a named state machine.
///
/// Holds the current state and a shared, read-only [`RuleManager`]. Every
/// mutating call takes `&mut self`, so one instance is driven by one owner
/// at a time; wrap it in a lock if several threads need it.
///
/// # Example
///
/// ```rust
/// use statewise::machine::StateMachine;
/// use statewise::rules::{RuleManagerRegistry, StateClassRegistry, PASSIVE_STATE_CLASS};
/// use statewise::store::InMemoryRuleStore;
/// use statewise::config::RuleLoadConfig;
/// use std::sync::Arc;
///
/// let store = InMemoryRuleStore::new();
/// for state in ["NEW", "SUBMITTED"] {
///     store.add_state_class("Order", state, PASSIVE_STATE_CLASS);
/// }
/// store.add_transition_rule("Order", "NEW", "submit", "SUBMITTED");
///
/// let registry = RuleManagerRegistry::new(
///     Arc::new(store),
///     StateClassRegistry::with_defaults(),
///     RuleLoadConfig::default(),
/// );
///
/// let mut machine = StateMachine::from_registry(&registry, "Order", Some("NEW")).unwrap();
/// machine.process_event("submit", &mut (), &mut ()).unwrap();
/// assert_eq!(machine.current_state_name(), Some("SUBMITTED"));
/// ```
#[derive(Debug)]
pub struct StateMachine {
    rules: Arc<RuleManager>,
    current: Option<Box<dyn State>>,
    history: StateHistory,
}

impl StateMachine {
    /// Machine with no current state. Call [`StateMachine::initialize_state`]
    /// before the first event.
    pub fn new(rules: Arc<RuleManager>) -> Self {
        Self {
            rules,
            current: None,
            history: StateHistory::new(),
        }
    }

    /// Machine starting in `initial`. No hooks run.
    pub fn with_initial_state(rules: Arc<RuleManager>, initial: &str) -> Result<Self, StateError> {
        let mut machine = Self::new(rules);
        machine.initialize_state(initial)?;
        Ok(machine)
    }

    /// Machine for `machine_name` using the registry's cached rules.
    pub fn from_registry(
        registry: &RuleManagerRegistry,
        machine_name: &str,
        initial: Option<&str>,
    ) -> Result<Self, StateError> {
        let rules = registry.get_manager(machine_name)?;
        match initial {
            Some(initial) => Self::with_initial_state(rules, initial),
            None => Ok(Self::new(rules)),
        }
    }

    /// Set the current state directly, e.g. from a value loaded from storage.
    /// No hooks run and no history is recorded.
    pub fn initialize_state(&mut self, name: &str) -> Result<(), StateError> {
        let state = self.rules.state_for_name(name)?;
        tracing::debug!(
            machine = self.rules.machine_name(),
            state = name,
            "state machine initialized"
        );
        self.current = Some(state);
        Ok(())
    }

    pub fn machine_name(&self) -> &str {
        self.rules.machine_name()
    }

    pub fn rule_manager(&self) -> &Arc<RuleManager> {
        &self.rules
    }

    pub fn is_initialized(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_state(&self) -> Option<&dyn State> {
        self.current.as_deref()
    }

    pub fn current_state_name(&self) -> Option<&str> {
        self.current.as_deref().map(|state| state.state_name())
    }

    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    pub(crate) fn restore_history(&mut self, history: StateHistory) {
        self.history = history;
    }

    pub fn transition_rules_for_state(&self, state: &str) -> Option<Vec<EventRule>> {
        self.rules.transition_rules_for_state(state)
    }

    pub fn transition_rules_for_current_state(&self) -> Result<Option<Vec<EventRule>>, StateError> {
        let current = self.require_current()?;
        Ok(self.rules.transition_rules_for_state(current.state_name()))
    }

    pub fn states_that_accept_event(&self, event: &str) -> Vec<AcceptingState> {
        self.rules.states_that_accept_event(event)
    }

    /// Would `event` be accepted right now?
    ///
    /// Never fails: an uninitialized machine or a lookup error (for example
    /// a destination state without a class mapping) answers `false` and is
    /// logged as a warning.
    pub fn is_valid_event(&self, event: &str) -> bool {
        let Some(current) = self.current.as_deref() else {
            tracing::warn!(
                machine = self.machine_name(),
                event = event,
                "validity check on uninitialized state machine"
            );
            return false;
        };

        if tracing::enabled!(Level::TRACE) {
            self.trace_rules(current.state_name(), event);
        }

        match self.rules.destination_state(current, event) {
            Ok(Some(_)) => {
                tracing::debug!(state = current.state_name(), event = event, "event is valid");
                true
            }
            Ok(None) => {
                tracing::debug!(state = current.state_name(), event = event, "event is not valid");
                false
            }
            Err(e) => {
                tracing::warn!(
                    machine = self.machine_name(),
                    state = current.state_name(),
                    event = event,
                    error = %e,
                    "failed to resolve destination for event"
                );
                false
            }
        }
    }

    /// Drive the machine with `event`.
    ///
    /// Order: resolve the destination, run the current state's
    /// `process_event`, its `exit`, then the destination's `enter`. The new
    /// state becomes current only after `enter` succeeds. Any failure leaves
    /// the previous state current; side effects already performed by hooks
    /// are not undone here, which is what `tx` is for.
    pub fn process_event(
        &mut self,
        event: &str,
        context: &mut dyn StateContext,
        tx: &mut dyn Transaction,
    ) -> Result<(), StateError> {
        let machine = self.rules.machine_name();
        let current = self
            .current
            .as_mut()
            .ok_or_else(|| StateError::Uninitialized {
                machine: machine.to_string(),
            })?;
        let from = current.state_name().to_string();

        tracing::debug!(machine = machine, state = %from, event = event, "received event");

        let mut next = self
            .rules
            .destination_state(&**current, event)?
            .ok_or_else(|| StateError::IllegalTransition {
                state: from.clone(),
                event: event.to_string(),
            })?;

        current.process_event(event, context, tx)?;
        current.exit(context, tx)?;
        next.enter(context, tx)?;

        let to = next.state_name().to_string();
        self.current = Some(next);
        self.history = self.history.record(TransitionRecord {
            from: from.clone(),
            event: event.to_string(),
            to: to.clone(),
            timestamp: Utc::now(),
        });

        tracing::info!(
            machine = self.rules.machine_name(),
            from = %from,
            event = event,
            to = %to,
            "state transition committed"
        );
        Ok(())
    }

    fn require_current(&self) -> Result<&dyn State, StateError> {
        self.current
            .as_deref()
            .ok_or_else(|| StateError::Uninitialized {
                machine: self.machine_name().to_string(),
            })
    }

    fn trace_rules(&self, state: &str, event: &str) {
        let rules = self
            .rules
            .transition_rules_for_state(state)
            .unwrap_or_default()
            .into_iter()
            .map(|rule| format!("{} --> {}", rule.event, rule.next_state))
            .collect::<Vec<_>>();
        tracing::trace!(state = state, rules = ?rules, "transition rules for current state");

        let accepting = self
            .rules
            .states_that_accept_event(event)
            .into_iter()
            .map(|pair| format!("{} --> {}", pair.state, pair.next_state))
            .collect::<Vec<_>>();
        tracing::trace!(event = event, states = ?accepting, "states accepting event");
    }
}
