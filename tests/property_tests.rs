//! Property-based tests for rule indexing and state machine behavior.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated rule tables and event sequences.

use proptest::prelude::*;
use statewise::rules::{RuleManager, StateClassRegistry, PASSIVE_STATE_CLASS};
use statewise::store::{StateClassRow, TransitionRuleRow};
use statewise::{RuleLoadConfig, StateMachine};
use std::collections::HashMap;
use std::sync::Arc;

const STATES: [&str; 5] = ["A", "B", "C", "D", "E"];
const EVENTS: [&str; 4] = ["go", "stop", "retry", "skip"];

prop_compose! {
    fn arbitrary_rule()(from in 0..STATES.len(), event in 0..EVENTS.len(), to in 0..STATES.len())
        -> (&'static str, &'static str, &'static str) {
        (STATES[from], EVENTS[event], STATES[to])
    }
}

fn arbitrary_event() -> impl Strategy<Value = &'static str> {
    (0..EVENTS.len()).prop_map(|i| EVENTS[i])
}

fn manager_for(rules: &[(&str, &str, &str)]) -> RuleManager {
    let state_classes = STATES
        .iter()
        .map(|state| StateClassRow::new("Prop", *state, PASSIVE_STATE_CLASS))
        .collect();
    let transition_rules = rules
        .iter()
        .map(|(from, event, to)| TransitionRuleRow::new("Prop", *from, *event, *to))
        .collect();

    RuleManager::from_rows(
        "Prop",
        state_classes,
        transition_rules,
        Arc::new(StateClassRegistry::with_defaults()),
        &RuleLoadConfig::default(),
    )
    .unwrap()
}

proptest! {
    #[test]
    fn last_loaded_duplicate_rule_wins(rules in prop::collection::vec(arbitrary_rule(), 0..40)) {
        let manager = manager_for(&rules);

        let mut expected = HashMap::new();
        for (from, event, to) in &rules {
            expected.insert((*from, *event), *to);
        }

        prop_assert_eq!(manager.transitions().len(), expected.len());
        for ((from, event), to) in expected {
            prop_assert_eq!(manager.transitions().destination(from, event), Some(to));
        }
    }

    #[test]
    fn rules_for_state_are_stable_and_ordered(
        rules in prop::collection::vec(arbitrary_rule(), 0..40),
        state in 0..STATES.len(),
    ) {
        let manager = manager_for(&rules);
        let first = manager.transition_rules_for_state(STATES[state]);
        let second = manager.transition_rules_for_state(STATES[state]);
        prop_assert_eq!(&first, &second);

        match first {
            Some(events) => {
                prop_assert!(!events.is_empty());
                prop_assert!(events.windows(2).all(|pair| pair[0].event < pair[1].event));
            }
            None => {
                prop_assert!(!rules.iter().any(|(from, _, _)| *from == STATES[state]));
            }
        }
    }

    #[test]
    fn accepting_states_match_destinations(
        rules in prop::collection::vec(arbitrary_rule(), 0..40),
        event in arbitrary_event(),
    ) {
        let manager = manager_for(&rules);
        let accepting = manager.states_that_accept_event(event);

        for pair in &accepting {
            prop_assert_eq!(
                manager.transitions().destination(&pair.state, event),
                Some(pair.next_state.as_str())
            );
        }

        let expected = STATES
            .iter()
            .filter(|state| manager.transitions().destination(state, event).is_some())
            .count();
        prop_assert_eq!(accepting.len(), expected);
        prop_assert!(accepting.windows(2).all(|pair| pair[0].state < pair[1].state));
    }

    #[test]
    fn history_tracks_every_accepted_event(
        rules in prop::collection::vec(arbitrary_rule(), 0..40),
        events in prop::collection::vec(arbitrary_event(), 0..30),
    ) {
        let rules = Arc::new(manager_for(&rules));
        let mut machine = StateMachine::with_initial_state(rules, "A").unwrap();
        let mut accepted = 0;

        for event in events {
            let before = machine.current_state_name().map(str::to_string);
            let valid = machine.is_valid_event(event);
            let result = machine.process_event(event, &mut (), &mut ());

            prop_assert_eq!(valid, result.is_ok());
            if result.is_ok() {
                accepted += 1;
            } else {
                prop_assert!(result.unwrap_err().is_illegal_transition());
                prop_assert_eq!(machine.current_state_name().map(str::to_string), before);
            }
        }

        prop_assert_eq!(machine.history().len(), accepted);
        if accepted > 0 {
            let path = machine.history().get_path();
            prop_assert_eq!(path.len(), accepted + 1);
            prop_assert_eq!(path.last().copied(), machine.current_state_name());
        }
    }
}
