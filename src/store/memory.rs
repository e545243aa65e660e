//! In-process rule store.

use super::{RuleSession, RuleStore, RuleTables, StateClassRow, TransitionRuleRow};
use crate::core::StateError;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Rule store backed by tables held in memory.
///
/// Keeps count of open sessions and served queries so callers can check
/// that sessions are released and that caches above it avoid re-querying.
#[derive(Debug, Default)]
pub struct InMemoryRuleStore {
    tables: RwLock<RuleTables>,
    open_sessions: AtomicUsize,
    queries: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(tables: RuleTables) -> Self {
        Self {
            tables: RwLock::new(tables),
            ..Self::default()
        }
    }

    pub fn add_state_class(&self, machine: &str, state: &str, class: &str) {
        self.tables
            .write()
            .state_classes
            .push(StateClassRow::new(machine, state, class));
    }

    pub fn add_transition_rule(&self, machine: &str, from: &str, event: &str, to: &str) {
        self.tables
            .write()
            .transition_rules
            .push(TransitionRuleRow::new(machine, from, event, to));
    }

    /// Replace every row with `tables`.
    pub fn replace_tables(&self, tables: RuleTables) {
        *self.tables.write() = tables;
    }

    /// Make every later query fail as if the backing store were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), StateError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StateError::StoreUnavailable {
                reason: "in-memory rule store marked unavailable".to_string(),
            });
        }
        Ok(())
    }
}

impl RuleStore for InMemoryRuleStore {
    fn open_session(&self) -> Result<Box<dyn RuleSession + '_>, StateError> {
        self.open_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySession { store: self }))
    }
}

struct MemorySession<'a> {
    store: &'a InMemoryRuleStore,
}

impl RuleSession for MemorySession<'_> {
    fn state_classes(&mut self, machine: &str) -> Result<Vec<StateClassRow>, StateError> {
        self.store.check_available()?;
        self.store.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.store.tables.read().state_classes_for(machine))
    }

    fn transition_rules(&mut self, machine: &str) -> Result<Vec<TransitionRuleRow>, StateError> {
        self.store.check_available()?;
        self.store.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.store.tables.read().transition_rules_for(machine))
    }
}

impl Drop for MemorySession<'_> {
    fn drop(&mut self) {
        self.store.open_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}
