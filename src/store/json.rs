//! Rule store reading a JSON document from disk.

use super::{RuleSession, RuleStore, RuleTables, StateClassRow, TransitionRuleRow};
use crate::core::{StateError, StoreCause};
use std::fs;
use std::path::{Path, PathBuf};

/// Rule store backed by a [`RuleTables`] JSON document.
///
/// The file is read and parsed on every query, so edits show up on the next
/// load. Read and parse failures keep their cause in [`StateError::Store`].
#[derive(Debug, Clone)]
pub struct JsonRuleStore {
    path: PathBuf,
}

impl JsonRuleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_tables(&self, machine: &str) -> Result<RuleTables, StateError> {
        let store_error = |source: StoreCause| StateError::Store {
            machine: machine.to_string(),
            source,
        };

        let contents = fs::read_to_string(&self.path).map_err(|e| store_error(Box::new(e)))?;
        let tables = serde_json::from_str(&contents).map_err(|e| store_error(Box::new(e)))?;
        tracing::trace!(path = %self.path.display(), machine = machine, "read rule document");
        Ok(tables)
    }
}

impl RuleStore for JsonRuleStore {
    fn open_session(&self) -> Result<Box<dyn RuleSession + '_>, StateError> {
        tracing::debug!(path = %self.path.display(), "opened rule document session");
        Ok(Box::new(DocumentSession { store: self }))
    }
}

struct DocumentSession<'a> {
    store: &'a JsonRuleStore,
}

impl RuleSession for DocumentSession<'_> {
    fn state_classes(&mut self, machine: &str) -> Result<Vec<StateClassRow>, StateError> {
        Ok(self.store.read_tables(machine)?.state_classes_for(machine))
    }

    fn transition_rules(&mut self, machine: &str) -> Result<Vec<TransitionRuleRow>, StateError> {
        Ok(self.store.read_tables(machine)?.transition_rules_for(machine))
    }
}
