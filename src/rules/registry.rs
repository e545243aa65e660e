//! Cache of rule managers keyed by machine name.

use super::classes::StateClassRegistry;
use super::manager::RuleManager;
use crate::config::{ConfigError, EngineConfig, RuleLoadConfig};
use crate::core::StateError;
use crate::store::RuleStore;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Lazily populated `machine name -> RuleManager` cache.
///
/// The first request for a machine loads its rules from the store; later
/// requests get the same `Arc` without touching the store until the entry
/// is invalidated. Loads are serialized per machine name, so concurrent
/// first callers for a machine load it once while other machines load in
/// parallel. The application owns the registry and decides its lifetime.
pub struct RuleManagerRegistry {
    store: Arc<dyn RuleStore>,
    classes: Arc<StateClassRegistry>,
    config: RuleLoadConfig,
    managers: RwLock<HashMap<String, Arc<RuleManager>>>,
    load_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl RuleManagerRegistry {
    pub fn new(
        store: Arc<dyn RuleStore>,
        classes: StateClassRegistry,
        config: RuleLoadConfig,
    ) -> Self {
        Self {
            store,
            classes: Arc::new(classes),
            config,
            managers: RwLock::new(HashMap::new()),
            load_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Registry over the JSON rule document named by `config`.
    pub fn from_config(
        config: &EngineConfig,
        classes: StateClassRegistry,
    ) -> Result<Self, ConfigError> {
        let store = config.rule_store()?;
        tracing::debug!(path = %store.path().display(), "rule registry configured");
        Ok(Self::new(Arc::new(store), classes, config.rules.clone()))
    }

    pub fn config(&self) -> &RuleLoadConfig {
        &self.config
    }

    pub fn classes(&self) -> &Arc<StateClassRegistry> {
        &self.classes
    }

    /// The rule manager for `machine`, loading it on first use.
    pub fn get_manager(&self, machine: &str) -> Result<Arc<RuleManager>, StateError> {
        if let Some(manager) = self.managers.read().get(machine) {
            return Ok(Arc::clone(manager));
        }

        let load_lock = Arc::clone(
            self.load_locks
                .lock()
                .entry(machine.to_string())
                .or_default(),
        );
        let _loading = load_lock.lock();

        // Another caller may have finished loading while we waited.
        if let Some(manager) = self.managers.read().get(machine) {
            return Ok(Arc::clone(manager));
        }

        let manager = Arc::new(RuleManager::load(
            machine,
            self.store.as_ref(),
            Arc::clone(&self.classes),
            &self.config,
        )?);

        self.managers
            .write()
            .insert(machine.to_string(), Arc::clone(&manager));
        tracing::info!(machine = machine, "rule manager cached");

        Ok(manager)
    }

    /// Drop the cached manager for `machine` so the next request reloads it.
    /// Machines already holding the old manager keep using it.
    pub fn invalidate(&self, machine: &str) -> bool {
        let removed = self.managers.write().remove(machine).is_some();
        if removed {
            tracing::info!(machine = machine, "rule manager invalidated");
        }
        removed
    }

    pub fn invalidate_all(&self) {
        let mut managers = self.managers.write();
        tracing::info!(count = managers.len(), "invalidating all rule managers");
        managers.clear();
    }

    pub fn is_cached(&self, machine: &str) -> bool {
        self.managers.read().contains_key(machine)
    }

    pub fn cached_machines(&self) -> Vec<String> {
        let mut names: Vec<String> = self.managers.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for RuleManagerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleManagerRegistry")
            .field("classes", &self.classes)
            .field("config", &self.config)
            .field("cached", &self.cached_machines())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::classes::PASSIVE_STATE_CLASS;
    use crate::core::StoreCause;
    use crate::store::{InMemoryRuleStore, RuleSession, StateClassRow, TransitionRuleRow};
    use std::io::Write;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    /// Store whose "Slow" machine waits for a release signal mid-load.
    struct GatedStore {
        inner: InMemoryRuleStore,
        started: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    struct GatedSession<'a> {
        store: &'a GatedStore,
        inner: Box<dyn RuleSession + 'a>,
    }

    impl RuleStore for GatedStore {
        fn open_session(&self) -> Result<Box<dyn RuleSession + '_>, StateError> {
            Ok(Box::new(GatedSession {
                store: self,
                inner: self.inner.open_session()?,
            }))
        }
    }

    impl RuleSession for GatedSession<'_> {
        fn state_classes(&mut self, machine: &str) -> Result<Vec<StateClassRow>, StateError> {
            if machine == "Slow" {
                let _ = self.store.started.lock().send(());
                self.store
                    .release
                    .lock()
                    .recv_timeout(Duration::from_secs(5))
                    .map_err(|e| StateError::Store {
                        machine: machine.to_string(),
                        source: Box::new(e) as StoreCause,
                    })?;
            }
            self.inner.state_classes(machine)
        }

        fn transition_rules(
            &mut self,
            machine: &str,
        ) -> Result<Vec<TransitionRuleRow>, StateError> {
            self.inner.transition_rules(machine)
        }
    }

    fn order_store() -> Arc<InMemoryRuleStore> {
        let store = Arc::new(InMemoryRuleStore::new());
        for state in ["NEW", "SUBMITTED"] {
            store.add_state_class("Order", state, PASSIVE_STATE_CLASS);
        }
        store.add_transition_rule("Order", "NEW", "submit", "SUBMITTED");
        store
    }

    fn registry(store: &Arc<InMemoryRuleStore>) -> RuleManagerRegistry {
        RuleManagerRegistry::new(
            Arc::clone(store) as Arc<dyn RuleStore>,
            StateClassRegistry::with_defaults(),
            RuleLoadConfig::default(),
        )
    }

    #[test]
    fn second_request_uses_the_cache() {
        let store = order_store();
        let registry = registry(&store);

        let first = registry.get_manager("Order").unwrap();
        let queries = store.query_count();
        let second = registry.get_manager("Order").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.query_count(), queries);
        assert!(registry.is_cached("Order"));
    }

    #[test]
    fn invalidate_forces_a_reload() {
        let store = order_store();
        let registry = registry(&store);

        let before = registry.get_manager("Order").unwrap();
        store.add_transition_rule("Order", "SUBMITTED", "reopen", "NEW");

        assert!(registry.invalidate("Order"));
        assert!(!registry.invalidate("Order"));

        let after = registry.get_manager("Order").unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert!(before.transition_rules_for_state("SUBMITTED").is_none());
        assert!(after.transition_rules_for_state("SUBMITTED").is_some());
    }

    #[test]
    fn failed_load_is_not_cached() {
        let store = order_store();
        store.set_unavailable(true);
        let registry = registry(&store);

        assert!(registry.get_manager("Order").is_err());
        assert!(!registry.is_cached("Order"));

        store.set_unavailable(false);
        assert!(registry.get_manager("Order").is_ok());
    }

    #[test]
    fn concurrent_first_callers_load_once() {
        let store = order_store();
        let registry = Arc::new(registry(&store));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.get_manager("Order").unwrap())
            })
            .collect();
        let managers: Vec<Arc<RuleManager>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(managers.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        // One load is one state-class query plus one rule query.
        assert_eq!(store.query_count(), 2);
    }

    #[test]
    fn invalidate_all_clears_every_machine() {
        let store = order_store();
        store.add_state_class("Invoice", "OPEN", PASSIVE_STATE_CLASS);
        let registry = registry(&store);

        registry.get_manager("Order").unwrap();
        registry.get_manager("Invoice").unwrap();
        assert_eq!(registry.cached_machines(), vec!["Invoice", "Order"]);

        registry.invalidate_all();
        assert!(registry.cached_machines().is_empty());
    }

    #[test]
    fn slow_load_does_not_block_other_machines() {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let inner = InMemoryRuleStore::new();
        inner.add_state_class("Slow", "A", PASSIVE_STATE_CLASS);
        inner.add_state_class("Fast", "B", PASSIVE_STATE_CLASS);
        let store = GatedStore {
            inner,
            started: Mutex::new(started_tx),
            release: Mutex::new(release_rx),
        };
        let registry = Arc::new(RuleManagerRegistry::new(
            Arc::new(store),
            StateClassRegistry::with_defaults(),
            RuleLoadConfig::default(),
        ));

        let slow = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.get_manager("Slow").map(|_| ()))
        };
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        // "Slow" is still mid-load here.
        assert!(registry.get_manager("Fast").is_ok());
        assert!(!registry.is_cached("Slow"));

        release_tx.send(()).unwrap();
        slow.join().unwrap().unwrap();
        assert_eq!(registry.cached_machines(), vec!["Fast", "Slow"]);
    }

    #[test]
    fn from_config_reads_the_rule_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"{"state_classes": [
                    {"machine_name": "Order", "state_name": "NEW", "state_class_name": "passive"}
                ]}"#,
        )
        .unwrap();
        let config = EngineConfig {
            rules: RuleLoadConfig::strict(),
            rule_document: Some(file.path().to_path_buf()),
        };

        let registry =
            RuleManagerRegistry::from_config(&config, StateClassRegistry::with_defaults()).unwrap();

        assert_eq!(registry.config(), &RuleLoadConfig::strict());
        let manager = registry.get_manager("Order").unwrap();
        assert_eq!(manager.state_names(), vec!["NEW"]);
    }

    #[test]
    fn from_config_requires_a_rule_document() {
        let result =
            RuleManagerRegistry::from_config(&EngineConfig::default(), StateClassRegistry::new());
        assert!(matches!(result, Err(ConfigError::MissingRuleDocument)));
    }
}
