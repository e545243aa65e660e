//! Registry of state behavior classes.
//!
//! The state-class table names a class for every state. This registry maps
//! those class names to constructors, registered up front by the
//! application.

use crate::core::{FromStateName, PassiveState, State, StateError};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Class name under which [`PassiveState`] is registered by
/// [`StateClassRegistry::with_defaults`].
pub const PASSIVE_STATE_CLASS: &str = "passive";

/// Constructor for a state class. Receives the state name to assign.
pub type StateConstructor =
    Arc<dyn Fn(&str) -> Result<Box<dyn State>, StateError> + Send + Sync>;

/// Class name -> constructor.
#[derive(Clone, Default)]
pub struct StateClassRegistry {
    constructors: HashMap<String, StateConstructor>,
}

impl StateClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with [`PassiveState`] under [`PASSIVE_STATE_CLASS`].
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_type::<PassiveState>(PASSIVE_STATE_CLASS);
        registry
    }

    /// Register a constructor closure. A later registration for the same
    /// class name replaces the earlier one.
    pub fn register<F>(&mut self, class: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&str) -> Result<Box<dyn State>, StateError> + Send + Sync + 'static,
    {
        self.constructors.insert(class.into(), Arc::new(constructor));
        self
    }

    /// Register a type constructed through [`FromStateName`].
    pub fn register_type<T: FromStateName>(&mut self, class: impl Into<String>) -> &mut Self {
        self.register(class, |name: &str| {
            T::from_state_name(name).map(|state| Box::new(state) as Box<dyn State>)
        })
    }

    pub fn contains(&self, class: &str) -> bool {
        self.constructors.contains_key(class)
    }

    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build a fresh instance of `class` named `state`.
    pub fn construct(&self, class: &str, state: &str) -> Result<Box<dyn State>, StateError> {
        let constructor = self
            .constructors
            .get(class)
            .ok_or_else(|| StateError::UnknownStateClass {
                state: state.to_string(),
                class: class.to_string(),
            })?;

        let wrap = |source: StateError| StateError::StateConstruction {
            state: state.to_string(),
            class: class.to_string(),
            source: Box::new(source),
        };

        let built = constructor(state).map_err(wrap)?;
        if built.state_name() != state {
            return Err(wrap(StateError::Construction(format!(
                "constructor returned state [{}]",
                built.state_name()
            ))));
        }
        Ok(built)
    }
}

impl fmt::Debug for StateClassRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateClassRegistry")
            .field("classes", &self.class_names())
            .finish()
    }
}
