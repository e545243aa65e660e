//! State behavior trait and the opaque capabilities passed to every hook.
//!
//! A state is a short-lived behavior object. The rule manager constructs a
//! fresh instance every time it resolves a state name, so anything a state
//! wants to remember across transitions must live in the [`StateContext`].

use super::error::StateError;
use std::any::Any;
use std::fmt::Debug;

/// Opaque caller-supplied context handed to every state hook.
///
/// Implemented for every `Any + Send` type. Hooks that need the concrete
/// context downcast through [`StateContext::as_any_mut`]; `()` works as an
/// empty context.
pub trait StateContext: Send {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any + Send> StateContext for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Opaque commit/rollback boundary owned by the caller.
///
/// The state machine never opens it; it is passed through to the hooks
/// untouched. `()` works when no transaction is involved.
pub trait Transaction: Send {
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any + Send> Transaction for T {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Behavior bound to a named state.
///
/// All hooks have accepting defaults, so a concrete state overrides only
/// what it needs. `process_event` runs while the state is still current and
/// may veto with [`StateError::rejected`]; `exit` runs next, then the
/// destination state's `enter`.
///
/// # Example
///
/// ```rust
/// use statewise::core::{State, StateContext, StateError, Transaction};
///
/// #[derive(Debug)]
/// struct Submitted {
///     name: String,
/// }
///
/// impl State for Submitted {
///     fn state_name(&self) -> &str {
///         &self.name
///     }
///
///     fn process_event(
///         &mut self,
///         event: &str,
///         _context: &mut dyn StateContext,
///         _tx: &mut dyn Transaction,
///     ) -> Result<(), StateError> {
///         if event == "cancel" {
///             return Err(StateError::rejected(self.state_name(), "already submitted"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait State: Debug + Send {
    /// Name this instance was constructed for.
    fn state_name(&self) -> &str;

    /// Called once, after the machine commits to this state and before the
    /// event caller regains control.
    fn enter(
        &mut self,
        _context: &mut dyn StateContext,
        _tx: &mut dyn Transaction,
    ) -> Result<(), StateError> {
        tracing::debug!(state = self.state_name(), "entering state");
        Ok(())
    }

    /// Called once, right before the machine leaves this state.
    fn exit(
        &mut self,
        _context: &mut dyn StateContext,
        _tx: &mut dyn Transaction,
    ) -> Result<(), StateError> {
        tracing::debug!(state = self.state_name(), "exiting state");
        Ok(())
    }

    /// Business logic for `event` while this state is current.
    ///
    /// Only the owning state machine calls this. Returning an error keeps
    /// the machine in this state and skips both `exit` and `enter`.
    fn process_event(
        &mut self,
        _event: &str,
        _context: &mut dyn StateContext,
        _tx: &mut dyn Transaction,
    ) -> Result<(), StateError> {
        Ok(())
    }
}

/// Construction contract for states registered by type.
///
/// See [`crate::rules::StateClassRegistry::register_type`].
pub trait FromStateName: State + Sized + 'static {
    fn from_state_name(name: &str) -> Result<Self, StateError>;
}

/// State with no behavior beyond the logging defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassiveState {
    name: String,
}

impl PassiveState {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl State for PassiveState {
    fn state_name(&self) -> &str {
        &self.name
    }
}

impl FromStateName for PassiveState {
    fn from_state_name(name: &str) -> Result<Self, StateError> {
        Ok(Self::new(name))
    }
}
