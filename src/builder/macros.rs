//! Macros for declaring state behavior types.

/// Declare a named state type with the default hooks.
///
/// The generated struct holds the state name, implements
/// [`State`](crate::core::State) and
/// [`FromStateName`](crate::core::FromStateName), and can be registered with
/// [`StateClassRegistry::register_type`](crate::rules::StateClassRegistry::register_type).
///
/// # Example
///
/// ```
/// use statewise::state_class;
/// use statewise::core::{FromStateName, State};
///
/// state_class! {
///     /// Terminal state for cancelled orders.
///     pub struct CancelledState;
/// }
///
/// let state = CancelledState::from_state_name("CANCELLED").unwrap();
/// assert_eq!(state.state_name(), "CANCELLED");
/// ```
#[macro_export]
macro_rules! state_class {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq)]
        $vis struct $name {
            name: String,
        }

        impl $crate::core::State for $name {
            fn state_name(&self) -> &str {
                &self.name
            }
        }

        impl $crate::core::FromStateName for $name {
            fn from_state_name(name: &str) -> Result<Self, $crate::core::StateError> {
                Ok(Self {
                    name: name.to_string(),
                })
            }
        }
    };
}
