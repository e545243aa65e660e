//! Order Lifecycle
//!
//! This demo drives an order through rule-table transitions.
//!
//! Key concepts:
//! - Rule tables built with the fluent builder
//! - State behavior registered by class name
//! - Context downcasting inside state hooks
//! - Rejected events leave the order where it was
//! - Checkpoint and resume
//!
//! Run with: RUST_LOG=statewise=debug cargo run --example order_lifecycle

use statewise::builder::{in_memory_store, RuleTablesBuilder};
use statewise::core::{StateContext, Transaction};
use statewise::state_class;
use statewise::{
    MachineCheckpoint, RuleLoadConfig, RuleManagerRegistry, State, StateClassRegistry,
    StateError, StateMachine,
};
use std::sync::Arc;

state_class! {
    /// Terminal states with no behavior of their own.
    struct ClosedOrder;
}

// Order entity carried through the hooks as context
struct Order {
    id: u64,
    total: f64,
    notifications: Vec<String>,
}

/// Submitting is refused for empty orders.
#[derive(Debug)]
struct NewOrder {
    name: String,
}

impl State for NewOrder {
    fn state_name(&self) -> &str {
        &self.name
    }

    fn process_event(
        &mut self,
        event: &str,
        context: &mut dyn StateContext,
        _tx: &mut dyn Transaction,
    ) -> Result<(), StateError> {
        let Some(order) = context.as_any_mut().downcast_mut::<Order>() else {
            return Err(StateError::rejected(&self.name, "context is not an order"));
        };
        if event == "submit" && order.total <= 0.0 {
            return Err(StateError::rejected(&self.name, "order total must be positive"));
        }
        Ok(())
    }
}

/// Notifies the customer on arrival.
#[derive(Debug)]
struct SubmittedOrder {
    name: String,
}

impl State for SubmittedOrder {
    fn state_name(&self) -> &str {
        &self.name
    }

    fn enter(
        &mut self,
        context: &mut dyn StateContext,
        _tx: &mut dyn Transaction,
    ) -> Result<(), StateError> {
        if let Some(order) = context.as_any_mut().downcast_mut::<Order>() {
            order
                .notifications
                .push(format!("order {} submitted", order.id));
        }
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "statewise=info".to_string()),
        )
        .init();

    println!("=== Order Lifecycle Demo ===\n");

    let store = in_memory_store(
        RuleTablesBuilder::new("Order")
            .state("NEW", "order.new")
            .state("SUBMITTED", "order.submitted")
            .state("CANCELLED", "order.closed")
            .state("SHIPPED", "order.closed")
            .transition("NEW", "submit", "SUBMITTED")
            .transition("NEW", "cancel", "CANCELLED")
            .transition("SUBMITTED", "cancel", "CANCELLED")
            .transition("SUBMITTED", "ship", "SHIPPED"),
    )?;

    let mut classes = StateClassRegistry::with_defaults();
    classes
        .register("order.new", |name| {
            Ok(Box::new(NewOrder {
                name: name.to_string(),
            }) as Box<dyn State>)
        })
        .register("order.submitted", |name| {
            Ok(Box::new(SubmittedOrder {
                name: name.to_string(),
            }) as Box<dyn State>)
        })
        .register_type::<ClosedOrder>("order.closed");

    let registry = RuleManagerRegistry::new(Arc::new(store), classes, RuleLoadConfig::strict());

    let mut empty = Order {
        id: 41,
        total: 0.0,
        notifications: Vec::new(),
    };
    let mut machine = StateMachine::from_registry(&registry, "Order", Some("NEW"))?;
    match machine.process_event("submit", &mut empty, &mut ()) {
        Ok(()) => println!("order {} submitted", empty.id),
        Err(e) => println!("order {} refused: {}", empty.id, e),
    }
    println!("order {} is {:?}\n", empty.id, machine.current_state_name());

    let mut order = Order {
        id: 42,
        total: 99.5,
        notifications: Vec::new(),
    };
    let mut machine = StateMachine::from_registry(&registry, "Order", Some("NEW"))?;
    println!("'ship' valid in NEW? {}", machine.is_valid_event("ship"));

    machine.process_event("submit", &mut order, &mut ())?;
    println!("order {} is {:?}", order.id, machine.current_state_name());
    println!("notifications: {:?}", order.notifications);

    for rule in machine.transition_rules_for_current_state()?.unwrap_or_default() {
        println!("  {} --> {}", rule.event, rule.next_state);
    }

    let json = machine.checkpoint().to_json()?;
    println!("\ncheckpoint: {}", json);

    let checkpoint = MachineCheckpoint::from_json(&json)?;
    let mut resumed = StateMachine::restore(registry.get_manager("Order")?, &checkpoint)?;
    resumed.process_event("ship", &mut order, &mut ())?;
    println!(
        "resumed order {} path: {:?}",
        order.id,
        resumed.history().get_path()
    );

    Ok(())
}
