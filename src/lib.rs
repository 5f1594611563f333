//! Statewright: named-state machines with two driving models.
//!
//! - [`EventMachine`]: transitions fire when a named event is triggered.
//!   Guards gate them and lifecycle hooks observe them in a fixed order.
//! - [`PolledMachine`]: the host calls [`PolledMachine::update`] every tick.
//!   The current state's update hook runs, then the first satisfied
//!   transition out of the current state is taken.
//!
//! Both models share a JSON-valued [`Context`], an opt-in transition
//! [`StateHistory`], and pluggable diagnostics (logged through `tracing` by
//! default).
//!
//! # Example
//!
//! ```rust
//! use statewright::context;
//! use statewright::polled::{PolledMachine, State};
//!
//! let mut hero = PolledMachine::with_context("hero", context! { "should_move" => false });
//! hero.add_state("idle", State::new());
//! hero.add_state("moving", State::new());
//! hero.add_transition("idle", "moving", |m| m.context().is_true("should_move"));
//! hero.add_transition("moving", "idle", |m| !m.context().is_true("should_move"));
//! hero.set_initial_state("idle");
//!
//! assert!(!hero.update(0.016));
//! hero.context_mut().set("should_move", true);
//! assert!(hero.update(0.016));
//! assert_eq!(hero.current_state(), Some("moving"));
//! ```

pub mod builder;
pub mod core;
pub mod event;
pub mod hooks;
pub mod polled;

// Re-export commonly used types
pub use builder::{BuildError, EventMachineBuilder, PolledMachineBuilder};
pub use core::{Cause, Context, Guard, StateHistory, StateTransition};
pub use event::{EventError, EventMachine, TriggerOutcome};
pub use hooks::{Diagnostic, DiagnosticSink, HookArgs, HookKey, HookPhase};
pub use polled::{PolledMachine, State};
