//! Event-driven machines.
//!
//! Transitions are named events declared with a source state, a target state
//! and an optional guard. Hooks bound to `onbefore`/`onafter` an event and to
//! `leave`/`enter` a state observe every trigger.

mod machine;
mod rule;

pub use machine::EventMachine;
pub use rule::{EventError, TransitionRule, TriggerOutcome, INITIAL_EVENT};
