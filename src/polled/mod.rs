//! Tick-driven machines.
//!
//! States carry optional enter/update/exit hooks. Transitions are rows keyed
//! by source state and guarded by conditions over the machine; the caller
//! drives the machine by calling `update(dt)` at whatever cadence it likes.

mod machine;
mod state;
mod transition;

pub use machine::{MachineStatus, PolledMachine};
pub use state::{State, StateHook, UpdateHook};
pub use transition::{Condition, Sources, Transition, TransitionTable};
