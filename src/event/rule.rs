//! Event rules and trigger results.

use crate::core::Guard;
use crate::hooks::RejectReason;

/// Event name passed to enter hooks fired by `set_initial_state`.
pub const INITIAL_EVENT: &str = "init";

/// A named event moving the machine from one state to another.
pub struct TransitionRule<C> {
    pub event: String,
    pub from: String,
    pub to: String,
    pub guard: Option<Guard<C>>,
}

impl<C> TransitionRule<C> {
    pub fn new(event: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            from: from.into(),
            to: to.into(),
            guard: None,
        }
    }

    pub fn with_guard(mut self, guard: Guard<C>) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Evaluate the guard. A rule without a guard always passes.
    pub fn guard_passes(&self, context: &C) -> bool {
        self.guard.as_ref().map_or(true, |g| g.check(context))
    }
}

impl<C> Clone for TransitionRule<C> {
    fn clone(&self) -> Self {
        Self {
            event: self.event.clone(),
            from: self.from.clone(),
            to: self.to.clone(),
            guard: self.guard.clone(),
        }
    }
}

impl<C> std::fmt::Debug for TransitionRule<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionRule")
            .field("event", &self.event)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("guarded", &self.guard.is_some())
            .finish()
    }
}

/// Result of triggering a declared event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The machine moved from `from` to `to`.
    Transitioned { from: String, to: String },

    /// The machine stayed where it was. `onafter` hooks still ran.
    Rejected {
        current: Option<String>,
        reason: RejectReason,
    },
}

impl TriggerOutcome {
    pub fn is_transitioned(&self) -> bool {
        matches!(self, Self::Transitioned { .. })
    }
}

/// Errors returned by `EventMachine::trigger`.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum EventError {
    #[error("No event named '{event}' is declared on machine '{machine}'")]
    UnknownEvent { machine: String, event: String },
}
