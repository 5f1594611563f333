//! Hook identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle phase a hook is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookPhase {
    /// Runs first on every trigger of the named event.
    BeforeEvent,
    /// Runs last on every trigger of the named event, even when rejected.
    AfterEvent,
    /// Runs when the named state is left.
    LeaveState,
    /// Runs when the named state is entered.
    EnterState,
}

impl HookPhase {
    /// Prefix used by the string form of hook identifiers.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::BeforeEvent => "onbefore",
            Self::AfterEvent => "onafter",
            Self::LeaveState => "leave",
            Self::EnterState => "enter",
        }
    }

    const ALL: [HookPhase; 4] = [
        Self::BeforeEvent,
        Self::AfterEvent,
        Self::LeaveState,
        Self::EnterState,
    ];
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HookKeyError {
    #[error("Hook identifier '{0}' does not start with onbefore, onafter, leave or enter")]
    UnknownPrefix(String),

    #[error("Hook identifier '{0}' names no event or state")]
    MissingSubject(String),
}

/// A `(phase, subject)` pair naming one hook slot.
///
/// The subject is an event name for `BeforeEvent`/`AfterEvent` and a state
/// name for `LeaveState`/`EnterState`. The string form concatenates the phase
/// prefix and the subject, so `onafterwarn` and `entergreen` round-trip.
///
/// # Example
///
/// ```rust
/// use statewright::hooks::{HookKey, HookPhase};
///
/// let key: HookKey = "onafterwarn".parse().unwrap();
/// assert_eq!(key, HookKey::new(HookPhase::AfterEvent, "warn"));
/// assert_eq!(key.to_string(), "onafterwarn");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HookKey {
    pub phase: HookPhase,
    pub subject: String,
}

impl HookKey {
    pub fn new(phase: HookPhase, subject: impl Into<String>) -> Self {
        Self {
            phase,
            subject: subject.into(),
        }
    }

    pub fn before(event: impl Into<String>) -> Self {
        Self::new(HookPhase::BeforeEvent, event)
    }

    pub fn after(event: impl Into<String>) -> Self {
        Self::new(HookPhase::AfterEvent, event)
    }

    pub fn leave(state: impl Into<String>) -> Self {
        Self::new(HookPhase::LeaveState, state)
    }

    pub fn enter(state: impl Into<String>) -> Self {
        Self::new(HookPhase::EnterState, state)
    }
}

impl fmt::Display for HookKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.phase.prefix(), self.subject)
    }
}

impl FromStr for HookKey {
    type Err = HookKeyError;

    fn from_str(identifier: &str) -> Result<Self, Self::Err> {
        let (phase, subject) = HookPhase::ALL
            .iter()
            .find_map(|phase| {
                identifier
                    .strip_prefix(phase.prefix())
                    .map(|subject| (*phase, subject))
            })
            .ok_or_else(|| HookKeyError::UnknownPrefix(identifier.to_string()))?;

        if subject.is_empty() {
            return Err(HookKeyError::MissingSubject(identifier.to_string()));
        }

        Ok(HookKey::new(phase, subject))
    }
}
