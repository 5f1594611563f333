//! State change history tracking.
//!
//! Every committed state change is recorded with the state it left, the state
//! it entered, what caused it and when it happened.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// What caused a state change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Cause {
    /// The machine was given its initial state.
    Initial,
    /// A named event was triggered.
    Event(String),
    /// A polled condition evaluated true during `update`.
    Condition,
    /// The caller forced the change directly.
    Forced,
}

/// Record of a single state change.
///
/// # Example
///
/// ```rust
/// use statewright::core::{Cause, StateTransition};
/// use chrono::Utc;
///
/// let transition = StateTransition {
///     from: Some("green".to_string()),
///     to: "yellow".to_string(),
///     cause: Cause::Event("warn".to_string()),
///     timestamp: Utc::now(),
/// };
/// assert_eq!(transition.to, "yellow");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    /// The state being left; `None` for the initial entry
    pub from: Option<String>,
    /// The state being entered
    pub to: String,
    /// What triggered the change
    pub cause: Cause,
    /// When the change was committed
    pub timestamp: DateTime<Utc>,
}

impl StateTransition {
    pub fn now(from: Option<String>, to: impl Into<String>, cause: Cause) -> Self {
        Self {
            from,
            to: to.into(),
            cause,
            timestamp: Utc::now(),
        }
    }
}

/// Ordered history of state changes.
///
/// By default the history is unbounded. With a limit set, the oldest records
/// are dropped once the limit is reached, which keeps long-running tick loops
/// from growing without bound.
///
/// # Example
///
/// ```rust
/// use statewright::core::{Cause, StateHistory, StateTransition};
///
/// let mut history = StateHistory::new();
/// history.record(StateTransition::now(None, "idle", Cause::Initial));
/// history.record(StateTransition::now(Some("idle".into()), "moving", Cause::Condition));
///
/// assert_eq!(history.get_path(), vec!["idle", "moving"]);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StateHistory {
    transitions: VecDeque<StateTransition>,
    limit: Option<usize>,
}

impl StateHistory {
    /// Create a new empty, unbounded history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a history that keeps at most `limit` records.
    ///
    /// A limit of zero disables recording entirely.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            transitions: VecDeque::new(),
            limit: Some(limit),
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Append a transition, evicting the oldest record when over the limit.
    pub fn record(&mut self, transition: StateTransition) {
        if self.limit == Some(0) {
            return;
        }
        if let Some(limit) = self.limit {
            while self.transitions.len() >= limit {
                self.transitions.pop_front();
            }
        }
        self.transitions.push_back(transition);
    }

    /// Get the path of states traversed.
    ///
    /// Starts with the `from` state of the oldest retained record (when it has
    /// one), followed by the `to` state of each record.
    pub fn get_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        if let Some(from) = self.transitions.front().and_then(|t| t.from.as_deref()) {
            path.push(from);
        }
        for transition in &self.transitions {
            path.push(transition.to.as_str());
        }
        path
    }

    /// Time between the oldest and newest retained records.
    ///
    /// Returns `None` when the history is empty.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.transitions.front()?, self.transitions.back()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn last(&self) -> Option<&StateTransition> {
        self.transitions.back()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn clear(&mut self) {
        self.transitions.clear();
    }

    /// Iterate records oldest first.
    pub fn transitions(&self) -> impl Iterator<Item = &StateTransition> {
        self.transitions.iter()
    }
}
