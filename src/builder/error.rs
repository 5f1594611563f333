//! Build errors for machine builders.

use crate::hooks::HookKeyError;
use thiserror::Error;

/// A single problem found while validating a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigIssue {
    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("No events list supplied. Call .event(..) or load a description with an events list")]
    MissingEvents,

    #[error("Event #{index} has an empty name")]
    EmptyEventName { index: usize },

    #[error("Event '{event}' has an empty source or target state")]
    EmptyEventState { event: String },

    #[error("Guard supplied for undeclared event '{0}'")]
    GuardForUnknownEvent(String),

    #[error(transparent)]
    InvalidHookIdentifier(#[from] HookKeyError),

    #[error("Initial state '{0}' is not a registered state")]
    UnknownInitialState(String),

    #[error("Transition into '{to}' has no source states")]
    EmptySources { to: String },

    #[error("Transition {from} -> {to} references unregistered state '{state}'")]
    UnknownTransitionState {
        from: String,
        to: String,
        state: String,
    },
}

/// Errors that can occur when building a machine.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Invalid machine configuration: {}", join_issues(.0))]
    Invalid(Vec<ConfigIssue>),

    #[error("Failed to parse machine description: {0}")]
    Parse(#[from] serde_json::Error),
}

impl BuildError {
    /// Every validation issue found; empty for parse errors.
    pub fn issues(&self) -> &[ConfigIssue] {
        match self {
            Self::Invalid(issues) => issues,
            Self::Parse(_) => &[],
        }
    }
}

fn join_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
