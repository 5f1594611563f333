//! Declarative description of an event machine.

use crate::builder::error::BuildError;
use serde::{Deserialize, Serialize};

/// One declared event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDecl {
    pub name: String,
    pub from: String,
    pub to: String,
}

impl EventDecl {
    pub fn new(name: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            from: from.into(),
            to: to.into(),
        }
    }
}

/// The data half of an event machine configuration.
///
/// Guards and callbacks are code, so they are attached through
/// [`EventMachineBuilder`](crate::builder::EventMachineBuilder) by event name
/// and hook identifier. Missing keys deserialize to `None` so the builder can
/// report them as configuration issues instead of parse failures.
///
/// # Example
///
/// ```rust
/// use statewright::builder::MachineDescription;
///
/// let description = MachineDescription::from_json(r#"{
///     "initial": "green",
///     "events": [
///         { "name": "warn", "from": "green", "to": "yellow" },
///         { "name": "clear", "from": "yellow", "to": "green" }
///     ]
/// }"#).unwrap();
///
/// assert_eq!(description.initial.as_deref(), Some("green"));
/// assert_eq!(description.events.map(|e| e.len()), Some(2));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineDescription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub initial: Option<String>,
    #[serde(default)]
    pub events: Option<Vec<EventDecl>>,
}

impl MachineDescription {
    pub fn from_json(json: &str) -> Result<Self, BuildError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, BuildError> {
        Ok(serde_json::from_value(value)?)
    }
}
