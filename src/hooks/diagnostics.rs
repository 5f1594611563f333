//! Diagnostics emitted by machines.
//!
//! Machines never write to stdout. Everything worth reporting is turned into a
//! [`Diagnostic`] and handed to the machine's [`DiagnosticSink`]. The default
//! sink forwards to `tracing`.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Why a triggered event did not change state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The event's guard evaluated false.
    GuardFailed,
    /// The machine was not in the event's declared source state.
    StateMismatch,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GuardFailed => f.write_str("guard rejected the transition"),
            Self::StateMismatch => f.write_str("current state does not match the source"),
        }
    }
}

/// A human-oriented status report from a machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// An event was triggered but did not change state.
    TransitionRejected {
        machine: String,
        event: String,
        current: Option<String>,
        from: String,
        to: String,
        reason: RejectReason,
    },
    /// The current state changed.
    StateChanged {
        machine: String,
        from: Option<String>,
        to: String,
    },
    /// A state was entered that has no registered handlers.
    UnregisteredState { machine: String, state: String },
    /// The transitions currently available, as reported by `report_status`.
    AvailableTransitions {
        machine: String,
        state: Option<String>,
        targets: Vec<String>,
    },
    Paused { machine: String },
    Resumed { machine: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransitionRejected {
                machine,
                event,
                current,
                reason,
                ..
            } => write!(
                f,
                "[{machine}] cannot transition from {} via {event}: {reason}",
                current.as_deref().unwrap_or("<uninitialized>")
            ),
            Self::StateChanged { machine, from, to } => write!(
                f,
                "[{machine}] {} -> {to}",
                from.as_deref().unwrap_or("<uninitialized>")
            ),
            Self::UnregisteredState { machine, state } => {
                write!(f, "[{machine}] entered unregistered state {state}")
            }
            Self::AvailableTransitions {
                machine,
                state,
                targets,
            } => write!(
                f,
                "[{machine}] in {} with available transitions: [{}]",
                state.as_deref().unwrap_or("<uninitialized>"),
                targets.join(", ")
            ),
            Self::Paused { machine } => write!(f, "[{machine}] paused"),
            Self::Resumed { machine } => write!(f, "[{machine}] resumed"),
        }
    }
}

/// Receiver for machine diagnostics.
///
/// Any `Fn(&Diagnostic) + Send + Sync` closure is a sink.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: &Diagnostic);
}

impl<F> DiagnosticSink for F
where
    F: Fn(&Diagnostic) + Send + Sync,
{
    fn emit(&self, diagnostic: &Diagnostic) {
        self(diagnostic)
    }
}

/// Sink that logs diagnostics through `tracing`.
///
/// Rejections and unregistered states are logged at `warn`, state changes at
/// `debug`, everything else at `info`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: &Diagnostic) {
        match diagnostic {
            Diagnostic::TransitionRejected {
                machine,
                event,
                current,
                from,
                to,
                reason,
            } => tracing::warn!(
                machine = %machine,
                event = %event,
                current = ?current,
                from = %from,
                to = %to,
                reason = %reason,
                "transition rejected"
            ),
            Diagnostic::StateChanged { machine, from, to } => {
                tracing::debug!(machine = %machine, from = ?from, to = %to, "state changed")
            }
            Diagnostic::UnregisteredState { machine, state } => {
                tracing::warn!(machine = %machine, state = %state, "entered unregistered state")
            }
            Diagnostic::AvailableTransitions {
                machine,
                state,
                targets,
            } => tracing::info!(
                machine = %machine,
                state = ?state,
                targets = ?targets,
                "available transitions"
            ),
            Diagnostic::Paused { machine } => tracing::info!(machine = %machine, "paused"),
            Diagnostic::Resumed { machine } => tracing::info!(machine = %machine, "resumed"),
        }
    }
}

/// Sink that keeps every diagnostic in memory.
///
/// Clones share the same buffer, so one handle can be given to a machine and
/// another kept for inspection.
///
/// # Example
///
/// ```rust
/// use statewright::hooks::{Diagnostic, DiagnosticSink, MemorySink};
///
/// let sink = MemorySink::new();
/// sink.emit(&Diagnostic::Paused { machine: "m".into() });
/// assert_eq!(sink.len(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<Diagnostic>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    pub fn records(&self) -> Vec<Diagnostic> {
        self.records.lock().clone()
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.records.lock())
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, diagnostic: &Diagnostic) {
        self.records.lock().push(diagnostic.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected() -> Diagnostic {
        Diagnostic::TransitionRejected {
            machine: "traffic".to_string(),
            event: "warn".to_string(),
            current: Some("red".to_string()),
            from: "green".to_string(),
            to: "yellow".to_string(),
            reason: RejectReason::StateMismatch,
        }
    }

    #[test]
    fn closures_are_sinks() {
        let seen = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&seen);
        let sink = move |_: &Diagnostic| *counter.lock() += 1;

        sink.emit(&rejected());
        sink.emit(&rejected());
        assert_eq!(*seen.lock(), 2);
    }

    #[test]
    fn memory_sink_clones_share_buffer() {
        let sink = MemorySink::new();
        let handle = sink.clone();

        sink.emit(&rejected());
        assert_eq!(handle.records(), vec![rejected()]);

        assert_eq!(handle.drain().len(), 1);
        assert!(sink.is_empty());
    }

    #[test]
    fn rejection_message_names_state_and_event() {
        let text = rejected().to_string();
        assert!(text.contains("red"));
        assert!(text.contains("warn"));
    }

    #[test]
    fn tracing_sink_accepts_every_variant() {
        let sink = TracingSink;
        sink.emit(&rejected());
        sink.emit(&Diagnostic::StateChanged {
            machine: "m".into(),
            from: None,
            to: "idle".into(),
        });
        sink.emit(&Diagnostic::UnregisteredState {
            machine: "m".into(),
            state: "ghost".into(),
        });
        sink.emit(&Diagnostic::AvailableTransitions {
            machine: "m".into(),
            state: Some("idle".into()),
            targets: vec!["moving".into()],
        });
        sink.emit(&Diagnostic::Paused { machine: "m".into() });
        sink.emit(&Diagnostic::Resumed { machine: "m".into() });
    }

    #[test]
    fn diagnostics_serialize_with_kind_tag() {
        let json = serde_json::to_value(rejected()).unwrap();
        assert_eq!(json["kind"], "transition_rejected");
        assert_eq!(json["reason"], "state_mismatch");
    }
}
