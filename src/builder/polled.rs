//! Builder for polled machines.

use crate::builder::error::{BuildError, ConfigIssue};
use crate::core::{Context, StateHistory};
use crate::hooks::DiagnosticSink;
use crate::polled::{Condition, PolledMachine, Sources, State};
use std::collections::HashSet;
use std::sync::Arc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

struct PendingTransition<C> {
    sources: Sources,
    to: String,
    condition: Condition<C>,
}

/// Builder for polled machines.
///
/// Unlike registering directly on a [`PolledMachine`], the builder insists that
/// the initial state and every transition endpoint name a registered state.
///
/// # Example
///
/// ```rust
/// use statewright::builder::PolledMachineBuilder;
/// use statewright::context;
/// use statewright::polled::State;
///
/// let mut door = PolledMachineBuilder::new("door")
///     .context(context! { "open" => false })
///     .state("closed", State::new())
///     .state("opened", State::new())
///     .transition("closed", "opened", |m| m.context().is_true("open"))
///     .transition("opened", "closed", |m| !m.context().is_true("open"))
///     .initial("closed")
///     .build()
///     .unwrap();
///
/// door.context_mut().set("open", true);
/// door.update(0.1);
/// assert_eq!(door.current_state(), Some("opened"));
/// ```
pub struct PolledMachineBuilder<C = Context> {
    name: String,
    states: Vec<(String, State<C>)>,
    transitions: Vec<PendingTransition<C>>,
    initial: Option<String>,
    context: C,
    sink: Option<Arc<dyn DiagnosticSink>>,
    history_limit: Option<usize>,
    start_paused: bool,
}

impl PolledMachineBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_context(name, Context::new())
    }
}

impl PolledMachine {
    pub fn builder(name: impl Into<String>) -> PolledMachineBuilder {
        PolledMachineBuilder::new(name)
    }
}

impl<C> PolledMachineBuilder<C> {
    pub fn with_context(name: impl Into<String>, context: C) -> Self {
        Self {
            name: name.into(),
            states: Vec::new(),
            transitions: Vec::new(),
            initial: None,
            context,
            sink: None,
            history_limit: None,
            start_paused: false,
        }
    }

    /// Replace the context the machine starts with.
    pub fn context(mut self, context: C) -> Self {
        self.context = context;
        self
    }

    pub fn state(mut self, name: impl Into<String>, state: State<C>) -> Self {
        self.states.push((name.into(), state));
        self
    }

    pub fn transition<F>(self, sources: impl Into<Sources>, to: impl Into<String>, condition: F) -> Self
    where
        F: Fn(&PolledMachine<C>) -> bool + Send + Sync + 'static,
    {
        self.shared_transition(sources, to, Condition::new(condition))
    }

    pub fn shared_transition(
        mut self,
        sources: impl Into<Sources>,
        to: impl Into<String>,
        condition: Condition<C>,
    ) -> Self {
        self.transitions.push(PendingTransition {
            sources: sources.into(),
            to: to.into(),
            condition,
        });
        self
    }

    /// Set the initial state (required).
    pub fn initial(mut self, state: impl Into<String>) -> Self {
        self.initial = Some(state.into());
        self
    }

    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    /// Build the machine already paused. The initial enter hook still runs.
    pub fn paused(mut self) -> Self {
        self.start_paused = true;
        self
    }

    /// Check the configuration, accumulating every issue.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<ConfigIssue>> {
        let mut checks: Vec<Validation<(), NonEmptyVec<ConfigIssue>>> = Vec::new();
        let registered: HashSet<&str> = self.states.iter().map(|(n, _)| n.as_str()).collect();

        match self.initial.as_deref() {
            None | Some("") => checks.push(Validation::fail(ConfigIssue::MissingInitialState)),
            Some(initial) if !registered.contains(initial) => checks.push(Validation::fail(
                ConfigIssue::UnknownInitialState(initial.to_string()),
            )),
            Some(_) => checks.push(Validation::success(())),
        }

        for pending in &self.transitions {
            if pending.sources.is_empty() {
                checks.push(Validation::fail(ConfigIssue::EmptySources {
                    to: pending.to.clone(),
                }));
            }
            for from in pending.sources.as_slice() {
                for state in [from.as_str(), pending.to.as_str()] {
                    if !registered.contains(state) {
                        checks.push(Validation::fail(ConfigIssue::UnknownTransitionState {
                            from: from.clone(),
                            to: pending.to.clone(),
                            state: state.to_string(),
                        }));
                    }
                }
            }
        }

        Validation::all_vec(checks).map(|_| ())
    }

    /// Build the machine and enter the initial state.
    pub fn build(self) -> Result<PolledMachine<C>, BuildError> {
        if let Validation::Failure(issues) = self.validate() {
            return Err(BuildError::Invalid(issues.iter().cloned().collect()));
        }

        let mut machine = PolledMachine::with_context(self.name, self.context);
        if let Some(sink) = self.sink {
            machine.set_diagnostics(sink);
        }
        if let Some(limit) = self.history_limit {
            machine.set_history(StateHistory::with_limit(limit));
        }
        for (name, state) in self.states {
            machine.add_state(name, state);
        }
        for pending in self.transitions {
            machine.add_shared_transition(pending.sources, &pending.to, pending.condition);
        }
        if let Some(initial) = self.initial {
            machine.set_initial_state(initial);
        }
        if self.start_paused {
            machine.pause();
        }

        Ok(machine)
    }
}
