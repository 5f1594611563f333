//! Tick-driven state machine.

use super::state::State;
use super::transition::{Condition, Sources, Transition, TransitionTable};
use crate::core::{Cause, Context, StateHistory, StateTransition};
use crate::hooks::{Diagnostic, DiagnosticSink, TracingSink};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Point-in-time summary of a polled machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MachineStatus {
    pub name: String,
    pub current_state: Option<String>,
    pub paused: bool,
    pub available: Vec<String>,
}

impl fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}{} -> [{}]",
            self.name,
            self.current_state.as_deref().unwrap_or("<uninitialized>"),
            if self.paused { " (paused)" } else { "" },
            self.available.join(", ")
        )
    }
}

/// State machine advanced by calling [`update`](PolledMachine::update) once per
/// tick.
///
/// Each unpaused update runs the current state's update hook, then checks the
/// transitions leaving the current state in registration order and commits
/// the first one whose condition holds. At most one state change happens per
/// update.
///
/// # Example
///
/// ```rust
/// use statewright::polled::{PolledMachine, State};
///
/// let mut player = PolledMachine::new("player");
/// player.add_state("idle", State::new());
/// player.add_state("moving", State::new());
/// player.add_transition("idle", "moving", |m| m.context().is_true("should_move"));
/// player.add_transition("moving", "idle", |m| !m.context().is_true("should_move"));
///
/// player.context_mut().set("should_move", false);
/// player.set_initial_state("idle");
///
/// player.update(0.016);
/// assert_eq!(player.current_state(), Some("idle"));
///
/// player.context_mut().set("should_move", true);
/// player.update(0.016);
/// assert_eq!(player.current_state(), Some("moving"));
/// ```
pub struct PolledMachine<C = Context> {
    id: Uuid,
    name: String,
    states: HashMap<String, Arc<State<C>>>,
    transitions: TransitionTable<C>,
    current_state: Option<String>,
    context: C,
    paused: bool,
    history: StateHistory,
    sink: Arc<dyn DiagnosticSink>,
}

impl PolledMachine {
    /// Create a machine with an empty key-value context.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_context(name, Context::new())
    }
}

impl<C> PolledMachine<C> {
    pub fn with_context(name: impl Into<String>, context: C) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            states: HashMap::new(),
            transitions: TransitionTable::new(),
            current_state: None,
            context,
            paused: false,
            history: StateHistory::new(),
            sink: Arc::new(TracingSink),
        }
    }

    /// Unique per instance; clones get a fresh id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn current_state(&self) -> Option<&str> {
        self.current_state.as_deref()
    }

    pub fn is_state(&self, state: &str) -> bool {
        self.current_state.as_deref() == Some(state)
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Replace the whole context, returning the old one.
    pub fn set_context(&mut self, context: C) -> C {
        std::mem::replace(&mut self.context, context)
    }

    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    pub fn set_history(&mut self, history: StateHistory) {
        self.history = history;
    }

    pub fn set_diagnostics(&mut self, sink: Arc<dyn DiagnosticSink>) {
        self.sink = sink;
    }

    /// Register a state, replacing any earlier binding under the same name.
    pub fn add_state(&mut self, name: impl Into<String>, state: State<C>) {
        self.states.insert(name.into(), Arc::new(state));
    }

    pub fn has_state(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    pub fn state(&self, name: &str) -> Option<&State<C>> {
        self.states.get(name).map(Arc::as_ref)
    }

    /// Registered state names, in no particular order.
    pub fn state_names(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }

    /// Register a transition from every state in `sources` to `to`.
    ///
    /// Each source gets its own row; all rows share the one condition.
    pub fn add_transition<F>(&mut self, sources: impl Into<Sources>, to: &str, condition: F)
    where
        F: Fn(&PolledMachine<C>) -> bool + Send + Sync + 'static,
    {
        self.add_shared_transition(sources, to, Condition::new(condition));
    }

    /// Like [`add_transition`](Self::add_transition), reusing an existing
    /// condition handle.
    pub fn add_shared_transition(
        &mut self,
        sources: impl Into<Sources>,
        to: &str,
        condition: Condition<C>,
    ) {
        self.transitions.insert(sources.into(), to, condition);
    }

    pub fn transitions(&self) -> &TransitionTable<C> {
        &self.transitions
    }

    /// Remove every transition row. States and context are untouched.
    pub fn clear_transitions(&mut self) {
        self.transitions.clear();
    }

    /// Set the current state and run its enter hook.
    ///
    /// The name is not checked against registered states: an unknown name is
    /// still made current, it simply has no hooks to run.
    pub fn set_initial_state(&mut self, name: impl Into<String>) {
        let name = name.into();
        let previous = self.current_state.replace(name.clone());
        self.record(previous, &name, Cause::Initial);
        self.enter(&name);
    }

    /// Advance one tick.
    ///
    /// Returns `true` when a transition was committed. While paused this does
    /// nothing at all and returns `false`.
    pub fn update(&mut self, dt: f64) -> bool {
        if self.paused {
            return false;
        }

        let update = self.current_handlers().and_then(|s| s.update_hook());
        if let Some(hook) = update {
            hook(self, dt);
        }

        let target = {
            let this: &Self = self;
            let Some(current) = this.current_state.as_deref() else {
                return false;
            };
            this.transitions
                .from_state(current)
                .iter()
                .find(|t| t.condition.check(this))
                .map(|t| t.to.clone())
        };

        match target {
            Some(to) => {
                self.transition(&to, Cause::Condition);
                true
            }
            None => false,
        }
    }

    /// Leave the current state and enter `new_state`, running exit and enter
    /// hooks.
    pub fn change_state(&mut self, new_state: &str) {
        self.transition(new_state, Cause::Forced);
    }

    /// Alias of [`change_state`](Self::change_state) for callers bypassing
    /// the transition table.
    pub fn force_state(&mut self, new_state: &str) {
        self.change_state(new_state);
    }

    /// Is there a transition from the current state to `target` whose
    /// condition holds right now?
    pub fn can_transition_to(&self, target: &str) -> bool {
        self.current_rows()
            .iter()
            .any(|t| t.to == target && t.condition.check(self))
    }

    /// Targets of every transition from the current state whose condition
    /// holds, in registration order.
    pub fn available_transitions(&self) -> Vec<String> {
        self.current_rows()
            .iter()
            .filter(|t| t.condition.check(self))
            .map(|t| t.to.clone())
            .collect()
    }

    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            self.sink.emit(&Diagnostic::Paused {
                machine: self.name.clone(),
            });
        }
    }

    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.sink.emit(&Diagnostic::Resumed {
                machine: self.name.clone(),
            });
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn status(&self) -> MachineStatus {
        MachineStatus {
            name: self.name.clone(),
            current_state: self.current_state.clone(),
            paused: self.paused,
            available: self.available_transitions(),
        }
    }

    /// Send the current state and available transitions to the diagnostic
    /// sink.
    pub fn report_status(&self) {
        self.sink.emit(&Diagnostic::AvailableTransitions {
            machine: self.name.clone(),
            state: self.current_state.clone(),
            targets: self.available_transitions(),
        });
    }

    fn current_rows(&self) -> &[Transition<C>] {
        match self.current_state.as_deref() {
            Some(current) => self.transitions.from_state(current),
            None => &[],
        }
    }

    fn current_handlers(&self) -> Option<Arc<State<C>>> {
        let current = self.current_state.as_deref()?;
        self.states.get(current).cloned()
    }

    fn transition(&mut self, new_state: &str, cause: Cause) {
        let exit = self.current_handlers().and_then(|s| s.exit_hook());
        if let Some(hook) = exit {
            hook(self);
        }

        let previous = self.current_state.replace(new_state.to_string());
        self.record(previous, new_state, cause);
        self.enter(new_state);
    }

    fn enter(&mut self, name: &str) {
        match self.states.get(name).cloned() {
            Some(state) => {
                if let Some(hook) = state.enter_hook() {
                    hook(self);
                }
            }
            None => self.sink.emit(&Diagnostic::UnregisteredState {
                machine: self.name.clone(),
                state: name.to_string(),
            }),
        }
    }

    fn record(&mut self, from: Option<String>, to: &str, cause: Cause) {
        self.sink.emit(&Diagnostic::StateChanged {
            machine: self.name.clone(),
            from: from.clone(),
            to: to.to_string(),
        });
        self.history.record(StateTransition::now(from, to, cause));
    }
}

/// The copy gets its own transition table, context and history. State
/// handlers, conditions and the diagnostic sink are shared with the original.
/// The pause flag carries over.
impl<C: Clone> Clone for PolledMachine<C> {
    fn clone(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: self.name.clone(),
            states: self.states.clone(),
            transitions: self.transitions.clone(),
            current_state: self.current_state.clone(),
            context: self.context.clone(),
            paused: self.paused,
            history: self.history.clone(),
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<C: fmt::Debug> fmt::Debug for PolledMachine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolledMachine")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("current_state", &self.current_state)
            .field("paused", &self.paused)
            .field("states", &self.states)
            .field("transitions", &self.transitions)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
