//! Event-driven state machine.

use crate::core::{Cause, Context, Guard, StateHistory, StateTransition};
use crate::event::rule::{EventError, TransitionRule, TriggerOutcome, INITIAL_EVENT};
use crate::hooks::{
    Diagnostic, DiagnosticSink, HookArgs, HookKey, HookKeyError, HookPhase, HookRegistry,
    RejectReason, TracingSink,
};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// State machine whose transitions are named events.
///
/// Triggering an event runs, in order: the `onbefore` hook, the guard, and
/// (only when the guard passes and the machine is in the declared source
/// state) the `leave` hook, the state change and the `enter` hook. The
/// `onafter` hook runs last on every trigger, including rejected ones.
///
/// # Example
///
/// ```rust
/// use statewright::event::EventMachine;
///
/// let mut light = EventMachine::new("traffic");
/// light.declare("warn", "green", "yellow");
/// light.declare("panic", "yellow", "red");
/// light.set_initial_state("green");
///
/// let outcome = light.trigger("warn", &[]).unwrap();
/// assert!(outcome.is_transitioned());
/// assert!(light.is_state("yellow"));
///
/// // "warn" only leaves green; from yellow it is rejected.
/// let outcome = light.trigger("warn", &[]).unwrap();
/// assert!(!outcome.is_transitioned());
/// assert!(light.is_state("yellow"));
/// ```
pub struct EventMachine<C = Context> {
    id: Uuid,
    name: String,
    rules: Vec<TransitionRule<C>>,
    index: HashMap<String, usize>,
    hooks: HookRegistry<EventMachine<C>>,
    current_state: Option<String>,
    context: C,
    history: StateHistory,
    sink: Arc<dyn DiagnosticSink>,
}

impl EventMachine {
    /// Create a machine with an empty key-value context.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_context(name, Context::new())
    }
}

impl<C> EventMachine<C> {
    pub fn with_context(name: impl Into<String>, context: C) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            rules: Vec::new(),
            index: HashMap::new(),
            hooks: HookRegistry::new(),
            current_state: None,
            context,
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

    /// Replace the history store, e.g. with a bounded one.
    pub fn set_history(&mut self, history: StateHistory) {
        self.history = history;
    }

    pub fn set_diagnostics(&mut self, sink: Arc<dyn DiagnosticSink>) {
        self.sink = sink;
    }

    /// Declare an unguarded event. Re-declaring a name replaces its rule.
    pub fn declare(
        &mut self,
        event: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) {
        self.insert_rule(TransitionRule::new(event, from, to));
    }

    /// Declare an event gated by `guard`. Re-declaring a name replaces its rule.
    pub fn declare_guarded(
        &mut self,
        event: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        guard: Guard<C>,
    ) {
        self.insert_rule(TransitionRule::new(event, from, to).with_guard(guard));
    }

    /// Insert a rule, keeping the original declaration position when the
    /// event name already exists.
    pub fn insert_rule(&mut self, rule: TransitionRule<C>) {
        match self.index.get(&rule.event) {
            Some(&position) => self.rules[position] = rule,
            None => {
                self.index.insert(rule.event.clone(), self.rules.len());
                self.rules.push(rule);
            }
        }
    }

    pub fn rule(&self, event: &str) -> Option<&TransitionRule<C>> {
        self.index.get(event).map(|&position| &self.rules[position])
    }

    /// Declared rules in declaration order.
    pub fn events(&self) -> impl Iterator<Item = &TransitionRule<C>> {
        self.rules.iter()
    }

    /// Bind a callback to a hook slot, replacing any previous binding.
    pub fn bind<F>(&mut self, key: HookKey, callback: F)
    where
        F: Fn(&mut EventMachine<C>, &HookArgs<'_>) + Send + Sync + 'static,
    {
        self.hooks.bind(key, Arc::new(callback));
    }

    /// Bind a callback by its string identifier, e.g. `"onafterwarn"`.
    pub fn bind_identifier<F>(&mut self, identifier: &str, callback: F) -> Result<(), HookKeyError>
    where
        F: Fn(&mut EventMachine<C>, &HookArgs<'_>) + Send + Sync + 'static,
    {
        let key = identifier.parse()?;
        self.bind(key, callback);
        Ok(())
    }

    pub fn hooks(&self) -> &HookRegistry<EventMachine<C>> {
        &self.hooks
    }

    pub(crate) fn hooks_mut(&mut self) -> &mut HookRegistry<EventMachine<C>> {
        &mut self.hooks
    }

    /// Enter the initial state, firing its `enter` hook.
    pub fn set_initial_state(&mut self, state: impl Into<String>) {
        let state = state.into();
        let previous = self.current_state.replace(state.clone());
        self.record(previous, &state, Cause::Initial);

        let args = HookArgs {
            event: INITIAL_EVENT,
            from: None,
            to: &state,
            payload: &[],
        };
        self.fire(HookPhase::EnterState, &state, &args);
    }

    /// Would `trigger(event)` change state right now?
    ///
    /// Evaluates the guard but runs no hooks.
    pub fn can(&self, event: &str) -> bool {
        self.rule(event).is_some_and(|rule| {
            self.is_state(&rule.from) && rule.guard_passes(&self.context)
        })
    }

    /// Trigger a declared event.
    ///
    /// A rejected trigger is not an error: it returns
    /// `TriggerOutcome::Rejected`, emits a diagnostic and still runs the
    /// `onafter` hook. Only an undeclared event name is an error, and in that
    /// case no hook runs.
    pub fn trigger(&mut self, event: &str, payload: &[Value]) -> Result<TriggerOutcome, EventError> {
        let rule = self
            .rule(event)
            .cloned()
            .ok_or_else(|| EventError::UnknownEvent {
                machine: self.name.clone(),
                event: event.to_string(),
            })?;

        let args = HookArgs {
            event,
            from: Some(&rule.from),
            to: &rule.to,
            payload,
        };

        self.fire(HookPhase::BeforeEvent, event, &args);

        let outcome = if !rule.guard_passes(&self.context) {
            self.reject(&rule, RejectReason::GuardFailed)
        } else if !self.is_state(&rule.from) {
            self.reject(&rule, RejectReason::StateMismatch)
        } else {
            self.fire(HookPhase::LeaveState, &rule.from, &args);
            self.current_state = Some(rule.to.clone());
            self.record(
                Some(rule.from.clone()),
                &rule.to,
                Cause::Event(rule.event.clone()),
            );
            self.fire(HookPhase::EnterState, &rule.to, &args);
            TriggerOutcome::Transitioned {
                from: rule.from.clone(),
                to: rule.to.clone(),
            }
        };

        self.fire(HookPhase::AfterEvent, event, &args);
        Ok(outcome)
    }

    fn fire(&mut self, phase: HookPhase, subject: &str, args: &HookArgs<'_>) {
        if let Some(callback) = self.hooks.resolve(phase, subject) {
            callback(self, args);
        }
    }

    fn reject(&self, rule: &TransitionRule<C>, reason: RejectReason) -> TriggerOutcome {
        self.sink.emit(&Diagnostic::TransitionRejected {
            machine: self.name.clone(),
            event: rule.event.clone(),
            current: self.current_state.clone(),
            from: rule.from.clone(),
            to: rule.to.clone(),
            reason: reason.clone(),
        });
        TriggerOutcome::Rejected {
            current: self.current_state.clone(),
            reason,
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

/// Rules and context are copied; guards, hooks and the diagnostic sink are
/// shared with the original.
impl<C: Clone> Clone for EventMachine<C> {
    fn clone(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: self.name.clone(),
            rules: self.rules.clone(),
            index: self.index.clone(),
            hooks: self.hooks.clone(),
            current_state: self.current_state.clone(),
            context: self.context.clone(),
            history: self.history.clone(),
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<C: fmt::Debug> fmt::Debug for EventMachine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventMachine")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("current_state", &self.current_state)
            .field("rules", &self.rules)
            .field("hooks", &self.hooks)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::hooks::MemorySink;
    use parking_lot::Mutex;
    use serde_json::json;

    type Log = Arc<Mutex<Vec<String>>>;

    fn traffic_light(log: &Log) -> EventMachine {
        let mut fsm = EventMachine::new("traffic");
        fsm.declare("warn", "green", "yellow");
        fsm.declare("panic", "yellow", "red");
        fsm.declare("calm", "red", "yellow");
        fsm.declare("clear", "yellow", "green");

        for key in [
            HookKey::before("warn"),
            HookKey::leave("green"),
            HookKey::enter("yellow"),
            HookKey::after("warn"),
        ] {
            let log = Arc::clone(log);
            let label = key.to_string();
            fsm.bind(key, move |_, _| log.lock().push(label.clone()));
        }
        fsm
    }

    #[test]
    fn initial_state_fires_enter_once() {
        let log: Log = Arc::default();
        let mut fsm = traffic_light(&log);
        let entered = Arc::clone(&log);
        fsm.bind(HookKey::enter("green"), move |_, args| {
            assert_eq!(args.event, INITIAL_EVENT);
            assert_eq!(args.from, None);
            entered.lock().push(format!("enter{}", args.to));
        });

        assert_eq!(fsm.current_state(), None);
        fsm.set_initial_state("green");

        assert_eq!(fsm.current_state(), Some("green"));
        assert_eq!(*log.lock(), vec!["entergreen"]);
    }

    #[test]
    fn matching_trigger_runs_hooks_in_order() {
        let log: Log = Arc::default();
        let mut fsm = traffic_light(&log);
        fsm.set_initial_state("green");

        let outcome = fsm.trigger("warn", &[]).unwrap();

        assert_eq!(
            outcome,
            TriggerOutcome::Transitioned {
                from: "green".into(),
                to: "yellow".into()
            }
        );
        assert_eq!(fsm.current_state(), Some("yellow"));
        assert_eq!(
            *log.lock(),
            vec!["onbeforewarn", "leavegreen", "enteryellow", "onafterwarn"]
        );
    }

    #[test]
    fn mismatched_source_only_runs_before_and_after() {
        let log: Log = Arc::default();
        let sink = MemorySink::new();
        let mut fsm = traffic_light(&log);
        fsm.set_diagnostics(Arc::new(sink.clone()));
        fsm.set_initial_state("red");
        sink.drain();

        let outcome = fsm.trigger("warn", &[]).unwrap();

        assert_eq!(
            outcome,
            TriggerOutcome::Rejected {
                current: Some("red".into()),
                reason: RejectReason::StateMismatch
            }
        );
        assert_eq!(fsm.current_state(), Some("red"));
        assert_eq!(*log.lock(), vec!["onbeforewarn", "onafterwarn"]);
        assert!(matches!(
            sink.records().as_slice(),
            [Diagnostic::TransitionRejected { reason: RejectReason::StateMismatch, .. }]
        ));
    }

    #[test]
    fn failing_guard_behaves_like_mismatch() {
        let log: Log = Arc::default();
        let sink = MemorySink::new();
        let mut fsm = traffic_light(&log);
        fsm.set_diagnostics(Arc::new(sink.clone()));
        fsm.declare_guarded(
            "warn",
            "green",
            "yellow",
            Guard::new(|ctx: &Context| ctx.is_true("allowed")),
        );
        fsm.set_initial_state("green");
        sink.drain();

        let outcome = fsm.trigger("warn", &[]).unwrap();

        assert!(!outcome.is_transitioned());
        assert_eq!(fsm.current_state(), Some("green"));
        assert_eq!(*log.lock(), vec!["onbeforewarn", "onafterwarn"]);
        assert!(matches!(
            sink.records().as_slice(),
            [Diagnostic::TransitionRejected { reason: RejectReason::GuardFailed, .. }]
        ));

        fsm.context_mut().set("allowed", true);
        assert!(fsm.trigger("warn", &[]).unwrap().is_transitioned());
        assert_eq!(fsm.current_state(), Some("yellow"));
    }

    #[test]
    fn guard_is_evaluated_even_when_source_mismatches() {
        let calls = Arc::new(Mutex::new(0u32));
        let counted = Arc::clone(&calls);
        let mut fsm = EventMachine::new("guarded");
        fsm.declare_guarded(
            "go",
            "a",
            "b",
            Guard::nullary(move || {
                *counted.lock() += 1;
                true
            }),
        );
        fsm.set_initial_state("z");

        fsm.trigger("go", &[]).unwrap();
        assert_eq!(*calls.lock(), 1);
    }

    #[test]
    fn hooks_receive_payload_and_declared_states() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut fsm = EventMachine::new("payload");
        fsm.declare("warn", "green", "yellow");
        let sink = Arc::clone(&seen);
        fsm.bind(HookKey::after("warn"), move |_, args| {
            sink.lock().push((
                args.event.to_string(),
                args.from.map(str::to_string),
                args.to.to_string(),
                args.payload.to_vec(),
            ));
        });
        fsm.set_initial_state("red");

        fsm.trigger("warn", &[json!(42), json!("why")]).unwrap();

        assert_eq!(
            *seen.lock(),
            vec![(
                "warn".to_string(),
                Some("green".to_string()),
                "yellow".to_string(),
                vec![json!(42), json!("why")]
            )]
        );
    }

    #[test]
    fn unknown_event_is_an_error_and_fires_nothing() {
        let log: Log = Arc::default();
        let mut fsm = traffic_light(&log);
        fsm.set_initial_state("green");
        log.lock().clear();

        let err = fsm.trigger("teleport", &[]).unwrap_err();
        assert_eq!(
            err,
            EventError::UnknownEvent {
                machine: "traffic".into(),
                event: "teleport".into()
            }
        );
        assert!(log.lock().is_empty());
        assert_eq!(fsm.current_state(), Some("green"));
    }

    #[test]
    fn redeclaring_replaces_rule_in_place() {
        let mut fsm = EventMachine::new("redeclare");
        fsm.declare("a", "x", "y");
        fsm.declare("b", "y", "z");
        fsm.declare("a", "x", "z");

        let names: Vec<&str> = fsm.events().map(|r| r.event.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(fsm.rule("a").map(|r| r.to.as_str()), Some("z"));
    }

    #[test]
    fn hooks_may_mutate_machine() {
        let mut fsm = EventMachine::new("counter");
        fsm.declare("tick", "on", "on");
        fsm.bind(HookKey::after("tick"), |m, _| {
            let count = m.context().get_i64("ticks").unwrap_or(0);
            m.context_mut().set("ticks", count + 1);
        });
        fsm.set_initial_state("on");

        fsm.trigger("tick", &[]).unwrap();
        fsm.trigger("tick", &[]).unwrap();
        assert_eq!(fsm.context().get_i64("ticks"), Some(2));
    }

    #[test]
    fn can_reports_without_running_hooks() {
        let log: Log = Arc::default();
        let mut fsm = traffic_light(&log);
        fsm.set_initial_state("green");
        log.lock().clear();

        assert!(fsm.can("warn"));
        assert!(!fsm.can("panic"));
        assert!(!fsm.can("unknown"));
        assert!(log.lock().is_empty());
    }

    #[test]
    fn bind_identifier_parses_legacy_names() {
        let mut fsm = EventMachine::new("ids");
        assert!(fsm.bind_identifier("onafterwarn", |_, _| {}).is_ok());
        assert!(fsm.hooks().is_bound(HookPhase::AfterEvent, "warn"));
        assert!(matches!(
            fsm.bind_identifier("whenwarn", |_, _| {}),
            Err(HookKeyError::UnknownPrefix(_))
        ));
    }

    #[test]
    fn history_tracks_initial_and_event_changes() {
        let log: Log = Arc::default();
        let mut fsm = traffic_light(&log);
        fsm.set_initial_state("green");
        fsm.trigger("warn", &[]).unwrap();
        fsm.trigger("warn", &[]).unwrap();

        assert_eq!(fsm.history().get_path(), vec!["green", "yellow"]);
        assert_eq!(
            fsm.history().last().map(|t| &t.cause),
            Some(&Cause::Event("warn".to_string()))
        );
    }

    #[test]
    fn clone_isolates_rules_and_context() {
        let log: Log = Arc::default();
        let mut original = traffic_light(&log);
        original.set_initial_state("green");
        original.context_mut().set("k", 1);

        let mut copy = original.clone();
        copy.declare("skip", "green", "red");
        copy.context_mut().set("k", 2);
        copy.trigger("warn", &[]).unwrap();

        assert!(original.rule("skip").is_none());
        assert_eq!(original.context().get_i64("k"), Some(1));
        assert_eq!(original.current_state(), Some("green"));
        assert_eq!(copy.current_state(), Some("yellow"));
        assert_ne!(original.id(), copy.id());
        assert_eq!(copy.name(), "traffic");
    }
}
