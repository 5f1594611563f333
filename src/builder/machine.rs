//! Builder for event machines.

use crate::builder::description::{EventDecl, MachineDescription};
use crate::builder::error::{BuildError, ConfigIssue};
use crate::core::{Context, Guard, StateHistory};
use crate::event::EventMachine;
use crate::hooks::{Callback, DiagnosticSink, HookArgs, HookKey};
use std::collections::HashSet;
use std::sync::Arc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type EventCallback<C> = Callback<EventMachine<C>>;

/// Builder for constructing event machines with a fluent API.
///
/// `build` validates the whole configuration at once and reports every
/// problem it finds. On success the machine is already in its initial state
/// and the initial `enter` hook has run.
///
/// # Example
///
/// ```rust
/// use statewright::builder::EventMachineBuilder;
///
/// let mut light = EventMachineBuilder::new()
///     .name("traffic")
///     .initial("green")
///     .event("warn", "green", "yellow")
///     .event("clear", "yellow", "green")
///     .callback("onafterwarn", |m, _| {
///         m.context_mut().set("warned", true);
///     })
///     .build()
///     .unwrap();
///
/// light.trigger("warn", &[]).unwrap();
/// assert!(light.is_state("yellow"));
/// assert!(light.context().is_true("warned"));
/// ```
pub struct EventMachineBuilder<C = Context> {
    name: Option<String>,
    initial: Option<String>,
    events: Option<Vec<EventDecl>>,
    guards: Vec<(String, Guard<C>)>,
    callbacks: Vec<(String, EventCallback<C>)>,
    hooks: Vec<(HookKey, EventCallback<C>)>,
    context: C,
    sink: Option<Arc<dyn DiagnosticSink>>,
    history_limit: Option<usize>,
}

impl EventMachineBuilder {
    /// Create a builder whose machine gets an empty key-value context.
    pub fn new() -> Self {
        Self::with_context(Context::new())
    }
}

impl Default for EventMachineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EventMachine {
    pub fn builder() -> EventMachineBuilder {
        EventMachineBuilder::new()
    }
}

impl<C> EventMachineBuilder<C> {
    pub fn with_context(context: C) -> Self {
        Self {
            name: None,
            initial: None,
            events: None,
            guards: Vec::new(),
            callbacks: Vec::new(),
            hooks: Vec::new(),
            context,
            sink: None,
            history_limit: None,
        }
    }

    /// Take name, initial state and events from a description.
    ///
    /// Fields the description leaves out keep their current values.
    pub fn description(mut self, description: MachineDescription) -> Self {
        if description.name.is_some() {
            self.name = description.name;
        }
        if description.initial.is_some() {
            self.initial = description.initial;
        }
        if let Some(events) = description.events {
            self.events.get_or_insert_with(Vec::new).extend(events);
        }
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the initial state (required).
    pub fn initial(mut self, state: impl Into<String>) -> Self {
        self.initial = Some(state.into());
        self
    }

    /// Declare an event.
    pub fn event(
        mut self,
        name: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.events
            .get_or_insert_with(Vec::new)
            .push(EventDecl::new(name, from, to));
        self
    }

    /// Declare an event together with its guard.
    pub fn guarded_event(
        self,
        name: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        guard: Guard<C>,
    ) -> Self {
        let name = name.into();
        self.event(name.clone(), from, to).guard(name, guard)
    }

    /// Attach a guard to an event declared elsewhere, e.g. in a description.
    pub fn guard(mut self, event: impl Into<String>, guard: Guard<C>) -> Self {
        self.guards.push((event.into(), guard));
        self
    }

    /// Mark the events list as present but empty.
    pub fn no_events(mut self) -> Self {
        self.events.get_or_insert_with(Vec::new);
        self
    }

    /// Bind a callback by string identifier such as `"onbeforewarn"` or
    /// `"enteryellow"`. Unknown identifiers are reported by `build`.
    pub fn callback<F>(mut self, identifier: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&mut EventMachine<C>, &HookArgs<'_>) + Send + Sync + 'static,
    {
        self.callbacks.push((identifier.into(), Arc::new(callback)));
        self
    }

    /// Bind a callback by explicit key.
    pub fn hook<F>(mut self, key: HookKey, callback: F) -> Self
    where
        F: Fn(&mut EventMachine<C>, &HookArgs<'_>) + Send + Sync + 'static,
    {
        self.hooks.push((key, Arc::new(callback)));
        self
    }

    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Keep at most `limit` history records.
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    /// Check the configuration, accumulating every issue.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<ConfigIssue>> {
        let mut checks: Vec<Validation<(), NonEmptyVec<ConfigIssue>>> = Vec::new();

        match self.initial.as_deref() {
            Some(initial) if !initial.is_empty() => checks.push(Validation::success(())),
            _ => checks.push(Validation::fail(ConfigIssue::MissingInitialState)),
        }

        let declared: HashSet<&str> = match &self.events {
            None => {
                checks.push(Validation::fail(ConfigIssue::MissingEvents));
                HashSet::new()
            }
            Some(events) => {
                for (index, event) in events.iter().enumerate() {
                    checks.push(check_event(index, event));
                }
                events.iter().map(|e| e.name.as_str()).collect()
            }
        };

        for (event, _) in &self.guards {
            if !declared.contains(event.as_str()) {
                checks.push(Validation::fail(ConfigIssue::GuardForUnknownEvent(
                    event.clone(),
                )));
            }
        }

        for (identifier, _) in &self.callbacks {
            if let Err(err) = identifier.parse::<HookKey>() {
                checks.push(Validation::fail(ConfigIssue::from(err)));
            }
        }

        Validation::all_vec(checks).map(|_| ())
    }

    /// Build the machine and enter the initial state.
    pub fn build(self) -> Result<EventMachine<C>, BuildError> {
        if let Validation::Failure(issues) = self.validate() {
            return Err(BuildError::Invalid(issues.iter().cloned().collect()));
        }

        let Self {
            name,
            initial,
            events,
            guards,
            callbacks,
            hooks,
            context,
            sink,
            history_limit,
        } = self;

        let mut machine =
            EventMachine::with_context(name.unwrap_or_else(|| "machine".to_string()), context);
        if let Some(sink) = sink {
            machine.set_diagnostics(sink);
        }
        if let Some(limit) = history_limit {
            machine.set_history(StateHistory::with_limit(limit));
        }

        for event in events.unwrap_or_default() {
            let guard = guards
                .iter()
                .rev()
                .find(|(name, _)| *name == event.name)
                .map(|(_, guard)| guard.clone());
            match guard {
                Some(guard) => machine.declare_guarded(event.name, event.from, event.to, guard),
                None => machine.declare(event.name, event.from, event.to),
            }
        }

        let parsed = callbacks
            .into_iter()
            .filter_map(|(identifier, callback)| {
                identifier.parse::<HookKey>().ok().map(|key| (key, callback))
            });
        for (key, callback) in parsed.chain(hooks) {
            machine.hooks_mut().bind(key, callback);
        }

        if let Some(initial) = initial {
            machine.set_initial_state(initial);
        }

        Ok(machine)
    }
}

fn check_event(index: usize, event: &EventDecl) -> Validation<(), NonEmptyVec<ConfigIssue>> {
    if event.name.is_empty() {
        Validation::fail(ConfigIssue::EmptyEventName { index })
    } else if event.from.is_empty() || event.to.is_empty() {
        Validation::fail(ConfigIssue::EmptyEventState {
            event: event.name.clone(),
        })
    } else {
        Validation::success(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::TriggerOutcome;
    use crate::hooks::{Diagnostic, MemorySink};
    use parking_lot::Mutex;

    fn traffic_description() -> MachineDescription {
        MachineDescription::from_json(
            r#"{
                "name": "traffic",
                "initial": "green",
                "events": [
                    { "name": "warn", "from": "green", "to": "yellow" },
                    { "name": "panic", "from": "yellow", "to": "red" },
                    { "name": "calm", "from": "red", "to": "yellow" },
                    { "name": "clear", "from": "yellow", "to": "green" }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn builder_validates_required_fields() {
        let result = EventMachineBuilder::new().build();

        let err = result.unwrap_err();
        assert_eq!(err.issues().len(), 2);
        assert!(err.issues().contains(&ConfigIssue::MissingInitialState));
        assert!(err.issues().contains(&ConfigIssue::MissingEvents));
    }

    #[test]
    fn empty_events_list_is_allowed() {
        let machine = EventMachineBuilder::new()
            .initial("solo")
            .no_events()
            .build()
            .unwrap();
        assert_eq!(machine.current_state(), Some("solo"));
        assert_eq!(machine.events().count(), 0);
    }

    #[test]
    fn reports_every_problem_at_once() {
        let result = EventMachineBuilder::new()
            .initial("a")
            .event("", "a", "b")
            .event("go", "a", "")
            .guard("missing", Guard::nullary(|| true))
            .callback("afterwarn", |_, _| {})
            .build();

        let issues = result.unwrap_err().issues().to_vec();
        assert_eq!(issues.len(), 4);
        assert!(issues.contains(&ConfigIssue::EmptyEventName { index: 0 }));
        assert!(issues.contains(&ConfigIssue::EmptyEventState {
            event: "go".to_string()
        }));
        assert!(issues.contains(&ConfigIssue::GuardForUnknownEvent("missing".to_string())));
        assert!(issues
            .iter()
            .any(|i| matches!(i, ConfigIssue::InvalidHookIdentifier(_))));
    }

    #[test]
    fn description_builds_traffic_light() {
        let mut light = EventMachineBuilder::new()
            .description(traffic_description())
            .build()
            .unwrap();

        assert_eq!(light.name(), "traffic");
        assert_eq!(light.current_state(), Some("green"));

        for (event, expected) in [
            ("warn", "yellow"),
            ("panic", "red"),
            ("calm", "yellow"),
            ("clear", "green"),
        ] {
            light.trigger(event, &[]).unwrap();
            assert_eq!(light.current_state(), Some(expected));
        }
    }

    #[test]
    fn build_fires_initial_enter_hook() {
        let entered = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&entered);
        let _machine = EventMachineBuilder::new()
            .description(traffic_description())
            .callback("entergreen", move |_, _| *counter.lock() += 1)
            .build()
            .unwrap();

        assert_eq!(*entered.lock(), 1);
    }

    #[test]
    fn guards_attach_by_event_name() {
        let mut light = EventMachineBuilder::new()
            .description(traffic_description())
            .guard("warn", Guard::new(|ctx: &Context| ctx.is_true("sensor")))
            .build()
            .unwrap();

        let outcome = light.trigger("warn", &[]).unwrap();
        assert!(!outcome.is_transitioned());

        light.context_mut().set("sensor", true);
        assert!(light.trigger("warn", &[]).unwrap().is_transitioned());
    }

    #[test]
    fn warn_from_red_still_runs_after_hook() {
        let sink = MemorySink::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let (before, after) = (Arc::clone(&log), Arc::clone(&log));
        let mut light = EventMachineBuilder::new()
            .initial("red")
            .event("warn", "green", "yellow")
            .callback("onbeforewarn", move |_, _| before.lock().push("before"))
            .callback("onafterwarn", move |_, _| after.lock().push("after"))
            .diagnostics(Arc::new(sink.clone()))
            .build()
            .unwrap();

        let outcome = light.trigger("warn", &[]).unwrap();

        assert!(matches!(outcome, TriggerOutcome::Rejected { .. }));
        assert_eq!(light.current_state(), Some("red"));
        assert_eq!(*log.lock(), vec!["before", "after"]);
        assert!(sink
            .records()
            .iter()
            .any(|d| matches!(d, Diagnostic::TransitionRejected { .. })));
    }

    #[test]
    fn explicit_hook_keys_bind() {
        let light = EventMachineBuilder::new()
            .initial("green")
            .event("warn", "green", "yellow")
            .hook(HookKey::leave("green"), |_, _| {})
            .build()
            .unwrap();

        assert!(light
            .hooks()
            .is_bound(crate::hooks::HookPhase::LeaveState, "green"));
    }

    #[test]
    fn history_limit_is_applied() {
        let mut machine = EventMachineBuilder::new()
            .initial("a")
            .event("flip", "a", "b")
            .event("flop", "b", "a")
            .history_limit(2)
            .build()
            .unwrap();

        for _ in 0..3 {
            machine.trigger("flip", &[]).unwrap();
            machine.trigger("flop", &[]).unwrap();
        }
        assert_eq!(machine.history().len(), 2);
    }

    #[test]
    fn custom_context_type() {
        #[derive(Clone, Default)]
        struct Door {
            locked: bool,
        }

        let mut door = EventMachineBuilder::with_context(Door { locked: true })
            .initial("closed")
            .guarded_event("open", "closed", "open", Guard::new(|d: &Door| !d.locked))
            .build()
            .unwrap();

        assert!(!door.trigger("open", &[]).unwrap().is_transitioned());
        door.context_mut().locked = false;
        assert!(door.trigger("open", &[]).unwrap().is_transitioned());
    }
}
