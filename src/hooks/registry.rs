//! Callback storage keyed by hook phase and subject.

use super::key::{HookKey, HookPhase};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Arguments passed to every event-model callback.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HookArgs<'a> {
    /// Event being triggered, or [`INITIAL_EVENT`](crate::event::INITIAL_EVENT)
    /// for the initial entry
    pub event: &'a str,
    /// Declared source state; `None` for the initial entry
    pub from: Option<&'a str>,
    /// Declared target state
    pub to: &'a str,
    /// Extra values supplied by the caller of `trigger`
    pub payload: &'a [Value],
}

/// Callback bound to a hook slot. `M` is the machine type handed to it.
pub type Callback<M> = Arc<dyn Fn(&mut M, &HookArgs<'_>) + Send + Sync>;

/// Maps `(phase, subject)` pairs to callbacks.
///
/// Lookups never fail: an unbound slot resolves to `None` and the caller skips
/// it. Cloning the registry shares the callbacks themselves.
pub struct HookRegistry<M> {
    slots: HashMap<HookPhase, HashMap<String, Callback<M>>>,
}

impl<M> HookRegistry<M> {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    /// Bind a callback, replacing any previous binding for the same slot.
    pub fn bind(&mut self, key: HookKey, callback: Callback<M>) -> Option<Callback<M>> {
        self.slots
            .entry(key.phase)
            .or_default()
            .insert(key.subject, callback)
    }

    pub fn unbind(&mut self, phase: HookPhase, subject: &str) -> Option<Callback<M>> {
        self.slots.get_mut(&phase)?.remove(subject)
    }

    /// Resolve a slot to a cloned handle, so the caller may invoke it while
    /// holding the machine mutably.
    pub fn resolve(&self, phase: HookPhase, subject: &str) -> Option<Callback<M>> {
        self.slots.get(&phase)?.get(subject).cloned()
    }

    pub fn is_bound(&self, phase: HookPhase, subject: &str) -> bool {
        self.slots
            .get(&phase)
            .is_some_and(|subjects| subjects.contains_key(subject))
    }

    pub fn len(&self) -> usize {
        self.slots.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every bound slot, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = HookKey> + '_ {
        self.slots.iter().flat_map(|(phase, subjects)| {
            subjects
                .keys()
                .map(move |subject| HookKey::new(*phase, subject.clone()))
        })
    }
}

impl<M> Default for HookRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Clone for HookRegistry<M> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
        }
    }
}

impl<M> fmt::Debug for HookRegistry<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self.keys().map(|k| k.to_string()).collect();
        keys.sort();
        f.debug_struct("HookRegistry").field("bound", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        hits: Vec<String>,
    }

    fn args() -> HookArgs<'static> {
        HookArgs {
            event: "warn",
            from: Some("green"),
            to: "yellow",
            payload: &[],
        }
    }

    #[test]
    fn unbound_slot_resolves_to_none() {
        let registry: HookRegistry<Counter> = HookRegistry::new();
        assert!(registry.resolve(HookPhase::BeforeEvent, "warn").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn resolves_by_phase_and_subject() {
        let mut registry: HookRegistry<Counter> = HookRegistry::new();
        registry.bind(
            HookKey::after("warn"),
            Arc::new(|m: &mut Counter, a: &HookArgs<'_>| m.hits.push(format!("after {}", a.event))),
        );

        assert!(registry.resolve(HookPhase::BeforeEvent, "warn").is_none());
        assert!(registry.resolve(HookPhase::AfterEvent, "green").is_none());

        let callback = registry.resolve(HookPhase::AfterEvent, "warn").unwrap();
        let mut counter = Counter { hits: Vec::new() };
        callback(&mut counter, &args());
        assert_eq!(counter.hits, vec!["after warn"]);
    }

    #[test]
    fn rebinding_replaces_previous_callback() {
        let mut registry: HookRegistry<Counter> = HookRegistry::new();
        let first = registry.bind(
            HookKey::enter("yellow"),
            Arc::new(|m: &mut Counter, _: &HookArgs<'_>| m.hits.push("first".into())),
        );
        let second = registry.bind(
            HookKey::enter("yellow"),
            Arc::new(|m: &mut Counter, _: &HookArgs<'_>| m.hits.push("second".into())),
        );

        assert!(first.is_none());
        assert!(second.is_some());
        assert_eq!(registry.len(), 1);

        let mut counter = Counter { hits: Vec::new() };
        registry.resolve(HookPhase::EnterState, "yellow").unwrap()(&mut counter, &args());
        assert_eq!(counter.hits, vec!["second"]);
    }

    #[test]
    fn unbind_removes_slot() {
        let mut registry: HookRegistry<Counter> = HookRegistry::new();
        registry.bind(HookKey::leave("green"), Arc::new(|_: &mut Counter, _: &HookArgs<'_>| {}));

        assert!(registry.is_bound(HookPhase::LeaveState, "green"));
        assert!(registry.unbind(HookPhase::LeaveState, "green").is_some());
        assert!(!registry.is_bound(HookPhase::LeaveState, "green"));
    }

    #[test]
    fn clone_shares_callbacks() {
        let mut registry: HookRegistry<Counter> = HookRegistry::new();
        registry.bind(HookKey::before("warn"), Arc::new(|_: &mut Counter, _: &HookArgs<'_>| {}));

        let copy = registry.clone();
        let a = registry.resolve(HookPhase::BeforeEvent, "warn").unwrap();
        let b = copy.resolve(HookPhase::BeforeEvent, "warn").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
