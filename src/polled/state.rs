//! State handlers with optional lifecycle hooks.

use super::machine::PolledMachine;
use std::fmt;
use std::sync::Arc;

/// Hook run when a state is entered or exited.
pub type StateHook<C> = Arc<dyn Fn(&mut PolledMachine<C>) + Send + Sync>;

/// Hook run on every unpaused `update` while the state is current.
pub type UpdateHook<C> = Arc<dyn Fn(&mut PolledMachine<C>, f64) + Send + Sync>;

/// Lifecycle hooks for one state.
///
/// Each slot is independently optional; an empty slot is a no-op. Handlers are
/// shared between a machine and its clones, so they should keep no state of
/// their own. Anything that changes belongs in the machine context.
///
/// # Example
///
/// ```rust
/// use statewright::polled::{PolledMachine, State};
///
/// let moving = State::new()
///     .on_enter(|m: &mut PolledMachine| {
///         m.context_mut().set("speed", 1.0);
///     })
///     .on_update(|m: &mut PolledMachine, dt| {
///         let x = m.context().get_f64("x").unwrap_or(0.0);
///         m.context_mut().set("x", x + dt);
///     });
///
/// assert!(moving.has_enter());
/// assert!(moving.has_update());
/// assert!(!moving.has_exit());
/// ```
pub struct State<C> {
    enter: Option<StateHook<C>>,
    update: Option<UpdateHook<C>>,
    exit: Option<StateHook<C>>,
}

impl<C> State<C> {
    /// A state with no hooks.
    pub fn new() -> Self {
        Self {
            enter: None,
            update: None,
            exit: None,
        }
    }

    pub fn on_enter<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut PolledMachine<C>) + Send + Sync + 'static,
    {
        self.enter = Some(Arc::new(hook));
        self
    }

    pub fn on_update<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut PolledMachine<C>, f64) + Send + Sync + 'static,
    {
        self.update = Some(Arc::new(hook));
        self
    }

    pub fn on_exit<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut PolledMachine<C>) + Send + Sync + 'static,
    {
        self.exit = Some(Arc::new(hook));
        self
    }

    pub fn has_enter(&self) -> bool {
        self.enter.is_some()
    }

    pub fn has_update(&self) -> bool {
        self.update.is_some()
    }

    pub fn has_exit(&self) -> bool {
        self.exit.is_some()
    }

    pub(crate) fn enter_hook(&self) -> Option<StateHook<C>> {
        self.enter.clone()
    }

    pub(crate) fn update_hook(&self) -> Option<UpdateHook<C>> {
        self.update.clone()
    }

    pub(crate) fn exit_hook(&self) -> Option<StateHook<C>> {
        self.exit.clone()
    }
}

impl<C> Default for State<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for State<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("enter", &self.has_enter())
            .field("update", &self.has_update())
            .field("exit", &self.has_exit())
            .finish()
    }
}
