//! Guard predicates for event-driven transitions.
//!
//! Guards are boolean functions that decide whether a triggered event may
//! change state. They are treated as immutable logic: cloning a guard shares
//! the underlying function rather than copying it.

use std::fmt;
use std::sync::Arc;

type Predicate<C> = Arc<dyn Fn(&C) -> bool + Send + Sync>;

/// Predicate that gates an event transition.
///
/// A guard sees the machine's context by shared reference. Guards that do not
/// care about the context can be built with [`Guard::nullary`].
///
/// # Example
///
/// ```rust
/// use statewright::core::{Context, Guard};
///
/// let armed = Guard::new(|ctx: &Context| ctx.is_true("armed"));
///
/// let mut ctx = Context::new();
/// assert!(!armed.check(&ctx));
///
/// ctx.set("armed", true);
/// assert!(armed.check(&ctx));
/// ```
pub struct Guard<C> {
    predicate: Predicate<C>,
}

impl<C> Guard<C> {
    /// Create a guard from a predicate over the context.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
        }
    }

    /// Create a guard from a zero-argument predicate.
    ///
    /// ```rust
    /// use statewright::core::{Context, Guard};
    ///
    /// let never: Guard<Context> = Guard::nullary(|| false);
    /// assert!(!never.check(&Context::new()));
    /// ```
    pub fn nullary<F>(predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Guard::new(move |_: &C| predicate())
    }

    /// Evaluate the guard against a context.
    pub fn check(&self, context: &C) -> bool {
        (self.predicate)(context)
    }

    /// True when both guards wrap the same function.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.predicate, &other.predicate)
    }
}

impl<C> Clone for Guard<C> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<C> fmt::Debug for Guard<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard").finish_non_exhaustive()
    }
}
