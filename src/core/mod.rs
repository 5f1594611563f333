//! Core data shared by both machine variants.
//!
//! This module contains the pieces that do not depend on how transitions are
//! driven:
//! - The key-value `Context` read by predicates and written by hooks
//! - `Guard` predicates for event transitions
//! - State change history

mod context;
mod guard;
mod history;

pub use context::Context;
pub use guard::Guard;
pub use history::{Cause, StateHistory, StateTransition};
