//! Hook resolution and diagnostic reporting.
//!
//! Event-model callbacks are stored under explicit `(phase, subject)` keys
//! rather than assembled names. The familiar string identifiers
//! (`onbeforewarn`, `leavegreen`, ...) are still accepted at the configuration
//! boundary and parse into those keys.

mod diagnostics;
mod key;
mod registry;

pub use diagnostics::{Diagnostic, DiagnosticSink, MemorySink, RejectReason, TracingSink};
pub use key::{HookKey, HookKeyError, HookPhase};
pub use registry::{Callback, HookArgs, HookRegistry};
