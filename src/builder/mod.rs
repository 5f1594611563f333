//! Builder API for ergonomic machine construction.
//!
//! Builders validate the whole configuration up front and report every
//! problem at once, where registering on a machine directly accepts anything.

pub mod description;
pub mod error;
pub mod machine;
pub mod macros;
pub mod polled;

pub use description::{EventDecl, MachineDescription};
pub use error::{BuildError, ConfigIssue};
pub use machine::EventMachineBuilder;
pub use polled::PolledMachineBuilder;
