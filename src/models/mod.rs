//! Durable entities of the task ledger.
//!
//! Stage graphs themselves live in [`crate::flow`]; tasks only store the stage name.

pub mod project;
pub mod task;
pub mod transition;

pub use project::*;
pub use task::*;
pub use transition::*;
