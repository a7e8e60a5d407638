pub mod project;
pub mod task;
pub mod transition;

pub use project::*;
pub use task::*;
pub use transition::*;
