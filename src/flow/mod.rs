//! Flow definition engine.
//!
//! A flow is a named graph of stages that one task type moves through. This
//! module loads flows from YAML definitions ([`FlowLoader`]), resolves
//! single-parent inheritance between them, and answers routing queries on the
//! result ([`Flow::next_status`], [`Flow::valid_transitions`], ...).

pub mod error;
pub mod loader;
pub mod model;
pub mod router;
pub mod source;

pub use error::FlowError;
pub use loader::FlowLoader;
pub use model::{Flow, Stage, Transition, WorkersRule};
pub use source::{DirSource, FlowSource, MemorySource, RawFlow, RawStage, RawWorkers};

use std::path::Path;

/// Load the flow `name` from a directory of YAML definitions.
pub fn load_flow(name: &str, flows_dir: &Path) -> Result<Flow, FlowError> {
    FlowLoader::new(DirSource::new(flows_dir)).load(name)
}

/// Names of the flows defined in `flows_dir`, sorted.
pub fn list_flow_names(flows_dir: &Path) -> Result<Vec<String>, FlowError> {
    DirSource::new(flows_dir).names()
}
