use thiserror::Error;

/// Errors raised while locating, parsing, or validating a flow definition.
///
/// Routing queries on a loaded [`Flow`](super::Flow) never fail; every error
/// in this enum comes from the loader or from a [`FlowSource`](super::FlowSource).
#[derive(Debug, Error)]
pub enum FlowError {
    /// No definition exists for the named flow (or for a parent it inherits from).
    #[error("flow '{0}' not found")]
    NotFound(String),

    /// The merged definition breaks a structural rule.
    #[error("invalid flow '{flow}': {message}")]
    Validation { flow: String, message: String },

    /// The definition source is not well-formed YAML or a field has the wrong shape.
    #[error("failed to parse flow '{name}': {message}")]
    Parse { name: String, message: String },

    /// The definition source could not be read.
    #[error("failed to read flow '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl FlowError {
    pub(crate) fn validation(flow: &str, message: impl Into<String>) -> Self {
        FlowError::Validation {
            flow: flow.to_string(),
            message: message.into(),
        }
    }
}
