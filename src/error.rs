//! Error types for the tool-invocation core.

/// A failure raised while validating or executing a single tool call.
///
/// Every variant is terminal for the call that raised it. Variants differ in
/// how they reach the user: model mistakes are pushed back into the
/// conversation as tool results, everything else goes through the shared
/// error path (logged, notified, no result pushed).
#[derive(Debug, thiserror::Error)]
pub enum ToolFailure {
    /// A required parameter was absent from the call.
    #[error("missing value for required parameter '{0}'")]
    MissingParameter(&'static str),

    /// A line-range parameter failed to parse or described an empty range.
    #[error("invalid line range: {0}")]
    InvalidRange(String),

    /// A parameter was present but malformed (e.g. unparsable JSON).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A required collaborator is not ready to serve the call.
    #[error("{0}")]
    InfrastructureUnavailable(String),

    /// The side-effecting operation itself failed.
    #[error("tool execution failed: {0}")]
    Execution(String),
}

impl ToolFailure {
    /// Whether this failure counts against the model's consecutive-mistake
    /// counter. Permission and infrastructure outcomes are not something the
    /// model could have known in advance.
    #[must_use]
    pub const fn is_model_mistake(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter(_) | Self::InvalidRange(_) | Self::InvalidArgument(_)
        )
    }
}

/// Errors raised by the orchestration layer itself, as opposed to failures of
/// an individual tool call.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The approval gateway channel was closed.
    #[error("approval gateway channel closed")]
    GatewayClosed,

    /// A tool call is already in flight for this task.
    #[error("a tool call is already in flight")]
    CallInFlight,
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_mistakes_are_classified() {
        assert!(ToolFailure::MissingParameter("path").is_model_mistake());
        assert!(ToolFailure::InvalidRange("bad".into()).is_model_mistake());
        assert!(ToolFailure::InvalidArgument("bad".into()).is_model_mistake());

        assert!(!ToolFailure::InfrastructureUnavailable("hub down".into()).is_model_mistake());
        assert!(!ToolFailure::Execution("boom".into()).is_model_mistake());
    }

    #[test]
    fn missing_parameter_names_the_parameter() {
        let msg = ToolFailure::MissingParameter("server_name").to_string();
        assert!(msg.contains("server_name"));
    }
}
