//! Tool-call records and the per-call state machine.

use std::fmt;

/// The closed set of tools this core can dispatch.
///
/// Adding a tool means adding a variant here and a handler to the dispatcher
/// table, both checked at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    /// List workspace files, optionally recursively.
    ListFiles,
    /// Read a file, whole or by line range.
    ReadFile,
    /// Invoke a tool on a remote capability (MCP) server.
    UseMcpTool,
}

impl ToolKind {
    /// Resolve a model-issued tool name. Unknown names are the caller's
    /// problem to log; they must never crash the task.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "list_files" => Some(Self::ListFiles),
            "read_file" => Some(Self::ReadFile),
            "use_mcp_tool" => Some(Self::UseMcpTool),
            _ => None,
        }
    }

    /// The wire name the model uses for this tool.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ListFiles => "list_files",
            Self::ReadFile => "read_file",
            Self::UseMcpTool => "use_mcp_tool",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Insertion-ordered string parameters of a tool call.
///
/// The parser emits parameters in the order the model streamed them; that
/// order is preserved for display and payload construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Set a parameter, replacing any previous value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.0.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.0.push((name, value));
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut params = Self::new();
        for (n, v) in iter {
            params.set(n, v);
        }
        params
    }
}

/// A structured tool request issued by the model.
///
/// Lives for the duration of one handler invocation. `partial` marks a
/// still-streaming snapshot; no side effect may occur while it is set.
#[derive(Debug, Clone)]
pub struct ToolCall {
    pub kind: ToolKind,
    pub params: Params,
    pub partial: bool,
}

impl ToolCall {
    #[must_use]
    pub const fn new(kind: ToolKind, params: Params, partial: bool) -> Self {
        Self {
            kind,
            params,
            partial,
        }
    }
}

/// Lifecycle states of a single tool call.
///
/// `Streaming` may be re-entered arbitrarily many times while the call is
/// still being assembled from the token stream; every other transition is
/// forward-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// Partial snapshot, preview only.
    Streaming,
    /// Finalized call undergoing parameter validation.
    Validating,
    /// Validation failed; result pushed, terminal.
    RejectedByValidation,
    /// Waiting on the approval gateway.
    AwaitingApproval,
    /// User denied the action; terminal, silent.
    Denied,
    /// Side-effecting operation running.
    Executing,
    /// Completed; result pushed, telemetry recorded.
    Succeeded,
    /// Routed to the shared error path; no result pushed.
    Errored,
}

impl CallState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::RejectedByValidation | Self::Denied | Self::Succeeded | Self::Errored
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_name() {
        for kind in [ToolKind::ListFiles, ToolKind::ReadFile, ToolKind::UseMcpTool] {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ToolKind::from_name("browse_web"), None);
    }

    #[test]
    fn params_preserve_insertion_order() {
        let mut params = Params::new();
        params.set("path", "src");
        params.set("recursive", "true");
        params.set("path", "src/lib.rs");

        let keys: Vec<&str> = params.iter().map(|(n, _)| n).collect();
        assert_eq!(keys, ["path", "recursive"]);
        assert_eq!(params.get("path"), Some("src/lib.rs"));
        assert_eq!(params.get("missing"), None);
    }

    #[test]
    fn terminal_states() {
        assert!(CallState::Succeeded.is_terminal());
        assert!(CallState::Denied.is_terminal());
        assert!(CallState::Errored.is_terminal());
        assert!(CallState::RejectedByValidation.is_terminal());
        assert!(!CallState::Streaming.is_terminal());
        assert!(!CallState::AwaitingApproval.is_terminal());
        assert!(!CallState::Executing.is_terminal());
    }
}
