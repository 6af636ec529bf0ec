//! Core configuration.

use serde::{Deserialize, Serialize};

use crate::gateway::AutoApprove;

/// Default cap on entries returned by a single listing.
pub const DEFAULT_LIST_LIMIT: usize = 200;
/// Default cap on lines returned by an unbounded read.
pub const DEFAULT_MAX_READ_LINES: usize = 500;

/// Tunables for the tool-invocation core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Maximum entries a `list_files` call may return.
    pub list_limit: usize,
    /// Maximum lines a `read_file` call without an explicit range may return
    /// before the result is truncated and outlined.
    pub max_read_lines: usize,
    /// Per-tool auto-approval presets.
    pub auto_approve: AutoApprove,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            list_limit: DEFAULT_LIST_LIMIT,
            max_read_lines: DEFAULT_MAX_READ_LINES,
            auto_approve: AutoApprove::default(),
        }
    }
}

impl CoreConfig {
    /// Parse a configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid TOML for this shape.
    pub fn from_toml(document: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(document)?)
    }
}

#[cfg(test)]
mod tests {
    use crate::gateway::ApprovalPreset;

    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = CoreConfig::default();
        assert_eq!(config.list_limit, 200);
        assert_eq!(config.max_read_lines, 500);
        assert_eq!(config.auto_approve.read_file, ApprovalPreset::Ask);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config = CoreConfig::from_toml("max_read_lines = 100\n").unwrap();
        assert_eq!(config.max_read_lines, 100);
        assert_eq!(config.list_limit, 200);
    }

    #[test]
    fn presets_parse_from_toml() {
        let config = CoreConfig::from_toml(
            "[auto_approve]\nlist_files = \"allow\"\nuse_mcp_tool = \"deny\"\n",
        )
        .unwrap();
        assert_eq!(config.auto_approve.list_files, ApprovalPreset::Allow);
        assert_eq!(config.auto_approve.use_mcp_tool, ApprovalPreset::Deny);
        assert_eq!(config.auto_approve.read_file, ApprovalPreset::Ask);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(CoreConfig::from_toml("list_limit = \"lots\"").is_err());
    }
}
