//! Wire shapes for approval prompts.
//!
//! These payloads are part of the contract with the UI collaborator and must
//! serialize exactly as written here: a `tool` discriminator for file tools,
//! a `type` discriminator for MCP invocations.

use serde::Serialize;

/// Ask kind used for file-tool approval prompts.
pub const ASK_TOOL: &str = "tool";
/// Ask kind used for remote-capability approval prompts.
pub const ASK_USE_MCP_SERVER: &str = "use_mcp_server";

/// Approval payload for the file tools.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "tool", rename_all = "camelCase")]
pub enum ToolAsk {
    ListFilesTopLevel { path: String, content: String },
    ListFilesRecursive { path: String, content: String },
    ReadFile { path: String, content: String },
}

impl ToolAsk {
    /// Serialize to the JSON payload string the gateway transports.
    #[must_use]
    pub fn payload(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Approval payload for `use_mcp_tool`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UseMcpAsk {
    pub r#type: &'static str,
    pub server_name: String,
    pub tool_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

impl UseMcpAsk {
    #[must_use]
    pub fn new(
        server_name: impl Into<String>,
        tool_name: impl Into<String>,
        arguments: Option<String>,
    ) -> Self {
        Self {
            r#type: "use_mcp_tool",
            server_name: server_name.into(),
            tool_name: tool_name.into(),
            arguments,
        }
    }

    /// Serialize to the JSON payload string the gateway transports.
    #[must_use]
    pub fn payload(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_discriminators_match_wire_contract() {
        let payload = ToolAsk::ListFilesTopLevel {
            path: "/ws/src".into(),
            content: "lib.rs".into(),
        }
        .payload();
        assert!(payload.contains(r#""tool":"listFilesTopLevel""#));

        let payload = ToolAsk::ListFilesRecursive {
            path: "/ws".into(),
            content: String::new(),
        }
        .payload();
        assert!(payload.contains(r#""tool":"listFilesRecursive""#));

        let payload = ToolAsk::ReadFile {
            path: "/ws/main.rs".into(),
            content: "/ws/main.rs".into(),
        }
        .payload();
        assert!(payload.contains(r#""tool":"readFile""#));
    }

    #[test]
    fn mcp_payload_uses_type_discriminator_and_camel_case() {
        let ask = UseMcpAsk::new("weather", "get_forecast", Some(r#"{"city":"Kyiv"}"#.into()));
        let payload = ask.payload();
        assert!(payload.contains(r#""type":"use_mcp_tool""#));
        assert!(payload.contains(r#""serverName":"weather""#));
        assert!(payload.contains(r#""toolName":"get_forecast""#));
        assert!(payload.contains(r#""arguments":"{\"city\":\"Kyiv\"}""#));
    }

    #[test]
    fn mcp_payload_omits_absent_arguments() {
        let payload = UseMcpAsk::new("weather", "get_forecast", None).payload();
        assert!(!payload.contains("arguments"));
    }
}
