//! Remote-capability (MCP) hub boundary.
//!
//! The hub is an external collaborator that performs remote tool invocations
//! on behalf of this core. Handlers hold a weak reference: the backing
//! provider may be released while a task is still running, and that condition
//! is an infrastructure failure, not a model mistake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of a remote tool invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilityResult {
    pub content: Vec<ResultContent>,
    #[serde(default)]
    pub is_error: bool,
}

/// One content entry of a capability result, tagged by kind. Each variant
/// carries only the fields valid for that kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResultContent {
    Text {
        text: String,
    },
    Image {
        data: String,
        mime_type: String,
    },
    Resource {
        resource: ResourceRef,
    },
}

/// Reference to a server-side resource embedded in a result.
///
/// `blob` holds a binary payload and is excluded from serialization so that
/// rendered results never embed raw binary data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRef {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing)]
    pub blob: Option<String>,
}

/// External collaborator that executes remote tool calls.
#[async_trait]
pub trait CapabilityHub: Send + Sync {
    /// Invoke `tool` on `server` with optional parsed arguments.
    ///
    /// # Errors
    ///
    /// Returns an error for transport or protocol failures. A tool that ran
    /// and reported a problem comes back as `Ok` with `is_error` set.
    async fn call_tool(
        &self,
        server: &str,
        tool: &str,
        arguments: Option<Value>,
    ) -> anyhow::Result<CapabilityResult>;
}
