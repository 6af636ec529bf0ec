//! Remote-capability invocation tool.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use serde_json::Value;

use crate::ask::{ASK_USE_MCP_SERVER, UseMcpAsk};
use crate::call::{CallState, ToolCall, ToolKind};
use crate::error::ToolFailure;
use crate::gateway::{AskResponse, GatewayClient};
use crate::hub::{CapabilityHub, CapabilityResult, ResultContent};
use crate::task::TaskContext;
use crate::telemetry::Telemetry;

use super::{ToolHandler, route_error, unless_cancelled};

/// Handler for `use_mcp_tool`.
///
/// Holds a weak hub reference: the hub belongs to the host application and
/// may not be initialized yet, or may already have been torn down while this
/// task was running. Either way that is an infrastructure condition, never a
/// model mistake.
pub struct UseMcpHandler {
    gateway: GatewayClient,
    hub: Option<Weak<dyn CapabilityHub>>,
    telemetry: Arc<dyn Telemetry>,
}

/// Render a capability result for the conversation: text entries
/// concatenated in order, resource entries appended as labeled blocks of
/// pretty-printed structured data (binary payloads excluded by
/// serialization), and an `Error:` prefix when the result is error-flagged.
fn render_result(result: &CapabilityResult) -> String {
    let mut body = result
        .content
        .iter()
        .filter_map(|entry| match entry {
            ResultContent::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    for entry in &result.content {
        if let ResultContent::Resource { resource } = entry {
            let pretty = serde_json::to_string_pretty(resource).unwrap_or_default();
            body.push_str(&format!("\n\nResource {}:\n{pretty}", resource.uri));
        }
    }

    if result.is_error {
        format!("Error:\n{body}")
    } else {
        body
    }
}

impl UseMcpHandler {
    #[must_use]
    pub fn new(
        gateway: GatewayClient,
        hub: Option<Weak<dyn CapabilityHub>>,
        telemetry: Arc<dyn Telemetry>,
    ) -> Self {
        Self {
            gateway,
            hub,
            telemetry,
        }
    }
}

#[async_trait]
impl ToolHandler for UseMcpHandler {
    fn kind(&self) -> ToolKind {
        ToolKind::UseMcpTool
    }

    fn validate(&self, call: &ToolCall) -> Result<(), ToolFailure> {
        let Some(server_name) = call.params.get("server_name") else {
            return Err(ToolFailure::MissingParameter("server_name"));
        };
        let Some(tool_name) = call.params.get("tool_name") else {
            return Err(ToolFailure::MissingParameter("tool_name"));
        };

        if let Some(raw) = call.params.get("arguments") {
            if serde_json::from_str::<Value>(raw).is_err() {
                return Err(ToolFailure::InvalidArgument(format!(
                    "invalid JSON argument used with {server_name} for {tool_name}"
                )));
            }
        }
        Ok(())
    }

    async fn handle_partial(&self, task: &TaskContext, call: &ToolCall) {
        let _ = task;
        let ask = UseMcpAsk::new(
            call.params.get("server_name").unwrap_or_default(),
            call.params.get("tool_name").unwrap_or_default(),
            call.params.get("arguments").map(str::to_string),
        );
        self.gateway.preview(ASK_USE_MCP_SERVER, ask.payload());
    }

    async fn handle_complete(&self, task: &TaskContext, call: &ToolCall) {
        // Presence and argument shape were checked in `validate`.
        let Some(server_name) = call.params.get("server_name") else {
            return;
        };
        let Some(tool_name) = call.params.get("tool_name") else {
            return;
        };
        let raw_arguments = call.params.get("arguments");
        let Ok(parsed_arguments) = raw_arguments
            .map(serde_json::from_str::<Value>)
            .transpose()
        else {
            return;
        };

        // The hub may be gone before or during a task; this is not the
        // model's fault, so it goes through the shared error path.
        let Some(hub) = self.hub.as_ref().and_then(Weak::upgrade) else {
            route_error(
                task,
                &self.gateway,
                self.kind(),
                &ToolFailure::InfrastructureUnavailable(
                    "MCP hub is not available: no active capability connection".to_string(),
                ),
            );
            return;
        };

        task.set_call_state(CallState::AwaitingApproval);
        let token = task.cancellation_token();
        let ask = UseMcpAsk::new(server_name, tool_name, raw_arguments.map(str::to_string));
        let Some(response) = unless_cancelled(
            &token,
            self.gateway
                .request_approval(self.kind(), ASK_USE_MCP_SERVER, ask.payload()),
        )
        .await
        else {
            return;
        };

        match response {
            Ok(AskResponse::Approved) => {}
            Ok(AskResponse::Denied) => {
                task.set_call_state(CallState::Denied);
                return;
            }
            Err(err) => {
                route_error(
                    task,
                    &self.gateway,
                    self.kind(),
                    &ToolFailure::InfrastructureUnavailable(err.to_string()),
                );
                return;
            }
        }

        task.set_call_state(CallState::Executing);
        let Some(invoked) = unless_cancelled(
            &token,
            hub.call_tool(server_name, tool_name, parsed_arguments),
        )
        .await
        else {
            return;
        };

        match invoked {
            Ok(result) => {
                // The call completed; an error-flagged result still counts as
                // a completion for telemetry purposes.
                let rendered = render_result(&result);
                if task.push_tool_result(self.kind(), rendered.clone()) {
                    self.gateway.say("mcp_server_response", Some(rendered));
                    self.telemetry.capture_tool_usage(task.id(), self.kind().name());
                    task.reset_mistakes();
                    task.set_call_state(CallState::Succeeded);
                }
            }
            Err(err) => {
                route_error(
                    task,
                    &self.gateway,
                    self.kind(),
                    &ToolFailure::Execution(err.to_string()),
                );
            }
        }
    }
}
