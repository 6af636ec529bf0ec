//! File-listing tool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::ask::{ASK_TOOL, ToolAsk};
use crate::call::{CallState, ToolCall, ToolKind};
use crate::error::ToolFailure;
use crate::gateway::{AskResponse, GatewayClient};
use crate::ignore_policy::IgnorePolicy;
use crate::task::TaskContext;
use crate::telemetry::Telemetry;
use crate::workspace::WorkspaceOps;

use super::{ToolHandler, route_error, unless_cancelled};

/// Handler for `list_files`.
///
/// Required `path`; optional `recursive` (default false). Listing runs before
/// approval so the prompt can describe exactly what would be shown; the
/// result only reaches the conversation once the user consents.
pub struct ListFilesHandler {
    gateway: GatewayClient,
    ignore: Arc<IgnorePolicy>,
    workspace: Arc<dyn WorkspaceOps>,
    telemetry: Arc<dyn Telemetry>,
    list_limit: usize,
}

impl ListFilesHandler {
    #[must_use]
    pub fn new(
        gateway: GatewayClient,
        ignore: Arc<IgnorePolicy>,
        workspace: Arc<dyn WorkspaceOps>,
        telemetry: Arc<dyn Telemetry>,
        list_limit: usize,
    ) -> Self {
        Self {
            gateway,
            ignore,
            workspace,
            telemetry,
            list_limit,
        }
    }

    fn ask_payload(&self, recursive: bool, path: String, content: String) -> String {
        let ask = if recursive {
            ToolAsk::ListFilesRecursive { path, content }
        } else {
            ToolAsk::ListFilesTopLevel { path, content }
        };
        ask.payload()
    }

    /// Render the entry list, annotating each entry with its ignore-policy
    /// status and the listing with whether it was truncated.
    fn format_listing(&self, base: &Path, entries: &[PathBuf], limit_hit: bool) -> String {
        if entries.is_empty() {
            return "No files found.".to_string();
        }

        let mut lines: Vec<String> = entries
            .iter()
            .map(|entry| {
                if self.ignore.allows(&base.join(entry)) {
                    entry.display().to_string()
                } else {
                    format!("{} (ignored)", entry.display())
                }
            })
            .collect();

        if limit_hit {
            lines.push(format!(
                "\n(Listing truncated at {} entries. Try listing a subdirectory if you need more.)",
                self.list_limit
            ));
        }

        lines.join("\n")
    }
}

#[async_trait]
impl ToolHandler for ListFilesHandler {
    fn kind(&self) -> ToolKind {
        ToolKind::ListFiles
    }

    fn validate(&self, call: &ToolCall) -> Result<(), ToolFailure> {
        if call.params.get("path").is_none() {
            return Err(ToolFailure::MissingParameter("path"));
        }
        Ok(())
    }

    async fn handle_partial(&self, task: &TaskContext, call: &ToolCall) {
        let path = call.params.get("path").unwrap_or_default();
        let recursive = call
            .params
            .get("recursive")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));
        let resolved = task.cwd().join(path).display().to_string();

        self.gateway
            .preview(ASK_TOOL, self.ask_payload(recursive, resolved, String::new()));
    }

    async fn handle_complete(&self, task: &TaskContext, call: &ToolCall) {
        // Presence was checked in `validate`.
        let Some(path) = call.params.get("path") else {
            return;
        };
        let recursive = call
            .params
            .get("recursive")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));
        let resolved = task.cwd().join(path);

        let (entries, limit_hit) = match self
            .workspace
            .list_files(&resolved, recursive, self.list_limit)
            .await
        {
            Ok(listing) => listing,
            Err(err) => {
                route_error(
                    task,
                    &self.gateway,
                    self.kind(),
                    &ToolFailure::Execution(err.to_string()),
                );
                return;
            }
        };

        let content = self.format_listing(&resolved, &entries, limit_hit);

        task.set_call_state(CallState::AwaitingApproval);
        let token = task.cancellation_token();
        let payload = self.ask_payload(recursive, resolved.display().to_string(), content.clone());
        let Some(response) = unless_cancelled(
            &token,
            self.gateway.request_approval(self.kind(), ASK_TOOL, payload),
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

        if task.push_tool_result(self.kind(), content) {
            self.telemetry.capture_tool_usage(task.id(), self.kind().name());
            task.reset_mistakes();
            task.set_call_state(CallState::Succeeded);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::gateway::GatewayActor;
    use crate::telemetry::NoTelemetry;
    use crate::workspace::LocalWorkspace;

    use super::*;

    fn handler(limit: usize) -> ListFilesHandler {
        let (_actor, tx) = GatewayActor::new();
        ListFilesHandler::new(
            GatewayClient::new(tx),
            Arc::new(IgnorePolicy::allow_all("/ws")),
            Arc::new(LocalWorkspace::new()),
            Arc::new(NoTelemetry),
            limit,
        )
    }

    #[test]
    fn full_listing_carries_no_truncation_note() {
        let handler = handler(200);
        let entries: Vec<PathBuf> = (0..200).map(|i| PathBuf::from(format!("f{i}.rs"))).collect();

        let text = handler.format_listing(Path::new("/ws"), &entries, false);
        assert!(text.contains("f0.rs"));
        assert!(text.contains("f199.rs"));
        assert!(!text.contains("truncated at 200"));
    }

    #[test]
    fn truncated_listing_is_annotated() {
        let handler = handler(200);
        let entries: Vec<PathBuf> = (0..42).map(|i| PathBuf::from(format!("f{i}.rs"))).collect();

        let text = handler.format_listing(Path::new("/ws"), &entries, true);
        assert!(text.contains("truncated at 200 entries"));
    }

    #[test]
    fn empty_listing_has_a_friendly_message() {
        let handler = handler(200);
        let text = handler.format_listing(Path::new("/ws"), &[], false);
        assert_eq!(text, "No files found.");
    }

    #[test]
    fn ignored_entries_are_annotated() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(crate::ignore_policy::IGNORE_FILE), "*.env\n").unwrap();
        let (_actor, tx) = GatewayActor::new();
        let handler = ListFilesHandler::new(
            GatewayClient::new(tx),
            Arc::new(IgnorePolicy::load(dir.path())),
            Arc::new(LocalWorkspace::new()),
            Arc::new(NoTelemetry),
            200,
        );

        let entries = vec![PathBuf::from("main.rs"), PathBuf::from("prod.env")];
        let text = handler.format_listing(dir.path(), &entries, false);
        assert!(text.contains("main.rs"));
        assert!(!text.contains("main.rs (ignored)"));
        assert!(text.contains("prod.env (ignored)"));
    }
}
