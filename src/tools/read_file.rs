//! File-reading tool.

use std::io;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::ask::{ASK_TOOL, ToolAsk};
use crate::call::{CallState, ToolCall, ToolKind};
use crate::error::ToolFailure;
use crate::gateway::{AskResponse, GatewayClient};
use crate::ignore_policy::{IGNORE_FILE, IgnorePolicy};
use crate::task::TaskContext;
use crate::telemetry::Telemetry;
use crate::workspace::WorkspaceOps;

use super::{ToolHandler, route_error, unless_cancelled};

/// Handler for `read_file`.
///
/// Required `path`; optional `start_line`/`end_line`, 1-based inclusive.
/// Unbounded reads of files longer than `max_lines` are truncated and
/// supplemented with a structural outline so the model can ask for the
/// slice it actually needs.
pub struct ReadFileHandler {
    gateway: GatewayClient,
    ignore: Arc<IgnorePolicy>,
    workspace: Arc<dyn WorkspaceOps>,
    telemetry: Arc<dyn Telemetry>,
    max_lines: usize,
}

/// Prefix each line with its 1-based number, starting at `first`.
fn number_lines(content: &str, first: usize) -> String {
    content
        .lines()
        .enumerate()
        .map(|(offset, line)| format!("{} | {line}", first + offset))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse the optional line-range parameters.
///
/// Returns 1-based `(start, end)`; both inclusive. Rejects non-integers,
/// zero (lines are 1-based), and empty ranges.
fn parse_range(call: &ToolCall) -> Result<(Option<usize>, Option<usize>), ToolFailure> {
    let parse = |name: &str| -> Result<Option<usize>, ToolFailure> {
        match call.params.get(name) {
            None => Ok(None),
            Some(raw) => {
                let value: usize = raw.trim().parse().map_err(|_| {
                    ToolFailure::InvalidRange(format!("{name} must be an integer, got '{raw}'"))
                })?;
                if value == 0 {
                    return Err(ToolFailure::InvalidRange(format!(
                        "{name} is 1-based, got 0"
                    )));
                }
                Ok(Some(value))
            }
        }
    };

    let start = parse("start_line")?;
    let end = parse("end_line")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(ToolFailure::InvalidRange(format!(
                "start_line ({start}) must be less than end_line ({end})"
            )));
        }
    }

    Ok((start, end))
}

impl ReadFileHandler {
    #[must_use]
    pub fn new(
        gateway: GatewayClient,
        ignore: Arc<IgnorePolicy>,
        workspace: Arc<dyn WorkspaceOps>,
        telemetry: Arc<dyn Telemetry>,
        max_lines: usize,
    ) -> Self {
        Self {
            gateway,
            ignore,
            workspace,
            telemetry,
            max_lines,
        }
    }

    /// Read a file without an explicit range: whole file when it fits,
    /// otherwise the first `max_lines` plus outline and truncation notice.
    async fn read_unbounded(&self, path: &Path) -> io::Result<String> {
        let total = self.workspace.count_lines(path).await?;

        if total <= self.max_lines {
            let content = self.workspace.read_lines(path, None, None).await?;
            return Ok(number_lines(&content, 1));
        }

        let content = self
            .workspace
            .read_lines(path, Some(0), Some(self.max_lines))
            .await?;
        let outline = self.workspace.outline(path).await?;

        let mut result = format!(
            "{}\n\n[Showing only {} of {total} total lines. Use start_line and end_line to read the rest.]",
            number_lines(&content, 1),
            self.max_lines,
        );
        if !outline.is_empty() {
            result.push_str(&format!("\n\nFile outline:\n{outline}"));
        }
        Ok(result)
    }

    /// Terminal handling for a read that failed at the file system.
    fn handle_read_error(&self, task: &TaskContext, path: &Path, err: &io::Error) {
        if err.kind() == io::ErrorKind::NotFound {
            task.push_tool_result(
                self.kind(),
                format!("File does not exist at path: {}", path.display()),
            );
            task.set_call_state(CallState::RejectedByValidation);
        } else {
            route_error(
                task,
                &self.gateway,
                self.kind(),
                &ToolFailure::Execution(err.to_string()),
            );
        }
    }
}

#[async_trait]
impl ToolHandler for ReadFileHandler {
    fn kind(&self) -> ToolKind {
        ToolKind::ReadFile
    }

    fn validate(&self, call: &ToolCall) -> Result<(), ToolFailure> {
        if call.params.get("path").is_none() {
            return Err(ToolFailure::MissingParameter("path"));
        }
        parse_range(call)?;
        Ok(())
    }

    async fn handle_partial(&self, task: &TaskContext, call: &ToolCall) {
        let path = call.params.get("path").unwrap_or_default();
        let resolved = task.cwd().join(path).display().to_string();

        let ask = ToolAsk::ReadFile {
            path: resolved.clone(),
            content: resolved,
        };
        self.gateway.preview(ASK_TOOL, ask.payload());
    }

    async fn handle_complete(&self, task: &TaskContext, call: &ToolCall) {
        // Presence and range shape were checked in `validate`.
        let Some(path) = call.params.get("path") else {
            return;
        };
        let Ok((start, end)) = parse_range(call) else {
            return;
        };
        let resolved = task.cwd().join(path);

        // Ignore policy runs before any file access. A denial is a
        // permission outcome, not a model mistake.
        if !self.ignore.allows(&resolved) {
            task.push_tool_result(
                self.kind(),
                format!(
                    "Access to {path} is blocked by the {IGNORE_FILE} file. \
                     Continue the task without this file, or ask the user to update {IGNORE_FILE}."
                ),
            );
            task.set_call_state(CallState::RejectedByValidation);
            return;
        }

        task.set_call_state(CallState::AwaitingApproval);
        let token = task.cancellation_token();
        let ask = ToolAsk::ReadFile {
            path: resolved.display().to_string(),
            content: resolved.display().to_string(),
        };
        let Some(response) = unless_cancelled(
            &token,
            self.gateway
                .request_approval(self.kind(), ASK_TOOL, ask.payload()),
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
        let read = if start.is_none() && end.is_none() {
            unless_cancelled(&token, self.read_unbounded(&resolved)).await
        } else {
            // 1-based inclusive start becomes a 0-based index; the 1-based
            // inclusive end is passed through.
            let start0 = start.map(|s| s - 1);
            let first = start.unwrap_or(1);
            unless_cancelled(&token, async {
                let content = self.workspace.read_lines(&resolved, start0, end).await?;
                Ok::<_, io::Error>(number_lines(&content, first))
            })
            .await
        };

        let Some(read) = read else { return };
        match read {
            Ok(content) => {
                if task.push_tool_result(self.kind(), content) {
                    self.telemetry.capture_tool_usage(task.id(), self.kind().name());
                    task.reset_mistakes();
                    task.set_call_state(CallState::Succeeded);
                }
            }
            Err(err) => self.handle_read_error(task, &resolved, &err),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::call::Params;

    use super::*;

    fn call_with(params: &[(&str, &str)]) -> ToolCall {
        let params = params
            .iter()
            .map(|(n, v)| ((*n).to_string(), (*v).to_string()))
            .collect::<Params>();
        ToolCall::new(ToolKind::ReadFile, params, false)
    }

    #[test]
    fn range_parses_valid_bounds() {
        let call = call_with(&[("path", "a.rs"), ("start_line", "5"), ("end_line", "10")]);
        assert_eq!(parse_range(&call).unwrap(), (Some(5), Some(10)));
    }

    #[test]
    fn range_allows_end_only() {
        let call = call_with(&[("path", "a.rs"), ("end_line", "10")]);
        assert_eq!(parse_range(&call).unwrap(), (None, Some(10)));
    }

    #[test]
    fn range_rejects_non_integers() {
        let call = call_with(&[("path", "a.rs"), ("start_line", "five")]);
        let err = parse_range(&call).unwrap_err();
        assert!(matches!(err, ToolFailure::InvalidRange(_)));
        assert!(err.to_string().contains("five"));
    }

    #[test]
    fn range_rejects_zero() {
        let call = call_with(&[("path", "a.rs"), ("start_line", "0"), ("end_line", "3")]);
        assert!(parse_range(&call).is_err());
    }

    #[test]
    fn range_rejects_start_not_below_end() {
        let call = call_with(&[("path", "a.rs"), ("start_line", "10"), ("end_line", "10")]);
        let err = parse_range(&call).unwrap_err();
        assert!(err.to_string().contains("must be less than"));

        let call = call_with(&[("path", "a.rs"), ("start_line", "11"), ("end_line", "10")]);
        assert!(parse_range(&call).is_err());
    }

    #[test]
    fn numbering_starts_at_requested_line() {
        assert_eq!(number_lines("a\nb", 1), "1 | a\n2 | b");
        assert_eq!(number_lines("x\ny\nz", 5), "5 | x\n6 | y\n7 | z");
        assert_eq!(number_lines("", 1), "");
    }
}
