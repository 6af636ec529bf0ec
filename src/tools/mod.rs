//! Tool handlers and dispatch.
//!
//! Every tool implements [`ToolHandler`]; the [`Dispatcher`] owns one handler
//! per [`ToolKind`], resolved at construction so the set of tools is checked
//! at compile time rather than discovered at runtime.

mod list_files;
mod read_file;
mod use_mcp;

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub use list_files::ListFilesHandler;
pub use read_file::ReadFileHandler;
pub use use_mcp::UseMcpHandler;

use crate::call::{CallState, Params, ToolCall, ToolKind};
use crate::config::CoreConfig;
use crate::error::ToolFailure;
use crate::gateway::GatewayClient;
use crate::hub::CapabilityHub;
use crate::ignore_policy::IgnorePolicy;
use crate::task::TaskContext;
use crate::telemetry::Telemetry;
use crate::workspace::WorkspaceOps;

/// Contract every tool satisfies.
///
/// `handle` is the entry point; it routes on the call's `partial` flag. A
/// partial call may arrive many times as the stream grows, so
/// `handle_partial` must be side-effect-free and idempotent: no approval
/// round-trip, no I/O, no telemetry. A finalized call is validated first;
/// a failure is counted against the model and pushed as a friendly result,
/// and `handle_complete` is never reached. `handle_complete` owns the
/// approve → execute → report sequence and absorbs its own failures; it
/// never propagates them as crashes.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Which tool this handler serves.
    fn kind(&self) -> ToolKind;

    /// Check that required parameters are present and well-formed.
    ///
    /// # Errors
    ///
    /// Returns a [`ToolFailure`] classified as a model mistake.
    fn validate(&self, call: &ToolCall) -> Result<(), ToolFailure>;

    /// Emit a non-committal preview of a still-streaming call.
    async fn handle_partial(&self, task: &TaskContext, call: &ToolCall);

    /// Run approval and execution for a validated, finalized call.
    async fn handle_complete(&self, task: &TaskContext, call: &ToolCall);

    /// Entry point: route on the `partial` flag.
    async fn handle(&self, task: &TaskContext, call: &ToolCall) {
        if call.partial {
            task.set_call_state(CallState::Streaming);
            self.handle_partial(task, call).await;
        } else {
            task.set_streaming(false);
            task.set_call_state(CallState::Validating);
            if let Err(failure) = self.validate(call) {
                reject_invalid(task, self.kind(), &failure);
                return;
            }
            self.handle_complete(task, call).await;
        }
    }
}

/// Local handling for a validation failure: count the mistake, push one
/// friendly result naming the problem, terminate the call. No approval is
/// requested and nothing else happens.
pub(crate) fn reject_invalid(task: &TaskContext, tool: ToolKind, failure: &ToolFailure) {
    debug_assert!(failure.is_model_mistake());
    let mistakes = task.record_mistake();
    tracing::warn!(tool = %tool, mistakes, error = %failure, "tool call failed validation");
    task.push_tool_result(
        tool,
        format!("Error: {failure}. Please retry with a complete, well-formed tool call."),
    );
    task.set_call_state(CallState::RejectedByValidation);
}

/// Shared error path: log, notify, and deliberately push no tool result.
/// Execution resumes at the conversation level; no retries happen here.
pub(crate) fn route_error(
    task: &TaskContext,
    gateway: &GatewayClient,
    tool: ToolKind,
    failure: &ToolFailure,
) {
    tracing::error!(tool = %tool, error = %failure, "tool execution failed");
    gateway.say("error", Some(format!("Error executing {tool}: {failure}")));
    task.set_call_state(CallState::Errored);
}

/// Await `fut` unless the task is cancelled first.
pub(crate) async fn unless_cancelled<T>(
    token: &CancellationToken,
    fut: impl std::future::Future<Output = T> + Send,
) -> Option<T> {
    tokio::select! {
        () = token.cancelled() => None,
        value = fut => Some(value),
    }
}

/// Routes finalized tool-call records to their handlers.
pub struct Dispatcher {
    handlers: HashMap<ToolKind, Box<dyn ToolHandler>>,
}

impl Dispatcher {
    /// Build a dispatcher from explicit handlers.
    #[must_use]
    pub fn new(handlers: Vec<Box<dyn ToolHandler>>) -> Self {
        let handlers = handlers
            .into_iter()
            .map(|h| (h.kind(), h))
            .collect::<HashMap<_, _>>();
        Self { handlers }
    }

    /// Build the dispatcher with the built-in tool set, wiring each handler's
    /// collaborators at construction time.
    #[must_use]
    pub fn builtin(
        config: &CoreConfig,
        gateway: GatewayClient,
        ignore: Arc<IgnorePolicy>,
        workspace: Arc<dyn WorkspaceOps>,
        hub: Option<Weak<dyn CapabilityHub>>,
        telemetry: Arc<dyn Telemetry>,
    ) -> Self {
        Self::new(vec![
            Box::new(ListFilesHandler::new(
                gateway.clone(),
                ignore.clone(),
                workspace.clone(),
                telemetry.clone(),
                config.list_limit,
            )),
            Box::new(ReadFileHandler::new(
                gateway.clone(),
                ignore,
                workspace,
                telemetry.clone(),
                config.max_read_lines,
            )),
            Box::new(UseMcpHandler::new(gateway, hub, telemetry)),
        ])
    }

    /// Route one parsed tool-call record.
    ///
    /// An unknown tool name is logged and skipped; a model hallucinating a
    /// tool must not crash the task.
    pub async fn dispatch(&self, task: &TaskContext, name: &str, params: Params, partial: bool) {
        let Some(kind) = ToolKind::from_name(name) else {
            tracing::warn!(tool = name, "model issued unknown tool name, skipping");
            return;
        };
        let Some(handler) = self.handlers.get(&kind) else {
            tracing::warn!(tool = %kind, "no handler registered, skipping");
            return;
        };

        let call = ToolCall::new(kind, params, partial);
        if let Err(err) = task.begin_call(&call) {
            tracing::error!(tool = %kind, error = %err, "dropping overlapping tool call");
            return;
        }
        handler.handle(task, &call).await;
        task.finish_call();
    }
}
