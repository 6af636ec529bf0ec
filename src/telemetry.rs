//! Telemetry seam.
//!
//! The emitting implementation lives with the host application; this core
//! only records successful tool executions, fire-and-forget.

/// Success telemetry sink.
pub trait Telemetry: Send + Sync {
    /// Record a completed (non-denied, non-errored) tool execution.
    fn capture_tool_usage(&self, task_id: &str, tool_name: &str);
}

/// Sink that drops everything.
#[derive(Debug, Default)]
pub struct NoTelemetry;

impl Telemetry for NoTelemetry {
    fn capture_tool_usage(&self, _task_id: &str, _tool_name: &str) {}
}
