//! Conduit tool-invocation core.
//!
//! Mediates between a model-driven agent and a workspace: the model emits
//! structured tool calls (list files, read a file, invoke a remote
//! capability); this crate validates, gates, executes, and reports on them.
//!
//! # Architecture
//!
//! ```text
//! parser (external)
//!        │ tool-call record
//!        ▼
//! ┌─────────────┐     ┌────────────┐
//! │ TaskContext │────▶│ Dispatcher │
//! └─────────────┘     └─────┬──────┘
//!                           │
//!                     ┌─────┴──────┐
//!                     │  Handlers  │── ignore policy
//!                     └─────┬──────┘── approval gateway
//!                           │
//!              workspace / capability hub
//! ```
//!
//! Side effects occur only after approval-gateway consent and ignore-policy
//! clearance; results are pushed back into the task's conversation log.

pub mod ask;
pub mod call;
pub mod config;
pub mod error;
pub mod gateway;
pub mod hub;
pub mod ignore_policy;
pub mod task;
pub mod telemetry;
pub mod tools;
pub mod workspace;

pub use call::{CallState, Params, ToolCall, ToolKind};
pub use config::CoreConfig;
pub use error::{Error, Result, ToolFailure};
pub use gateway::{
    ApprovalPreset, AskResponse, AutoApprove, GatewayActor, GatewayClient, GatewayMessage,
    InterfaceEvent,
};
pub use hub::{CapabilityHub, CapabilityResult, ResourceRef, ResultContent};
pub use ignore_policy::IgnorePolicy;
pub use task::{CancelOutcome, TaskContext};
pub use telemetry::{NoTelemetry, Telemetry};
pub use tools::{Dispatcher, ListFilesHandler, ReadFileHandler, ToolHandler, UseMcpHandler};
pub use workspace::{LocalWorkspace, WorkspaceOps};
