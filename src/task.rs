//! Task context: conversation state, mistake tracking, and cancellation.
//!
//! One `TaskContext` lives for the duration of one agent run and is replaced
//! wholesale when a run is cancelled or a new one starts. A context that
//! failed to shut down gracefully is marked abandoned; anything still
//! completing against it becomes inert, so a slow tool call from a dead run
//! can never corrupt a fresh one.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::sync::Notify;
use tokio::time::{Instant, timeout};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::call::{CallState, ToolCall, ToolKind};
use crate::error::Error;

/// A tool result appended to the conversation log.
#[derive(Debug, Clone)]
pub struct ToolResultMessage {
    pub tool: ToolKind,
    pub text: String,
    pub ts: DateTime<Utc>,
}

/// One raw request/response exchange with the model API.
#[derive(Debug, Clone)]
pub struct ApiExchange {
    pub request: String,
    pub response: String,
    pub ts: DateTime<Utc>,
}

/// How a cancellation concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The context wound down within the grace period.
    Graceful,
    /// The grace period elapsed; the context was marked abandoned.
    Abandoned,
}

#[derive(Debug)]
struct InFlight {
    kind: ToolKind,
    state: CallState,
}

/// Owner of all per-run mutable state.
pub struct TaskContext {
    id: String,
    cwd: PathBuf,
    messages: RwLock<Vec<ToolResultMessage>>,
    api_log: RwLock<Vec<ApiExchange>>,
    consecutive_mistakes: AtomicU32,
    in_flight: Mutex<Option<InFlight>>,
    abandoned: AtomicBool,
    streaming: AtomicBool,
    abort_complete: AtomicBool,
    first_chunk_only: AtomicBool,
    cancel: CancellationToken,
    progress: Notify,
}

impl TaskContext {
    #[must_use]
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            cwd: cwd.into(),
            messages: RwLock::new(Vec::new()),
            api_log: RwLock::new(Vec::new()),
            consecutive_mistakes: AtomicU32::new(0),
            in_flight: Mutex::new(None),
            abandoned: AtomicBool::new(false),
            streaming: AtomicBool::new(false),
            abort_complete: AtomicBool::new(false),
            first_chunk_only: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            progress: Notify::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    // --- conversation and API logs -------------------------------------

    /// Append a formatted tool result to the conversation log.
    ///
    /// Returns `false` without appending if this context has been abandoned:
    /// results from a dead run must never reach the log.
    pub fn push_tool_result(&self, tool: ToolKind, text: impl Into<String>) -> bool {
        let mut messages = self.messages.write();
        if self.abandoned.load(Ordering::SeqCst) {
            return false;
        }
        messages.push(ToolResultMessage {
            tool,
            text: text.into(),
            ts: Utc::now(),
        });
        true
    }

    #[must_use]
    pub fn messages(&self) -> Vec<ToolResultMessage> {
        self.messages.read().clone()
    }

    /// Record one raw API exchange.
    pub fn log_api_exchange(&self, request: impl Into<String>, response: impl Into<String>) {
        self.api_log.write().push(ApiExchange {
            request: request.into(),
            response: response.into(),
            ts: Utc::now(),
        });
    }

    #[must_use]
    pub fn api_log(&self) -> Vec<ApiExchange> {
        self.api_log.read().clone()
    }

    // --- mistake counter -----------------------------------------------

    /// Record a validation failure; returns the new consecutive count.
    pub fn record_mistake(&self) -> u32 {
        self.consecutive_mistakes.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Reset the counter after any successful completion.
    pub fn reset_mistakes(&self) {
        self.consecutive_mistakes.store(0, Ordering::SeqCst);
    }

    #[must_use]
    pub fn mistake_count(&self) -> u32 {
        self.consecutive_mistakes.load(Ordering::SeqCst)
    }

    // --- in-flight call tracking ---------------------------------------

    /// Claim the single in-flight slot for `call`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CallInFlight`] if another call is still active; tool
    /// calls are serialized by the conversation turn and overlap is a bug in
    /// the caller.
    pub fn begin_call(&self, call: &ToolCall) -> Result<(), Error> {
        let mut slot = self.in_flight.lock();
        if slot.is_some() {
            return Err(Error::CallInFlight);
        }
        *slot = Some(InFlight {
            kind: call.kind,
            state: if call.partial {
                CallState::Streaming
            } else {
                CallState::Validating
            },
        });
        if call.partial {
            self.streaming.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    /// Update the state of the in-flight call.
    pub fn set_call_state(&self, state: CallState) {
        if let Some(slot) = self.in_flight.lock().as_mut() {
            slot.state = state;
        }
        self.progress.notify_waiters();
    }

    #[must_use]
    pub fn call_state(&self) -> Option<CallState> {
        self.in_flight.lock().as_ref().map(|s| s.state)
    }

    #[must_use]
    pub fn in_flight_tool(&self) -> Option<ToolKind> {
        self.in_flight.lock().as_ref().map(|s| s.kind)
    }

    /// Release the in-flight slot.
    pub fn finish_call(&self) {
        *self.in_flight.lock() = None;
        self.progress.notify_waiters();
    }

    // --- streaming and cancellation ------------------------------------

    /// Mark whether a response is currently streaming in.
    pub fn set_streaming(&self, streaming: bool) {
        self.streaming.store(streaming, Ordering::SeqCst);
        self.progress.notify_waiters();
    }

    /// Mark that only the first response chunk had been processed, making a
    /// full graceful shutdown unnecessary.
    pub fn set_first_chunk_only(&self, value: bool) {
        self.first_chunk_only.store(value, Ordering::SeqCst);
        self.progress.notify_waiters();
    }

    /// Mark that the abort sequence has run to completion.
    pub fn mark_abort_complete(&self) {
        self.abort_complete.store(true, Ordering::SeqCst);
        self.progress.notify_waiters();
    }

    /// Token observed by every suspend point in the pipeline.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        self.abandoned.load(Ordering::SeqCst)
    }

    /// Force-abandon without waiting. Late completions become inert.
    pub fn mark_abandoned(&self) {
        self.abandoned.store(true, Ordering::SeqCst);
    }

    /// Cancel this context cooperatively.
    ///
    /// Signals the cancellation token, then waits up to `grace` for the
    /// context to report it is no longer streaming, has finished its abort
    /// sequence, or had only processed the first response chunk. If the
    /// grace period elapses the context is marked abandoned.
    pub async fn cancel(&self, grace: Duration) -> CancelOutcome {
        self.cancel.cancel();

        let deadline = Instant::now() + grace;
        loop {
            if self.wound_down() {
                return CancelOutcome::Graceful;
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() || timeout(remaining, self.progress.notified()).await.is_err() {
                // A notification may have slipped in between the flag check
                // and the wait; look once more before giving up.
                if self.wound_down() {
                    return CancelOutcome::Graceful;
                }
                break;
            }
        }

        self.abandoned.store(true, Ordering::SeqCst);
        CancelOutcome::Abandoned
    }

    fn wound_down(&self) -> bool {
        !self.streaming.load(Ordering::SeqCst)
            || self.abort_complete.load(Ordering::SeqCst)
            || self.first_chunk_only.load(Ordering::SeqCst)
    }
}
