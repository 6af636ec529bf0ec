//! Approval gateway: human-in-the-loop consent for side-effecting tool calls.
//!
//! Handlers talk to a lightweight [`GatewayClient`]; a [`GatewayActor`] owns
//! the pending-request bookkeeping and forwards dialogs to whatever interface
//! is registered. Partial previews are fire-and-forget and never block the
//! streaming path.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::call::ToolKind;
use crate::error::Error;

/// Configured disposition for a tool kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalPreset {
    /// Always allow without prompting.
    Allow,
    /// Always deny without prompting.
    Deny,
    /// Ask the user each time.
    #[default]
    Ask,
}

/// Per-tool auto-approval configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoApprove {
    pub list_files: ApprovalPreset,
    pub read_file: ApprovalPreset,
    pub use_mcp_tool: ApprovalPreset,
}

impl AutoApprove {
    #[must_use]
    pub const fn preset_for(&self, tool: ToolKind) -> ApprovalPreset {
        match tool {
            ToolKind::ListFiles => self.list_files,
            ToolKind::ReadFile => self.read_file,
            ToolKind::UseMcpTool => self.use_mcp_tool,
        }
    }
}

/// User's answer to an approval prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AskResponse {
    Approved,
    Denied,
}

/// Message sent to the [`GatewayActor`].
#[derive(Debug)]
pub enum GatewayMessage {
    /// Request user input. `response_tx` is absent for partial previews,
    /// which expect no answer.
    Ask {
        request_id: Uuid,
        kind: String,
        payload: String,
        is_partial: bool,
        response_tx: Option<oneshot::Sender<AskResponse>>,
    },
    /// One-way notification (e.g. an "error" or server-response event).
    Say { kind: String, text: Option<String> },
    /// Register an interface to receive dialogs and notifications.
    RegisterInterface {
        interface_tx: mpsc::UnboundedSender<InterfaceEvent>,
    },
    /// Unregister the interface, denying anything pending.
    UnregisterInterface,
}

/// Event forwarded to the UI interface.
#[derive(Debug, Clone)]
pub enum InterfaceEvent {
    ShowAsk {
        request_id: Uuid,
        kind: String,
        payload: String,
        is_partial: bool,
    },
    Notify {
        kind: String,
        text: Option<String>,
    },
}

/// Lightweight handle for handlers to request approval and emit notifications.
#[derive(Clone)]
pub struct GatewayClient {
    gateway_tx: mpsc::UnboundedSender<GatewayMessage>,
    presets: Arc<RwLock<AutoApprove>>,
}

impl GatewayClient {
    #[must_use]
    pub fn new(gateway_tx: mpsc::UnboundedSender<GatewayMessage>) -> Self {
        Self {
            gateway_tx,
            presets: Arc::new(RwLock::new(AutoApprove::default())),
        }
    }

    #[must_use]
    pub fn with_presets(
        gateway_tx: mpsc::UnboundedSender<GatewayMessage>,
        presets: AutoApprove,
    ) -> Self {
        Self {
            gateway_tx,
            presets: Arc::new(RwLock::new(presets)),
        }
    }

    /// Update the auto-approval presets (e.g. when configuration changes).
    pub fn set_presets(&self, presets: AutoApprove) {
        *self.presets.write() = presets;
    }

    /// Request approval for a fully described action.
    ///
    /// Checks the preset first: `Allow` and `Deny` short-circuit without
    /// prompting; `Ask` round-trips through the registered interface.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GatewayClosed`] if the gateway channel is gone.
    pub async fn request_approval(
        &self,
        tool: ToolKind,
        kind: &str,
        payload: String,
    ) -> Result<AskResponse, Error> {
        match self.presets.read().preset_for(tool) {
            ApprovalPreset::Allow => return Ok(AskResponse::Approved),
            ApprovalPreset::Deny => return Ok(AskResponse::Denied),
            ApprovalPreset::Ask => {}
        }

        let (response_tx, response_rx) = oneshot::channel();

        self.gateway_tx
            .send(GatewayMessage::Ask {
                request_id: Uuid::new_v4(),
                kind: kind.to_string(),
                payload,
                is_partial: false,
                response_tx: Some(response_tx),
            })
            .map_err(|_| Error::GatewayClosed)?;

        response_rx.await.map_err(|_| Error::GatewayClosed)
    }

    /// Emit a non-committal preview of a still-streaming call.
    ///
    /// Never blocks and never waits for an answer; a closed channel during
    /// shutdown is not an error worth surfacing here.
    pub fn preview(&self, kind: &str, payload: String) {
        let sent = self.gateway_tx.send(GatewayMessage::Ask {
            request_id: Uuid::new_v4(),
            kind: kind.to_string(),
            payload,
            is_partial: true,
            response_tx: None,
        });
        if sent.is_err() {
            tracing::debug!("gateway closed while sending preview");
        }
    }

    /// One-way notification to the user.
    pub fn say(&self, kind: &str, text: Option<String>) {
        let sent = self.gateway_tx.send(GatewayMessage::Say {
            kind: kind.to_string(),
            text,
        });
        if sent.is_err() {
            tracing::debug!("gateway closed while sending notification");
        }
    }
}

/// Actor that owns pending approval requests and the interface registration.
pub struct GatewayActor {
    /// Inbox for receiving gateway messages.
    pub inbox: mpsc::UnboundedReceiver<GatewayMessage>,
    interface_tx: Option<mpsc::UnboundedSender<InterfaceEvent>>,
    pending: HashMap<Uuid, oneshot::Sender<AskResponse>>,
}

impl GatewayActor {
    /// Create a new actor and the sender used to reach it.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedSender<GatewayMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                inbox: rx,
                interface_tx: None,
                pending: HashMap::new(),
            },
            tx,
        )
    }

    /// Run the actor loop until the inbox closes.
    pub async fn run(mut self) {
        while let Some(msg) = self.inbox.recv().await {
            self.handle_message(msg);
        }
    }

    /// Handle a single message.
    pub fn handle_message(&mut self, msg: GatewayMessage) {
        match msg {
            GatewayMessage::Ask {
                request_id,
                kind,
                payload,
                is_partial,
                response_tx,
            } => {
                if let Some(ref interface_tx) = self.interface_tx {
                    if let Some(tx) = response_tx {
                        self.pending.insert(request_id, tx);
                    }
                    let _ = interface_tx.send(InterfaceEvent::ShowAsk {
                        request_id,
                        kind,
                        payload,
                        is_partial,
                    });
                } else if let Some(tx) = response_tx {
                    // No interface registered: deny rather than hang.
                    let _ = tx.send(AskResponse::Denied);
                }
            }

            GatewayMessage::Say { kind, text } => {
                if let Some(ref interface_tx) = self.interface_tx {
                    let _ = interface_tx.send(InterfaceEvent::Notify { kind, text });
                }
            }

            GatewayMessage::RegisterInterface { interface_tx } => {
                self.interface_tx = Some(interface_tx);
            }

            GatewayMessage::UnregisterInterface => {
                self.interface_tx = None;
                for (_, tx) in self.pending.drain() {
                    let _ = tx.send(AskResponse::Denied);
                }
            }
        }
    }

    /// Resolve a pending approval request.
    pub fn respond(&mut self, request_id: Uuid, response: AskResponse) {
        if let Some(tx) = self.pending.remove(&request_id) {
            let _ = tx.send(response);
        }
    }
}
