//! Wire shapes for the Redux-DevTools-compatible debug bridge. Mirrors
//! the extension's actual message shapes closely enough that a real
//! DevTools panel (or its relay) can consume `OutboundMessage` and
//! produce `InboundMessage` without translation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum OutboundMessage {
    #[serde(rename = "INIT")]
    Init { state: serde_json::Value },
    #[serde(rename = "ACTION")]
    Action { action: ActionPayload, state: serde_json::Value },
    /// All mutations inside one explicit `start_batch`/`end_batch`
    /// bracket, emitted as a single grouped action.
    #[serde(rename = "ACTION")]
    Batch { action: BatchedAction },
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionPayload {
    pub id: u64,
    #[serde(rename = "type")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atom_id: Option<usize>,
}

/// One or more mutations, serialized together for a batched dispatch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchedAction {
    pub actions: Vec<ActionPayload>,
    pub state: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum InboundMessage {
    #[serde(rename = "START")]
    Start,
    #[serde(rename = "STOP")]
    Stop,
    #[serde(rename = "DISPATCH")]
    Dispatch { payload: DispatchPayload },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum DispatchPayload {
    #[serde(rename = "JUMP_TO_STATE")]
    JumpToState { index: usize },
    #[serde(rename = "JUMP_TO_ACTION")]
    JumpToAction { action_id: u64 },
    #[serde(rename = "IMPORT_STATE")]
    ImportState { state: serde_json::Value, checksum: Option<String> },
    #[serde(rename = "COMMIT")]
    Commit,
    #[serde(rename = "RESET")]
    Reset,
}
