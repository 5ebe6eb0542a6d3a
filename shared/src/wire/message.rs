use serde::{Deserialize, Serialize};

use crate::wire::{error::WireError, wire_snapshot::WireSnapshot};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CrankAction {
    DetonateBomb,
    CheckGameEnd,
}

/// Messages pushed from a session's channel to its subscribers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Latest authoritative snapshot
    State { data: WireSnapshot },
    /// Informational only; a missing crank message does not mean the action did not happen
    Crank {
        action: CrankAction,
        tx: Option<String>,
    },
    Error { message: String },
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(text)?)
    }
}
