use thiserror::Error;

use deadmint_shared::{Address, LedgerError, RuleError, WireError};

/// Errors surfaced to the player's own input loop
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    /// No authoritative snapshot has arrived yet
    #[error("No snapshot received yet")]
    NoSnapshot,

    /// The local authority does not own a player slot in this session
    #[error("{authority} has not joined this session")]
    NotJoined { authority: Address },

    /// The action does not apply to the current predicted view
    #[error("Input rejected locally: {0}")]
    Rule(#[from] RuleError),

    /// A pushed message could not be decoded
    #[error("Malformed server message: {0}")]
    Wire(String),

    /// A direct submission (e.g. claim) failed
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<WireError> for ClientError {
    fn from(error: WireError) -> Self {
        ClientError::Wire(error.to_string())
    }
}
