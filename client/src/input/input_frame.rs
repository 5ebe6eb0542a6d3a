use deadmint_shared::{Nonce, PlayerAction};

/// A locally predicted input waiting for the authoritative side to apply it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputFrame {
    /// Local submission order
    pub seq: u64,
    pub action: PlayerAction,
    /// The player's input nonce once this input has been applied
    pub expected_nonce: Nonce,
}

impl InputFrame {
    pub fn new(seq: u64, action: PlayerAction, expected_nonce: Nonce) -> Self {
        Self {
            seq,
            action,
            expected_nonce,
        }
    }

    /// Whether an authoritative nonce of `nonce` already reflects this input.
    pub fn is_acknowledged_by(&self, nonce: Nonce) -> bool {
        self.expected_nonce <= nonce
    }
}
