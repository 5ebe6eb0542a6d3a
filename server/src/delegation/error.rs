use thiserror::Error;

use crate::delegation::delegation_state::{DelegationEvent, DelegationState};

/// Errors that can occur when driving a session's delegation state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DelegationError {
    /// The event is not valid from the current state (e.g. a second delegate trigger)
    #[error("Delegation cannot go from {from} on {event:?}")]
    IllegalTransition {
        from: DelegationState,
        event: DelegationEvent,
    },

    /// The lock guarding the delegation state was poisoned
    #[error("Delegation state lock is poisoned")]
    LockPoisoned,
}
