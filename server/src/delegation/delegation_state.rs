use std::fmt;

use deadmint_shared::Environment;

use crate::delegation::error::DelegationError;

/// Where a session's authority currently lives, as far as its worker knows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DelegationState {
    NotDelegated,
    Delegating,
    Delegated,
    Undelegating,
}

/// Inputs to the delegation state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DelegationEvent {
    BeginDelegate,
    BeginUndelegate,
    /// Ownership on the base ledger reached the requested side
    Confirmed,
    /// Submission failed or the confirmation poll timed out
    Abandoned,
}

impl Default for DelegationState {
    fn default() -> Self {
        DelegationState::NotDelegated
    }
}

impl DelegationState {
    pub fn is_delegated(self) -> bool {
        self == DelegationState::Delegated
    }

    /// A delegate or undelegate path is running.
    pub fn in_transition(self) -> bool {
        matches!(
            self,
            DelegationState::Delegating | DelegationState::Undelegating
        )
    }

    /// Only a confirmed delegation moves reads and writes to the ephemeral environment.
    pub fn environment(self) -> Environment {
        Environment::from_delegated(self.is_delegated())
    }

    /// The state after `event`. Never jumps directly between `NotDelegated` and `Delegated`.
    pub fn next(self, event: DelegationEvent) -> Result<Self, DelegationError> {
        use DelegationEvent::*;
        use DelegationState::*;

        match (self, event) {
            (NotDelegated, BeginDelegate) => Ok(Delegating),
            (Delegating, Confirmed) => Ok(Delegated),
            (Delegating, Abandoned) => Ok(NotDelegated),
            (Delegated, BeginUndelegate) => Ok(Undelegating),
            (Undelegating, Confirmed) => Ok(NotDelegated),
            (Undelegating, Abandoned) => Ok(Delegated),
            (from, event) => Err(DelegationError::IllegalTransition { from, event }),
        }
    }
}

impl fmt::Display for DelegationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DelegationState::NotDelegated => "not-delegated",
            DelegationState::Delegating => "delegating",
            DelegationState::Delegated => "delegated",
            DelegationState::Undelegating => "undelegating",
        };
        f.write_str(name)
    }
}
