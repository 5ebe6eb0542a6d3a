use std::sync::{Arc, RwLock};

use crate::delegation::{
    delegation_state::{DelegationEvent, DelegationState},
    error::DelegationError,
};

// DelegationChannel
#[derive(Clone)]
pub(crate) struct DelegationChannel {
    data: Arc<RwLock<DelegationData>>,
}

impl DelegationChannel {
    pub(crate) fn new_channel() -> (DelegationMutator, DelegationAccessor) {
        let channel = Self {
            data: Arc::new(RwLock::new(DelegationData::new())),
        };

        let mutator = DelegationMutator::new(&channel);
        let accessor = DelegationAccessor::new(&channel);

        (mutator, accessor)
    }

    /// Get the delegation state (panicking version)
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    /// Consider using `try_state` for non-panicking error handling.
    fn state(&self) -> DelegationState {
        self.try_state()
            .expect("Lock on DelegationState is held by current thread.")
    }

    /// Get the delegation state (non-panicking version)
    ///
    /// Returns an error if the lock is poisoned.
    fn try_state(&self) -> Result<DelegationState, DelegationError> {
        let data = self
            .data
            .as_ref()
            .read()
            .map_err(|_| DelegationError::LockPoisoned)?;
        Ok(data.state)
    }

    fn transitions(&self) -> Result<u64, DelegationError> {
        let data = self
            .data
            .as_ref()
            .read()
            .map_err(|_| DelegationError::LockPoisoned)?;
        Ok(data.transitions)
    }

    /// Apply an event atomically, returning the new state.
    fn try_apply(&self, event: DelegationEvent) -> Result<DelegationState, DelegationError> {
        let mut data = self
            .data
            .as_ref()
            .write()
            .map_err(|_| DelegationError::LockPoisoned)?;
        data.apply(event)
    }
}

// DelegationData
struct DelegationData {
    state: DelegationState,
    transitions: u64,
}

impl DelegationData {
    fn new() -> Self {
        Self {
            state: DelegationState::NotDelegated,
            transitions: 0,
        }
    }

    fn apply(&mut self, event: DelegationEvent) -> Result<DelegationState, DelegationError> {
        let next = self.state.next(event)?;
        self.state = next;
        self.transitions += 1;
        Ok(next)
    }
}

// DelegationAccessor
/// Read-only view of a worker's delegation state, shared with the registry.
#[derive(Clone)]
pub struct DelegationAccessor {
    channel: DelegationChannel,
}

impl DelegationAccessor {
    fn new(channel: &DelegationChannel) -> Self {
        Self {
            channel: channel.clone(),
        }
    }

    /// Get the delegation state (panicking version)
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    /// Consider using `try_state` for non-panicking error handling.
    pub fn state(&self) -> DelegationState {
        self.channel.state()
    }

    /// Get the delegation state (non-panicking version)
    ///
    /// Returns an error if the lock is poisoned.
    pub fn try_state(&self) -> Result<DelegationState, DelegationError> {
        self.channel.try_state()
    }

    /// Number of state changes applied so far.
    pub fn transitions(&self) -> Result<u64, DelegationError> {
        self.channel.transitions()
    }
}

// DelegationMutator
/// The worker holds one of these; each running delegate / undelegate path
/// holds a clone until it reports `Confirmed` or `Abandoned`.
#[derive(Clone)]
pub(crate) struct DelegationMutator {
    channel: DelegationChannel,
}

impl DelegationMutator {
    fn new(channel: &DelegationChannel) -> Self {
        Self {
            channel: channel.clone(),
        }
    }

    pub(crate) fn try_state(&self) -> Result<DelegationState, DelegationError> {
        self.channel.try_state()
    }

    /// Apply an event (non-panicking version)
    ///
    /// Returns an error if the lock is poisoned or the transition is illegal.
    pub(crate) fn try_apply(
        &self,
        event: DelegationEvent,
    ) -> Result<DelegationState, DelegationError> {
        self.channel.try_apply(event)
    }
}
