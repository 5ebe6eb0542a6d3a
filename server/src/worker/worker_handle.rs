use std::sync::{
    atomic::{AtomicU64, AtomicU8, Ordering},
    Arc,
};

use tokio::task::JoinHandle;

use deadmint_shared::{SessionInfo, SessionStatus, Tick};

use crate::delegation::delegation_channel::DelegationAccessor;

const NO_STATUS: u8 = u8::MAX;

/// Worker facts readable from outside the poll loop.
pub(crate) struct WorkerShared {
    status: AtomicU8,
    last_tick: AtomicU64,
}

impl WorkerShared {
    pub(crate) fn new() -> Self {
        Self {
            status: AtomicU8::new(NO_STATUS),
            last_tick: AtomicU64::new(0),
        }
    }

    pub(crate) fn status(&self) -> Option<SessionStatus> {
        SessionStatus::try_from(self.status.load(Ordering::Acquire)).ok()
    }

    pub(crate) fn record(&self, status: SessionStatus, tick: Tick) {
        self.status.store(status.code(), Ordering::Release);
        self.last_tick.store(tick, Ordering::Release);
    }

    /// Fills in a status known from elsewhere, unless the worker already
    /// observed one.
    pub(crate) fn seed(&self, status: SessionStatus) {
        let _ = self.status.compare_exchange(
            NO_STATUS,
            status.code(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    pub(crate) fn last_tick(&self) -> Tick {
        self.last_tick.load(Ordering::Acquire)
    }
}

/// The registry's grip on a running worker. Stopping cancels the next tick
/// only; in-flight submissions and delegation polls finish on their own.
pub struct WorkerHandle {
    info: SessionInfo,
    shared: Arc<WorkerShared>,
    delegation: DelegationAccessor,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    pub(crate) fn new(
        info: SessionInfo,
        shared: Arc<WorkerShared>,
        delegation: DelegationAccessor,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            info,
            shared,
            delegation,
            task,
        }
    }

    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    /// Last status the worker observed. Before its first successful fetch this
    /// is the status the session was discovered with, if any.
    pub fn status(&self) -> Option<SessionStatus> {
        self.shared.status()
    }

    pub(crate) fn seed_status(&self, status: SessionStatus) {
        self.shared.seed(status);
    }

    pub fn last_tick(&self) -> Tick {
        self.shared.last_tick()
    }

    pub fn delegation(&self) -> &DelegationAccessor {
        &self.delegation
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}
