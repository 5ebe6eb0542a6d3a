use std::{
    collections::HashMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use log::{info, warn};
use tokio::{task::JoinHandle, time::sleep};

use deadmint_shared::{Address, LedgerClient, SessionId, SessionInfo, SessionStatus};

use crate::{
    delegation::delegation_state::DelegationState,
    error::RegistryError,
    fan_out::FanOut,
    server::ServerConfig,
    worker::{SessionWorker, WorkerHandle},
};

/// One row of the active-session listing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSummary {
    pub address: Address,
    pub session_id: SessionId,
    pub max_players: u8,
    pub status: Option<SessionStatus>,
    pub delegation: DelegationState,
    pub cleanup_scheduled: bool,
}

struct WorkerEntry {
    handle: WorkerHandle,
    cleanup: Option<JoinHandle<()>>,
}

/// Process-wide table of running session workers.
pub struct SessionRegistry<L: LedgerClient> {
    ledger: Arc<L>,
    config: ServerConfig,
    fan_out: FanOut,
    workers: RwLock<HashMap<Address, WorkerEntry>>,
}

impl<L: LedgerClient> SessionRegistry<L> {
    pub fn new(ledger: Arc<L>, config: ServerConfig, fan_out: FanOut) -> Self {
        Self {
            ledger,
            config,
            fan_out,
            workers: RwLock::new(HashMap::new()),
        }
    }

    /// Starts a worker for `info`. Returns `false` if one is already running.
    pub fn register(&self, info: SessionInfo) -> Result<bool, RegistryError> {
        self.register_observed(info, None)
    }

    /// Like `register`, with the status the session was last seen in. The
    /// worker still treats its own first fetch as the first observation.
    pub fn register_observed(
        &self,
        info: SessionInfo,
        status: Option<SessionStatus>,
    ) -> Result<bool, RegistryError> {
        let mut workers = self.write()?;
        if workers.contains_key(&info.address) {
            return Ok(false);
        }
        let address = info.address;
        info!(
            "Registering session {} (#{}, {} players)",
            address.short(),
            info.session_id,
            info.max_players
        );
        let worker = SessionWorker::new(info, self.ledger.clone(), &self.config, self.fan_out.clone());
        let handle = worker.spawn();
        if let Some(status) = status {
            handle.seed_status(status);
        }
        workers.insert(
            address,
            WorkerEntry {
                handle,
                cleanup: None,
            },
        );
        Ok(true)
    }

    /// Stops the worker, cancels any pending cleanup and closes the session's push channel.
    pub fn unregister(&self, address: &Address) -> Result<bool, RegistryError> {
        let Some(entry) = self.write()?.remove(address) else {
            return Ok(false);
        };
        entry.handle.stop();
        if let Some(cleanup) = entry.cleanup {
            cleanup.abort();
        }
        self.fan_out.remove(address)?;
        info!("Unregistered session {}", address.short());
        Ok(true)
    }

    pub fn contains(&self, address: &Address) -> Result<bool, RegistryError> {
        Ok(self.read()?.contains_key(address))
    }

    pub fn summary(&self, address: &Address) -> Result<Option<SessionSummary>, RegistryError> {
        let workers = self.read()?;
        match workers.get(address) {
            Some(entry) => Ok(Some(summarize(entry)?)),
            None => Ok(None),
        }
    }

    pub fn list(&self) -> Result<Vec<SessionSummary>, RegistryError> {
        let workers = self.read()?;
        let mut summaries = workers
            .values()
            .map(summarize)
            .collect::<Result<Vec<_>, _>>()?;
        summaries.sort_by_key(|summary| summary.session_id);
        Ok(summaries)
    }

    pub fn active_count(&self) -> Result<usize, RegistryError> {
        Ok(self.read()?.len())
    }

    /// Unregisters `address` once `cleanup_after` has passed. Idempotent.
    pub fn schedule_cleanup(self: &Arc<Self>, address: &Address) -> Result<bool, RegistryError> {
        let mut workers = self.write()?;
        let Some(entry) = workers.get_mut(address) else {
            return Ok(false);
        };
        if entry.cleanup.is_some() {
            return Ok(false);
        }
        let delay = self.config.timing.cleanup_after;
        info!("Session {} finished, cleaning up in {:?}", address.short(), delay);

        let registry = Arc::downgrade(self);
        let address = *address;
        entry.cleanup = Some(tokio::spawn(async move {
            sleep(delay).await;
            let Some(registry) = registry.upgrade() else {
                return;
            };
            if let Err(error) = registry.unregister(&address) {
                warn!("Cleanup of {} failed: {}", address.short(), error);
            }
        }));
        Ok(true)
    }

    /// Schedules cleanup for every worker that has observed the end of its session.
    pub fn check_for_finished(self: &Arc<Self>) -> Result<usize, RegistryError> {
        let finished: Vec<Address> = self
            .read()?
            .iter()
            .filter(|(_, entry)| entry.cleanup.is_none())
            .filter(|(_, entry)| entry.handle.status().map_or(false, SessionStatus::is_over))
            .map(|(address, _)| *address)
            .collect();

        let mut scheduled = 0;
        for address in finished {
            if self.schedule_cleanup(&address)? {
                scheduled += 1;
            }
        }
        Ok(scheduled)
    }

    /// Runs `check_for_finished` every `cleanup_check_interval`.
    pub fn spawn_cleanup_loop(self: &Arc<Self>) -> JoinHandle<()> {
        let registry = Arc::downgrade(self);
        let interval = self.config.timing.cleanup_check_interval;
        tokio::spawn(async move {
            loop {
                sleep(interval).await;
                let Some(registry) = registry.upgrade() else {
                    return;
                };
                if let Err(error) = registry.check_for_finished() {
                    warn!("Cleanup check failed: {}", error);
                }
            }
        })
    }

    /// Registers every unclaimed session found on the base ledger. Returns
    /// how many new workers were started.
    pub async fn discover_and_register_all(&self) -> Result<usize, RegistryError> {
        let discovered = self.ledger.discover_sessions().await?;
        let mut registered = 0;
        for session in discovered {
            if session.status >= SessionStatus::Claimed {
                continue;
            }
            if self.register_observed(session.info, Some(session.status))? {
                registered += 1;
            }
        }
        info!("Discovered and registered {} session(s)", registered);
        Ok(registered)
    }

    /// Stops every worker.
    pub fn shutdown(&self) -> Result<(), RegistryError> {
        let addresses: Vec<Address> = self.read()?.keys().copied().collect();
        for address in addresses {
            self.unregister(&address)?;
        }
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<Address, WorkerEntry>>, RegistryError> {
        self.workers
            .read()
            .map_err(|_| RegistryError::LockPoisoned { table: "registry" })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<Address, WorkerEntry>>, RegistryError> {
        self.workers
            .write()
            .map_err(|_| RegistryError::LockPoisoned { table: "registry" })
    }
}

fn summarize(entry: &WorkerEntry) -> Result<SessionSummary, RegistryError> {
    let info = entry.handle.info();
    Ok(SessionSummary {
        address: info.address,
        session_id: info.session_id,
        max_players: info.max_players,
        status: entry.handle.status(),
        delegation: entry.handle.delegation().try_state()?,
        cleanup_scheduled: entry.cleanup.is_some(),
    })
}
