use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use log::{debug, info, warn};
use tokio::time::sleep;

use deadmint_shared::{
    CrankAction, Environment, LedgerClient, LedgerError, ServerMessage, SessionInfo,
    SessionStatus, Snapshot, WireSnapshot,
};

use crate::{
    crank::{CrankEngine, CrankOutcome, CrankReport},
    delegation::{delegation_state::DelegationState, lifecycle::DelegationLifecycle},
    fan_out::FanOut,
    server::{ServerConfig, TimingConfig},
    worker::{WorkerHandle, WorkerShared},
};

/// What a single tick did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Transient read failure; the next tick retries
    FetchFailed(LedgerError),
    /// The session account does not exist (yet)
    NotFound,
    /// The snapshot's status is behind one already observed; nothing was acted on
    Stale {
        observed: SessionStatus,
        current: SessionStatus,
    },
    Observed(TickReport),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickReport {
    pub previous: Option<SessionStatus>,
    pub status: SessionStatus,
    /// Where the snapshot was read from
    pub environment: Environment,
    pub delegate_started: bool,
    pub undelegate_started: bool,
    pub crank: Option<CrankReport>,
    /// Subscribers the `state` message reached
    pub delivered: usize,
}

impl TickReport {
    pub fn transitioned(&self) -> bool {
        self.previous != Some(self.status)
    }
}

/// Owns the poll / react loop for exactly one session.
pub struct SessionWorker<L: LedgerClient> {
    info: SessionInfo,
    ledger: Arc<L>,
    timing: TimingConfig,
    status: Option<SessionStatus>,
    delegation: DelegationLifecycle<L>,
    crank: CrankEngine<L>,
    fan_out: FanOut,
    shared: Arc<WorkerShared>,
}

impl<L: LedgerClient> SessionWorker<L> {
    pub fn new(info: SessionInfo, ledger: Arc<L>, config: &ServerConfig, fan_out: FanOut) -> Self {
        let delegation =
            DelegationLifecycle::new(ledger.clone(), info.clone(), config.delegation.clone());
        let crank = CrankEngine::new(ledger.clone(), info.address, config.crank.clone());
        Self {
            info,
            ledger,
            timing: config.timing.clone(),
            status: None,
            delegation,
            crank,
            fan_out,
            shared: Arc::new(WorkerShared::new()),
        }
    }

    // Public

    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    pub fn status(&self) -> Option<SessionStatus> {
        self.status
    }

    pub fn delegation_state(&self) -> DelegationState {
        match self.delegation.state() {
            Ok(state) => state,
            Err(error) => {
                // the base ledger is always readable
                warn!("{} on {}", error, self.info.address.short());
                DelegationState::NotDelegated
            }
        }
    }

    pub fn crank(&self) -> &CrankEngine<L> {
        &self.crank
    }

    /// Fetches, reacts to what changed, cranks and publishes. Failures are
    /// logged and swallowed.
    pub async fn tick(&mut self) -> TickOutcome {
        let outcomes = self.crank.drain();
        self.publish_crank_outcomes(&outcomes);

        let short = self.info.address.short();
        let delegation = self.delegation_state();
        let environment = delegation.environment();

        let snapshot = match self
            .ledger
            .fetch_snapshot(&self.info.address, self.info.max_players, environment)
            .await
        {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                debug!("Session {} not found on {} yet", short, environment);
                return TickOutcome::NotFound;
            }
            Err(error) => {
                warn!("Fetch of {} from {} failed: {}", short, environment, error);
                return TickOutcome::FetchFailed(error);
            }
        };

        let observed = snapshot.status();
        let previous = self.status;
        if let Some(current) = previous {
            if observed < current {
                warn!(
                    "Ignoring {:?} snapshot of {} from {}, already {:?}",
                    observed, short, environment, current
                );
                return TickOutcome::Stale { observed, current };
            }
        }
        self.status = Some(observed);
        self.shared.record(observed, snapshot.tick);
        if previous != Some(observed) {
            info!(
                "Session {} status {:?} -> {:?} at tick {}",
                short, previous, observed, snapshot.tick
            );
        }

        let mut report = TickReport {
            previous,
            status: observed,
            environment,
            delegate_started: false,
            undelegate_started: false,
            crank: None,
            delivered: 0,
        };

        let entered_active =
            observed == SessionStatus::Active && previous != Some(SessionStatus::Active);
        if entered_active && delegation == DelegationState::NotDelegated {
            report.delegate_started = self.start_path(Path::Delegate, &snapshot);
        }
        if previous.is_none()
            && observed == SessionStatus::Finished
            && delegation == DelegationState::NotDelegated
        {
            if let Err(error) = self.delegation.start_adopt() {
                warn!("Could not probe delegation of {}: {}", short, error);
            }
        }
        if observed == SessionStatus::Finished && delegation == DelegationState::Delegated {
            report.undelegate_started = self.start_path(Path::Undelegate, &snapshot);
        }

        if observed == SessionStatus::Active {
            report.crank = Some(self.crank.run(&snapshot, environment));
        }

        report.delivered = self.publish_state(&snapshot, delegation.is_delegated());
        TickOutcome::Observed(report)
    }

    /// Delay before the next tick, tracking how fast the state churns.
    pub fn poll_interval(&self) -> Duration {
        match self.status {
            Some(SessionStatus::Active) if self.delegation_state().is_delegated() => {
                self.timing.active_delegated_poll
            }
            Some(SessionStatus::Active) => self.timing.active_poll,
            _ => self.timing.lobby_poll,
        }
    }

    /// Waits for in-flight crank submissions and any running delegation path.
    pub async fn settle(&mut self) -> Vec<CrankOutcome> {
        let outcomes = self.crank.settle().await;
        self.publish_crank_outcomes(&outcomes);
        self.delegation.settle().await;
        outcomes
    }

    /// Moves the worker onto its own task.
    pub fn spawn(self) -> WorkerHandle {
        let info = self.info.clone();
        let shared = self.shared.clone();
        let accessor = self.delegation.accessor();
        let task = tokio::spawn(self.run());
        WorkerHandle::new(info, shared, accessor, task)
    }

    // Private

    async fn run(mut self) {
        info!(
            "Worker started for session {} (#{})",
            self.info.address.short(),
            self.info.session_id
        );
        let stagger = self.timing.start_stagger;
        if !stagger.is_zero() {
            let ceiling = u64::try_from(stagger.as_millis()).unwrap_or(u64::MAX);
            sleep(Duration::from_millis(fastrand::u64(0..=ceiling))).await;
        }
        loop {
            self.tick().await;
            sleep(self.poll_interval()).await;
        }
    }

    fn start_path(&mut self, path: Path, snapshot: &Snapshot) -> bool {
        let players = snapshot.joined_indices();
        let started = match path {
            Path::Delegate => self.delegation.start_delegate(players),
            Path::Undelegate => self.delegation.start_undelegate(players),
        };
        match started {
            Ok(started) => started,
            Err(error) => {
                warn!(
                    "Delegation path for {} not started: {}",
                    self.info.address.short(),
                    error
                );
                false
            }
        }
    }

    fn publish_state(&self, snapshot: &Snapshot, delegated: bool) -> usize {
        let data = WireSnapshot::from_snapshot(snapshot, delegated, now_millis());
        self.publish(ServerMessage::State { data })
    }

    fn publish_crank_outcomes(&self, outcomes: &[CrankOutcome]) {
        for outcome in outcomes {
            let message = match outcome {
                CrankOutcome::Detonated { tx, .. } => ServerMessage::Crank {
                    action: CrankAction::DetonateBomb,
                    tx: Some(tx.to_string()),
                },
                CrankOutcome::EndChecked { tx } => ServerMessage::Crank {
                    action: CrankAction::CheckGameEnd,
                    tx: Some(tx.to_string()),
                },
                _ => continue,
            };
            self.publish(message);
        }
    }

    fn publish(&self, message: ServerMessage) -> usize {
        match self.fan_out.publish(&self.info.address, message) {
            Ok(delivered) => delivered,
            Err(error) => {
                warn!("Publish on {} failed: {}", self.info.address.short(), error);
                0
            }
        }
    }
}

enum Path {
    Delegate,
    Undelegate,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
