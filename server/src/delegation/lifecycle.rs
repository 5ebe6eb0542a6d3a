use std::sync::Arc;

use log::{debug, info, trace, warn};
use tokio::{
    task::JoinHandle,
    time::{sleep, Instant},
};

use deadmint_shared::{
    player_seeds, session_seeds, Address, Environment, Instruction, LedgerClient, PlayerIndex,
    SessionInfo,
};

use crate::{
    delegation::{
        delegation_channel::{DelegationAccessor, DelegationChannel, DelegationMutator},
        delegation_state::{DelegationEvent, DelegationState},
        error::DelegationError,
    },
    server::DelegationConfig,
};

/// Migrates one session between the base ledger and the ephemeral
/// environment. Paths run as detached tasks; the tick that starts one never
/// waits for it.
pub struct DelegationLifecycle<L: LedgerClient> {
    ledger: Arc<L>,
    session: SessionInfo,
    config: DelegationConfig,
    mutator: DelegationMutator,
    accessor: DelegationAccessor,
    path: Option<JoinHandle<()>>,
}

impl<L: LedgerClient> DelegationLifecycle<L> {
    pub fn new(ledger: Arc<L>, session: SessionInfo, config: DelegationConfig) -> Self {
        let (mutator, accessor) = DelegationChannel::new_channel();
        Self {
            ledger,
            session,
            config,
            mutator,
            accessor,
            path: None,
        }
    }

    pub fn state(&self) -> Result<DelegationState, DelegationError> {
        self.mutator.try_state()
    }

    pub fn accessor(&self) -> DelegationAccessor {
        self.accessor.clone()
    }

    /// Starts the delegate path for the session account and the given joined
    /// player slots. Returns `Ok(false)` if a path is already running or the
    /// session is already delegated.
    pub fn start_delegate(&mut self, players: Vec<PlayerIndex>) -> Result<bool, DelegationError> {
        if !self.begin(DelegationEvent::BeginDelegate)? {
            return Ok(false);
        }
        info!(
            "Delegating session {} with {} player slot(s)",
            self.session.address.short(),
            players.len()
        );
        let path = run_delegate(
            self.ledger.clone(),
            self.session.clone(),
            players,
            self.config.clone(),
            self.mutator.clone(),
        );
        self.path = Some(tokio::spawn(path));
        Ok(true)
    }

    /// Checks, without submitting anything, whether a session first seen
    /// after the fact is still delegated. Lets a restarted worker undelegate
    /// a finished session it never delegated itself.
    pub fn start_adopt(&mut self) -> Result<bool, DelegationError> {
        if !self.begin(DelegationEvent::BeginDelegate)? {
            return Ok(false);
        }
        let path = run_adopt(
            self.ledger.clone(),
            self.session.address,
            self.mutator.clone(),
        );
        self.path = Some(tokio::spawn(path));
        Ok(true)
    }

    /// Starts the undelegate path. Player slots are returned before the session account.
    pub fn start_undelegate(
        &mut self,
        players: Vec<PlayerIndex>,
    ) -> Result<bool, DelegationError> {
        if !self.begin(DelegationEvent::BeginUndelegate)? {
            return Ok(false);
        }
        info!(
            "Undelegating session {} with {} player slot(s)",
            self.session.address.short(),
            players.len()
        );
        let path = run_undelegate(
            self.ledger.clone(),
            self.session.clone(),
            players,
            self.config.clone(),
            self.mutator.clone(),
        );
        self.path = Some(tokio::spawn(path));
        Ok(true)
    }

    /// Waits for the running path, if any, to finish.
    pub async fn settle(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(error) = path.await {
                warn!(
                    "Delegation path for {} did not complete: {}",
                    self.session.address.short(),
                    error
                );
            }
        }
    }

    fn begin(&self, event: DelegationEvent) -> Result<bool, DelegationError> {
        match self.mutator.try_apply(event) {
            Ok(_) => Ok(true),
            Err(DelegationError::IllegalTransition { from, .. }) => {
                debug!(
                    "Ignoring {:?} for {} while {}",
                    event,
                    self.session.address.short(),
                    from
                );
                Ok(false)
            }
            Err(error) => Err(error),
        }
    }
}

async fn run_delegate<L: LedgerClient>(
    ledger: Arc<L>,
    session: SessionInfo,
    players: Vec<PlayerIndex>,
    config: DelegationConfig,
    mutator: DelegationMutator,
) {
    let short = session.address.short();

    match ledger.is_delegated(&session.address).await {
        Ok(true) => {
            info!("Session {} is already delegated", short);
            finish(&mutator, &session.address, DelegationEvent::Confirmed);
            return;
        }
        Ok(false) => {}
        Err(error) => debug!("Ownership pre-check for {} failed: {}", short, error),
    }

    let instruction = Instruction::Delegate {
        account: session.address,
        seeds: session_seeds(session.session_id),
    };
    match ledger.submit(Environment::Base, instruction).await {
        Ok(tx) => debug!("Delegate sent for session {}: {}", short, tx.short()),
        Err(error) => {
            warn!("Failed to delegate session {}: {}", short, error);
            finish(&mutator, &session.address, DelegationEvent::Abandoned);
            return;
        }
    }

    for index in players {
        let account = ledger.player_address(&session.address, index);
        let instruction = Instruction::Delegate {
            account,
            seeds: player_seeds(&session.address, index),
        };
        if let Err(error) = ledger.submit(Environment::Base, instruction).await {
            warn!(
                "Failed to delegate player slot {} of {}: {}",
                index, short, error
            );
        }
    }

    let event = if await_ownership(&*ledger, &session.address, true, &config).await {
        info!("Session {} delegated", short);
        DelegationEvent::Confirmed
    } else {
        warn!(
            "Delegation of {} not confirmed within {:?}, staying on the base ledger",
            short, config.timeout
        );
        DelegationEvent::Abandoned
    };
    finish(&mutator, &session.address, event);
}

async fn run_adopt<L: LedgerClient>(ledger: Arc<L>, session: Address, mutator: DelegationMutator) {
    let event = match ledger.is_delegated(&session).await {
        Ok(true) => {
            info!("Adopting existing delegation of {}", session.short());
            DelegationEvent::Confirmed
        }
        Ok(false) => DelegationEvent::Abandoned,
        Err(error) => {
            debug!("Ownership probe for {} failed: {}", session.short(), error);
            DelegationEvent::Abandoned
        }
    };
    finish(&mutator, &session, event);
}

async fn run_undelegate<L: LedgerClient>(
    ledger: Arc<L>,
    session: SessionInfo,
    players: Vec<PlayerIndex>,
    config: DelegationConfig,
    mutator: DelegationMutator,
) {
    let short = session.address.short();

    let accounts = players
        .iter()
        .map(|index| ledger.player_address(&session.address, *index))
        .chain(std::iter::once(session.address));
    for account in accounts {
        if let Err(error) = ledger
            .submit(Environment::Ephemeral, Instruction::Undelegate { account })
            .await
        {
            warn!("Failed to undelegate {} of {}: {}", account.short(), short, error);
        }
    }

    let event = if await_ownership(&*ledger, &session.address, false, &config).await {
        info!("Session {} returned to the base ledger", short);
        DelegationEvent::Confirmed
    } else {
        warn!(
            "Undelegation of {} not confirmed within {:?}, will retry",
            short, config.timeout
        );
        DelegationEvent::Abandoned
    };
    finish(&mutator, &session.address, event);
}

/// Polls base-ledger ownership until it matches `delegated` or the timeout runs out.
async fn await_ownership<L: LedgerClient>(
    ledger: &L,
    account: &Address,
    delegated: bool,
    config: &DelegationConfig,
) -> bool {
    let deadline = Instant::now() + config.timeout;
    while Instant::now() < deadline {
        sleep(config.check_interval).await;
        match ledger.is_delegated(account).await {
            Ok(owned) if owned == delegated => return true,
            Ok(_) => trace!("Ownership of {} not moved yet", account.short()),
            Err(error) => debug!("Ownership check for {} failed: {}", account.short(), error),
        }
    }
    false
}

fn finish(mutator: &DelegationMutator, session: &Address, event: DelegationEvent) {
    if let Err(error) = mutator.try_apply(event) {
        warn!(
            "Could not record {:?} for session {}: {}",
            event,
            session.short(),
            error
        );
    }
}
