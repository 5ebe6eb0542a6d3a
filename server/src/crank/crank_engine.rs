use std::{collections::HashSet, sync::Arc};

use log::{debug, info, trace, warn};
use tokio::{sync::mpsc, time::Instant};

use deadmint_shared::{
    Address, BombIndex, Environment, Instruction, InstructionKind, LedgerClient, LedgerError,
    Snapshot, TxRef,
};

use crate::server::CrankConfig;

/// Result of a fire-and-forget crank submission, fed back into the engine
/// on a later tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CrankOutcome {
    Detonated {
        bomb: BombIndex,
        tx: TxRef,
        at: Instant,
    },
    DetonateFailed {
        bomb: BombIndex,
        error: LedgerError,
    },
    EndChecked {
        tx: TxRef,
    },
    EndCheckFailed {
        error: LedgerError,
    },
}

/// What one crank pass dispatched
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CrankReport {
    /// Bomb slots a detonation was sent for, in slot order
    pub detonations: Vec<BombIndex>,
    pub end_check: bool,
    /// Expired bombs held back by the cooldown or an unresolved batch
    pub throttled: bool,
}

/// Submits housekeeping instructions no player is incentivised to send.
pub struct CrankEngine<L: LedgerClient> {
    ledger: Arc<L>,
    session: Address,
    config: CrankConfig,
    last_detonation: Option<Instant>,
    end_check_sent: bool,
    in_flight: HashSet<BombIndex>,
    pending: usize,
    outcome_sender: mpsc::UnboundedSender<CrankOutcome>,
    outcome_receiver: mpsc::UnboundedReceiver<CrankOutcome>,
}

impl<L: LedgerClient> CrankEngine<L> {
    pub fn new(ledger: Arc<L>, session: Address, config: CrankConfig) -> Self {
        let (outcome_sender, outcome_receiver) = mpsc::unbounded_channel();
        Self {
            ledger,
            session,
            config,
            last_detonation: None,
            end_check_sent: false,
            in_flight: HashSet::new(),
            pending: 0,
            outcome_sender,
            outcome_receiver,
        }
    }

    // Public

    pub fn end_check_sent(&self) -> bool {
        self.end_check_sent
    }

    pub fn last_detonation(&self) -> Option<Instant> {
        self.last_detonation
    }

    pub fn in_flight(&self) -> impl Iterator<Item = &BombIndex> {
        self.in_flight.iter()
    }

    /// Submissions whose outcome has not been absorbed yet.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Inspects `snapshot` and dispatches detonate / check-end instructions to `environment`.
    pub fn run(&mut self, snapshot: &Snapshot, environment: Environment) -> CrankReport {
        let mut report = CrankReport::default();

        let expired: Vec<BombIndex> = snapshot
            .expired_bombs()
            .into_iter()
            .take(self.config.max_detonations_per_tick)
            .collect();
        if !expired.is_empty() {
            // one batch at a time; the cooldown starts when a batch lands
            if self.cooling_down() || !self.in_flight.is_empty() {
                trace!(
                    "Crank cooldown holds {} expired bomb(s) on {}",
                    expired.len(),
                    self.session.short()
                );
                report.throttled = true;
            } else {
                let players = self
                    .ledger
                    .player_addresses(&self.session, snapshot.session.max_players);
                for bomb in expired {
                    self.dispatch_detonation(bomb, players.clone(), environment);
                    report.detonations.push(bomb);
                }
            }
        }

        if !self.end_check_sent && should_check_end(snapshot) {
            self.end_check_sent = true;
            let players = self
                .ledger
                .player_addresses(&self.session, snapshot.session.max_players);
            self.dispatch_end_check(players, environment);
            report.end_check = true;
        }

        report
    }

    /// Absorbs every outcome that has already arrived, without waiting.
    pub fn drain(&mut self) -> Vec<CrankOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(outcome) = self.outcome_receiver.try_recv() {
            self.absorb(&outcome);
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Waits for every in-flight submission and absorbs its outcome.
    pub async fn settle(&mut self) -> Vec<CrankOutcome> {
        let mut outcomes = Vec::new();
        while self.pending > 0 {
            let Some(outcome) = self.outcome_receiver.recv().await else {
                break;
            };
            self.absorb(&outcome);
            outcomes.push(outcome);
        }
        outcomes
    }

    // Private

    fn cooling_down(&self) -> bool {
        match self.last_detonation {
            Some(at) => at.elapsed() < self.config.cooldown,
            None => false,
        }
    }

    fn dispatch_detonation(&mut self, bomb: BombIndex, players: Vec<Address>, environment: Environment) {
        self.in_flight.insert(bomb);
        self.pending += 1;
        debug!("Detonating bomb {} on {}", bomb, self.session.short());

        let ledger = self.ledger.clone();
        let sender = self.outcome_sender.clone();
        let instruction = Instruction::DetonateBomb {
            session: self.session,
            bomb_index: bomb,
            players,
        };
        tokio::spawn(async move {
            let outcome = match ledger.submit(environment, instruction).await {
                Ok(tx) => CrankOutcome::Detonated {
                    bomb,
                    tx,
                    at: Instant::now(),
                },
                Err(error) => CrankOutcome::DetonateFailed { bomb, error },
            };
            // the engine is gone once its worker is stopped
            let _ = sender.send(outcome);
        });
    }

    fn dispatch_end_check(&mut self, players: Vec<Address>, environment: Environment) {
        self.pending += 1;
        info!("Checking game end on {}", self.session.short());

        let ledger = self.ledger.clone();
        let sender = self.outcome_sender.clone();
        let instruction = Instruction::CheckEnd {
            session: self.session,
            players,
        };
        tokio::spawn(async move {
            let outcome = match ledger.submit(environment, instruction).await {
                Ok(tx) => CrankOutcome::EndChecked { tx },
                Err(error) => CrankOutcome::EndCheckFailed { error },
            };
            let _ = sender.send(outcome);
        });
    }

    fn absorb(&mut self, outcome: &CrankOutcome) {
        self.pending = self.pending.saturating_sub(1);
        let short = self.session.short();
        match outcome {
            CrankOutcome::Detonated { bomb, tx, at } => {
                self.in_flight.remove(bomb);
                self.last_detonation = Some(*at);
                debug!("Bomb {} on {} detonated: {}", bomb, short, tx.short());
            }
            CrankOutcome::DetonateFailed { bomb, error } => {
                self.in_flight.remove(bomb);
                if error.is_expected_race(InstructionKind::DetonateBomb) {
                    trace!("Detonation race on {} bomb {}: {}", short, bomb, error);
                } else {
                    warn!("Failed to detonate bomb {} on {}: {}", bomb, short, error);
                }
            }
            CrankOutcome::EndChecked { tx } => {
                info!("Game end checked on {}: {}", short, tx.short());
            }
            CrankOutcome::EndCheckFailed { error } => {
                self.end_check_sent = false;
                if error.is_expected_race(InstructionKind::CheckEnd) {
                    trace!("Game on {} already ended: {}", short, error);
                } else {
                    warn!("Failed to check game end on {}: {}", short, error);
                }
            }
        }
    }
}

/// Every slot is filled and at most one player is left alive.
pub fn should_check_end(snapshot: &Snapshot) -> bool {
    snapshot.all_slots_filled() && snapshot.alive_count() <= 1
}
