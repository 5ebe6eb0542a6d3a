use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::mpsc;

use deadmint_shared::{
    Address, Environment, Instruction, LedgerClient, LedgerError, PlayerAction, ServerMessage,
    Snapshot, TxRef,
};

use crate::{
    client_config::ClientConfig,
    client_events::{ClientEvents, InputRejection},
    error::ClientError,
    input::input_frame::InputFrame,
    reconciliation::engine::{ReconcileOutcome, ReconciliationEngine},
};

struct Submission {
    seq: u64,
    result: Result<TxRef, LedgerError>,
}

/// One player's connection to one session: predicts locally, submits in
/// the background, reconciles every pushed snapshot.
pub struct ClientSession<L: LedgerClient> {
    ledger: Arc<L>,
    session: Address,
    engine: ReconciliationEngine,
    delegated: bool,
    events: ClientEvents,
    in_flight: usize,
    submission_sender: mpsc::UnboundedSender<Submission>,
    submission_receiver: mpsc::UnboundedReceiver<Submission>,
}

impl<L: LedgerClient> ClientSession<L> {
    pub fn new(ledger: Arc<L>, session: Address, authority: Address, config: ClientConfig) -> Self {
        let (submission_sender, submission_receiver) = mpsc::unbounded_channel();
        Self {
            ledger,
            session,
            engine: ReconciliationEngine::new(authority, config),
            delegated: false,
            events: ClientEvents::new(),
            in_flight: 0,
            submission_sender,
            submission_receiver,
        }
    }

    // Public

    pub fn session(&self) -> &Address {
        &self.session
    }

    pub fn engine(&self) -> &ReconciliationEngine {
        &self.engine
    }

    pub fn predicted(&self) -> Option<&Snapshot> {
        self.engine.predicted()
    }

    /// Where player instructions go, per the latest snapshot.
    pub fn environment(&self) -> Environment {
        Environment::from_delegated(self.delegated)
    }

    /// Submissions not yet resolved.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Takes every event gathered since the last call.
    pub fn take_events(&mut self) -> ClientEvents {
        std::mem::take(&mut self.events)
    }

    /// Parses and handles one push-channel message.
    pub fn receive_text(&mut self, text: &str) -> Result<(), ClientError> {
        let message = ServerMessage::from_json(text)?;
        self.receive(message)
    }

    pub fn receive(&mut self, message: ServerMessage) -> Result<(), ClientError> {
        self.poll_submissions();
        match message {
            ServerMessage::State { data } => {
                let delegated = data.delegated;
                let snapshot = data.into_snapshot()?;
                let outcome = self.engine.reconcile(snapshot);
                if !matches!(outcome, ReconcileOutcome::Stale { .. }) {
                    self.delegated = delegated;
                }
                self.events.push_state(outcome);
            }
            ServerMessage::Crank { action, tx } => self.events.push_crank(action, tx),
            ServerMessage::Error { message } => {
                warn!("Server error on {}: {}", self.session.short(), message);
                self.events.push_error(message);
            }
        }
        Ok(())
    }

    /// Predicts `action` and submits it in the background.
    pub fn act(&mut self, action: PlayerAction) -> Result<InputFrame, ClientError> {
        self.poll_submissions();
        let frame = self.engine.predict(action)?;
        let player = self
            .engine
            .player_index()
            .ok_or(ClientError::NotJoined {
                authority: *self.engine.authority(),
            })?;

        let instruction = match action {
            PlayerAction::Move(direction) => Instruction::Move {
                session: self.session,
                player,
                direction,
            },
            PlayerAction::PlaceBomb => Instruction::PlaceBomb {
                session: self.session,
                player,
            },
        };
        let environment = self.environment();
        let ledger = self.ledger.clone();
        let sender = self.submission_sender.clone();
        let seq = frame.seq;
        self.in_flight += 1;
        tokio::spawn(async move {
            let result = ledger.submit(environment, instruction).await;
            let _ = sender.send(Submission { seq, result });
        });
        Ok(frame)
    }

    /// Applies resolved submissions without waiting. Returns how many resolved.
    pub fn poll_submissions(&mut self) -> usize {
        let mut resolved = 0;
        while let Ok(submission) = self.submission_receiver.try_recv() {
            self.resolve(submission);
            resolved += 1;
        }
        resolved
    }

    /// Waits for every in-flight submission to resolve.
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            let Some(submission) = self.submission_receiver.recv().await else {
                break;
            };
            self.resolve(submission);
        }
    }

    /// Claims the prize for the local player. Claims settle on the base ledger.
    pub async fn claim(&self) -> Result<TxRef, ClientError> {
        let player = self
            .engine
            .player_index()
            .ok_or(ClientError::NotJoined {
                authority: *self.engine.authority(),
            })?;
        let tx = self
            .ledger
            .submit(
                Environment::Base,
                Instruction::Claim {
                    session: self.session,
                    player,
                },
            )
            .await?;
        info!("Claimed {} for slot {}: {}", self.session.short(), player, tx.short());
        Ok(tx)
    }

    // Private

    fn resolve(&mut self, submission: Submission) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match submission.result {
            Ok(tx) => debug!("Input {} sent: {}", submission.seq, tx.short()),
            Err(error) => {
                let Some(frame) = self.engine.reject(submission.seq) else {
                    // already acknowledged
                    return;
                };
                warn!("Input {} rejected: {}", submission.seq, error);
                self.events.push_rejection(InputRejection { frame, error });
            }
        }
    }
}
