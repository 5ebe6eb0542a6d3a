use log::{debug, trace};

use deadmint_shared::{
    apply_action, Address, ExplosionTracker, Nonce, PlayerAction, PlayerIndex, RuleError,
    Snapshot,
};

use crate::{
    client_config::ClientConfig,
    error::ClientError,
    input::{input_buffer::InputBuffer, input_frame::InputFrame},
    reconciliation::replay::replay,
};

/// What one reconciliation pass did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The snapshot's nonce for the local player is behind one already
    /// observed; it was dropped
    Stale { nonce: Nonce, highest: Nonce },
    Reconciled {
        /// Authoritative nonce of the local player, `None` if not joined
        nonce: Option<Nonce>,
        acknowledged: usize,
        replayed: usize,
        /// Frames still waiting for acknowledgment
        pending: usize,
        /// First pending frame that no longer applies
        failed: Option<(u64, RuleError)>,
        /// Explosion cells treated as cleared in this snapshot
        explosions_cleared: usize,
    },
}

/// Prediction and reconciliation for one local player.
///
/// Confirmation is an integer comparison on the player's input nonce, never
/// position matching. The predicted view is always the latest authoritative
/// snapshot plus a replay of the inputs it does not yet reflect.
pub struct ReconciliationEngine {
    authority: Address,
    config: ClientConfig,
    buffer: InputBuffer,
    explosions: ExplosionTracker,
    authoritative: Option<Snapshot>,
    predicted: Option<Snapshot>,
    highest_nonce: Option<Nonce>,
}

impl ReconciliationEngine {
    pub fn new(authority: Address, config: ClientConfig) -> Self {
        let explosions = ExplosionTracker::new(config.explosion_lifetime_ticks);
        Self {
            authority,
            config,
            buffer: InputBuffer::new(),
            explosions,
            authoritative: None,
            predicted: None,
            highest_nonce: None,
        }
    }

    // Public

    pub fn authority(&self) -> &Address {
        &self.authority
    }

    /// Latest authoritative snapshot, with stale explosions already aged out.
    pub fn authoritative(&self) -> Option<&Snapshot> {
        self.authoritative.as_ref()
    }

    /// What the player should see.
    pub fn predicted(&self) -> Option<&Snapshot> {
        self.predicted.as_ref()
    }

    pub fn buffer(&self) -> &InputBuffer {
        &self.buffer
    }

    pub fn player_index(&self) -> Option<PlayerIndex> {
        self.authoritative
            .as_ref()
            .and_then(|snapshot| snapshot.player_index_of(&self.authority))
    }

    /// Validates `action` against the predicted view, applies it there and
    /// buffers it. The caller submits the real instruction.
    pub fn predict(&mut self, action: PlayerAction) -> Result<InputFrame, ClientError> {
        let fuse_ticks = self.config.bomb_fuse_ticks;
        let authority = self.authority;
        let predicted = self.predicted.as_mut().ok_or(ClientError::NoSnapshot)?;
        let player = predicted
            .player_index_of(&authority)
            .ok_or(ClientError::NotJoined { authority })?;

        apply_action(predicted, player, action, fuse_ticks)?;
        let slot = predicted
            .player_mut(player)
            .ok_or(ClientError::NotJoined { authority })?;
        // a stopped replay leaves buffered frames out of the view
        let expected_nonce = match self.buffer.last() {
            Some(last) => slot.input_nonce.max(last.expected_nonce + 1),
            None => slot.input_nonce,
        };
        slot.input_nonce = expected_nonce;

        let frame = self.buffer.push(action, expected_nonce);
        trace!("Predicted {:?} as frame {} (nonce {})", action, frame.seq, expected_nonce);
        Ok(frame)
    }

    /// Folds a fresh authoritative snapshot in: acknowledges confirmed
    /// frames, then replays the rest on top of it.
    pub fn reconcile(&mut self, mut snapshot: Snapshot) -> ReconcileOutcome {
        let player = snapshot.player_index_of(&self.authority);
        let nonce = player
            .and_then(|index| snapshot.player(index))
            .map(|slot| slot.input_nonce);

        if let (Some(nonce), Some(highest)) = (nonce, self.highest_nonce) {
            if nonce < highest {
                debug!("Dropping stale snapshot at nonce {} (seen {})", nonce, highest);
                return ReconcileOutcome::Stale { nonce, highest };
            }
        }

        let explosions_cleared = self.explosions.age(&mut snapshot.grid, snapshot.tick);

        let Some((player, nonce)) = player.zip(nonce) else {
            self.predicted = Some(snapshot.clone());
            self.authoritative = Some(snapshot);
            return ReconcileOutcome::Reconciled {
                nonce: None,
                acknowledged: 0,
                replayed: 0,
                pending: self.buffer.len(),
                failed: None,
                explosions_cleared,
            };
        };
        self.highest_nonce = Some(nonce);

        let acknowledged = self.buffer.acknowledge(nonce);
        let replayed = replay(&snapshot, player, self.buffer.iter(), self.config.bomb_fuse_ticks);
        if let Some((seq, error)) = &replayed.failed {
            debug!("Replay stopped at frame {}: {}", seq, error);
        }

        self.authoritative = Some(snapshot);
        self.predicted = Some(replayed.view);
        ReconcileOutcome::Reconciled {
            nonce: Some(nonce),
            acknowledged,
            replayed: replayed.applied,
            pending: self.buffer.len(),
            failed: replayed.failed,
            explosions_cleared,
        }
    }

    /// Drops a frame whose submission is known to have failed and rebuilds
    /// the predicted view without it.
    pub fn reject(&mut self, seq: u64) -> Option<InputFrame> {
        let frame = self.buffer.remove(seq)?;
        self.rebuild();
        Some(frame)
    }

    // Private

    fn rebuild(&mut self) {
        let Some(base) = self.authoritative.as_ref() else {
            return;
        };
        let Some(player) = base.player_index_of(&self.authority) else {
            self.predicted = Some(base.clone());
            return;
        };
        let replayed = replay(base, player, self.buffer.iter(), self.config.bomb_fuse_ticks);
        self.predicted = Some(replayed.view);
    }
}
