/// E2E TESTS: Client reconciliation
///
/// Local prediction keyed on the player's input nonce: frames are confirmed
/// by integer comparison, the rest are replayed on every fresh snapshot.

use deadmint_client::{ClientConfig, ClientError, ReconcileOutcome, ReconciliationEngine};
use deadmint_shared::{
    CellKind, Direction, PlayerAction, RuleError, SessionStatus, Snapshot,
};
use deadmint_test::{authority_for, SnapshotBuilder};

const SESSION_ID: u64 = 11;

fn engine() -> ReconciliationEngine {
    ReconciliationEngine::new(authority_for(0), ClientConfig::default())
}

/// Local player in slot 0 at (x, 1) with the given nonce.
fn at(x: u8, nonce: u64) -> SnapshotBuilder {
    SnapshotBuilder::new(SESSION_ID)
        .status(SessionStatus::Active)
        .player(0, x, 1)
        .player(1, 11, 9)
        .nonce(0, nonce)
        .tick(40)
}

fn position(snapshot: &Snapshot) -> (u8, u8, u64) {
    let slot = snapshot.player(0).expect("local player");
    (slot.x, slot.y, slot.input_nonce)
}

fn right() -> PlayerAction {
    PlayerAction::Move(Direction::Right)
}

// ============================================================================
// Acknowledgment
// ============================================================================

#[test]
fn single_input_acknowledged_by_next_nonce() {
    let mut engine = engine();
    engine.reconcile(at(1, 5).build());

    let frame = engine.predict(right()).expect("move applies");
    assert_eq!(frame.expected_nonce, 6);
    assert_eq!(position(engine.predicted().unwrap()), (2, 1, 6));

    let outcome = engine.reconcile(at(2, 6).build());
    assert_eq!(
        outcome,
        ReconcileOutcome::Reconciled {
            nonce: Some(6),
            acknowledged: 1,
            replayed: 0,
            pending: 0,
            failed: None,
            explosions_cleared: 0,
        }
    );
    assert!(engine.buffer().is_empty());
    assert_eq!(engine.predicted(), engine.authoritative());
}

#[test]
fn unacknowledged_inputs_are_replayed_on_fresh_snapshot() {
    let mut engine = engine();
    engine.reconcile(at(1, 5).build());
    for expected in 6..=8 {
        let frame = engine.predict(right()).expect("move applies");
        assert_eq!(frame.expected_nonce, expected);
    }

    let outcome = engine.reconcile(at(2, 6).build());
    match outcome {
        ReconcileOutcome::Reconciled {
            acknowledged,
            replayed,
            pending,
            ..
        } => {
            assert_eq!(acknowledged, 1);
            assert_eq!(replayed, 2);
            assert_eq!(pending, 2);
        }
        other => panic!("unexpected {:?}", other),
    }
    let remaining: Vec<u64> = engine.buffer().iter().map(|frame| frame.expected_nonce).collect();
    assert_eq!(remaining, vec![7, 8]);
    assert_eq!(position(engine.predicted().unwrap()), (4, 1, 8));
    assert_eq!(position(engine.authoritative().unwrap()), (2, 1, 6));
}

#[test]
fn nonce_jump_acknowledges_everything_at_or_below() {
    let mut engine = engine();
    engine.reconcile(at(1, 0).build());
    for _ in 0..3 {
        engine.predict(right()).expect("move applies");
    }

    // the authority applied all three between two snapshots
    engine.reconcile(at(4, 3).build());
    assert!(engine.buffer().is_empty());
    assert_eq!(position(engine.predicted().unwrap()), (4, 1, 3));
}

#[test]
fn position_is_never_used_for_confirmation() {
    let mut engine = engine();
    engine.reconcile(at(1, 0).build());
    engine.predict(right()).expect("move applies");

    // the player ended up where the prediction put them, but the nonce has not moved
    engine.reconcile(at(2, 0).build());
    assert_eq!(engine.buffer().len(), 1);
}

// ============================================================================
// Replay failure and rejection
// ============================================================================

#[test]
fn replay_stops_at_first_frame_that_no_longer_applies() {
    let mut engine = engine();
    engine.reconcile(at(1, 0).build());
    let first = engine.predict(right()).expect("move applies");
    engine.predict(right()).expect("move applies");

    let blocked = at(1, 0).cell(2, 1, CellKind::Block).build();
    let outcome = engine.reconcile(blocked);
    match outcome {
        ReconcileOutcome::Reconciled {
            replayed,
            pending,
            failed,
            ..
        } => {
            assert_eq!(replayed, 0);
            assert_eq!(pending, 2);
            assert_eq!(failed, Some((first.seq, RuleError::CellNotWalkable)));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(position(engine.predicted().unwrap()), (1, 1, 0));
}

#[test]
fn input_after_stopped_replay_takes_next_free_nonce() {
    let mut engine = engine();
    engine.reconcile(at(1, 0).build());
    engine.predict(right()).expect("move applies");
    engine.predict(right()).expect("move applies");
    engine.reconcile(at(1, 0).cell(2, 1, CellKind::Block).build());

    let frame = engine
        .predict(PlayerAction::Move(Direction::Down))
        .expect("move applies");
    assert_eq!(frame.expected_nonce, 3);
    let nonces: Vec<u64> = engine.buffer().iter().map(|frame| frame.expected_nonce).collect();
    assert_eq!(nonces, vec![1, 2, 3]);
    assert_eq!(position(engine.predicted().unwrap()), (1, 2, 3));

    // nonce 1 must not confirm the newest input
    engine.reconcile(at(1, 1).build());
    assert_eq!(engine.buffer().len(), 2);
}

#[test]
fn rejected_frame_is_removed_and_view_rebuilt() {
    let mut engine = engine();
    engine.reconcile(at(1, 0).build());
    let first = engine.predict(right()).expect("move applies");
    let second = engine.predict(PlayerAction::PlaceBomb).expect("bomb applies");
    assert_eq!(position(engine.predicted().unwrap()), (2, 1, 2));

    assert_eq!(engine.reject(first.seq), Some(first));
    assert_eq!(engine.reject(first.seq), None);

    let remaining: Vec<(u64, u64)> = engine
        .buffer()
        .iter()
        .map(|frame| (frame.seq, frame.expected_nonce))
        .collect();
    assert_eq!(remaining, vec![(second.seq, 1)]);
    let predicted = engine.predicted().unwrap();
    assert_eq!(position(predicted), (1, 1, 1));
    assert_eq!(predicted.grid.cell(1, 1), Some(CellKind::Bomb));

    // the bomb lands at nonce 1 and is not replayed again
    let landed = at(1, 1).cell(1, 1, CellKind::Bomb).build();
    engine.reconcile(landed);
    assert!(engine.buffer().is_empty());
    assert_eq!(position(engine.predicted().unwrap()), (1, 1, 1));
}

// ============================================================================
// Stale snapshots
// ============================================================================

#[test]
fn snapshot_with_lower_nonce_is_dropped() {
    let mut engine = engine();
    engine.reconcile(at(3, 6).build());

    let outcome = engine.reconcile(at(1, 5).build());
    assert_eq!(outcome, ReconcileOutcome::Stale { nonce: 5, highest: 6 });
    assert_eq!(position(engine.authoritative().unwrap()), (3, 1, 6));
}

#[test]
fn equal_nonce_snapshot_still_applies() {
    let mut engine = engine();
    engine.reconcile(at(3, 6).tick(40).build());
    let outcome = engine.reconcile(at(3, 6).tick(41).build());
    assert!(matches!(outcome, ReconcileOutcome::Reconciled { .. }));
    assert_eq!(engine.authoritative().unwrap().tick, 41);
}

// ============================================================================
// Explosion aging
// ============================================================================

#[test]
fn aged_explosion_becomes_walkable() {
    let mut engine = engine();
    let with_blast = |tick| at(1, 0).cell(2, 1, CellKind::Explosion).tick(tick).build();

    engine.reconcile(with_blast(10));
    assert_eq!(
        engine.predict(right()),
        Err(ClientError::Rule(RuleError::CellNotWalkable))
    );

    engine.reconcile(with_blast(14));
    assert!(engine.predict(right()).is_err());

    let outcome = engine.reconcile(with_blast(15));
    assert!(matches!(
        outcome,
        ReconcileOutcome::Reconciled {
            explosions_cleared: 1,
            ..
        }
    ));
    assert_eq!(
        engine.authoritative().unwrap().grid.cell(2, 1),
        Some(CellKind::Empty)
    );
    assert!(engine.predict(right()).is_ok());
}

// ============================================================================
// Local errors
// ============================================================================

#[test]
fn predict_before_any_snapshot() {
    let mut engine = engine();
    assert_eq!(engine.predict(right()), Err(ClientError::NoSnapshot));
}

#[test]
fn predict_for_unjoined_authority() {
    let mut engine = ReconciliationEngine::new(authority_for(3), ClientConfig::default());
    let outcome = engine.reconcile(at(1, 0).build());
    assert!(matches!(
        outcome,
        ReconcileOutcome::Reconciled { nonce: None, .. }
    ));
    assert_eq!(
        engine.predict(right()),
        Err(ClientError::NotJoined {
            authority: authority_for(3)
        })
    );
}

#[test]
fn predict_outside_active_game() {
    let mut engine = engine();
    engine.reconcile(at(1, 0).status(SessionStatus::Lobby).build());
    assert_eq!(
        engine.predict(right()),
        Err(ClientError::Rule(RuleError::GameNotActive))
    );
    assert!(engine.buffer().is_empty());
}
