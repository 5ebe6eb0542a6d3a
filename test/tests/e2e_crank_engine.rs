/// E2E TESTS: Crank engine
///
/// Detonations for expired bombs, the session-wide cooldown, race tolerance
/// and the one-shot end-of-game check.

use std::{sync::Arc, time::Duration};

use deadmint_server::{
    should_check_end, CrankConfig, CrankEngine, CrankOutcome, FanOut, ServerConfig, SessionWorker,
};
use deadmint_shared::{
    CrankAction, Environment, Instruction, InstructionKind, LedgerError, ProgramError,
    ServerMessage, SessionInfo, SessionStatus, Snapshot,
};
use deadmint_test::{
    assert_submitted, expect_observed, player_address_of, session_address, MockLedger,
    SnapshotBuilder,
};

const SESSION_ID: u64 = 3;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn engine(ledger: &Arc<MockLedger>) -> CrankEngine<MockLedger> {
    CrankEngine::new(
        ledger.clone(),
        session_address(SESSION_ID),
        CrankConfig::default(),
    )
}

fn arena(tick: u64) -> SnapshotBuilder {
    SnapshotBuilder::new(SESSION_ID)
        .status(SessionStatus::Active)
        .player(0, 1, 1)
        .player(1, 11, 1)
        .player(2, 1, 9)
        .player(3, 11, 9)
        .tick(tick)
}

fn one_bomb(tick: u64) -> Snapshot {
    arena(tick).bomb(0, 5, 5, 100, 6).build()
}

// ============================================================================
// Expiry
// ============================================================================

#[test]
fn bomb_expires_once_fuse_has_run() {
    assert_eq!(one_bomb(107).expired_bombs(), vec![0]);
    assert_eq!(one_bomb(106).expired_bombs(), vec![0]);
    assert!(one_bomb(105).expired_bombs().is_empty());
}

#[test]
fn detonated_or_inactive_bombs_never_expire() {
    let snapshot = arena(200).detonated_bomb(1, 3, 3, 100, 6).build();
    assert!(snapshot.expired_bombs().is_empty());
}

#[tokio::test(start_paused = true)]
async fn expired_bomb_is_detonated_with_every_player_slot() {
    init();
    let ledger = Arc::new(MockLedger::new());
    let mut engine = engine(&ledger);
    let session = session_address(SESSION_ID);

    let report = engine.run(&one_bomb(107), Environment::Ephemeral);
    assert_eq!(report.detonations, vec![0]);
    engine.settle().await;

    let submissions = ledger.submissions_of(InstructionKind::DetonateBomb);
    assert_eq!(submissions.len(), 1);
    let (environment, instruction) = &submissions[0];
    assert_eq!(*environment, Environment::Ephemeral);
    assert_eq!(
        *instruction,
        Instruction::DetonateBomb {
            session,
            bomb_index: 0,
            players: (0..4).map(|index| player_address_of(&session, index)).collect(),
        }
    );
}

#[tokio::test(start_paused = true)]
async fn unexpired_bomb_is_left_alone() {
    let ledger = Arc::new(MockLedger::new());
    let mut engine = engine(&ledger);

    let report = engine.run(&one_bomb(105), Environment::Base);
    assert!(report.detonations.is_empty());
    assert!(!report.throttled);
    engine.settle().await;
    assert_submitted!(ledger, InstructionKind::DetonateBomb, 0);
}

#[tokio::test(start_paused = true)]
async fn detonations_per_tick_are_capped() {
    let ledger = Arc::new(MockLedger::new());
    let mut engine = engine(&ledger);
    let snapshot = arena(120)
        .bomb(0, 3, 3, 100, 8)
        .bomb(4, 5, 5, 100, 8)
        .bomb(9, 7, 7, 100, 8)
        .build();

    let report = engine.run(&snapshot, Environment::Base);
    assert_eq!(report.detonations, vec![0, 4]);
    engine.settle().await;
    assert_submitted!(ledger, InstructionKind::DetonateBomb, 2);
}

// ============================================================================
// Cooldown
// ============================================================================

#[tokio::test(start_paused = true)]
async fn successful_detonation_starts_cooldown() {
    init();
    let ledger = Arc::new(MockLedger::new());
    let mut engine = engine(&ledger);
    let snapshot = one_bomb(107);

    engine.run(&snapshot, Environment::Base);
    let outcomes = engine.settle().await;
    assert!(matches!(outcomes[..], [CrankOutcome::Detonated { bomb: 0, .. }]));
    assert!(engine.last_detonation().is_some());

    let report = engine.run(&snapshot, Environment::Base);
    assert!(report.throttled);
    assert!(report.detonations.is_empty());

    tokio::time::advance(Duration::from_millis(500)).await;
    let report = engine.run(&snapshot, Environment::Base);
    assert_eq!(report.detonations, vec![0]);
}

#[tokio::test(start_paused = true)]
async fn unresolved_batch_holds_next_detonation() {
    let ledger = Arc::new(MockLedger::new());
    ledger.set_submit_latency(Duration::from_millis(300));
    let mut engine = engine(&ledger);
    let snapshot = one_bomb(107);

    assert_eq!(engine.run(&snapshot, Environment::Base).detonations, vec![0]);
    let report = engine.run(&snapshot, Environment::Base);
    assert!(report.throttled);
    assert_eq!(engine.in_flight().count(), 1);

    engine.settle().await;
    assert_eq!(engine.in_flight().count(), 0);
    assert_submitted!(ledger, InstructionKind::DetonateBomb, 1);
}

#[tokio::test(start_paused = true)]
async fn detonation_races_are_dropped_with_cooldown_untouched() {
    init();
    let races = [
        ProgramError::FuseNotExpired,
        ProgramError::BombAlreadyDetonated,
        ProgramError::BombNotActive,
        ProgramError::InvalidBombIndex,
        ProgramError::GameNotActive,
    ];
    for race in races {
        let ledger = Arc::new(MockLedger::new());
        ledger.fail_next(InstructionKind::DetonateBomb, LedgerError::Rejected(race));
        let mut engine = engine(&ledger);
        let snapshot = one_bomb(107);

        engine.run(&snapshot, Environment::Base);
        let outcomes = engine.settle().await;
        assert!(matches!(outcomes[..], [CrankOutcome::DetonateFailed { .. }]));
        assert!(engine.last_detonation().is_none(), "{:?} touched the cooldown", race);
        assert_eq!(engine.in_flight().count(), 0);
        assert_eq!(engine.pending(), 0);

        // free to retry at once
        let report = engine.run(&snapshot, Environment::Base);
        assert_eq!(report.detonations, vec![0], "{:?} blocked the retry", race);
    }
}

#[tokio::test(start_paused = true)]
async fn transient_detonation_failure_is_retried() {
    let ledger = Arc::new(MockLedger::new());
    ledger.fail_next(
        InstructionKind::DetonateBomb,
        LedgerError::transient("429 Too Many Requests"),
    );
    let mut engine = engine(&ledger);
    let snapshot = one_bomb(107);

    engine.run(&snapshot, Environment::Base);
    engine.settle().await;
    assert!(engine.last_detonation().is_none());

    assert_eq!(engine.run(&snapshot, Environment::Base).detonations, vec![0]);
    engine.settle().await;
    assert_submitted!(ledger, InstructionKind::DetonateBomb, 2);
}

// ============================================================================
// End of game
// ============================================================================

fn last_one_standing() -> Snapshot {
    SnapshotBuilder::new(SESSION_ID)
        .status(SessionStatus::Active)
        .player(0, 1, 1)
        .dead_player(1, 11, 1)
        .dead_player(2, 1, 9)
        .dead_player(3, 11, 9)
        .tick(300)
        .build()
}

#[test]
fn end_check_needs_every_slot_filled() {
    assert!(should_check_end(&last_one_standing()));

    let partial = SnapshotBuilder::new(SESSION_ID)
        .status(SessionStatus::Active)
        .player(0, 1, 1)
        .dead_player(1, 11, 1)
        .build();
    assert!(!should_check_end(&partial));

    let everyone_alive = arena(10).build();
    assert!(!should_check_end(&everyone_alive));
}

#[tokio::test(start_paused = true)]
async fn end_check_is_sent_exactly_once() {
    init();
    let ledger = Arc::new(MockLedger::new());
    let mut engine = engine(&ledger);
    let snapshot = last_one_standing();

    assert!(engine.run(&snapshot, Environment::Ephemeral).end_check);
    assert!(engine.end_check_sent());
    assert!(!engine.run(&snapshot, Environment::Ephemeral).end_check);

    engine.settle().await;
    assert!(!engine.run(&snapshot, Environment::Ephemeral).end_check);
    assert_submitted!(ledger, InstructionKind::CheckEnd, 1);
}

#[tokio::test(start_paused = true)]
async fn failed_end_check_is_retried() {
    let ledger = Arc::new(MockLedger::new());
    ledger.fail_next(InstructionKind::CheckEnd, LedgerError::transient("timeout"));
    let mut engine = engine(&ledger);
    let snapshot = last_one_standing();

    assert!(engine.run(&snapshot, Environment::Base).end_check);
    engine.settle().await;
    assert!(!engine.end_check_sent());

    assert!(engine.run(&snapshot, Environment::Base).end_check);
    engine.settle().await;
    assert!(engine.end_check_sent());
    assert_submitted!(ledger, InstructionKind::CheckEnd, 2);
}

#[tokio::test(start_paused = true)]
async fn end_check_race_clears_flag_quietly() {
    init();
    let ledger = Arc::new(MockLedger::new());
    ledger.fail_next(
        InstructionKind::CheckEnd,
        LedgerError::from_failure_message("custom program error: GameNotActive"),
    );
    let mut engine = engine(&ledger);

    engine.run(&last_one_standing(), Environment::Base);
    let outcomes = engine.settle().await;
    match &outcomes[..] {
        [CrankOutcome::EndCheckFailed { error }] => {
            assert!(error.is_expected_race(InstructionKind::CheckEnd));
        }
        other => panic!("unexpected outcomes {:?}", other),
    }
    assert!(!engine.end_check_sent());
}

// ============================================================================
// Through the worker
// ============================================================================

#[tokio::test(start_paused = true)]
async fn worker_cranks_active_session_and_announces_detonation() {
    init();
    let ledger = Arc::new(MockLedger::new());
    let session = session_address(SESSION_ID);
    ledger.set_snapshot(&session, Environment::Base, one_bomb(107));
    let fan_out = FanOut::default();
    let mut subscription = fan_out.subscribe(&session).expect("subscribe");
    let info = SessionInfo::new(session, SESSION_ID, 4);
    let mut worker = SessionWorker::new(info, ledger.clone(), &ServerConfig::default(), fan_out);

    let report = expect_observed(worker.tick().await);
    let crank = report.crank.expect("active sessions are cranked");
    assert_eq!(crank.detonations, vec![0]);
    assert_eq!(report.delivered, 1);

    worker.settle().await;

    assert!(matches!(
        subscription.receiver.recv().await,
        Ok(ServerMessage::State { .. })
    ));
    match subscription.receiver.recv().await {
        Ok(ServerMessage::Crank { action, tx }) => {
            assert_eq!(action, CrankAction::DetonateBomb);
            assert!(tx.is_some());
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn lobby_session_is_not_cranked() {
    let ledger = Arc::new(MockLedger::new());
    let session = session_address(SESSION_ID);
    let lobby = SnapshotBuilder::new(SESSION_ID)
        .player(0, 1, 1)
        .bomb(0, 5, 5, 0, 1)
        .tick(50)
        .build();
    ledger.set_snapshot(&session, Environment::Base, lobby);
    let info = SessionInfo::new(session, SESSION_ID, 4);
    let mut worker =
        SessionWorker::new(info, ledger.clone(), &ServerConfig::default(), FanOut::default());

    let report = expect_observed(worker.tick().await);
    assert!(report.crank.is_none());
    worker.settle().await;
    assert_submitted!(ledger, InstructionKind::DetonateBomb, 0);
}
