/// INTEGRATION TESTS: Session registry and server wiring
///
/// Workers run on their own tasks here, under paused time, so every sleep
/// below only yields until the spawned workers have ticked.

use std::{sync::Arc, time::Duration};

use tokio::time::sleep;

use deadmint_server::{
    ConfigError, FanOut, Server, ServerConfig, ServerError, SessionRegistry, SignerSource,
};
use deadmint_shared::{
    DiscoveredSession, Environment, LedgerError, ServerMessage, SessionInfo, SessionStatus,
};
use deadmint_test::{session_address, MockLedger, SnapshotBuilder};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn info(id: u64) -> SessionInfo {
    SessionInfo::new(session_address(id), id, 4)
}

fn seed(ledger: &MockLedger, id: u64, status: SessionStatus) {
    let snapshot = SnapshotBuilder::new(id).player(0, 1, 1).status(status).build();
    ledger.set_snapshot(&session_address(id), Environment::Base, snapshot);
}

fn registry(ledger: &Arc<MockLedger>) -> Arc<SessionRegistry<MockLedger>> {
    Arc::new(SessionRegistry::new(
        ledger.clone(),
        ServerConfig::default(),
        FanOut::default(),
    ))
}

/// Lets freshly spawned workers run their first tick.
async fn first_ticks() {
    sleep(Duration::from_millis(1)).await;
}

fn signed_config() -> ServerConfig {
    let keypair: Vec<u8> = (0..64).collect();
    ServerConfig {
        signer: Some(SignerSource::Base58(bs58::encode(keypair).into_string())),
        ..ServerConfig::default()
    }
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test(start_paused = true)]
async fn registering_twice_keeps_one_worker() {
    init();
    let ledger = Arc::new(MockLedger::new());
    seed(&ledger, 1, SessionStatus::Lobby);
    let registry = registry(&ledger);

    assert!(registry.register(info(1)).unwrap());
    assert!(!registry.register(info(1)).unwrap());
    assert_eq!(registry.active_count().unwrap(), 1);

    first_ticks().await;
    assert_eq!(ledger.fetches().len(), 1);
    registry.shutdown().unwrap();
}

#[tokio::test(start_paused = true)]
async fn listing_reports_observed_status() {
    init();
    let ledger = Arc::new(MockLedger::new());
    seed(&ledger, 2, SessionStatus::Lobby);
    seed(&ledger, 1, SessionStatus::Lobby);
    let registry = registry(&ledger);
    registry.register(info(2)).unwrap();
    registry.register(info(1)).unwrap();
    registry.register(info(9)).unwrap();

    first_ticks().await;
    let sessions = registry.list().unwrap();
    let ids: Vec<u64> = sessions.iter().map(|summary| summary.session_id).collect();
    assert_eq!(ids, vec![1, 2, 9]);
    assert_eq!(sessions[0].status, Some(SessionStatus::Lobby));
    // never fetched successfully
    assert_eq!(sessions[2].status, None);
    assert!(sessions.iter().all(|summary| !summary.cleanup_scheduled));
    registry.shutdown().unwrap();
}

#[tokio::test(start_paused = true)]
async fn unregister_stops_worker_and_closes_channel() {
    init();
    let ledger = Arc::new(MockLedger::new());
    seed(&ledger, 3, SessionStatus::Lobby);
    let fan_out = FanOut::default();
    let registry = Arc::new(SessionRegistry::new(
        ledger.clone(),
        ServerConfig::default(),
        fan_out.clone(),
    ));
    let session = session_address(3);
    registry.register(info(3)).unwrap();
    first_ticks().await;
    let mut subscription = fan_out.subscribe(&session).unwrap();

    assert!(registry.unregister(&session).unwrap());
    assert!(!registry.unregister(&session).unwrap());
    assert!(!registry.contains(&session).unwrap());
    assert!(subscription.receiver.recv().await.is_err());

    // no further polling once stopped
    let fetched = ledger.fetches().len();
    sleep(Duration::from_secs(120)).await;
    assert_eq!(ledger.fetches().len(), fetched);
}

// ============================================================================
// Cleanup
// ============================================================================

#[tokio::test(start_paused = true)]
async fn finished_session_is_cleaned_up_after_delay() {
    init();
    let ledger = Arc::new(MockLedger::new());
    seed(&ledger, 4, SessionStatus::Lobby);
    seed(&ledger, 5, SessionStatus::Finished);
    let registry = registry(&ledger);
    registry.register(info(4)).unwrap();
    registry.register(info(5)).unwrap();
    first_ticks().await;

    assert_eq!(registry.check_for_finished().unwrap(), 1);
    // already scheduled
    assert_eq!(registry.check_for_finished().unwrap(), 0);
    let summary = registry.summary(&session_address(5)).unwrap().unwrap();
    assert!(summary.cleanup_scheduled);

    sleep(Duration::from_secs(119)).await;
    assert!(registry.contains(&session_address(5)).unwrap());

    sleep(Duration::from_secs(2)).await;
    assert!(!registry.contains(&session_address(5)).unwrap());
    assert!(registry.contains(&session_address(4)).unwrap());
    registry.shutdown().unwrap();
}

#[tokio::test(start_paused = true)]
async fn cleanup_loop_finds_finished_sessions() {
    init();
    let ledger = Arc::new(MockLedger::new());
    seed(&ledger, 6, SessionStatus::Finished);
    let registry = registry(&ledger);
    registry.register(info(6)).unwrap();
    let cleanup_loop = registry.spawn_cleanup_loop();

    // first check at 30 s, removal 120 s later
    sleep(Duration::from_secs(31)).await;
    assert!(registry.summary(&session_address(6)).unwrap().unwrap().cleanup_scheduled);
    sleep(Duration::from_secs(121)).await;
    assert_eq!(registry.active_count().unwrap(), 0);
    cleanup_loop.abort();
}

#[tokio::test(start_paused = true)]
async fn unregistering_cancels_pending_cleanup() {
    init();
    let ledger = Arc::new(MockLedger::new());
    seed(&ledger, 7, SessionStatus::Finished);
    let registry = registry(&ledger);
    let session = session_address(7);
    registry.register(info(7)).unwrap();
    first_ticks().await;
    assert!(registry.schedule_cleanup(&session).unwrap());

    registry.unregister(&session).unwrap();
    // a fresh registration must survive the old timer
    registry.register(info(7)).unwrap();
    sleep(Duration::from_secs(121)).await;
    assert!(registry.contains(&session).unwrap());
    registry.shutdown().unwrap();
}

// ============================================================================
// Discovery
// ============================================================================

#[tokio::test(start_paused = true)]
async fn discovery_skips_claimed_sessions() {
    init();
    let ledger = Arc::new(MockLedger::new());
    ledger.set_discoverable(vec![
        DiscoveredSession {
            info: info(1),
            status: SessionStatus::Lobby,
        },
        DiscoveredSession {
            info: info(2),
            status: SessionStatus::Finished,
        },
        DiscoveredSession {
            info: info(3),
            status: SessionStatus::Claimed,
        },
    ]);
    let registry = registry(&ledger);

    assert_eq!(registry.discover_and_register_all().await.unwrap(), 2);
    assert!(!registry.contains(&session_address(3)).unwrap());
    // a second pass only adds what is new
    assert_eq!(registry.discover_and_register_all().await.unwrap(), 0);
    registry.shutdown().unwrap();
}

#[tokio::test(start_paused = true)]
async fn discovered_status_is_listed_until_first_fetch() {
    init();
    let ledger = Arc::new(MockLedger::new());
    seed(&ledger, 2, SessionStatus::Finished);
    ledger.set_discoverable(vec![
        DiscoveredSession {
            info: info(1),
            status: SessionStatus::Active,
        },
        DiscoveredSession {
            info: info(2),
            status: SessionStatus::Lobby,
        },
    ]);
    let registry = registry(&ledger);
    assert_eq!(registry.discover_and_register_all().await.unwrap(), 2);

    let statuses: Vec<_> = registry
        .list()
        .unwrap()
        .iter()
        .map(|summary| summary.status)
        .collect();
    assert_eq!(
        statuses,
        vec![Some(SessionStatus::Active), Some(SessionStatus::Lobby)]
    );

    // the worker's own observation replaces it
    first_ticks().await;
    let observed = registry.summary(&session_address(2)).unwrap().unwrap();
    assert_eq!(observed.status, Some(SessionStatus::Finished));
    let unfetched = registry.summary(&session_address(1)).unwrap().unwrap();
    assert_eq!(unfetched.status, Some(SessionStatus::Active));
    registry.shutdown().unwrap();
}

// ============================================================================
// Server
// ============================================================================

#[test]
fn bootstrap_without_signer_is_fatal() {
    let result = Server::bootstrap(ServerConfig::default(), |_, _| Ok(MockLedger::new()));
    assert!(matches!(
        result,
        Err(ServerError::Config(ConfigError::Missing { .. }))
    ));
}

#[test]
fn bootstrap_reports_connection_failure() {
    let result = Server::<MockLedger>::bootstrap(signed_config(), |_, _| {
        Err(LedgerError::transient("connection refused"))
    });
    assert!(matches!(result, Err(ServerError::Connect(_))));
}

#[tokio::test(start_paused = true)]
async fn started_server_serves_health_and_initial_state() {
    init();
    let ledger = MockLedger::new();
    seed(&ledger, 8, SessionStatus::Lobby);
    ledger.set_discoverable(vec![DiscoveredSession {
        info: info(8),
        status: SessionStatus::Lobby,
    }]);
    let mut server = Server::bootstrap(signed_config(), |endpoints, signer| {
        assert_eq!(endpoints.ephemeral_url, "https://devnet-as.magicblock.app");
        assert_eq!(signer.keypair_bytes()[0], 0);
        Ok(ledger)
    })
    .unwrap();

    assert_eq!(server.start().await.unwrap(), 1);
    first_ticks().await;

    let session = session_address(8);
    let first = server.subscribe(&session).unwrap();
    let second = server.subscribe(&session).unwrap();
    let health = server.health().unwrap();
    assert!(health.ok);
    assert_eq!(health.games, 1);
    assert_eq!(health.connections, 2);

    // late subscribers get the last state right away
    match &first.initial {
        Some(ServerMessage::State { data }) => {
            assert_eq!(data.config.game_id, 8);
            assert!(!data.delegated);
        }
        other => panic!("expected an initial state, got {:?}", other),
    }
    assert_eq!(first.initial, second.initial);

    drop(second);
    assert_eq!(server.health().unwrap().connections, 1);

    server.shutdown().unwrap();
    assert_eq!(server.health().unwrap().games, 0);
    drop(first);
}
