use deadmint_server::{TickOutcome, TickReport};

/// Unwraps a tick that fetched and acted on a snapshot
pub fn expect_observed(outcome: TickOutcome) -> TickReport {
    match outcome {
        TickOutcome::Observed(report) => report,
        other => panic!("expected an observed tick, got {:?}", other),
    }
}

/// Assert how many instructions of a kind the mock ledger has recorded
#[macro_export]
macro_rules! assert_submitted {
    ($ledger:expr, $kind:expr, $count:expr) => {
        assert_eq!(
            $ledger.count($kind),
            $count,
            "expected {} {:?} submission(s), recorded: {:?}",
            $count,
            $kind,
            $ledger.submissions()
        );
    };
}
