pub mod assertions;

pub use assertions::expect_observed;
pub use mock_ledger::{player_address_of, MockLedger};
pub use snapshot_builder::{authority_for, session_address, SnapshotBuilder};
