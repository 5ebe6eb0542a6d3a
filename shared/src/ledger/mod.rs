pub mod error;
pub mod instruction;
pub mod ledger_client;
pub mod seeds;
