use thiserror::Error;

use deadmint_shared::LedgerError;

use crate::{delegation::error::DelegationError, server::ConfigError};

/// Errors raised by the session registry and the fan-out table
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A shared table's lock was poisoned by a panicking holder
    #[error("Lock on {table} is poisoned")]
    LockPoisoned { table: &'static str },

    /// Session discovery could not read the base ledger
    #[error("Session discovery failed: {0}")]
    Discovery(#[from] LedgerError),

    #[error(transparent)]
    Delegation(#[from] DelegationError),
}

/// Top-level server errors. Only `Config` is fatal at startup.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The ledger client could not be constructed
    #[error("Failed to connect to the ledger: {0}")]
    Connect(LedgerError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
