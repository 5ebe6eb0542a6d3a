//! # Deadmint Server
//! Runs one worker per registered session: polls authoritative state,
//! migrates the session between the base ledger and the ephemeral
//! environment, cranks expired bombs and game end, and fans each snapshot
//! out to subscribed clients.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use deadmint_shared::{
        Address, Environment, Instruction, InstructionKind, LedgerClient, LedgerError,
        ServerMessage, SessionInfo, SessionStatus, Snapshot, TxRef,
    };
}

mod crank;
mod delegation;
mod error;
mod fan_out;
mod registry;
mod server;
mod worker;

pub use crank::{should_check_end, CrankEngine, CrankOutcome, CrankReport};
pub use delegation::{
    delegation_channel::DelegationAccessor,
    delegation_state::{DelegationEvent, DelegationState},
    error::DelegationError,
    lifecycle::DelegationLifecycle,
};
pub use error::{RegistryError, ServerError};
pub use fan_out::{FanOut, Subscription};
pub use registry::{SessionRegistry, SessionSummary};
pub use server::{
    ConfigError, CrankConfig, CrankSigner, DelegationConfig, HealthReport, LedgerEndpoints,
    Server, ServerConfig, SignerSource, TimingConfig,
};
pub use worker::{SessionWorker, TickOutcome, TickReport, WorkerHandle};
