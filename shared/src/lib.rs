//! # Deadmint Shared
//! Common functionality shared between deadmint-server & deadmint-client
//! crates: the decoded session data model, the authoritative action rules
//! used for prediction, the ledger interface, and the wire form pushed to
//! clients.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod address;
mod bomb;
mod constants;
mod explosion;
mod grid;
mod ledger;
mod player;
mod rules;
mod session;
mod snapshot;
mod types;
mod wire;

pub use address::{Address, AddressError, ADDRESS_LENGTH};
pub use bomb::BombSlot;
pub use constants::{
    DEFAULT_FUSE_TICKS, EXPLOSION_DURATION_TICKS, GRID_CELLS, GRID_HEIGHT, GRID_WIDTH,
    LOOT_POOL_DIVISOR, MAX_BOMBS, MAX_BOMB_COUNT, MAX_BOMB_RANGE, MAX_PLAYERS, MAX_SPEED,
    MIN_LOOT_AMOUNT, PLAYER_SEED, SESSION_SEED, SPAWN_POSITIONS,
};
pub use explosion::ExplosionTracker;
pub use grid::{CellKind, Grid, GridError, PowerupKind};
pub use ledger::{
    error::{LedgerError, ProgramError},
    instruction::{Instruction, InstructionKind, TxRef},
    ledger_client::LedgerClient,
    seeds::{player_seeds, session_seeds},
};
pub use player::{Direction, DirectionError, PlayerSlot};
pub use rules::{apply_action, apply_move, apply_place_bomb, PlayerAction, RuleError};
pub use session::{DiscoveredSession, SessionConfig, SessionError, SessionInfo, SessionStatus};
pub use snapshot::Snapshot;
pub use types::{BombIndex, Environment, Nonce, PlayerIndex, SessionId, Tick};
pub use wire::{
    error::WireError,
    message::{CrankAction, ServerMessage},
    number::{i64_string, u64_string},
    wire_snapshot::{WireBomb, WireGrid, WirePlayer, WireSessionConfig, WireSnapshot},
};
