// Mirrors the authoritative program's layout.

pub const GRID_WIDTH: u8 = 13;
pub const GRID_HEIGHT: u8 = 11;
pub const GRID_CELLS: usize = 143;
pub const MAX_BOMBS: usize = 12;
pub const MAX_PLAYERS: u8 = 4;

/// Ticks an explosion cell stays visible / lethal before it is treated as empty.
pub const EXPLOSION_DURATION_TICKS: u64 = 5;
pub const DEFAULT_FUSE_TICKS: u8 = 8;

pub const MAX_BOMB_RANGE: u8 = 5;
pub const MAX_BOMB_COUNT: u8 = 3;
pub const MAX_SPEED: u8 = 3;

pub const LOOT_POOL_DIVISOR: u64 = 50;
pub const MIN_LOOT_AMOUNT: u64 = 1_000;

pub const SPAWN_POSITIONS: [(u8, u8); 4] = [(1, 1), (11, 1), (1, 9), (11, 9)];

pub const SESSION_SEED: &[u8] = b"game";
pub const PLAYER_SEED: &[u8] = b"player";
