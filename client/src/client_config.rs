use std::default::Default;

use deadmint_shared::{Tick, DEFAULT_FUSE_TICKS, EXPLOSION_DURATION_TICKS};

/// Contains Config properties which will be used by a Client
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Ticks after which an explosion cell is treated as empty, even if the
    /// authoritative side has not cleared it yet
    pub explosion_lifetime_ticks: Tick,
    /// Fuse given to locally predicted bombs
    pub bomb_fuse_ticks: u8,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            explosion_lifetime_ticks: EXPLOSION_DURATION_TICKS,
            bomb_fuse_ticks: DEFAULT_FUSE_TICKS,
        }
    }
}
