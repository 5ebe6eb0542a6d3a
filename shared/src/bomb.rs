use crate::{
    types::{BombIndex, Tick},
    Address,
};

/// A fixed slot in the session's embedded bomb array. Reusable once detonated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BombSlot {
    pub index: BombIndex,
    pub active: bool,
    pub detonated: bool,
    pub owner: Option<Address>,
    pub x: u8,
    pub y: u8,
    pub range: u8,
    pub fuse_ticks: u8,
    pub placed_tick: Tick,
}

impl BombSlot {
    pub fn vacant(index: BombIndex) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    pub fn detonation_tick(&self) -> Tick {
        self.placed_tick.saturating_add(self.fuse_ticks as Tick)
    }

    /// Active, not yet detonated, and its fuse has run out at `current_tick`.
    pub fn is_expired(&self, current_tick: Tick) -> bool {
        self.active && !self.detonated && self.detonation_tick() <= current_tick
    }
}
