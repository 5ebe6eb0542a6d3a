use crate::{
    bomb::BombSlot,
    grid::Grid,
    player::PlayerSlot,
    session::{SessionConfig, SessionStatus},
    types::{BombIndex, PlayerIndex, Tick},
    Address,
};

/// A fully decoded, point-in-time read of a session and its player slots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub session: SessionConfig,
    pub grid: Grid,
    pub bombs: Vec<BombSlot>,
    /// One entry per slot up to `max_players`; `None` if the slot account does not exist
    pub players: Vec<Option<PlayerSlot>>,
    /// Logical clock of the environment the snapshot was read from
    pub tick: Tick,
}

impl Snapshot {
    pub fn status(&self) -> SessionStatus {
        self.session.status
    }

    pub fn player(&self, index: PlayerIndex) -> Option<&PlayerSlot> {
        self.players.get(index as usize).and_then(Option::as_ref)
    }

    pub fn player_mut(&mut self, index: PlayerIndex) -> Option<&mut PlayerSlot> {
        self.players.get_mut(index as usize).and_then(Option::as_mut)
    }

    pub fn player_index_of(&self, authority: &Address) -> Option<PlayerIndex> {
        self.joined_players()
            .find(|player| player.authority.as_ref() == Some(authority))
            .map(|player| player.index)
    }

    pub fn joined_players(&self) -> impl Iterator<Item = &PlayerSlot> {
        self.players
            .iter()
            .filter_map(Option::as_ref)
            .filter(|player| player.is_joined())
    }

    pub fn joined_indices(&self) -> Vec<PlayerIndex> {
        self.joined_players().map(|player| player.index).collect()
    }

    /// Every slot up to `max_players` has a joined player.
    pub fn all_slots_filled(&self) -> bool {
        self.joined_players().count() >= self.session.max_players as usize
    }

    pub fn alive_count(&self) -> usize {
        self.joined_players().filter(|player| player.alive).count()
    }

    pub fn free_bomb_slot(&self) -> Option<BombIndex> {
        self.bombs
            .iter()
            .find(|bomb| !bomb.active)
            .map(|bomb| bomb.index)
    }

    /// Bombs whose fuse has run out at this snapshot's tick, in slot order.
    pub fn expired_bombs(&self) -> Vec<BombIndex> {
        self.bombs
            .iter()
            .filter(|bomb| bomb.is_expired(self.tick))
            .map(|bomb| bomb.index)
            .collect()
    }
}
