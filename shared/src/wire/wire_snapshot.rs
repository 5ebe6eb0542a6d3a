use serde::{Deserialize, Serialize};

use crate::{
    bomb::BombSlot,
    constants::MAX_BOMBS,
    grid::Grid,
    player::PlayerSlot,
    session::{SessionConfig, SessionStatus},
    snapshot::Snapshot,
    wire::{
        error::WireError,
        number::{i64_string, u64_string},
    },
    Address,
};

/// Ledger-agnostic form of a [`Snapshot`] pushed to remote clients.
///
/// 64-bit ledger integers travel as decimal strings, addresses in their
/// canonical text form, and an unset address as `null`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSnapshot {
    pub config: WireSessionConfig,
    pub grid: WireGrid,
    pub players: Vec<WirePlayer>,
    pub bombs: Vec<WireBomb>,
    pub current_tick: u64,
    /// Milliseconds since the unix epoch when the snapshot was published
    pub timestamp: u64,
    pub delegated: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSessionConfig {
    #[serde(with = "u64_string")]
    pub game_id: u64,
    pub authority: Option<Address>,
    pub grid_width: u8,
    pub grid_height: u8,
    pub max_players: u8,
    pub current_players: u8,
    #[serde(with = "u64_string")]
    pub entry_fee: u64,
    #[serde(with = "u64_string")]
    pub prize_pool: u64,
    pub status: u8,
    pub winner: Option<Address>,
    #[serde(with = "i64_string")]
    pub created_at: i64,
    #[serde(with = "i64_string")]
    pub started_at: i64,
    pub round_duration: u16,
    pub platform_fee_bps: u16,
    #[serde(with = "u64_string")]
    pub last_detonate_tick: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireGrid {
    pub cells: Vec<u8>,
    pub powerup_types: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePlayer {
    pub authority: Option<Address>,
    pub x: u8,
    pub y: u8,
    pub alive: bool,
    #[serde(with = "u64_string")]
    pub collected: u64,
    #[serde(with = "u64_string")]
    pub wager: u64,
    pub bomb_range: u8,
    pub max_bombs: u8,
    pub active_bombs: u8,
    pub speed: u8,
    pub player_index: u8,
    #[serde(with = "u64_string")]
    pub last_move_tick: u64,
    pub kills: u8,
    pub input_nonce: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireBomb {
    pub owner: Option<Address>,
    pub x: u8,
    pub y: u8,
    pub range: u8,
    pub fuse_ticks: u8,
    #[serde(with = "u64_string")]
    pub placed_tick: u64,
    pub active: bool,
    pub detonated: bool,
    /// Slot in the session's embedded bomb array
    pub original_index: u8,
}

impl WireSnapshot {
    pub fn from_snapshot(snapshot: &Snapshot, delegated: bool, timestamp: u64) -> Self {
        let session = &snapshot.session;
        let config = WireSessionConfig {
            game_id: session.session_id,
            authority: session.authority,
            grid_width: session.grid_width,
            grid_height: session.grid_height,
            max_players: session.max_players,
            current_players: session.current_players,
            entry_fee: session.entry_fee,
            prize_pool: session.prize_pool,
            status: session.status.code(),
            winner: session.winner,
            created_at: session.created_at,
            started_at: session.started_at,
            round_duration: session.round_duration,
            platform_fee_bps: session.platform_fee_bps,
            last_detonate_tick: session.last_detonate_tick,
        };

        let grid = WireGrid {
            cells: snapshot.grid.cell_codes(),
            powerup_types: snapshot.grid.powerup_codes(),
        };

        let players = (0..session.max_players)
            .map(|index| match snapshot.player(index) {
                Some(player) => WirePlayer::from(player),
                None => WirePlayer::from(&PlayerSlot::unjoined(index)),
            })
            .collect();

        // vacant slots are not worth sending
        let bombs = snapshot
            .bombs
            .iter()
            .filter(|bomb| bomb.active || bomb.detonated)
            .map(WireBomb::from)
            .collect();

        Self {
            config,
            grid,
            players,
            bombs,
            current_tick: snapshot.tick,
            timestamp,
            delegated,
        }
    }

    pub fn into_snapshot(self) -> Result<Snapshot, WireError> {
        let config = self.config;
        let session = SessionConfig {
            session_id: config.game_id,
            authority: config.authority,
            grid_width: config.grid_width,
            grid_height: config.grid_height,
            max_players: config.max_players,
            current_players: config.current_players,
            entry_fee: config.entry_fee,
            prize_pool: config.prize_pool,
            status: SessionStatus::try_from(config.status)?,
            winner: config.winner,
            created_at: config.created_at,
            started_at: config.started_at,
            round_duration: config.round_duration,
            platform_fee_bps: config.platform_fee_bps,
            last_detonate_tick: config.last_detonate_tick,
        };

        let grid = Grid::from_codes(
            config.grid_width,
            config.grid_height,
            &self.grid.cells,
            &self.grid.powerup_types,
        )?;

        let mut bombs: Vec<BombSlot> = (0..MAX_BOMBS as u8).map(BombSlot::vacant).collect();
        for bomb in self.bombs {
            let index = bomb.original_index;
            let slot = bombs
                .get_mut(index as usize)
                .ok_or(WireError::BombIndexOutOfRange {
                    index,
                    max: MAX_BOMBS,
                })?;
            *slot = bomb.into_slot();
        }

        let mut players = Vec::with_capacity(self.players.len());
        for (position, player) in self.players.into_iter().enumerate() {
            if player.player_index as usize != position {
                return Err(WireError::PlayerIndexMismatch {
                    position,
                    index: player.player_index,
                });
            }
            players.push(player.into_slot());
        }

        Ok(Snapshot {
            session,
            grid,
            bombs,
            players,
            tick: self.current_tick,
        })
    }
}

impl From<&PlayerSlot> for WirePlayer {
    fn from(player: &PlayerSlot) -> Self {
        Self {
            authority: player.authority,
            x: player.x,
            y: player.y,
            alive: player.alive,
            collected: player.collected,
            wager: player.wager,
            bomb_range: player.bomb_range,
            max_bombs: player.max_bombs,
            active_bombs: player.active_bombs,
            speed: player.speed,
            player_index: player.index,
            last_move_tick: player.last_move_tick,
            kills: player.kills,
            input_nonce: player.input_nonce,
        }
    }
}

impl WirePlayer {
    /// An entry with no authority is an unjoined placeholder.
    fn into_slot(self) -> Option<PlayerSlot> {
        self.authority?;
        Some(PlayerSlot {
            index: self.player_index,
            authority: self.authority,
            x: self.x,
            y: self.y,
            alive: self.alive,
            collected: self.collected,
            wager: self.wager,
            bomb_range: self.bomb_range,
            max_bombs: self.max_bombs,
            active_bombs: self.active_bombs,
            speed: self.speed,
            kills: self.kills,
            last_move_tick: self.last_move_tick,
            input_nonce: self.input_nonce,
        })
    }
}

impl From<&BombSlot> for WireBomb {
    fn from(bomb: &BombSlot) -> Self {
        Self {
            owner: bomb.owner,
            x: bomb.x,
            y: bomb.y,
            range: bomb.range,
            fuse_ticks: bomb.fuse_ticks,
            placed_tick: bomb.placed_tick,
            active: bomb.active,
            detonated: bomb.detonated,
            original_index: bomb.index,
        }
    }
}

impl WireBomb {
    fn into_slot(self) -> BombSlot {
        BombSlot {
            index: self.original_index,
            active: self.active,
            detonated: self.detonated,
            owner: self.owner,
            x: self.x,
            y: self.y,
            range: self.range,
            fuse_ticks: self.fuse_ticks,
            placed_tick: self.placed_tick,
        }
    }
}
