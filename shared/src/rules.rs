//! # Player action rules
//!
//! The move and bomb-placement preconditions and effects the authoritative
//! program enforces, expressed over a [`Snapshot`]. Clients apply these to a
//! local copy to predict their own inputs; a rule that fails here means the
//! authoritative side would reject the same instruction.
//!
//! Every successful application increments the acting player's input nonce,
//! which is what reconciliation keys on.
//!
//! One deliberate difference: stepping onto an explosion is lethal on the
//! authoritative side, but locally it is refused as not walkable.

use thiserror::Error;

use crate::{
    bomb::BombSlot,
    constants::{
        LOOT_POOL_DIVISOR, MAX_BOMB_COUNT, MAX_BOMB_RANGE, MAX_SPEED, MIN_LOOT_AMOUNT,
    },
    grid::{CellKind, PowerupKind},
    player::Direction,
    session::SessionStatus,
    snapshot::Snapshot,
    types::{BombIndex, PlayerIndex},
};

/// Reasons a player action cannot be applied to a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RuleError {
    /// The session is not in the Active state
    #[error("Game is not active")]
    GameNotActive,

    /// No joined player occupies the given slot
    #[error("Player slot {index} is not joined")]
    PlayerNotFound { index: PlayerIndex },

    /// The acting player is dead
    #[error("Player is not alive")]
    PlayerNotAlive,

    /// The move would leave the grid
    #[error("Move out of bounds")]
    OutOfBounds,

    /// The target cell is a wall, block, bomb or live explosion
    #[error("Cell is not walkable")]
    CellNotWalkable,

    /// The player already has the maximum number of live bombs
    #[error("No bombs available")]
    NoBombsAvailable,

    /// The player's cell cannot hold a bomb
    #[error("Cell is occupied")]
    CellOccupied,

    /// Every bomb slot in the session is in use
    #[error("All bomb slots are full")]
    BombSlotsFull,
}

/// An action a player submits on their own behalf.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayerAction {
    Move(Direction),
    PlaceBomb,
}

/// Applies `action` for `player` to `snapshot` in place.
pub fn apply_action(
    snapshot: &mut Snapshot,
    player: PlayerIndex,
    action: PlayerAction,
    fuse_ticks: u8,
) -> Result<(), RuleError> {
    match action {
        PlayerAction::Move(direction) => apply_move(snapshot, player, direction),
        PlayerAction::PlaceBomb => apply_place_bomb(snapshot, player, fuse_ticks).map(|_| ()),
    }
}

pub fn apply_move(
    snapshot: &mut Snapshot,
    player: PlayerIndex,
    direction: Direction,
) -> Result<(), RuleError> {
    if snapshot.status() != SessionStatus::Active {
        return Err(RuleError::GameNotActive);
    }
    let tick = snapshot.tick;
    let prize_pool = snapshot.session.prize_pool;
    let width = snapshot.grid.width();
    let height = snapshot.grid.height();

    let slot = joined_player(snapshot, player)?;
    if !slot.alive {
        return Err(RuleError::PlayerNotAlive);
    }

    let (x, y) = (slot.x, slot.y);
    let target = match direction {
        Direction::Up => y.checked_sub(1).map(|y| (x, y)),
        Direction::Down => y.checked_add(1).filter(|y| *y < height).map(|y| (x, y)),
        Direction::Left => x.checked_sub(1).map(|x| (x, y)),
        Direction::Right => x.checked_add(1).filter(|x| *x < width).map(|x| (x, y)),
    };
    let (new_x, new_y) = target.ok_or(RuleError::OutOfBounds)?;

    let idx = snapshot
        .grid
        .index(new_x, new_y)
        .ok_or(RuleError::OutOfBounds)?;
    let cell = snapshot.grid.cell_at(idx).ok_or(RuleError::OutOfBounds)?;
    if !cell.is_walkable() {
        return Err(RuleError::CellNotWalkable);
    }
    let powerup = snapshot.grid.powerup_at(idx).unwrap_or(PowerupKind::None);

    let slot = joined_player_mut(snapshot, player)?;
    match cell {
        CellKind::Loot => {
            let amount = (prize_pool / LOOT_POOL_DIVISOR).max(MIN_LOOT_AMOUNT);
            slot.collected = slot.collected.saturating_add(amount);
        }
        CellKind::Powerup => match powerup {
            PowerupKind::BombRange => {
                slot.bomb_range = slot.bomb_range.saturating_add(1).min(MAX_BOMB_RANGE)
            }
            PowerupKind::ExtraBomb => {
                slot.max_bombs = slot.max_bombs.saturating_add(1).min(MAX_BOMB_COUNT)
            }
            PowerupKind::Speed => slot.speed = slot.speed.saturating_add(1).min(MAX_SPEED),
            PowerupKind::None => {}
        },
        _ => {}
    }
    slot.x = new_x;
    slot.y = new_y;
    slot.last_move_tick = tick;
    slot.input_nonce += 1;

    if matches!(cell, CellKind::Loot | CellKind::Powerup) {
        snapshot.grid.set_cell_at(idx, CellKind::Empty);
        snapshot.grid.clear_powerup_at(idx);
    }

    Ok(())
}

pub fn apply_place_bomb(
    snapshot: &mut Snapshot,
    player: PlayerIndex,
    fuse_ticks: u8,
) -> Result<BombIndex, RuleError> {
    if snapshot.status() != SessionStatus::Active {
        return Err(RuleError::GameNotActive);
    }
    let tick = snapshot.tick;

    let slot = joined_player(snapshot, player)?;
    if !slot.alive {
        return Err(RuleError::PlayerNotAlive);
    }
    if slot.active_bombs >= slot.max_bombs {
        return Err(RuleError::NoBombsAvailable);
    }
    let (x, y, range, owner) = (slot.x, slot.y, slot.bomb_range, slot.authority);

    let idx = snapshot.grid.index(x, y).ok_or(RuleError::OutOfBounds)?;
    let standing = snapshot.grid.cell_at(idx).ok_or(RuleError::OutOfBounds)?;
    if !standing.is_walkable() {
        return Err(RuleError::CellOccupied);
    }
    let bomb_index = snapshot.free_bomb_slot().ok_or(RuleError::BombSlotsFull)?;

    snapshot.grid.set_cell_at(idx, CellKind::Bomb);
    if let Some(bomb) = snapshot
        .bombs
        .iter_mut()
        .find(|bomb| bomb.index == bomb_index)
    {
        *bomb = BombSlot {
            index: bomb_index,
            active: true,
            detonated: false,
            owner,
            x,
            y,
            range,
            fuse_ticks,
            placed_tick: tick,
        };
    }

    let slot = joined_player_mut(snapshot, player)?;
    slot.active_bombs += 1;
    slot.input_nonce += 1;

    Ok(bomb_index)
}

fn joined_player(
    snapshot: &Snapshot,
    index: PlayerIndex,
) -> Result<&crate::player::PlayerSlot, RuleError> {
    snapshot
        .player(index)
        .filter(|player| player.is_joined())
        .ok_or(RuleError::PlayerNotFound { index })
}

fn joined_player_mut(
    snapshot: &mut Snapshot,
    index: PlayerIndex,
) -> Result<&mut crate::player::PlayerSlot, RuleError> {
    snapshot
        .player_mut(index)
        .filter(|player| player.is_joined())
        .ok_or(RuleError::PlayerNotFound { index })
}
