use thiserror::Error;

use crate::{
    types::{Nonce, PlayerIndex, Tick},
    Address,
};

/// Errors that can occur when decoding a direction code
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectionError {
    /// Direction code outside 0..=3
    #[error("Invalid direction code {code} (must be 0-3)")]
    InvalidCode { code: u8 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn code(self) -> u8 {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }
}

impl TryFrom<u8> for Direction {
    type Error = DirectionError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Direction::Up),
            1 => Ok(Direction::Down),
            2 => Ok(Direction::Left),
            3 => Ok(Direction::Right),
            code => Err(DirectionError::InvalidCode { code }),
        }
    }
}

/// One player-slot account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerSlot {
    pub index: PlayerIndex,
    /// `None` while the slot is unjoined
    pub authority: Option<Address>,
    pub x: u8,
    pub y: u8,
    pub alive: bool,
    pub collected: u64,
    pub wager: u64,
    pub bomb_range: u8,
    pub max_bombs: u8,
    pub active_bombs: u8,
    pub speed: u8,
    pub kills: u8,
    pub last_move_tick: Tick,
    /// Incremented exactly once per applied move or bomb placement.
    pub input_nonce: Nonce,
}

impl PlayerSlot {
    /// The placeholder the wire form uses for a slot with no account.
    pub fn unjoined(index: PlayerIndex) -> Self {
        Self {
            index,
            authority: None,
            x: 0,
            y: 0,
            alive: false,
            collected: 0,
            wager: 0,
            bomb_range: 0,
            max_bombs: 0,
            active_bombs: 0,
            speed: 0,
            kills: 0,
            last_move_tick: 0,
            input_nonce: 0,
        }
    }

    pub fn is_joined(&self) -> bool {
        self.authority.is_some()
    }
}
