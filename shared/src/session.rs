use thiserror::Error;

use crate::{types::SessionId, Address};

/// Errors that can occur when decoding enumerated session values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Status code outside 0..=3
    #[error("Unknown session status code {code}")]
    UnknownStatus { code: u8 },
}

/// Lifecycle of a session. Strictly increasing over a session's life.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SessionStatus {
    Lobby,
    Active,
    Finished,
    Claimed,
}

impl SessionStatus {
    pub fn code(self) -> u8 {
        match self {
            SessionStatus::Lobby => 0,
            SessionStatus::Active => 1,
            SessionStatus::Finished => 2,
            SessionStatus::Claimed => 3,
        }
    }

    pub fn is_over(self) -> bool {
        self >= SessionStatus::Finished
    }
}

impl TryFrom<u8> for SessionStatus {
    type Error = SessionError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(SessionStatus::Lobby),
            1 => Ok(SessionStatus::Active),
            2 => Ok(SessionStatus::Finished),
            3 => Ok(SessionStatus::Claimed),
            code => Err(SessionError::UnknownStatus { code }),
        }
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Lobby
    }
}

/// The decoded session account header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub session_id: SessionId,
    pub authority: Option<Address>,
    pub grid_width: u8,
    pub grid_height: u8,
    pub max_players: u8,
    pub current_players: u8,
    pub entry_fee: u64,
    pub prize_pool: u64,
    pub status: SessionStatus,
    pub winner: Option<Address>,
    pub created_at: i64,
    pub started_at: i64,
    pub round_duration: u16,
    pub platform_fee_bps: u16,
    pub last_detonate_tick: u64,
}

/// What a registry needs to know to run a worker for a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionInfo {
    pub address: Address,
    pub session_id: SessionId,
    pub max_players: u8,
}

impl SessionInfo {
    pub fn new(address: Address, session_id: SessionId, max_players: u8) -> Self {
        Self {
            address,
            session_id,
            max_players,
        }
    }
}

/// A session found by scanning the base ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveredSession {
    pub info: SessionInfo,
    pub status: SessionStatus,
}
