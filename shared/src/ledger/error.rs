use thiserror::Error;

use crate::ledger::instruction::InstructionKind;

/// Failure reasons reported by the authoritative program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ProgramError {
    #[error("Game is not in lobby state")]
    GameNotInLobby,
    #[error("Game is not active")]
    GameNotActive,
    #[error("Game is not finished")]
    GameNotFinished,
    #[error("Game is full")]
    GameFull,
    #[error("Player is not alive")]
    PlayerNotAlive,
    #[error("Player does not belong to this game")]
    PlayerGameMismatch,
    #[error("Signer does not match player authority")]
    Unauthorized,
    #[error("Invalid direction (must be 0-3)")]
    InvalidDirection,
    #[error("Cell is not walkable")]
    CellNotWalkable,
    #[error("Move out of bounds")]
    OutOfBounds,
    #[error("Moving too fast, wait for cooldown")]
    MoveTooFast,
    #[error("No bombs available")]
    NoBombsAvailable,
    #[error("Cell is occupied by a bomb")]
    CellOccupied,
    #[error("All bomb slots are full")]
    BombSlotsFull,
    #[error("Invalid bomb index")]
    InvalidBombIndex,
    #[error("Bomb is not active")]
    BombNotActive,
    #[error("Bomb already detonated")]
    BombAlreadyDetonated,
    #[error("Fuse has not expired yet")]
    FuseNotExpired,
    #[error("No winner set")]
    NoWinner,
    #[error("Not the winner")]
    NotWinner,
    #[error("Prize already claimed")]
    AlreadyClaimed,
    #[error("Math overflow")]
    MathOverflow,
}

impl ProgramError {
    pub const ALL: [ProgramError; 22] = [
        ProgramError::GameNotInLobby,
        ProgramError::GameNotActive,
        ProgramError::GameNotFinished,
        ProgramError::GameFull,
        ProgramError::PlayerNotAlive,
        ProgramError::PlayerGameMismatch,
        ProgramError::Unauthorized,
        ProgramError::InvalidDirection,
        ProgramError::CellNotWalkable,
        ProgramError::OutOfBounds,
        ProgramError::MoveTooFast,
        ProgramError::NoBombsAvailable,
        ProgramError::CellOccupied,
        ProgramError::BombSlotsFull,
        ProgramError::InvalidBombIndex,
        ProgramError::BombNotActive,
        ProgramError::BombAlreadyDetonated,
        ProgramError::FuseNotExpired,
        ProgramError::NoWinner,
        ProgramError::NotWinner,
        ProgramError::AlreadyClaimed,
        ProgramError::MathOverflow,
    ];

    /// The error's name as the program reports it in failure logs.
    pub fn name(self) -> &'static str {
        match self {
            ProgramError::GameNotInLobby => "GameNotInLobby",
            ProgramError::GameNotActive => "GameNotActive",
            ProgramError::GameNotFinished => "GameNotFinished",
            ProgramError::GameFull => "GameFull",
            ProgramError::PlayerNotAlive => "PlayerNotAlive",
            ProgramError::PlayerGameMismatch => "PlayerGameMismatch",
            ProgramError::Unauthorized => "Unauthorized",
            ProgramError::InvalidDirection => "InvalidDirection",
            ProgramError::CellNotWalkable => "CellNotWalkable",
            ProgramError::OutOfBounds => "OutOfBounds",
            ProgramError::MoveTooFast => "MoveTooFast",
            ProgramError::NoBombsAvailable => "NoBombsAvailable",
            ProgramError::CellOccupied => "CellOccupied",
            ProgramError::BombSlotsFull => "BombSlotsFull",
            ProgramError::InvalidBombIndex => "InvalidBombIndex",
            ProgramError::BombNotActive => "BombNotActive",
            ProgramError::BombAlreadyDetonated => "BombAlreadyDetonated",
            ProgramError::FuseNotExpired => "FuseNotExpired",
            ProgramError::NoWinner => "NoWinner",
            ProgramError::NotWinner => "NotWinner",
            ProgramError::AlreadyClaimed => "AlreadyClaimed",
            ProgramError::MathOverflow => "MathOverflow",
        }
    }

    /// Finds a program error name inside a free-form failure message.
    pub fn from_message(message: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|error| message.contains(error.name()))
    }
}

/// Errors that can occur when talking to either ledger environment
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Network failure, rate limiting or an unavailable endpoint
    #[error("Transient ledger failure: {reason}")]
    Transient { reason: String },

    /// The program rejected the instruction
    #[error("Instruction rejected: {0}")]
    Rejected(#[from] ProgramError),

    /// An account could not be decoded into the expected layout
    #[error("Failed to decode account {account}: {reason}")]
    Decode { account: String, reason: String },

    /// A rejection whose reason could not be matched to a known program error
    #[error("Instruction failed: {message}")]
    Unrecognized { message: String },
}

impl LedgerError {
    pub fn transient(reason: impl Into<String>) -> Self {
        LedgerError::Transient {
            reason: reason.into(),
        }
    }

    /// Classifies a raw submission failure message.
    pub fn from_failure_message(message: &str) -> Self {
        match ProgramError::from_message(message) {
            Some(error) => LedgerError::Rejected(error),
            None => LedgerError::Unrecognized {
                message: message.to_string(),
            },
        }
    }

    pub fn program_error(&self) -> Option<ProgramError> {
        match self {
            LedgerError::Rejected(error) => Some(*error),
            _ => None,
        }
    }

    /// Whether this failure means another submitter got there first, for an
    /// instruction of the given kind. Races are dropped without logging.
    pub fn is_expected_race(&self, kind: InstructionKind) -> bool {
        let Some(error) = self.program_error() else {
            return false;
        };
        match kind {
            InstructionKind::DetonateBomb => matches!(
                error,
                ProgramError::FuseNotExpired
                    | ProgramError::BombAlreadyDetonated
                    | ProgramError::BombNotActive
                    | ProgramError::InvalidBombIndex
                    | ProgramError::GameNotActive
            ),
            InstructionKind::CheckEnd => error == ProgramError::GameNotActive,
            _ => false,
        }
    }
}
