use thiserror::Error;

use crate::{grid::GridError, session::SessionError};

/// Errors that can occur while decoding a wire message
#[derive(Debug, Error)]
pub enum WireError {
    /// The text was not a valid message
    #[error("Malformed wire message: {0}")]
    Json(#[from] serde_json::Error),

    /// The session status code is unknown
    #[error("Invalid session in wire state: {0}")]
    Session(#[from] SessionError),

    /// The grid arrays are inconsistent or hold unknown cell codes
    #[error("Invalid grid in wire state: {0}")]
    Grid(#[from] GridError),

    /// A bomb references a slot outside the embedded bomb array
    #[error("Bomb slot index {index} out of range (max {max})")]
    BombIndexOutOfRange { index: u8, max: usize },

    /// A player entry's index does not match its position
    #[error("Player entry at position {position} claims index {index}")]
    PlayerIndexMismatch { position: usize, index: u8 },
}
