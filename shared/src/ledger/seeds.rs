use crate::{
    constants::{PLAYER_SEED, SESSION_SEED},
    types::{PlayerIndex, SessionId},
    Address,
};

/// Derivation seeds of a session account: `["game", id as little-endian u64]`.
pub fn session_seeds(session_id: SessionId) -> Vec<Vec<u8>> {
    vec![SESSION_SEED.to_vec(), session_id.to_le_bytes().to_vec()]
}

/// Derivation seeds of a player slot: `["player", session address, [index]]`.
pub fn player_seeds(session: &Address, index: PlayerIndex) -> Vec<Vec<u8>> {
    vec![
        PLAYER_SEED.to_vec(),
        session.as_bytes().to_vec(),
        vec![index],
    ]
}
