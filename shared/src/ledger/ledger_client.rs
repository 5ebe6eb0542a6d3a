use async_trait::async_trait;

use crate::{
    ledger::{
        error::LedgerError,
        instruction::{Instruction, TxRef},
    },
    session::DiscoveredSession,
    snapshot::Snapshot,
    types::{Environment, PlayerIndex},
    Address,
};

/// The external ledger / program layer, consumed as a black box.
///
/// Implementations own the account encoding, the signer, and the connections
/// to both environments. Every method may be called concurrently from many
/// session workers.
#[async_trait]
pub trait LedgerClient: Send + Sync + 'static {
    /// Batched read of the session account, every player-slot account up to
    /// `max_players`, and the environment's current tick.
    ///
    /// `Ok(None)` means the session account does not exist (yet).
    async fn fetch_snapshot(
        &self,
        session: &Address,
        max_players: u8,
        environment: Environment,
    ) -> Result<Option<Snapshot>, LedgerError>;

    /// Builds, signs and submits one instruction. Returns once the
    /// transaction is sent, not confirmed.
    async fn submit(
        &self,
        environment: Environment,
        instruction: Instruction,
    ) -> Result<TxRef, LedgerError>;

    /// Whether the base ledger currently records `account` as owned by the
    /// delegation program.
    async fn is_delegated(&self, account: &Address) -> Result<bool, LedgerError>;

    /// Every session on the base ledger that has not been claimed.
    async fn discover_sessions(&self) -> Result<Vec<DiscoveredSession>, LedgerError>;

    /// Address of player slot `index`, derived from the session address.
    fn player_address(&self, session: &Address, index: PlayerIndex) -> Address;

    fn player_addresses(&self, session: &Address, max_players: u8) -> Vec<Address> {
        (0..max_players)
            .map(|index| self.player_address(session, index))
            .collect()
    }
}
