pub type Tick = u64;
pub type Nonce = u64;
pub type SessionId = u64;
pub type PlayerIndex = u8;
pub type BombIndex = u8;

/// Which execution environment currently holds authority over a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Environment {
    /// The slower, durable base ledger
    Base,
    /// The fast ephemeral environment a session is delegated to during play
    Ephemeral,
}

impl Environment {
    pub fn from_delegated(delegated: bool) -> Self {
        if delegated {
            Environment::Ephemeral
        } else {
            Environment::Base
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Base => write!(f, "base"),
            Environment::Ephemeral => write!(f, "ephemeral"),
        }
    }
}
