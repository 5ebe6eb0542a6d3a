use crate::{
    player::Direction,
    types::{BombIndex, PlayerIndex},
    Address,
};

/// An authoritative instruction the sync layer can submit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    Move {
        session: Address,
        player: PlayerIndex,
        direction: Direction,
    },
    PlaceBomb {
        session: Address,
        player: PlayerIndex,
    },
    /// `players` are passed as auxiliary accounts so the program can apply blast damage
    DetonateBomb {
        session: Address,
        bomb_index: BombIndex,
        players: Vec<Address>,
    },
    CheckEnd {
        session: Address,
        players: Vec<Address>,
    },
    /// Migrate `account` to the ephemeral environment
    Delegate {
        account: Address,
        seeds: Vec<Vec<u8>>,
    },
    /// Commit `account` and return it to the base ledger
    Undelegate {
        account: Address,
    },
    Claim {
        session: Address,
        player: PlayerIndex,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstructionKind {
    Move,
    PlaceBomb,
    DetonateBomb,
    CheckEnd,
    Delegate,
    Undelegate,
    Claim,
}

impl Instruction {
    pub fn kind(&self) -> InstructionKind {
        match self {
            Instruction::Move { .. } => InstructionKind::Move,
            Instruction::PlaceBomb { .. } => InstructionKind::PlaceBomb,
            Instruction::DetonateBomb { .. } => InstructionKind::DetonateBomb,
            Instruction::CheckEnd { .. } => InstructionKind::CheckEnd,
            Instruction::Delegate { .. } => InstructionKind::Delegate,
            Instruction::Undelegate { .. } => InstructionKind::Undelegate,
            Instruction::Claim { .. } => InstructionKind::Claim,
        }
    }
}

/// Reference to a submitted transaction (its signature in text form).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TxRef(pub String);

impl TxRef {
    pub fn new(signature: impl Into<String>) -> Self {
        Self(signature.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> &str {
        let end = self.0.len().min(16);
        self.0.get(..end).unwrap_or(&self.0)
    }
}

impl std::fmt::Display for TxRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
