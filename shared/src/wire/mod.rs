pub mod error;
pub mod message;
pub mod number;
pub mod wire_snapshot;
