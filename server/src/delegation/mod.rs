pub mod delegation_channel;
pub mod delegation_state;
pub mod error;
pub mod lifecycle;
