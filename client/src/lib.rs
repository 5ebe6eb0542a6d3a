//! # Deadmint Client
//! Makes a player's own actions feel instant. Each action is validated and
//! applied to a local view, tagged with the input nonce it should produce,
//! and submitted in the background. Every authoritative snapshot
//! acknowledges the inputs it reflects and the rest are replayed on top.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

mod client;
mod client_config;
mod client_events;
mod error;
mod input;
mod reconciliation;

pub use client::ClientSession;
pub use client_config::ClientConfig;
pub use client_events::{
    ClientEvent, ClientEvents, CrankEvent, ErrorEvent, InputRejectedEvent, InputRejection,
    StateEvent,
};
pub use error::ClientError;
pub use input::{input_buffer::InputBuffer, input_frame::InputFrame};
pub use reconciliation::{
    engine::{ReconcileOutcome, ReconciliationEngine},
    replay::{replay, Replay},
};
