mod server;
pub use server::{HealthReport, Server};

mod server_config;
pub use server_config::{
    ConfigError, CrankConfig, CrankSigner, DelegationConfig, LedgerEndpoints, ServerConfig,
    SignerSource, TimingConfig,
};
