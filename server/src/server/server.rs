use std::sync::Arc;

use log::info;
use serde::Serialize;
use tokio::task::JoinHandle;

use deadmint_shared::{Address, LedgerClient, LedgerError, SessionInfo};

use crate::{
    error::{RegistryError, ServerError},
    fan_out::{FanOut, Subscription},
    registry::{SessionRegistry, SessionSummary},
    server::{CrankSigner, LedgerEndpoints, ServerConfig},
};

/// Response of the health probe
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub ok: bool,
    /// Registered sessions
    pub games: usize,
    /// Live push-channel subscribers
    pub connections: usize,
}

/// Ties the ledger client, the session registry and the fan-out together.
/// A restart rebuilds everything from `start`'s discovery pass.
pub struct Server<L: LedgerClient> {
    config: ServerConfig,
    ledger: Arc<L>,
    fan_out: FanOut,
    registry: Arc<SessionRegistry<L>>,
    cleanup_loop: Option<JoinHandle<()>>,
}

impl<L: LedgerClient> Server<L> {
    /// Create a new Server
    pub fn new(config: ServerConfig, ledger: L) -> Self {
        let ledger = Arc::new(ledger);
        let fan_out = FanOut::default();
        let registry = Arc::new(SessionRegistry::new(
            ledger.clone(),
            config.clone(),
            fan_out.clone(),
        ));
        Self {
            config,
            ledger,
            fan_out,
            registry,
            cleanup_loop: None,
        }
    }

    /// Loads the crank signer and connects the ledger client. Any failure here is fatal.
    pub fn bootstrap<F>(config: ServerConfig, connect: F) -> Result<Self, ServerError>
    where
        F: FnOnce(&LedgerEndpoints, CrankSigner) -> Result<L, LedgerError>,
    {
        let signer = config.load_signer()?;
        info!(
            "Crank signer {} on {} / {}",
            signer.address().short(),
            config.endpoints.base_url,
            config.endpoints.ephemeral_url
        );
        let ledger = connect(&config.endpoints, signer).map_err(ServerError::Connect)?;
        Ok(Self::new(config, ledger))
    }

    /// Re-discovers live sessions and starts the periodic cleanup check.
    pub async fn start(&mut self) -> Result<usize, ServerError> {
        let registered = self.registry.discover_and_register_all().await?;
        if self.cleanup_loop.is_none() {
            self.cleanup_loop = Some(self.registry.spawn_cleanup_loop());
        }
        info!("Server ready on port {}", self.config.port);
        Ok(registered)
    }

    pub fn register(&self, info: SessionInfo) -> Result<bool, RegistryError> {
        self.registry.register(info)
    }

    pub fn sessions(&self) -> Result<Vec<SessionSummary>, RegistryError> {
        self.registry.list()
    }

    pub fn subscribe(&self, session: &Address) -> Result<Subscription, RegistryError> {
        self.fan_out.subscribe(session)
    }

    pub fn health(&self) -> Result<HealthReport, RegistryError> {
        Ok(HealthReport {
            ok: true,
            games: self.registry.active_count()?,
            connections: self.fan_out.connection_count()?,
        })
    }

    pub fn registry(&self) -> &Arc<SessionRegistry<L>> {
        &self.registry
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Stops the cleanup loop and every worker.
    pub fn shutdown(&mut self) -> Result<(), RegistryError> {
        if let Some(cleanup_loop) = self.cleanup_loop.take() {
            cleanup_loop.abort();
        }
        self.registry.shutdown()
    }
}
