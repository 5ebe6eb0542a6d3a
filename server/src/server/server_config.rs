use std::{default::Default, path::PathBuf, time::Duration};

use thiserror::Error;

use deadmint_shared::Address;

/// Startup configuration failures. The only errors allowed to stop the process.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is not set
    #[error("Missing required setting {name}: {hint}")]
    Missing {
        name: &'static str,
        hint: &'static str,
    },

    /// A setting is present but cannot be parsed
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    /// The crank keypair file could not be read
    #[error("Failed to read crank keypair from {path}: {source}")]
    KeypairFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The crank keypair bytes are malformed
    #[error("Malformed crank keypair: {reason}")]
    MalformedKeypair { reason: String },
}

/// Contains Config properties which will be used by the Server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Poll cadence and cleanup timing
    pub timing: TimingConfig,
    /// Crank throttling
    pub crank: CrankConfig,
    /// Delegation confirmation polling
    pub delegation: DelegationConfig,
    /// Endpoints of both environments
    pub endpoints: LedgerEndpoints,
    /// Where the crank signer comes from
    pub signer: Option<SignerSource>,
    /// Port the registration / push surface listens on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            crank: CrankConfig::default(),
            delegation: DelegationConfig::default(),
            endpoints: LedgerEndpoints::default(),
            signer: None,
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from any key lookup; `from_env` uses the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("RPC_URL").filter(|url| !url.is_empty()).ok_or(
            ConfigError::Missing {
                name: "RPC_URL",
                hint: "set the base ledger endpoint, e.g. https://api.devnet.solana.com",
            },
        )?;
        let mut endpoints = LedgerEndpoints {
            base_url,
            ..LedgerEndpoints::default()
        };
        if let Some(url) = lookup("EPHEMERAL_RPC_URL").filter(|url| !url.is_empty()) {
            endpoints.ephemeral_url = url;
        }
        if let Some(validator) = lookup("ER_VALIDATOR").filter(|text| !text.is_empty()) {
            let address = validator
                .parse::<Address>()
                .map_err(|error| ConfigError::Invalid {
                    name: "ER_VALIDATOR",
                    reason: error.to_string(),
                })?;
            endpoints.validator = Some(address);
        }

        let signer = if let Some(secret) = lookup("CRANK_KEYPAIR").filter(|text| !text.is_empty())
        {
            SignerSource::Base58(secret)
        } else if let Some(path) = lookup("CRANK_KEYPAIR_PATH").filter(|text| !text.is_empty()) {
            SignerSource::File(expand_home(&path, lookup("HOME")))
        } else {
            return Err(ConfigError::Missing {
                name: "CRANK_KEYPAIR",
                hint: "set CRANK_KEYPAIR (base58 secret key) or CRANK_KEYPAIR_PATH (JSON file path)",
            });
        };

        let port = match lookup("PORT") {
            Some(text) => text.parse::<u16>().map_err(|error| ConfigError::Invalid {
                name: "PORT",
                reason: error.to_string(),
            })?,
            None => 8080,
        };

        Ok(Self {
            endpoints,
            signer: Some(signer),
            port,
            ..Self::default()
        })
    }

    /// Loads the crank signer, failing loudly if none is configured.
    pub fn load_signer(&self) -> Result<CrankSigner, ConfigError> {
        match &self.signer {
            Some(source) => source.load(),
            None => Err(ConfigError::Missing {
                name: "CRANK_KEYPAIR",
                hint: "no signer source configured",
            }),
        }
    }
}

/// Poll intervals track how much the state is churning.
#[derive(Clone, Debug)]
pub struct TimingConfig {
    /// Lobby / finished sessions only need to notice one transition
    pub lobby_poll: Duration,
    /// Active on the base ledger, before delegation lands
    pub active_poll: Duration,
    /// Active and delegated to the ephemeral environment
    pub active_delegated_poll: Duration,
    /// How long a finished session stays registered
    pub cleanup_after: Duration,
    /// How often the registry looks for finished sessions
    pub cleanup_check_interval: Duration,
    /// Upper bound of the random delay before a worker's first tick
    pub start_stagger: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            lobby_poll: Duration::from_secs(30),
            active_poll: Duration::from_secs(2),
            active_delegated_poll: Duration::from_millis(500),
            cleanup_after: Duration::from_secs(120),
            cleanup_check_interval: Duration::from_secs(30),
            start_stagger: Duration::ZERO,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CrankConfig {
    /// Minimum gap between successful detonation sends, across the session
    pub cooldown: Duration,
    /// Transaction size / cost limit on detonations per tick
    pub max_detonations_per_tick: usize,
}

impl Default for CrankConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_millis(500),
            max_detonations_per_tick: 2,
        }
    }
}

#[derive(Clone, Debug)]
pub struct DelegationConfig {
    /// Give up waiting for an ownership change after this long
    pub timeout: Duration,
    /// Gap between ownership checks
    pub check_interval: Duration,
}

impl Default for DelegationConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            check_interval: Duration::from_secs(2),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LedgerEndpoints {
    pub base_url: String,
    pub ephemeral_url: String,
    /// Validator the ephemeral environment runs on, passed to delegate instructions
    pub validator: Option<Address>,
}

impl Default for LedgerEndpoints {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            ephemeral_url: "https://devnet-as.magicblock.app".to_string(),
            validator: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignerSource {
    /// Base58-encoded 64-byte secret key
    Base58(String),
    /// JSON array of 64 bytes
    File(PathBuf),
}

impl SignerSource {
    pub fn load(&self) -> Result<CrankSigner, ConfigError> {
        let bytes = match self {
            SignerSource::Base58(text) => {
                bs58::decode(text)
                    .into_vec()
                    .map_err(|error| ConfigError::MalformedKeypair {
                        reason: error.to_string(),
                    })?
            }
            SignerSource::File(path) => {
                let raw =
                    std::fs::read_to_string(path).map_err(|source| ConfigError::KeypairFile {
                        path: path.display().to_string(),
                        source,
                    })?;
                serde_json::from_str::<Vec<u8>>(&raw).map_err(|error| {
                    ConfigError::MalformedKeypair {
                        reason: error.to_string(),
                    }
                })?
            }
        };
        CrankSigner::from_bytes(&bytes)
    }
}

/// The crank's keypair: 32 secret bytes followed by 32 public bytes.
#[derive(Clone)]
pub struct CrankSigner {
    keypair: [u8; 64],
}

impl CrankSigner {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let keypair: [u8; 64] = bytes
            .try_into()
            .map_err(|_| ConfigError::MalformedKeypair {
                reason: format!("expected 64 bytes, got {}", bytes.len()),
            })?;
        Ok(Self { keypair })
    }

    pub fn address(&self) -> Address {
        let mut public = [0u8; 32];
        public.copy_from_slice(&self.keypair[32..]);
        Address::new(public)
    }

    pub fn keypair_bytes(&self) -> &[u8; 64] {
        &self.keypair
    }
}

impl std::fmt::Debug for CrankSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CrankSigner({})", self.address())
    }
}

fn expand_home(path: &str, home: Option<String>) -> PathBuf {
    match (path.strip_prefix('~'), home) {
        (Some(rest), Some(home)) => PathBuf::from(format!("{}{}", home, rest)),
        _ => PathBuf::from(path),
    }
}
