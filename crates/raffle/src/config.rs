//! # Client Configuration
//!
//! Loaded once at startup from TOML.
//!
//! ```toml
//! currency_symbol = "ETH"
//! decimals = 18
//! confirmations = 1
//! log_level = "info"
//!
//! [deployments]
//! "31337" = ["0x5FbDB2315678afecb367f032d93F642f64180aa3"]
//!
//! [simulation]
//! chain_id = 31337
//! entrance_fee = "100000000000000000"
//! players = 3
//! block_time_ms = 250
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use alloy_primitives::{Address, U256};
use raffle_chain::deployment::{LOCAL_CHAIN_ID, LOCAL_RAFFLE_ADDRESS};
use raffle_chain::{DeploymentError, DeploymentTable};
use raffle_ui::{CurrencyFormat, ViewConfig};
use serde::Deserialize;
use thiserror::Error;
use tracing::Level;

/// Environment variable holding the config file path.
pub const CONFIG_ENV: &str = "RAFFLE_CONFIG";

/// Errors loading the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A deployment key is not a chain id.
    #[error(transparent)]
    Deployment(#[from] DeploymentError),

    /// Confirmations must be at least one.
    #[error("confirmations must be at least 1")]
    ZeroConfirmations,

    /// An amount is not a base-unit integer.
    #[error("invalid amount: {0:?}")]
    InvalidAmount(String),

    /// Unknown log level.
    #[error("invalid log level: {0:?}")]
    InvalidLogLevel(String),
}

/// Settings of the simulated chain used by the demo client.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Network the simulated wallet connects to.
    pub chain_id: u64,
    /// Initial entrance fee in base units.
    pub entrance_fee: String,
    /// Players already entered.
    pub players: u32,
    /// Block time in milliseconds.
    pub block_time_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            chain_id: LOCAL_CHAIN_ID,
            entrance_fee: "100000000000000000".to_string(),
            players: 0,
            block_time_ms: 250,
        }
    }
}

/// Client configuration.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Symbol appended to amounts.
    pub currency_symbol: String,
    /// Decimals of the display unit.
    pub decimals: u8,
    /// Confirmations to wait for after an entry.
    pub confirmations: u64,
    /// Log level name.
    pub log_level: String,
    /// Chain id → raffle addresses; first address is used.
    pub deployments: HashMap<String, Vec<Address>>,
    /// Demo chain settings.
    pub simulation: SimulationConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "ETH".to_string(),
            decimals: raffle_chain::ETHER_DECIMALS,
            confirmations: 1,
            log_level: "info".to_string(),
            deployments: HashMap::from([(LOCAL_CHAIN_ID.to_string(), vec![LOCAL_RAFFLE_ADDRESS])]),
            simulation: SimulationConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed TOML or invalid values.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Loads from the path in [`CONFIG_ENV`], or returns defaults when unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the named file cannot be read or is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(PathBuf::from(path)),
            None => Ok(Self::default()),
        }
    }

    /// Checks every derived value.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.confirmations == 0 {
            return Err(ConfigError::ZeroConfirmations);
        }
        self.deployment_table()?;
        self.level()?;
        self.simulation.entrance_fee()?;
        Ok(())
    }

    /// The deployment table.
    ///
    /// # Errors
    ///
    /// Returns an error if a network key is not a chain id.
    pub fn deployment_table(&self) -> Result<DeploymentTable, ConfigError> {
        Ok(DeploymentTable::from_named(
            self.deployments
                .iter()
                .map(|(chain, addresses)| (chain.as_str(), addresses.clone())),
        )?)
    }

    /// Parsed log level.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown level name.
    pub fn level(&self) -> Result<Level, ConfigError> {
        Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }

    /// View settings derived from this config.
    #[must_use]
    pub fn view_config(&self) -> ViewConfig {
        ViewConfig {
            currency: CurrencyFormat {
                symbol: self.currency_symbol.clone(),
                decimals: self.decimals,
            },
            confirmations: self.confirmations,
        }
    }
}

impl SimulationConfig {
    /// Parsed entrance fee.
    ///
    /// # Errors
    ///
    /// Returns an error if the fee is not a decimal or `0x` hex integer.
    pub fn entrance_fee(&self) -> Result<U256, ConfigError> {
        U256::from_str(self.entrance_fee.trim()).map_err(|_| ConfigError::InvalidAmount(self.entrance_fee.clone()))
    }
}
