//! # Deployment Table
//!
//! Static mapping of network to deployed raffle addresses. Only the first
//! address of a network is ever used.

use std::collections::HashMap;

use alloy_primitives::{address, Address};

use crate::error::DeploymentError;

/// Chain id of the local development node (Hardhat / Anvil).
pub const LOCAL_CHAIN_ID: u64 = 31337;

/// First contract address a fresh local development node hands out.
pub const LOCAL_RAFFLE_ADDRESS: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");

/// Network id → ordered list of raffle deployments.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeploymentTable {
    entries: HashMap<u64, Vec<Address>>,
}

impl DeploymentTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the single local development deployment.
    #[must_use]
    pub fn local_development() -> Self {
        Self::new().with_deployment(LOCAL_CHAIN_ID, vec![LOCAL_RAFFLE_ADDRESS])
    }

    /// Builds a table from string-keyed entries, as found in config files.
    ///
    /// Keys may be decimal (`"31337"`) or hex (`"0x7a69"`).
    ///
    /// # Errors
    ///
    /// Returns [`DeploymentError::InvalidChainId`] for a key that is not a chain id.
    pub fn from_named<I, K>(entries: I) -> Result<Self, DeploymentError>
    where
        I: IntoIterator<Item = (K, Vec<Address>)>,
        K: AsRef<str>,
    {
        let mut table = Self::new();
        for (key, addresses) in entries {
            let key = key.as_ref();
            let chain_id =
                parse_chain_id(key).ok_or_else(|| DeploymentError::InvalidChainId(key.to_string()))?;
            table.insert(chain_id, addresses);
        }
        Ok(table)
    }

    /// Adds (or replaces) the deployments of a network.
    #[must_use]
    pub fn with_deployment(mut self, chain_id: u64, addresses: Vec<Address>) -> Self {
        self.insert(chain_id, addresses);
        self
    }

    /// Adds (or replaces) the deployments of a network.
    pub fn insert(&mut self, chain_id: u64, addresses: Vec<Address>) {
        self.entries.insert(chain_id, addresses);
    }

    /// Resolves the raffle address for a network.
    ///
    /// `None` when the network is unknown or has an empty address list.
    #[must_use]
    pub fn resolve(&self, chain_id: u64) -> Option<Address> {
        self.entries.get(&chain_id)?.first().copied()
    }

    /// Number of networks in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no network is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parses a chain id given in decimal or `0x`-prefixed hex.
#[must_use]
pub fn parse_chain_id(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}
