//! # Raffle Error Types
//!
//! All errors the entrance view can report. None of them are fatal.

use alloy_primitives::B256;
use raffle_chain::TransportError;
use thiserror::Error;

use crate::state::StateField;

/// A single field that failed to refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadFailure {
    /// The field.
    pub field: StateField,
    /// Why it failed.
    pub error: TransportError,
}

/// Errors that can occur in the entrance view.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RaffleError {
    /// No raffle is deployed on the connected network.
    #[error("no raffle address for chain {}", chain_label(.chain_id))]
    NoDeployment {
        /// The connected network, if any.
        chain_id: Option<u64>,
    },

    /// An entry was attempted before the fee was read from the chain.
    #[error("entrance fee not known yet")]
    EntranceFeeUnknown,

    /// At least one field of a refresh failed; the previous state was kept.
    #[error("failed to read {} raffle field(s), keeping previous state", .failures.len())]
    Read {
        /// Every field that failed.
        failures: Vec<ReadFailure>,
    },

    /// The wallet or the contract rejected the entry.
    #[error("entry rejected: {0}")]
    Submission(#[source] TransportError),

    /// The entry was accepted but never reached the confirmation threshold.
    #[error("entry {tx_hash} not confirmed: {source}")]
    Confirmation {
        /// Hash of the entry transaction.
        tx_hash: B256,
        /// Underlying transport error.
        #[source]
        source: TransportError,
    },
}

impl RaffleError {
    /// Returns true if the entry itself failed, at send or while waiting.
    #[must_use]
    pub const fn is_submission_failure(&self) -> bool {
        matches!(self, Self::Submission(_) | Self::Confirmation { .. })
    }
}

fn chain_label(chain_id: &Option<u64>) -> String {
    chain_id.map_or_else(|| "<none>".to_string(), |id| id.to_string())
}

/// Result type for entrance view operations.
pub type RaffleResult<T> = Result<T, RaffleError>;
