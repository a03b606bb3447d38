//! # Chain Error Types
//!
//! Errors reported by the contract-call transport and the deployment table.

use alloy_primitives::{hex, B256};
use thiserror::Error;

/// Errors a contract-call transport can report.
///
/// None of these are fatal to the client: the worst outcome is stale or
/// absent data on screen.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The user or the wallet refused to sign or send.
    #[error("request rejected by wallet: {0}")]
    Rejected(String),

    /// The contract reverted the call.
    #[error("execution reverted: {reason}")]
    Reverted {
        /// Revert reason or custom error name.
        reason: String,
    },

    /// The node could not be reached or answered garbage.
    #[error("network error: {0}")]
    Network(String),

    /// The transaction left the mempool before reaching the confirmation threshold.
    #[error("transaction {tx_hash} dropped before confirmation")]
    Dropped {
        /// Hash of the dropped transaction.
        tx_hash: B256,
    },

    /// Return data did not decode as the expected ABI type.
    #[error("could not decode return data of {function}: {reason}")]
    Decode {
        /// Solidity signature of the called function.
        function: &'static str,
        /// Decoder message.
        reason: String,
    },

    /// The target contract has no function with this selector.
    #[error("unknown function selector 0x{}", hex::encode(.selector))]
    UnknownSelector {
        /// First four calldata bytes.
        selector: [u8; 4],
    },
}

/// Errors building a deployment table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeploymentError {
    /// A network key was not a decimal or `0x`-prefixed chain id.
    #[error("invalid chain id: {0:?}")]
    InvalidChainId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_selector_message() {
        let err = TransportError::UnknownSelector {
            selector: [0xde, 0xad, 0xbe, 0xef],
        };
        assert_eq!(err.to_string(), "unknown function selector 0xdeadbeef");
    }
}
