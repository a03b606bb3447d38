//! # Contract Call Transport
//!
//! The capability the client uses to reach the chain. Wallet connectors, RPC
//! providers and the [`crate::SimulatedChain`] all sit behind
//! [`ContractTransport`].
//!
//! ## Write path
//!
//! ```text
//! send(call) ──▶ PendingTransaction ──wait(n)──▶ TxReceipt
//!     │                  │
//!     ▼                  ▼
//!  rejected          dropped / reverted
//! ```

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;

use crate::error::TransportError;

/// A single contract call: target, function and ABI-encoded arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractCall {
    /// Contract address.
    pub address: Address,
    /// Solidity signature, kept for logging.
    pub function: &'static str,
    /// ABI-encoded calldata, selector first.
    pub calldata: Bytes,
    /// Wei attached to a payable call.
    pub value: Option<U256>,
}

impl ContractCall {
    /// Encodes `call` against the contract at `address`.
    #[must_use]
    pub fn new<C: SolCall>(address: Address, call: &C) -> Self {
        Self {
            address,
            function: C::SIGNATURE,
            calldata: Bytes::from(call.abi_encode()),
            value: None,
        }
    }

    /// Attaches a payable value.
    #[must_use]
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    /// Returns the four-byte function selector, if the calldata has one.
    #[must_use]
    pub fn selector(&self) -> Option<[u8; 4]> {
        let bytes = self.calldata.get(..4)?;
        let mut selector = [0u8; 4];
        selector.copy_from_slice(bytes);
        Some(selector)
    }
}

/// Receipt of a confirmed transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    /// Transaction hash.
    pub tx_hash: B256,
    /// Block that included the transaction.
    pub block_number: u64,
    /// Confirmations observed when the wait returned.
    pub confirmations: u64,
}

/// A transaction accepted by the transport but not yet confirmed.
#[async_trait]
pub trait PendingTransaction: Send {
    /// Hash of the submitted transaction.
    fn tx_hash(&self) -> B256;

    /// Waits until the transaction has `confirmations` confirmations.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction is dropped or reverts, or if the
    /// connection is lost before the threshold is reached.
    async fn wait(&mut self, confirmations: u64) -> Result<TxReceipt, TransportError>;
}

/// Runs contract calls against some chain.
///
/// Implementations must report [`is_fetching`](Self::is_fetching) while they
/// are still preparing call metadata (gas estimation, wallet prompts), so the
/// client can keep the entry trigger disabled.
#[async_trait]
pub trait ContractTransport: Send + Sync {
    /// Executes a read-only call and returns the raw return data.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is unreachable or the call reverts.
    async fn read(&self, call: ContractCall) -> Result<Bytes, TransportError>;

    /// Signs and broadcasts a state-changing call.
    ///
    /// # Errors
    ///
    /// Returns an error if the wallet rejects the request or the call would revert.
    async fn send(&self, call: ContractCall) -> Result<Box<dyn PendingTransaction>, TransportError>;

    /// Whether the transport is busy preparing a call.
    fn is_fetching(&self) -> bool;
}

/// Decodes the return data of `C`.
///
/// # Errors
///
/// Returns [`TransportError::Decode`] if `data` is not a valid encoding of
/// the function's return type.
pub fn decode_return<C: SolCall>(data: &[u8]) -> Result<C::Return, TransportError> {
    C::abi_decode_returns(data, true).map_err(|e| TransportError::Decode {
        function: C::SIGNATURE,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::IRaffle;

    #[test]
    fn test_call_carries_selector_and_value() {
        let call = ContractCall::new(Address::repeat_byte(7), &IRaffle::enterRaffleCall {})
            .with_value(U256::from(10));

        assert_eq!(call.function, "enterRaffle()");
        assert_eq!(call.selector(), Some(IRaffle::enterRaffleCall::SELECTOR));
        assert_eq!(call.value, Some(U256::from(10)));
    }

    #[test]
    fn test_decode_fee() {
        let fee = U256::from(100_000_000_000_000_000u64);
        let data = fee.to_be_bytes::<32>();

        let decoded = decode_return::<IRaffle::getEntranceFeeCall>(&data).unwrap();
        assert_eq!(decoded._0, fee);
    }

    #[test]
    fn test_decode_rejects_short_data() {
        let err = decode_return::<IRaffle::getNumberOfPlayersCall>(&[0u8; 3]).unwrap_err();
        assert!(matches!(
            err,
            TransportError::Decode {
                function: "getNumberOfPlayers()",
                ..
            }
        ));
    }
}
