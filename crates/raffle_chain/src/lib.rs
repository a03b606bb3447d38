//! # Raffle Chain Bridge
//!
//! Everything the raffle client needs to talk to the on-chain raffle contract,
//! without depending on a live node.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐  ContractCall   ┌──────────────────────┐
//! │  Raffle client  │ ──────────────▶ │  ContractTransport   │
//! │  (raffle_ui)    │ ◀────────────── │  (wallet / RPC / sim)│
//! └─────────────────┘  Bytes / Tx     └──────────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ DeploymentTable │  chain id -> [address, ...]
//! └─────────────────┘
//! ```
//!
//! Calldata and return data use the Solidity ABI, generated from the
//! [`contracts::IRaffle`] interface.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod contracts;
pub mod deployment;
pub mod error;
pub mod simulator;
pub mod transport;
pub mod units;

pub use contracts::IRaffle;
pub use deployment::DeploymentTable;
pub use error::{DeploymentError, TransportError};
pub use simulator::{ChainStats, SimulatedChain};
pub use transport::{decode_return, ContractCall, ContractTransport, PendingTransaction, TxReceipt};
pub use units::{format_ether, format_units, ETHER_DECIMALS};
