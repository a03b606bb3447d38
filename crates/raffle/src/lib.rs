//! # Raffle Client
//!
//! Entry point crate: configuration, logging and re-exports of the chain
//! bridge and the entrance view.
//!
//! ## Modules
//!
//! - `config`: TOML client configuration
//! - `logging`: tracing subscriber setup
//! - `chain`: contract interface, transport, simulated chain
//! - `ui`: session, gate, synchronizer, submitter, view

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod logging;

/// Contract bridge.
pub mod chain {
    pub use raffle_chain::*;
}

/// Entrance view.
pub mod ui {
    pub use raffle_ui::*;
}

pub use config::{ClientConfig, ConfigError, SimulationConfig};
pub use raffle_ui::{RaffleEntrance, RenderedView};
