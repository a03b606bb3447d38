//! # Raffle Entrance View
//!
//! Client-side view of a single raffle contract: mirrors its state, submits
//! entries and re-reads the chain once an entry is confirmed.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐ change ┌──────────────────┐ address ┌──────────────────┐
//! │ SessionContext │ ─────▶ │ AvailabilityGate │ ──────▶ │  EntrySubmitter  │
//! └────────────────┘        └──────────────────┘         └────────┬─────────┘
//!                                                                 │ confirmed
//!                                    ┌──────────────────┐         ▼
//!                                    │ StateSynchronizer│ ◀── notify, refresh
//!                                    └────────┬─────────┘
//!                                             ▼
//!                                    ┌──────────────────┐
//!                                    │   RenderedView   │
//!                                    └──────────────────┘
//! ```
//!
//! ## Consistency
//!
//! Fee, player count and winner are read concurrently and applied as one
//! triple. Every refresh takes a ticket; a triple whose ticket is older than
//! the last applied one is thrown away.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod gate;
pub mod notify;
pub mod session;
pub mod state;
pub mod submit;
pub mod sync;
pub mod view;

pub use error::{RaffleError, RaffleResult, ReadFailure};
pub use gate::{Availability, AvailabilityGate};
pub use notify::{ChannelNotifier, Notification, NotificationSink, Position, Severity};
pub use session::{NetworkContext, SessionContext, Subscription};
pub use state::{DisplayState, StateField};
pub use submit::{EntrySubmitter, SkipReason, SubmitOutcome};
pub use sync::{RefreshOutcome, StateSynchronizer, SyncSnapshot, SyncStats};
pub use view::{CurrencyFormat, RaffleEntrance, ReadyView, RenderedView, SessionBinding, TriggerControl, ViewConfig};
