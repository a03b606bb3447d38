//! # State Synchronizer
//!
//! Mirrors fee, player count and recent winner from the raffle contract.
//!
//! ## Refresh
//!
//! ```text
//! ticket = next++ ──▶ join(fee, players, winner) ──▶ all ok?
//!                                                    │ no  → keep previous, mark stale
//!                                                    │ yes → ticket > applied? replace : discard
//! ```
//!
//! The synchronizer mirrors one contract at a time, chosen with
//! [`StateSynchronizer::bind`]. A triple read from any other contract is
//! discarded, however late it arrives.
//!
//! The snapshot lives in a `watch` channel: renderers subscribe and redraw
//! on every applied triple.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use alloy_primitives::Address;
use alloy_sol_types::SolCall;
use raffle_chain::{decode_return, ContractCall, ContractTransport, IRaffle, TransportError};
use tokio::sync::watch;

use crate::error::{RaffleError, RaffleResult, ReadFailure};
use crate::state::{DisplayState, StateField};

/// What the view currently shows, with sync bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncSnapshot {
    /// Contract this snapshot mirrors; `None` while detached.
    pub contract: Option<Address>,
    /// Last applied triple.
    pub state: DisplayState,
    /// Ticket of the refresh that produced `state`; also the discard fence.
    pub applied_ticket: u64,
    /// True once a triple from the current contract has been applied.
    pub synced: bool,
    /// True if a refresh newer than `state` failed.
    pub stale: bool,
}

/// Refresh counters.
#[derive(Debug, Default)]
pub struct SyncStats {
    /// Refreshes started.
    pub started: AtomicU64,
    /// Refreshes whose triple was applied.
    pub applied: AtomicU64,
    /// Refreshes discarded because a newer one had already applied or the
    /// contract changed.
    pub superseded: AtomicU64,
    /// Refreshes with at least one failed read.
    pub failed: AtomicU64,
}

/// How a successful refresh ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The triple replaced the displayed state.
    Applied(DisplayState),
    /// A newer refresh finished first; this triple was dropped.
    Superseded,
    /// The triple came from a contract the synchronizer is no longer bound to.
    Detached,
}

/// Keeps the displayed raffle state in sync with the chain.
pub struct StateSynchronizer {
    transport: Arc<dyn ContractTransport>,
    snapshot: watch::Sender<SyncSnapshot>,
    next_ticket: AtomicU64,
    stats: Arc<SyncStats>,
}

impl StateSynchronizer {
    /// Creates a detached synchronizer showing the initial zero / sentinel state.
    ///
    /// Call [`bind`](Self::bind) before refreshing.
    #[must_use]
    pub fn new(transport: Arc<dyn ContractTransport>) -> Self {
        let (snapshot, _) = watch::channel(SyncSnapshot::default());
        Self {
            transport,
            snapshot,
            next_ticket: AtomicU64::new(0),
            stats: Arc::new(SyncStats::default()),
        }
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SyncSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Currently displayed state.
    #[must_use]
    pub fn state(&self) -> DisplayState {
        self.snapshot.borrow().state.clone()
    }

    /// Receiver notified on every snapshot change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
        self.snapshot.subscribe()
    }

    /// Refresh counters.
    #[must_use]
    pub fn stats(&self) -> Arc<SyncStats> {
        Arc::clone(&self.stats)
    }

    /// Contract currently mirrored.
    #[must_use]
    pub fn contract(&self) -> Option<Address> {
        self.snapshot.borrow().contract
    }

    /// Switches to `contract` (or detaches with `None`) and forgets the
    /// displayed state.
    ///
    /// Refreshes already in flight are fenced off, and refreshes of any
    /// other contract started later are discarded.
    pub fn bind(&self, contract: Option<Address>) {
        let fence = self.next_ticket.load(Ordering::SeqCst);
        self.snapshot.send_modify(|snapshot| {
            *snapshot = SyncSnapshot {
                contract,
                applied_ticket: fence.max(snapshot.applied_ticket),
                ..SyncSnapshot::default()
            };
        });
        tracing::debug!(contract = ?contract, fence, "synchronizer bound");
    }

    /// Reads all three fields from the raffle at `address` and applies them as one unit.
    ///
    /// # Errors
    ///
    /// Returns [`RaffleError::Read`] listing every field that failed. The
    /// displayed state is left untouched and marked stale.
    pub async fn refresh(&self, address: Address) -> RaffleResult<RefreshOutcome> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.started.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(ticket, %address, "refresh started");

        let (fee, players, winner) = tokio::join!(
            self.query(address, IRaffle::getEntranceFeeCall {}),
            self.query(address, IRaffle::getNumberOfPlayersCall {}),
            self.query(address, IRaffle::getRecentWinnerCall {}),
        );

        let state = match (fee, players, winner) {
            (Ok(fee), Ok(players), Ok(winner)) => {
                DisplayState::from_chain(fee._0, players._0, winner._0)
            }
            (fee, players, winner) => {
                let failures: Vec<ReadFailure> = [
                    (StateField::EntranceFee, fee.err()),
                    (StateField::PlayerCount, players.err()),
                    (StateField::RecentWinner, winner.err()),
                ]
                .into_iter()
                .filter_map(|(field, error)| error.map(|error| ReadFailure { field, error }))
                .collect();

                for failure in &failures {
                    tracing::warn!(ticket, field = %failure.field, error = %failure.error, "raffle read failed");
                }
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                self.snapshot.send_if_modified(|snapshot| {
                    let current = snapshot.contract == Some(address) && ticket > snapshot.applied_ticket;
                    if current && !snapshot.stale {
                        snapshot.stale = true;
                        true
                    } else {
                        false
                    }
                });
                return Err(RaffleError::Read { failures });
            }
        };

        let mut detached = false;
        let applied = self.snapshot.send_if_modified(|snapshot| {
            if snapshot.contract != Some(address) {
                detached = true;
                return false;
            }
            if ticket <= snapshot.applied_ticket {
                return false;
            }
            *snapshot = SyncSnapshot {
                contract: Some(address),
                state: state.clone(),
                applied_ticket: ticket,
                synced: true,
                stale: false,
            };
            true
        });

        if applied {
            self.stats.applied.fetch_add(1, Ordering::Relaxed);
            tracing::info!(
                ticket,
                entrance_fee = %state.entrance_fee,
                players = %state.player_count,
                recent_winner = %state.recent_winner_string(),
                "raffle state refreshed"
            );
            Ok(RefreshOutcome::Applied(state))
        } else if detached {
            self.stats.superseded.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(ticket, %address, "contract no longer bound, discarding");
            Ok(RefreshOutcome::Detached)
        } else {
            self.stats.superseded.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(ticket, "newer refresh already applied, discarding");
            Ok(RefreshOutcome::Superseded)
        }
    }

    async fn query<C>(&self, address: Address, call: C) -> Result<C::Return, TransportError>
    where
        C: SolCall,
    {
        let data = self.transport.read(ContractCall::new(address, &call)).await?;
        decode_return::<C>(&data)
    }
}
