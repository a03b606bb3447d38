//! # Entry Submitter
//!
//! Sends `enterRaffle()` with the current fee, waits for the confirmation
//! threshold, then fires one notification and one refresh.
//!
//! Failures (rejection, revert, dropped transaction) produce neither. The
//! busy flag is released on every exit path, so the trigger re-enables.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use raffle_chain::{ContractCall, ContractTransport, IRaffle, TxReceipt};

use crate::error::{RaffleError, RaffleResult};
use crate::gate::Availability;
use crate::notify::{Notification, NotificationSink};
use crate::sync::{RefreshOutcome, StateSynchronizer};

/// Why a submission was skipped without making any call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// A previous entry is still pending.
    InFlight,
    /// The transport is still preparing a call.
    TransportFetching,
}

/// How a submission ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The entry reached the confirmation threshold.
    Confirmed {
        /// Receipt of the entry.
        receipt: TxReceipt,
        /// Whether the follow-up refresh applied a new triple.
        refreshed: bool,
    },
    /// Nothing was sent.
    Skipped(SkipReason),
}

/// Releases the busy flag on drop.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Submits raffle entries.
pub struct EntrySubmitter {
    transport: Arc<dyn ContractTransport>,
    synchronizer: Arc<StateSynchronizer>,
    notifier: Arc<dyn NotificationSink>,
    confirmations: u64,
    in_flight: AtomicBool,
}

impl EntrySubmitter {
    /// Creates a submitter waiting for `confirmations` blocks (at least one).
    #[must_use]
    pub fn new(
        transport: Arc<dyn ContractTransport>,
        synchronizer: Arc<StateSynchronizer>,
        notifier: Arc<dyn NotificationSink>,
        confirmations: u64,
    ) -> Self {
        Self {
            transport,
            synchronizer,
            notifier,
            confirmations: confirmations.max(1),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Confirmation threshold.
    #[must_use]
    pub const fn confirmations(&self) -> u64 {
        self.confirmations
    }

    /// True while an entry is pending or the transport is fetching.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) || self.transport.is_fetching()
    }

    /// Enters the raffle at the resolved address.
    ///
    /// # Errors
    ///
    /// - [`RaffleError::NoDeployment`] if no raffle resolved; nothing is sent.
    /// - [`RaffleError::EntranceFeeUnknown`] before the first refresh; nothing is sent.
    /// - [`RaffleError::Submission`] if the wallet or contract rejected the entry.
    /// - [`RaffleError::Confirmation`] if the entry never confirmed.
    pub async fn submit(&self, availability: Availability) -> RaffleResult<SubmitOutcome> {
        if self.transport.is_fetching() {
            tracing::debug!("transport fetching, entry ignored");
            return Ok(SubmitOutcome::Skipped(SkipReason::TransportFetching));
        }
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::debug!("entry already in flight, entry ignored");
            return Ok(SubmitOutcome::Skipped(SkipReason::InFlight));
        };

        let address = match availability {
            Availability::Available(address) => address,
            Availability::Unavailable { chain_id } => {
                return Err(RaffleError::NoDeployment { chain_id });
            }
        };

        let snapshot = self.synchronizer.snapshot();
        if !snapshot.synced || snapshot.contract != Some(address) {
            return Err(RaffleError::EntranceFeeUnknown);
        }
        let value = snapshot.state.entrance_fee;

        let call = ContractCall::new(address, &IRaffle::enterRaffleCall {}).with_value(value);
        let mut pending = self.transport.send(call).await.map_err(|error| {
            tracing::warn!(%error, "entry rejected");
            RaffleError::Submission(error)
        })?;

        let tx_hash = pending.tx_hash();
        tracing::info!(%tx_hash, %value, confirmations = self.confirmations, "entry sent, waiting for confirmation");

        let receipt = pending
            .wait(self.confirmations)
            .await
            .map_err(|source| {
                tracing::warn!(%tx_hash, error = %source, "entry not confirmed");
                RaffleError::Confirmation { tx_hash, source }
            })?;

        tracing::info!(%tx_hash, block = receipt.block_number, "entry confirmed");
        self.notifier.notify(Notification::transaction_complete());

        // The entry stands even if the follow-up read fails.
        let refreshed = match self.synchronizer.refresh(address).await {
            Ok(outcome) => matches!(outcome, RefreshOutcome::Applied(_)),
            Err(error) => {
                tracing::warn!(%error, "refresh after confirmed entry failed");
                false
            }
        };

        Ok(SubmitOutcome::Confirmed { receipt, refreshed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ChannelNotifier;
    use crate::sync::SyncStats;
    use alloy_primitives::{Address, U256};
    use parking_lot::Mutex;
    use raffle_chain::SimulatedChain;

    const FEE: u64 = 100_000_000_000_000_000;

    /// Records how many refreshes had started when each notification fired.
    struct OrderProbe {
        stats: Arc<SyncStats>,
        seen: Mutex<Vec<u64>>,
    }

    impl NotificationSink for OrderProbe {
        fn notify(&self, _notification: Notification) {
            self.seen.lock().push(self.stats.started.load(Ordering::SeqCst));
        }
    }

    struct Fixture {
        chain: Arc<SimulatedChain>,
        sync: Arc<StateSynchronizer>,
        probe: Arc<OrderProbe>,
        submitter: EntrySubmitter,
    }

    impl Fixture {
        fn available(&self) -> Availability {
            Availability::Available(self.chain.contract())
        }

        fn started(&self) -> u64 {
            self.sync.stats().started.load(Ordering::SeqCst)
        }
    }

    async fn fixture() -> Fixture {
        let chain = Arc::new(SimulatedChain::new(
            Address::repeat_byte(0xaa),
            Address::repeat_byte(0x01),
            U256::from(FEE),
        ));
        let sync = Arc::new(StateSynchronizer::new(chain.clone()));
        sync.bind(Some(chain.contract()));
        sync.refresh(chain.contract()).await.unwrap();

        let probe = Arc::new(OrderProbe {
            stats: sync.stats(),
            seen: Mutex::new(Vec::new()),
        });
        let submitter = EntrySubmitter::new(chain.clone(), sync.clone(), probe.clone(), 1);
        Fixture {
            chain,
            sync,
            probe,
            submitter,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmed_entry_notifies_then_refreshes() {
        let f = fixture().await;
        assert_eq!(f.started(), 1);

        let outcome = f.submitter.submit(f.available()).await.unwrap();

        assert!(matches!(outcome, SubmitOutcome::Confirmed { refreshed: true, .. }));
        // one notification, fired before the single follow-up refresh started
        assert_eq!(*f.probe.seen.lock(), vec![1]);
        assert_eq!(f.started(), 2);
        assert_eq!(f.sync.state().player_count, U256::from(1));
        assert!(!f.submitter.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_entry_has_no_side_effects() {
        let f = fixture().await;
        f.chain.reject_next_send("user denied transaction signature");

        let err = f.submitter.submit(f.available()).await.unwrap_err();

        assert!(matches!(err, RaffleError::Submission(_)));
        assert!(f.probe.seen.lock().is_empty());
        assert_eq!(f.started(), 1);
        assert!(!f.submitter.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_entry_is_a_submission_failure() {
        let f = fixture().await;
        f.chain.drop_next_transaction();

        let err = f.submitter.submit(f.available()).await.unwrap_err();

        assert!(matches!(err, RaffleError::Confirmation { .. }));
        assert!(err.is_submission_failure());
        assert!(f.probe.seen.lock().is_empty());
        assert_eq!(f.started(), 1);
        assert!(!f.submitter.is_busy());

        // retry works
        let outcome = f.submitter.submit(f.available()).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Confirmed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetching_transport_skips() {
        let f = fixture().await;
        f.chain.set_fetching(true);

        assert!(f.submitter.is_busy());
        let outcome = f.submitter.submit(f.available()).await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Skipped(SkipReason::TransportFetching));
        assert_eq!(f.chain.stats().sends.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_entry_while_pending_is_skipped() {
        let f = fixture().await;

        let (first, second) = tokio::join!(
            f.submitter.submit(f.available()),
            f.submitter.submit(f.available())
        );

        assert!(matches!(first.unwrap(), SubmitOutcome::Confirmed { .. }));
        assert_eq!(second.unwrap(), SubmitOutcome::Skipped(SkipReason::InFlight));
        assert_eq!(f.chain.stats().sends.load(Ordering::SeqCst), 1);
        assert_eq!(f.probe.seen.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_deployment_sends_nothing() {
        let f = fixture().await;
        let calls_before = f.chain.stats().total_calls();

        let err = f
            .submitter
            .submit(Availability::Unavailable { chain_id: Some(1) })
            .await
            .unwrap_err();

        assert_eq!(err, RaffleError::NoDeployment { chain_id: Some(1) });
        assert_eq!(f.chain.stats().total_calls(), calls_before);
        assert!(!f.submitter.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_fee_sends_nothing() {
        let chain = Arc::new(SimulatedChain::new(
            Address::repeat_byte(0xaa),
            Address::repeat_byte(0x01),
            U256::from(FEE),
        ));
        let sync = Arc::new(StateSynchronizer::new(chain.clone()));
        let (notifier, notifications) = ChannelNotifier::channel();
        let submitter = EntrySubmitter::new(chain.clone(), sync, Arc::new(notifier), 1);

        let err = submitter
            .submit(Availability::Available(chain.contract()))
            .await
            .unwrap_err();

        assert_eq!(err, RaffleError::EntranceFeeUnknown);
        assert_eq!(chain.stats().total_calls(), 0);
        assert!(notifications.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_underpaying_after_fee_raise_reverts() {
        let f = fixture().await;
        f.chain.set_entrance_fee(U256::from(FEE * 2));

        let err = f.submitter.submit(f.available()).await.unwrap_err();

        assert!(matches!(err, RaffleError::Submission(raffle_chain::TransportError::Reverted { .. })));
        assert!(f.probe.seen.lock().is_empty());
    }
}
