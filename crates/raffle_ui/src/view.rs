//! # Raffle Entrance View
//!
//! Ties the gate, synchronizer and submitter to a session and renders the
//! result.
//!
//! ```text
//! session change ──▶ gate (sync, immediate) ──▶ became active? ──▶ refresh task
//! enter()        ──▶ submitter ──▶ notify ──▶ refresh
//! render()       ──▶ NoAddress | Ready { trigger, fee, players, winner }
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use alloy_primitives::{Address, U256};
use parking_lot::Mutex;
use raffle_chain::{format_units, ContractTransport, DeploymentTable, ETHER_DECIMALS};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{RaffleError, RaffleResult};
use crate::gate::{Availability, AvailabilityGate};
use crate::notify::NotificationSink;
use crate::session::{NetworkContext, SessionContext, Subscription};
use crate::submit::{EntrySubmitter, SubmitOutcome};
use crate::sync::{RefreshOutcome, StateSynchronizer};

/// Shown when the connected network has no raffle.
pub const NO_ADDRESS_MESSAGE: &str = "No Raffle Address Detected!";

/// Trigger label when idle.
pub const ENTER_LABEL: &str = "Enter Raffle";

/// Trigger label while busy.
pub const BUSY_LABEL: &str = "...";

/// How base-unit amounts are displayed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrencyFormat {
    /// Symbol appended to amounts.
    pub symbol: String,
    /// Decimals of one display unit.
    pub decimals: u8,
}

impl CurrencyFormat {
    /// Formats `amount` as `"<decimal> <symbol>"`.
    #[must_use]
    pub fn format(&self, amount: U256) -> String {
        format!("{} {}", format_units(amount, self.decimals), self.symbol)
    }
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self {
            symbol: "ETH".to_string(),
            decimals: ETHER_DECIMALS,
        }
    }
}

/// View settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewConfig {
    /// Amount formatting.
    pub currency: CurrencyFormat,
    /// Confirmations to wait for after an entry.
    pub confirmations: u64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            currency: CurrencyFormat::default(),
            confirmations: 1,
        }
    }
}

/// The entry button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TriggerControl {
    /// Whether a click does anything.
    pub enabled: bool,
    /// Label or spinner text.
    pub label: &'static str,
}

impl TriggerControl {
    const fn new(busy: bool) -> Self {
        if busy {
            Self {
                enabled: false,
                label: BUSY_LABEL,
            }
        } else {
            Self {
                enabled: true,
                label: ENTER_LABEL,
            }
        }
    }
}

/// The view when a raffle resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadyView {
    /// Raffle address.
    pub address: Address,
    /// Entry button.
    pub trigger: TriggerControl,
    /// Fee, e.g. `"0.1 ETH"`.
    pub entrance_fee: String,
    /// Player count.
    pub player_count: String,
    /// Recent winner address or `"0x"`.
    pub recent_winner: String,
    /// The last refresh failed; values may be out of date.
    pub stale: bool,
}

/// Observable output of the view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderedView {
    /// No raffle on this network.
    NoAddress {
        /// Explanation for the user.
        message: &'static str,
    },
    /// Raffle found.
    Ready(ReadyView),
}

impl RenderedView {
    /// The entry button, absent when no raffle resolved.
    #[must_use]
    pub const fn trigger(&self) -> Option<&TriggerControl> {
        match self {
            Self::NoAddress { .. } => None,
            Self::Ready(view) => Some(&view.trigger),
        }
    }
}

impl fmt::Display for RenderedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Raffle Entrance")?;
        match self {
            Self::NoAddress { message } => writeln!(f, "{message}"),
            Self::Ready(view) => {
                let state = if view.trigger.enabled { "" } else { " (disabled)" };
                writeln!(f, "[ {} ]{state}", view.trigger.label)?;
                writeln!(f, "Entrance Fee: {}", view.entrance_fee)?;
                writeln!(f, "Number of Players: {}", view.player_count)?;
                writeln!(f, "Recent Winner: {}", view.recent_winner)?;
                if view.stale {
                    writeln!(f, "(last refresh failed, showing previous values)")?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Mounted {
    context: NetworkContext,
    availability: Availability,
}

/// The raffle entrance: state, entry and rendering for one raffle.
pub struct RaffleEntrance {
    gate: AvailabilityGate,
    synchronizer: Arc<StateSynchronizer>,
    submitter: EntrySubmitter,
    currency: CurrencyFormat,
    mounted: Mutex<Mounted>,
}

impl RaffleEntrance {
    /// Builds the view. Starts disconnected with nothing resolved.
    #[must_use]
    pub fn new(
        config: ViewConfig,
        deployments: DeploymentTable,
        transport: Arc<dyn ContractTransport>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let synchronizer = Arc::new(StateSynchronizer::new(Arc::clone(&transport)));
        let submitter = EntrySubmitter::new(
            transport,
            Arc::clone(&synchronizer),
            notifier,
            config.confirmations,
        );
        let context = NetworkContext::disconnected();

        Self {
            gate: AvailabilityGate::new(deployments),
            synchronizer,
            submitter,
            currency: config.currency,
            mounted: Mutex::new(Mounted {
                context,
                availability: Availability::Unavailable {
                    chain_id: context.chain_id,
                },
            }),
        }
    }

    /// Current gate result.
    #[must_use]
    pub fn availability(&self) -> Availability {
        self.mounted.lock().availability
    }

    /// Last network context seen.
    #[must_use]
    pub fn context(&self) -> NetworkContext {
        self.mounted.lock().context
    }

    /// The synchronizer, for subscribing to state changes.
    #[must_use]
    pub const fn synchronizer(&self) -> &Arc<StateSynchronizer> {
        &self.synchronizer
    }

    /// True while an entry is pending or the transport is fetching.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.submitter.is_busy()
    }

    /// Re-evaluates the gate for `context`.
    ///
    /// Returns the address to refresh when the wallet just became active on a
    /// network with a raffle, or switched to a different raffle while active.
    pub fn apply_network_change(&self, context: NetworkContext) -> Option<Address> {
        let availability = self.gate.evaluate(&context);
        let previous = {
            let mut mounted = self.mounted.lock();
            std::mem::replace(
                &mut *mounted,
                Mounted {
                    context,
                    availability,
                },
            )
        };

        let address = availability.address();
        let address_changed = address != previous.availability.address();
        if address_changed {
            // Whatever is displayed belongs to another contract.
            self.synchronizer.bind(address);
            tracing::info!(chain_id = ?context.chain_id, address = ?address, "raffle availability changed");
        }

        let became_active = context.web3_enabled && (!previous.context.web3_enabled || address_changed);
        if became_active {
            address
        } else {
            None
        }
    }

    /// Applies `context` and runs the refresh it calls for, if any.
    pub async fn on_network_change(&self, context: NetworkContext) -> Option<RaffleResult<RefreshOutcome>> {
        let address = self.apply_network_change(context)?;
        Some(self.synchronizer.refresh(address).await)
    }

    /// Re-reads the raffle state.
    ///
    /// # Errors
    ///
    /// [`RaffleError::NoDeployment`] without any call if no raffle resolved,
    /// or [`RaffleError::Read`] if a field failed.
    pub async fn refresh(&self) -> RaffleResult<RefreshOutcome> {
        match self.availability() {
            Availability::Available(address) => self.synchronizer.refresh(address).await,
            Availability::Unavailable { chain_id } => Err(RaffleError::NoDeployment { chain_id }),
        }
    }

    /// Enters the raffle (the trigger's click handler).
    ///
    /// # Errors
    ///
    /// See [`EntrySubmitter::submit`].
    pub async fn enter(&self) -> RaffleResult<SubmitOutcome> {
        self.submitter.submit(self.availability()).await
    }

    /// Renders the current state.
    #[must_use]
    pub fn render(&self) -> RenderedView {
        match self.availability() {
            Availability::Unavailable { .. } => RenderedView::NoAddress {
                message: NO_ADDRESS_MESSAGE,
            },
            Availability::Available(address) => {
                let snapshot = self.synchronizer.snapshot();
                RenderedView::Ready(ReadyView {
                    address,
                    trigger: TriggerControl::new(self.is_busy()),
                    entrance_fee: self.currency.format(snapshot.state.entrance_fee),
                    player_count: snapshot.state.player_count_string(),
                    recent_winner: snapshot.state.recent_winner_string(),
                    stale: snapshot.stale,
                })
            }
        }
    }

    /// Mounts the view on a session.
    ///
    /// The current context is applied right away, then every change. Gate
    /// decisions happen inside the change callback; refreshes run on a
    /// spawned task.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn bind_session(self: &Arc<Self>, session: &SessionContext) -> SessionBinding {
        let (refresh_tx, mut refresh_rx) = mpsc::unbounded_channel::<Address>();

        let view = Arc::downgrade(self);
        let on_change = move |context: &NetworkContext| {
            let Some(view) = view.upgrade() else {
                return;
            };
            if let Some(address) = view.apply_network_change(*context) {
                // The receiver only goes away with the task, after unbind.
                let _ = refresh_tx.send(address);
            }
        };
        on_change(&session.current());
        let subscription = session.subscribe(on_change);

        let worker: Weak<Self> = Arc::downgrade(self);
        let task = tokio::spawn(async move {
            while let Some(address) = refresh_rx.recv().await {
                let Some(view) = worker.upgrade() else {
                    break;
                };
                if view.availability().address() != Some(address) {
                    tracing::debug!(%address, "network moved on, skipping refresh");
                    continue;
                }
                if let Err(error) = view.synchronizer.refresh(address).await {
                    tracing::warn!(%error, "refresh after session change failed");
                }
            }
        });

        SessionBinding { subscription, task }
    }
}

/// A view mounted on a session.
pub struct SessionBinding {
    subscription: Subscription,
    task: JoinHandle<()>,
}

impl SessionBinding {
    /// Stops following the session. Safe to call more than once.
    pub fn unbind(&mut self) {
        self.subscription.unsubscribe();
    }

    /// Returns true until [`unbind`](Self::unbind) is called.
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.subscription.is_active()
    }

    /// Unbinds and waits for queued refreshes to finish.
    pub async fn shutdown(mut self) {
        self.unbind();
        if let Err(error) = (&mut self.task).await {
            tracing::warn!(%error, "session task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ChannelNotifier;
    use alloy_primitives::U256;
    use crossbeam_channel::Receiver;
    use raffle_chain::deployment::{LOCAL_CHAIN_ID, LOCAL_RAFFLE_ADDRESS};
    use raffle_chain::{IRaffle, SimulatedChain};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use crate::notify::Notification;

    const FEE: u64 = 100_000_000_000_000_000;

    fn setup() -> (Arc<SimulatedChain>, Arc<RaffleEntrance>, Receiver<Notification>) {
        let chain = Arc::new(SimulatedChain::new(
            LOCAL_RAFFLE_ADDRESS,
            Address::repeat_byte(0x01),
            U256::from(FEE),
        ));
        let (notifier, notifications) = ChannelNotifier::channel();
        let view = Arc::new(RaffleEntrance::new(
            ViewConfig::default(),
            DeploymentTable::local_development(),
            chain.clone(),
            Arc::new(notifier),
        ));
        (chain, view, notifications)
    }

    fn ready(view: &RaffleEntrance) -> ReadyView {
        match view.render() {
            RenderedView::Ready(ready) => ready,
            other => panic!("expected ready view, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_network_shows_absence_and_makes_no_calls() {
        let (chain, view, notifications) = setup();

        assert!(view.on_network_change(NetworkContext::connected(1)).await.is_none());

        let rendered = view.render();
        assert_eq!(rendered, RenderedView::NoAddress { message: NO_ADDRESS_MESSAGE });
        assert!(rendered.trigger().is_none());
        assert!(rendered.to_string().contains("No Raffle Address Detected!"));

        assert_eq!(
            view.enter().await.unwrap_err(),
            RaffleError::NoDeployment { chain_id: Some(1) }
        );
        assert!(view.refresh().await.is_err());
        assert_eq!(chain.stats().total_calls(), 0);
        assert!(notifications.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_view_values() {
        let (chain, view, _notifications) = setup();
        chain.seed_players(&[Address::repeat_byte(2), Address::repeat_byte(3), Address::repeat_byte(4)]);

        let refreshed = view.on_network_change(NetworkContext::connected(LOCAL_CHAIN_ID)).await;
        assert!(matches!(refreshed, Some(Ok(RefreshOutcome::Applied(_)))));

        let ready = ready(&view);
        assert_eq!(ready.entrance_fee, "0.1 ETH");
        assert_eq!(ready.player_count, "3");
        assert_eq!(ready.recent_winner, "0x0000000000000000000000000000000000000000");
        assert_eq!(ready.trigger, TriggerControl { enabled: true, label: ENTER_LABEL });
        assert!(!ready.stale);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_values_before_refresh() {
        let (_chain, view, _notifications) = setup();

        // known network, wallet not active yet: no refresh
        assert!(view
            .on_network_change(NetworkContext {
                chain_id: Some(LOCAL_CHAIN_ID),
                web3_enabled: false,
            })
            .await
            .is_none());

        let ready = ready(&view);
        assert_eq!(ready.entrance_fee, "0.0 ETH");
        assert_eq!(ready.player_count, "0");
        assert_eq!(ready.recent_winner, "0x");
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_transport_disables_trigger() {
        let (chain, view, notifications) = setup();
        view.on_network_change(NetworkContext::connected(LOCAL_CHAIN_ID)).await;
        chain.set_fetching(true);

        assert_eq!(ready(&view).trigger, TriggerControl { enabled: false, label: BUSY_LABEL });
        assert!(matches!(view.enter().await.unwrap(), SubmitOutcome::Skipped(_)));
        assert_eq!(chain.stats().sends.load(Ordering::SeqCst), 0);
        assert!(notifications.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmed_entry_overwrites_state_once() {
        let (chain, view, notifications) = setup();
        view.on_network_change(NetworkContext::connected(LOCAL_CHAIN_ID)).await;
        let applied_before = view.synchronizer().stats().applied.load(Ordering::SeqCst);

        let outcome = view.enter().await.unwrap();

        assert!(matches!(outcome, SubmitOutcome::Confirmed { refreshed: true, .. }));
        assert_eq!(notifications.try_recv().unwrap(), Notification::transaction_complete());
        assert!(notifications.try_recv().is_err());
        assert_eq!(
            view.synchronizer().stats().applied.load(Ordering::SeqCst),
            applied_before + 1
        );
        assert_eq!(ready(&view).player_count, "1");
        assert_eq!(chain.player_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_entry_reenables_trigger() {
        let (chain, view, notifications) = setup();
        view.on_network_change(NetworkContext::connected(LOCAL_CHAIN_ID)).await;
        chain.reject_next_send("user rejected");

        assert!(view.enter().await.unwrap_err().is_submission_failure());
        assert!(notifications.try_recv().is_err());
        assert!(ready(&view).trigger.enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_read_renders_stale_marker() {
        let (chain, view, _notifications) = setup();
        view.on_network_change(NetworkContext::connected(LOCAL_CHAIN_ID)).await;
        chain.fail_reads::<IRaffle::getNumberOfPlayersCall>();

        assert!(view.refresh().await.is_err());

        let ready = ready(&view);
        assert!(ready.stale);
        assert_eq!(ready.entrance_fee, "0.1 ETH");
        assert!(view.render().to_string().contains("last refresh failed"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_switching_away_clears_state() {
        let (_chain, view, _notifications) = setup();
        view.on_network_change(NetworkContext::connected(LOCAL_CHAIN_ID)).await;
        assert!(view.synchronizer().snapshot().synced);

        view.on_network_change(NetworkContext::connected(1)).await;
        assert!(!view.synchronizer().snapshot().synced);
        assert_eq!(view.render().trigger(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_switch_during_confirmation_keeps_old_triple_out() {
        let other = Address::repeat_byte(0x77);
        let chain = Arc::new(
            SimulatedChain::new(LOCAL_RAFFLE_ADDRESS, Address::repeat_byte(0x01), U256::from(FEE))
                .with_block_time(Duration::from_millis(100)),
        );
        let (notifier, notifications) = ChannelNotifier::channel();
        let view = RaffleEntrance::new(
            ViewConfig::default(),
            DeploymentTable::local_development().with_deployment(5, vec![other]),
            chain.clone(),
            Arc::new(notifier),
        );
        view.on_network_change(NetworkContext::connected(LOCAL_CHAIN_ID)).await;

        let switch = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            view.apply_network_change(NetworkContext::connected(5))
        };
        let (outcome, refresh_target) = tokio::join!(view.enter(), switch);

        // the entry itself confirmed on the old raffle
        assert_eq!(refresh_target, Some(other));
        assert!(matches!(outcome.unwrap(), SubmitOutcome::Confirmed { refreshed: false, .. }));
        assert_eq!(notifications.try_recv().unwrap(), Notification::transaction_complete());
        assert!(notifications.try_recv().is_err());

        let snapshot = view.synchronizer().snapshot();
        assert_eq!(snapshot.contract, Some(other));
        assert!(!snapshot.synced);

        let ready = ready(&view);
        assert_eq!(ready.address, other);
        assert_eq!(ready.entrance_fee, "0.0 ETH");
        assert_eq!(ready.player_count, "0");

        // no fee known for the new raffle yet, so nothing is sent
        assert_eq!(view.enter().await.unwrap_err(), RaffleError::EntranceFeeUnknown);
        assert_eq!(chain.stats().sends.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_binding_follows_changes() {
        let (chain, view, _notifications) = setup();
        chain.seed_players(&[Address::repeat_byte(2)]);
        let session = SessionContext::default();
        let mut updates = view.synchronizer().subscribe();

        let binding = view.bind_session(&session);
        assert!(binding.is_bound());
        assert_eq!(view.render().trigger(), None);

        session.set(NetworkContext::connected(LOCAL_CHAIN_ID));
        updates.wait_for(|snapshot| snapshot.synced).await.unwrap();
        assert_eq!(ready(&view).player_count, "1");

        // gate re-evaluates inside the callback, no await needed
        session.set(NetworkContext::connected(1));
        assert_eq!(view.render().trigger(), None);

        binding.shutdown().await;
        assert_eq!(session.subscriber_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_binding_mounts_current_context() {
        let (_chain, view, _notifications) = setup();
        let session = SessionContext::new(NetworkContext::connected(LOCAL_CHAIN_ID));
        let mut updates = view.synchronizer().subscribe();

        let mut binding = view.bind_session(&session);
        updates.wait_for(|snapshot| snapshot.synced).await.unwrap();

        binding.unbind();
        binding.unbind();
        assert!(!binding.is_bound());
        assert_eq!(session.subscriber_count(), 0);
    }
}
