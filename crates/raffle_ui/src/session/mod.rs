//! # Session Context
//!
//! Which network the wallet is on and whether it is active. Produced by the
//! wallet connector, read-only to the view.
//!
//! Changes are pushed to explicit subscribers. A [`Subscription`] can be
//! cancelled any number of times and cancels itself on drop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use raffle_chain::deployment::parse_chain_id;

/// Network the wallet is connected to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NetworkContext {
    /// Connected chain id, `None` when no network is known.
    pub chain_id: Option<u64>,
    /// Whether a wallet/provider is active.
    pub web3_enabled: bool,
}

impl NetworkContext {
    /// No wallet, no network.
    #[must_use]
    pub const fn disconnected() -> Self {
        Self {
            chain_id: None,
            web3_enabled: false,
        }
    }

    /// Active wallet on `chain_id`.
    #[must_use]
    pub const fn connected(chain_id: u64) -> Self {
        Self {
            chain_id: Some(chain_id),
            web3_enabled: true,
        }
    }

    /// Builds a context from a wallet-reported chain id such as `"0x7a69"`.
    ///
    /// An unparseable id means "no network".
    #[must_use]
    pub fn from_reported(chain_id: &str, web3_enabled: bool) -> Self {
        Self {
            chain_id: parse_chain_id(chain_id),
            web3_enabled,
        }
    }
}

type Callback = Arc<dyn Fn(&NetworkContext) + Send + Sync>;

struct SessionInner {
    current: Mutex<NetworkContext>,
    subscribers: Mutex<Vec<(u64, Callback)>>,
    next_id: AtomicU64,
}

impl SessionInner {
    fn remove(&self, id: u64) {
        self.subscribers.lock().retain(|(sid, _)| *sid != id);
    }
}

/// Shared session state with change subscriptions.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<SessionInner>,
}

impl SessionContext {
    /// Creates a session in the given state.
    #[must_use]
    pub fn new(initial: NetworkContext) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                current: Mutex::new(initial),
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Current network context.
    #[must_use]
    pub fn current(&self) -> NetworkContext {
        *self.inner.current.lock()
    }

    /// Publishes a new context. Subscribers run only if something changed.
    ///
    /// Returns true if subscribers were notified.
    pub fn set(&self, context: NetworkContext) -> bool {
        {
            let mut current = self.inner.current.lock();
            if *current == context {
                return false;
            }
            *current = context;
        }

        // Callbacks run without the lock so they may subscribe or unsubscribe.
        let callbacks: Vec<Callback> = self
            .inner
            .subscribers
            .lock()
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        tracing::debug!(
            chain_id = ?context.chain_id,
            web3_enabled = context.web3_enabled,
            subscribers = callbacks.len(),
            "session changed"
        );

        for callback in callbacks {
            callback(&context);
        }
        true
    }

    /// Registers `callback` for every future change.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&NetworkContext) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers.lock().push((id, Arc::new(callback)));

        Subscription {
            id,
            session: Arc::downgrade(&self.inner),
            active: true,
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(NetworkContext::disconnected())
    }
}

/// Handle to a session subscription.
pub struct Subscription {
    id: u64,
    session: Weak<SessionInner>,
    active: bool,
}

impl Subscription {
    /// Stops receiving changes. Safe to call more than once.
    pub fn unsubscribe(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(session) = self.session.upgrade() {
            session.remove(self.id);
        }
    }

    /// Returns true until [`unsubscribe`](Self::unsubscribe) is called.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
