//! # Simulated Chain
//!
//! In-memory raffle contract behind a [`ContractTransport`].
//! Used by the demo client and by tests, no network I/O.
//!
//! Supports fault injection so every error path of the client can be driven:
//! failing reads, wallet rejection, dropped transactions, a busy wallet and
//! slow responses.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::contracts::{IRaffle, NOT_ENOUGH_ETH_ENTERED};
use crate::error::TransportError;
use crate::transport::{ContractCall, ContractTransport, PendingTransaction, TxReceipt};

/// Call counters of the simulated chain.
#[derive(Debug, Default)]
pub struct ChainStats {
    /// Read-only calls received.
    pub reads: AtomicU64,
    /// Transactions submitted (accepted or not).
    pub sends: AtomicU64,
    /// Transactions that reached their confirmation threshold.
    pub confirmed: AtomicU64,
}

impl ChainStats {
    /// Total calls of any kind.
    #[must_use]
    pub fn total_calls(&self) -> u64 {
        self.reads.load(Ordering::Relaxed) + self.sends.load(Ordering::Relaxed)
    }
}

/// Contract storage.
#[derive(Debug)]
struct RaffleStorage {
    entrance_fee: U256,
    players: Vec<Address>,
    recent_winner: Address,
    block_number: u64,
    nonce: u64,
}

/// Pending faults, consumed as they fire.
#[derive(Debug, Default)]
struct Faults {
    failing_reads: HashSet<[u8; 4]>,
    reject_next_send: Option<String>,
    drop_next_tx: bool,
    read_delay: Duration,
}

/// An in-memory raffle deployment.
pub struct SimulatedChain {
    /// Where the raffle is "deployed".
    contract: Address,
    /// The connected wallet account.
    account: Address,
    /// Time to mine one block.
    block_time: Duration,
    storage: Arc<Mutex<RaffleStorage>>,
    faults: Mutex<Faults>,
    fetching: AtomicBool,
    stats: Arc<ChainStats>,
}

impl SimulatedChain {
    /// Deploys a raffle at `contract` with the given fee, seen from `account`.
    #[must_use]
    pub fn new(contract: Address, account: Address, entrance_fee: U256) -> Self {
        Self {
            contract,
            account,
            block_time: Duration::from_millis(10),
            storage: Arc::new(Mutex::new(RaffleStorage {
                entrance_fee,
                players: Vec::new(),
                recent_winner: Address::ZERO,
                block_number: 1,
                nonce: 0,
            })),
            faults: Mutex::new(Faults::default()),
            fetching: AtomicBool::new(false),
            stats: Arc::new(ChainStats::default()),
        }
    }

    /// Sets the block time.
    #[must_use]
    pub fn with_block_time(mut self, block_time: Duration) -> Self {
        self.block_time = block_time;
        self
    }

    /// Address of the raffle contract.
    #[must_use]
    pub const fn contract(&self) -> Address {
        self.contract
    }

    /// Address of the wallet account.
    #[must_use]
    pub const fn account(&self) -> Address {
        self.account
    }

    /// Returns the call counters.
    #[must_use]
    pub fn stats(&self) -> Arc<ChainStats> {
        Arc::clone(&self.stats)
    }

    // ---------------------------------------------------------------------
    // Contract state
    // ---------------------------------------------------------------------

    /// Current entrance fee.
    #[must_use]
    pub fn entrance_fee(&self) -> U256 {
        self.storage.lock().entrance_fee
    }

    /// Changes the entrance fee (owner action).
    pub fn set_entrance_fee(&self, fee: U256) {
        self.storage.lock().entrance_fee = fee;
    }

    /// Players in the current round.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.storage.lock().players.len()
    }

    /// Adds players without going through the transport.
    pub fn seed_players(&self, players: &[Address]) {
        self.storage.lock().players.extend_from_slice(players);
    }

    /// Winner of the last closed round.
    #[must_use]
    pub fn recent_winner(&self) -> Address {
        self.storage.lock().recent_winner
    }

    /// Current block height.
    #[must_use]
    pub fn block_number(&self) -> u64 {
        self.storage.lock().block_number
    }

    /// Closes the round: records `winner` and clears the players.
    ///
    /// Stands in for the contract's own upkeep; the winner is chosen by the caller.
    pub fn close_round(&self, winner: Address) {
        let mut storage = self.storage.lock();
        storage.recent_winner = winner;
        storage.players.clear();
        storage.block_number += 1;
        tracing::debug!(%winner, block = storage.block_number, "simulated round closed");
    }

    // ---------------------------------------------------------------------
    // Fault injection
    // ---------------------------------------------------------------------

    /// Makes every read of `C` fail until cleared.
    pub fn fail_reads<C: SolCall>(&self) {
        self.faults.lock().failing_reads.insert(C::SELECTOR);
    }

    /// Clears all read failures.
    pub fn clear_read_failures(&self) {
        self.faults.lock().failing_reads.clear();
    }

    /// Makes the wallet reject the next transaction.
    pub fn reject_next_send(&self, reason: impl Into<String>) {
        self.faults.lock().reject_next_send = Some(reason.into());
    }

    /// Drops the next accepted transaction before it confirms.
    pub fn drop_next_transaction(&self) {
        self.faults.lock().drop_next_tx = true;
    }

    /// Sets the wallet's fetching flag.
    pub fn set_fetching(&self, fetching: bool) {
        self.fetching.store(fetching, Ordering::SeqCst);
    }

    /// Delays every read response.
    ///
    /// The response reflects the state at request time, as if it came from
    /// the block the node was on when the request arrived.
    pub fn set_read_delay(&self, delay: Duration) {
        self.faults.lock().read_delay = delay;
    }

    fn answer(&self, call: &ContractCall) -> Result<Bytes, TransportError> {
        if call.address != self.contract {
            return Err(TransportError::Network(format!(
                "no contract code at {}",
                call.address
            )));
        }

        let selector = call.selector().unwrap_or_default();
        if self.faults.lock().failing_reads.contains(&selector) {
            return Err(TransportError::Network(format!(
                "{} timed out",
                call.function
            )));
        }

        let storage = self.storage.lock();
        let word = if selector == IRaffle::getEntranceFeeCall::SELECTOR {
            uint_word(storage.entrance_fee)
        } else if selector == IRaffle::getNumberOfPlayersCall::SELECTOR {
            uint_word(U256::from(storage.players.len()))
        } else if selector == IRaffle::getRecentWinnerCall::SELECTOR {
            address_word(storage.recent_winner)
        } else {
            return Err(TransportError::UnknownSelector { selector });
        };
        Ok(Bytes::copy_from_slice(&word))
    }
}

fn uint_word(value: U256) -> [u8; 32] {
    value.to_be_bytes::<32>()
}

fn address_word(address: Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_slice());
    word
}

#[async_trait]
impl ContractTransport for SimulatedChain {
    async fn read(&self, call: ContractCall) -> Result<Bytes, TransportError> {
        self.stats.reads.fetch_add(1, Ordering::Relaxed);

        let response = self.answer(&call);
        let delay = self.faults.lock().read_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        response
    }

    async fn send(&self, call: ContractCall) -> Result<Box<dyn PendingTransaction>, TransportError> {
        self.stats.sends.fetch_add(1, Ordering::Relaxed);

        let drop_tx = {
            let mut faults = self.faults.lock();
            if let Some(reason) = faults.reject_next_send.take() {
                return Err(TransportError::Rejected(reason));
            }
            std::mem::take(&mut faults.drop_next_tx)
        };

        if call.address != self.contract {
            return Err(TransportError::Network(format!(
                "no contract code at {}",
                call.address
            )));
        }
        let selector = call.selector().unwrap_or_default();
        if selector != IRaffle::enterRaffleCall::SELECTOR {
            return Err(TransportError::UnknownSelector { selector });
        }

        let value = call.value.unwrap_or_default();
        let tx_hash = {
            let mut storage = self.storage.lock();
            if value < storage.entrance_fee {
                return Err(TransportError::Reverted {
                    reason: NOT_ENOUGH_ETH_ENTERED.to_string(),
                });
            }
            storage.nonce += 1;
            let mut preimage = self.account.to_vec();
            preimage.extend_from_slice(&storage.nonce.to_be_bytes());
            keccak256(preimage)
        };

        tracing::debug!(%tx_hash, %value, "simulated entry accepted");

        Ok(Box::new(SimulatedPendingTx {
            tx_hash,
            player: self.account,
            block_time: self.block_time,
            storage: Arc::clone(&self.storage),
            stats: Arc::clone(&self.stats),
            dropped: drop_tx,
            mined_at: None,
        }))
    }

    fn is_fetching(&self) -> bool {
        self.fetching.load(Ordering::SeqCst)
    }
}

/// An entry waiting to be mined on the simulated chain.
struct SimulatedPendingTx {
    tx_hash: B256,
    player: Address,
    block_time: Duration,
    storage: Arc<Mutex<RaffleStorage>>,
    stats: Arc<ChainStats>,
    dropped: bool,
    mined_at: Option<u64>,
}

#[async_trait]
impl PendingTransaction for SimulatedPendingTx {
    fn tx_hash(&self) -> B256 {
        self.tx_hash
    }

    async fn wait(&mut self, confirmations: u64) -> Result<TxReceipt, TransportError> {
        let blocks = u32::try_from(confirmations.max(1)).unwrap_or(u32::MAX);
        tokio::time::sleep(self.block_time.saturating_mul(blocks)).await;

        if self.dropped {
            return Err(TransportError::Dropped {
                tx_hash: self.tx_hash,
            });
        }

        let block_number = {
            let mut storage = self.storage.lock();
            if let Some(block) = self.mined_at {
                block
            } else {
                storage.block_number += 1;
                storage.players.push(self.player);
                let block = storage.block_number;
                self.mined_at = Some(block);
                self.stats.confirmed.fetch_add(1, Ordering::Relaxed);
                block
            }
        };

        Ok(TxReceipt {
            tx_hash: self.tx_hash,
            block_number,
            confirmations,
        })
    }
}
