//! # Raffle Client
//!
//! Drives the entrance view against the in-memory simulated chain.
//!
//! ```bash
//! # Defaults: local chain 31337, fee 0.1 ETH
//! cargo run --bin raffle_client
//!
//! # Custom config
//! RAFFLE_CONFIG=raffle.toml cargo run --bin raffle_client
//! ```

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use raffle::chain::SimulatedChain;
use raffle::ui::{ChannelNotifier, NetworkContext, RaffleEntrance, SessionContext, SubmitOutcome};
use raffle::{logging, ClientConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    logging::init(config.level()?);

    let deployments = config.deployment_table()?;
    let chain_id = config.simulation.chain_id;
    let Some(contract) = deployments.resolve(chain_id) else {
        return Err(format!("no raffle deployment configured for chain {chain_id}").into());
    };

    let account = Address::repeat_byte(0x42);
    let chain = Arc::new(
        SimulatedChain::new(contract, account, config.simulation.entrance_fee()?)
            .with_block_time(Duration::from_millis(config.simulation.block_time_ms)),
    );
    let seeded: Vec<Address> = (1..=config.simulation.players)
        .map(player_address)
        .collect();
    chain.seed_players(&seeded);

    let (notifier, notifications) = ChannelNotifier::channel();
    let view = Arc::new(RaffleEntrance::new(
        config.view_config(),
        deployments,
        chain.clone(),
        Arc::new(notifier),
    ));

    let session = SessionContext::default();
    let binding = view.bind_session(&session);
    println!("{}", view.render());

    // Wallet connects: the gate resolves and the first refresh runs.
    let mut updates = view.synchronizer().subscribe();
    session.set(NetworkContext::connected(chain_id));
    updates.wait_for(|snapshot| snapshot.synced).await?;
    println!("{}", view.render());

    // Enter once.
    match view.enter().await {
        Ok(SubmitOutcome::Confirmed { receipt, .. }) => {
            tracing::info!(tx_hash = %receipt.tx_hash, block = receipt.block_number, "entered raffle");
        }
        Ok(SubmitOutcome::Skipped(reason)) => tracing::warn!(?reason, "entry skipped"),
        Err(error) => tracing::warn!(%error, "entry failed"),
    }
    while let Ok(notification) = notifications.try_recv() {
        println!("[{}] {}", notification.title, notification.message);
    }
    println!("{}", view.render());

    // The round closes on-chain; re-read to pick up the winner.
    chain.close_round(account);
    if let Err(error) = view.refresh().await {
        tracing::warn!(%error, "refresh failed");
    }
    println!("{}", view.render());

    // Switching to a network without a deployment disables the view.
    session.set(NetworkContext::connected(1));
    println!("{}", view.render());

    binding.shutdown().await;
    Ok(())
}

/// Deterministic address for the `n`th seeded player.
fn player_address(n: u32) -> Address {
    let mut bytes = [0u8; 20];
    bytes[16..].copy_from_slice(&n.to_be_bytes());
    Address::from(bytes)
}
