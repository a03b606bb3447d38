//! # Contract Definitions
//!
//! Solidity interface of the raffle contract, generated with alloy's `sol!` macro.

// The sol! macro generates code that we can't document, so allow missing_docs
#![allow(missing_docs)]

use alloy_sol_types::sol;

sol! {
    /// The raffle contract. Fee, randomness and payout all live on-chain;
    /// the client only reads state and enters.
    #[derive(Debug)]
    interface IRaffle {
        /// Reverted when `msg.value` is below the entrance fee.
        error Raffle__NotEnoughETHEntered();

        /// Emitted when a player enters.
        event RaffleEnter(address indexed player);

        /// Emitted when a round closes and a winner is paid.
        event WinnerPicked(address indexed winner);

        /// Enters the raffle. Requires `msg.value >= getEntranceFee()`.
        function enterRaffle() external payable;

        /// Entrance fee in wei.
        function getEntranceFee() external view returns (uint256);

        /// Number of players in the current round.
        function getNumberOfPlayers() external view returns (uint256);

        /// Winner of the last closed round.
        function getRecentWinner() external view returns (address);
    }
}

/// Revert reason reported when an entry pays less than the fee.
pub const NOT_ENOUGH_ETH_ENTERED: &str = "Raffle__NotEnoughETHEntered";
