//! Mirrored contract state.

use std::fmt;

use alloy_primitives::{Address, U256};

/// Placeholder shown for the winner before the first refresh.
pub const WINNER_SENTINEL: &str = "0x";

/// The three contract fields the view mirrors.
///
/// Starts at zero / sentinel values and is only ever replaced as a whole by
/// a refresh that read all three fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayState {
    /// Entrance fee in base units.
    pub entrance_fee: U256,
    /// Players in the current round.
    pub player_count: U256,
    /// Winner of the last round; `None` until the chain has been read.
    pub recent_winner: Option<Address>,
}

impl DisplayState {
    /// Builds a state from decoded contract values.
    #[must_use]
    pub const fn from_chain(entrance_fee: U256, player_count: U256, recent_winner: Address) -> Self {
        Self {
            entrance_fee,
            player_count,
            recent_winner: Some(recent_winner),
        }
    }

    /// Fee as a decimal string in base units.
    #[must_use]
    pub fn entrance_fee_string(&self) -> String {
        self.entrance_fee.to_string()
    }

    /// Player count as an integer string.
    #[must_use]
    pub fn player_count_string(&self) -> String {
        self.player_count.to_string()
    }

    /// Checksummed winner address, or [`WINNER_SENTINEL`].
    #[must_use]
    pub fn recent_winner_string(&self) -> String {
        self.recent_winner
            .map_or_else(|| WINNER_SENTINEL.to_string(), |winner| winner.to_checksum(None))
    }
}

/// One of the mirrored fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateField {
    /// `getEntranceFee()`
    EntranceFee,
    /// `getNumberOfPlayers()`
    PlayerCount,
    /// `getRecentWinner()`
    RecentWinner,
}

impl fmt::Display for StateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::EntranceFee => "entrance fee",
            Self::PlayerCount => "player count",
            Self::RecentWinner => "recent winner",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_strings() {
        let state = DisplayState::default();

        assert_eq!(state.entrance_fee_string(), "0");
        assert_eq!(state.player_count_string(), "0");
        assert_eq!(state.recent_winner_string(), "0x");
    }

    #[test]
    fn test_chain_strings() {
        let state = DisplayState::from_chain(
            U256::from(100_000_000_000_000_000u64),
            U256::from(3),
            Address::ZERO,
        );

        assert_eq!(state.entrance_fee_string(), "100000000000000000");
        assert_eq!(state.player_count_string(), "3");
        assert_eq!(
            state.recent_winner_string(),
            "0x0000000000000000000000000000000000000000"
        );
    }
}
