//! Availability gate: is the raffle deployed on the connected network?

use alloy_primitives::Address;
use raffle_chain::DeploymentTable;

use crate::session::NetworkContext;

/// Result of resolving the raffle for a network.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Availability {
    /// The raffle lives at this address.
    Available(Address),
    /// Nothing deployed on this network; no calls may be made.
    Unavailable {
        /// The network that was checked.
        chain_id: Option<u64>,
    },
}

impl Availability {
    /// The resolved address, if any.
    #[must_use]
    pub const fn address(&self) -> Option<Address> {
        match self {
            Self::Available(address) => Some(*address),
            Self::Unavailable { .. } => None,
        }
    }

    /// Returns true if an address resolved.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// Resolves the raffle address from the session's network.
#[derive(Clone, Debug)]
pub struct AvailabilityGate {
    deployments: DeploymentTable,
}

impl AvailabilityGate {
    /// Creates a gate over a deployment table.
    #[must_use]
    pub const fn new(deployments: DeploymentTable) -> Self {
        Self { deployments }
    }

    /// Resolves the raffle for `context`. Pure lookup, no calls.
    #[must_use]
    pub fn evaluate(&self, context: &NetworkContext) -> Availability {
        context
            .chain_id
            .and_then(|chain_id| self.deployments.resolve(chain_id))
            .map_or(
                Availability::Unavailable {
                    chain_id: context.chain_id,
                },
                Availability::Available,
            )
    }
}
