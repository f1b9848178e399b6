//! The closed set of contract events the indexer understands.
//!
//! Every event the staking and token contracts emit is one variant of
//! [`ContractEvent`]. Adding an event means adding a variant here, a row to
//! [`EventKind::ALL`] and a decode rule in the decoder crate.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::address::Address;
use crate::amount::Amount;

/// The contract that emitted a log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContractFamily {
    /// Node registration, staking and lifecycle contract.
    Staking,
    /// Liquid-staking token contract.
    Token,
}

impl ContractFamily {
    pub const ALL: [ContractFamily; 2] = [ContractFamily::Staking, ContractFamily::Token];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractFamily::Staking => "staking",
            ContractFamily::Token => "token",
        }
    }
}

impl fmt::Display for ContractFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fieldless discriminant of [`ContractEvent`], used for signature lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Registered,
    Deactivated,
    Faulted,
    Recovered,
    Staked,
    Unstaked,
    RewardsDistributed,
    Transfer,
    Deposited,
    ReferralRewarded,
    BurnQueued,
    CreditAssigned,
    CreditClaimed,
}

impl EventKind {
    pub const ALL: [EventKind; 13] = [
        EventKind::Registered,
        EventKind::Deactivated,
        EventKind::Faulted,
        EventKind::Recovered,
        EventKind::Staked,
        EventKind::Unstaked,
        EventKind::RewardsDistributed,
        EventKind::Transfer,
        EventKind::Deposited,
        EventKind::ReferralRewarded,
        EventKind::BurnQueued,
        EventKind::CreditAssigned,
        EventKind::CreditClaimed,
    ];

    /// Name persisted for logs whose signature is not in the table.
    pub const UNKNOWN_NAME: &'static str = "Unknown";

    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Registered => "Registered",
            EventKind::Deactivated => "Deactivated",
            EventKind::Faulted => "Faulted",
            EventKind::Recovered => "Recovered",
            EventKind::Staked => "Staked",
            EventKind::Unstaked => "Unstaked",
            EventKind::RewardsDistributed => "RewardsDistributed",
            EventKind::Transfer => "Transfer",
            EventKind::Deposited => "Deposited",
            EventKind::ReferralRewarded => "ReferralRewarded",
            EventKind::BurnQueued => "BurnQueued",
            EventKind::CreditAssigned => "CreditAssigned",
            EventKind::CreditClaimed => "CreditClaimed",
        }
    }

    /// Canonical Solidity signature; `keccak256` of it is `topics[0]`.
    pub fn signature(&self) -> &'static str {
        match self {
            EventKind::Registered => "Registered(address,uint8)",
            EventKind::Deactivated => "Deactivated(address)",
            EventKind::Faulted => "Faulted(address)",
            EventKind::Recovered => "Recovered(address)",
            EventKind::Staked => "Staked(address,uint256)",
            EventKind::Unstaked => "Unstaked(address,uint256)",
            EventKind::RewardsDistributed => "RewardsDistributed(uint256)",
            EventKind::Transfer => "Transfer(address,address,uint256)",
            EventKind::Deposited => "Deposited(address,uint256,uint256,uint256)",
            EventKind::ReferralRewarded => "ReferralRewarded(address,address,uint256)",
            EventKind::BurnQueued => "BurnQueued(address,uint256,uint256,uint256,uint256)",
            EventKind::CreditAssigned => "CreditAssigned(address,uint256,address,uint256)",
            EventKind::CreditClaimed => "CreditClaimed(address,uint256)",
        }
    }

    pub fn family(&self) -> ContractFamily {
        match self {
            EventKind::Registered
            | EventKind::Deactivated
            | EventKind::Faulted
            | EventKind::Recovered
            | EventKind::Staked
            | EventKind::Unstaked
            | EventKind::RewardsDistributed => ContractFamily::Staking,
            EventKind::Transfer
            | EventKind::Deposited
            | EventKind::ReferralRewarded
            | EventKind::BurnQueued
            | EventKind::CreditAssigned
            | EventKind::CreditClaimed => ContractFamily::Token,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded contract event with typed arguments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractEvent {
    /// A node joined (or re-joined) the operator set.
    Registered { node: Address, node_type: u8 },
    Deactivated { node: Address },
    Faulted { node: Address },
    Recovered { node: Address },
    Staked { node: Address, amount: Amount },
    Unstaked { node: Address, amount: Amount },
    /// Staking rewards added to the protocol's asset backing.
    RewardsDistributed { amount: Amount },
    Transfer { from: Address, to: Address, value: Amount },
    /// Assets deposited for freshly minted shares.
    Deposited {
        account: Address,
        assets: Amount,
        shares: Amount,
        fee: Amount,
    },
    ReferralRewarded {
        referrer: Address,
        depositor: Address,
        reward: Amount,
    },
    /// Shares burned into the redemption queue.
    BurnQueued {
        account: Address,
        queue_index: u64,
        shares: Amount,
        expected_assets: Amount,
        tip: Amount,
    },
    /// A keeper credited a matured redemption.
    CreditAssigned {
        account: Address,
        queue_index: u64,
        keeper: Address,
        assets: Amount,
    },
    CreditClaimed { account: Address, assets: Amount },
}

impl ContractEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ContractEvent::Registered { .. } => EventKind::Registered,
            ContractEvent::Deactivated { .. } => EventKind::Deactivated,
            ContractEvent::Faulted { .. } => EventKind::Faulted,
            ContractEvent::Recovered { .. } => EventKind::Recovered,
            ContractEvent::Staked { .. } => EventKind::Staked,
            ContractEvent::Unstaked { .. } => EventKind::Unstaked,
            ContractEvent::RewardsDistributed { .. } => EventKind::RewardsDistributed,
            ContractEvent::Transfer { .. } => EventKind::Transfer,
            ContractEvent::Deposited { .. } => EventKind::Deposited,
            ContractEvent::ReferralRewarded { .. } => EventKind::ReferralRewarded,
            ContractEvent::BurnQueued { .. } => EventKind::BurnQueued,
            ContractEvent::CreditAssigned { .. } => EventKind::CreditAssigned,
            ContractEvent::CreditClaimed { .. } => EventKind::CreditClaimed,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_and_signatures_are_unique() {
        let names: HashSet<_> = EventKind::ALL.iter().map(|k| k.name()).collect();
        let sigs: HashSet<_> = EventKind::ALL.iter().map(|k| k.signature()).collect();
        assert_eq!(names.len(), EventKind::ALL.len());
        assert_eq!(sigs.len(), EventKind::ALL.len());
        assert!(!names.contains(EventKind::UNKNOWN_NAME));
    }

    #[test]
    fn signature_starts_with_name() {
        for kind in EventKind::ALL {
            assert!(kind.signature().starts_with(&format!("{}(", kind.name())));
        }
    }

    #[test]
    fn kind_matches_variant() {
        let ev = ContractEvent::Transfer {
            from: Address::ZERO,
            to: Address::new([1; 20]),
            value: Amount::from_u64(1),
        };
        assert_eq!(ev.kind(), EventKind::Transfer);
        assert_eq!(ev.kind().family(), ContractFamily::Token);
    }
}
