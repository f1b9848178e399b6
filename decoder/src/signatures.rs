//! `(family, topic0)` → [`EventKind`] lookup.

use std::collections::HashMap;

use alloy_sol_types::SolEvent;

use stakescan_types::{ContractFamily, EventKind, H256};

use crate::contracts::{IStaking, IToken};

/// The keccak-256 signature table, built once per decoder.
#[derive(Clone, Debug)]
pub struct SignatureTable {
    by_topic: HashMap<(ContractFamily, H256), EventKind>,
}

impl SignatureTable {
    pub fn new() -> Self {
        let by_topic = EventKind::ALL
            .iter()
            .map(|kind| ((kind.family(), topic0(*kind)), *kind))
            .collect();
        Self { by_topic }
    }

    pub fn lookup(&self, family: ContractFamily, topic0: &H256) -> Option<EventKind> {
        self.by_topic.get(&(family, *topic0)).copied()
    }

    pub fn len(&self) -> usize {
        self.by_topic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_topic.is_empty()
    }
}

impl Default for SignatureTable {
    fn default() -> Self {
        Self::new()
    }
}

/// The signature topic a log of `kind` carries in `topics[0]`.
pub fn topic0(kind: EventKind) -> H256 {
    let hash = match kind {
        EventKind::Registered => IStaking::Registered::SIGNATURE_HASH,
        EventKind::Deactivated => IStaking::Deactivated::SIGNATURE_HASH,
        EventKind::Faulted => IStaking::Faulted::SIGNATURE_HASH,
        EventKind::Recovered => IStaking::Recovered::SIGNATURE_HASH,
        EventKind::Staked => IStaking::Staked::SIGNATURE_HASH,
        EventKind::Unstaked => IStaking::Unstaked::SIGNATURE_HASH,
        EventKind::RewardsDistributed => IStaking::RewardsDistributed::SIGNATURE_HASH,
        EventKind::Transfer => IToken::Transfer::SIGNATURE_HASH,
        EventKind::Deposited => IToken::Deposited::SIGNATURE_HASH,
        EventKind::ReferralRewarded => IToken::ReferralRewarded::SIGNATURE_HASH,
        EventKind::BurnQueued => IToken::BurnQueued::SIGNATURE_HASH,
        EventKind::CreditAssigned => IToken::CreditAssigned::SIGNATURE_HASH,
        EventKind::CreditClaimed => IToken::CreditClaimed::SIGNATURE_HASH,
    };
    H256::new(hash.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_is_reachable() {
        let table = SignatureTable::new();
        assert_eq!(table.len(), EventKind::ALL.len());
        for kind in EventKind::ALL {
            assert_eq!(table.lookup(kind.family(), &topic0(kind)), Some(kind));
        }
    }

    #[test]
    fn lookup_is_scoped_by_family() {
        let table = SignatureTable::new();
        let transfer = topic0(EventKind::Transfer);
        assert_eq!(table.lookup(ContractFamily::Staking, &transfer), None);
        assert_eq!(
            table.lookup(ContractFamily::Token, &transfer),
            Some(EventKind::Transfer)
        );
    }

    #[test]
    fn abi_hashes_match_stored_signatures() {
        for kind in EventKind::ALL {
            assert_eq!(
                topic0(kind),
                H256::keccak(kind.signature().as_bytes()),
                "{kind}"
            );
        }
    }

    #[test]
    fn transfer_topic_matches_erc20() {
        assert_eq!(
            topic0(EventKind::Transfer).to_string(),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }
}
