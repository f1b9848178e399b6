//! Per-event decode rules.
//!
//! Each [`EventKind`] decodes through its `sol!` declaration; the typed
//! fields are then narrowed into a [`ContractEvent`].

use alloy_primitives::{Address as AbiAddress, B256, U256};
use alloy_sol_types::SolEvent;

use stakescan_types::{Address, Amount, ContractEvent, EventKind, H256};

use crate::contracts::{IStaking, IToken};
use crate::DecodeError;

/// Decode the arguments of a log whose signature topic resolved to `kind`.
/// `topics` includes the signature topic.
pub fn decode_event(
    kind: EventKind,
    topics: &[H256],
    data: &[u8],
) -> Result<ContractEvent, DecodeError> {
    let event = match kind {
        EventKind::Registered => {
            let ev: IStaking::Registered = decode(kind, topics, data)?;
            ContractEvent::Registered {
                node: address(ev.node),
                node_type: ev.node_type,
            }
        }
        EventKind::Deactivated => {
            let ev: IStaking::Deactivated = decode(kind, topics, data)?;
            ContractEvent::Deactivated {
                node: address(ev.node),
            }
        }
        EventKind::Faulted => {
            let ev: IStaking::Faulted = decode(kind, topics, data)?;
            ContractEvent::Faulted {
                node: address(ev.node),
            }
        }
        EventKind::Recovered => {
            let ev: IStaking::Recovered = decode(kind, topics, data)?;
            ContractEvent::Recovered {
                node: address(ev.node),
            }
        }
        EventKind::Staked => {
            let ev: IStaking::Staked = decode(kind, topics, data)?;
            ContractEvent::Staked {
                node: address(ev.node),
                amount: Amount::new(ev.amount),
            }
        }
        EventKind::Unstaked => {
            let ev: IStaking::Unstaked = decode(kind, topics, data)?;
            ContractEvent::Unstaked {
                node: address(ev.node),
                amount: Amount::new(ev.amount),
            }
        }
        EventKind::RewardsDistributed => {
            let ev: IStaking::RewardsDistributed = decode(kind, topics, data)?;
            ContractEvent::RewardsDistributed {
                amount: Amount::new(ev.amount),
            }
        }
        EventKind::Transfer => {
            let ev: IToken::Transfer = decode(kind, topics, data)?;
            ContractEvent::Transfer {
                from: address(ev.from),
                to: address(ev.to),
                value: Amount::new(ev.value),
            }
        }
        EventKind::Deposited => {
            let ev: IToken::Deposited = decode(kind, topics, data)?;
            ContractEvent::Deposited {
                account: address(ev.account),
                assets: Amount::new(ev.assets),
                shares: Amount::new(ev.shares),
                fee: Amount::new(ev.fee),
            }
        }
        EventKind::ReferralRewarded => {
            let ev: IToken::ReferralRewarded = decode(kind, topics, data)?;
            ContractEvent::ReferralRewarded {
                referrer: address(ev.referrer),
                depositor: address(ev.depositor),
                reward: Amount::new(ev.reward),
            }
        }
        EventKind::BurnQueued => {
            let ev: IToken::BurnQueued = decode(kind, topics, data)?;
            ContractEvent::BurnQueued {
                account: address(ev.account),
                queue_index: narrow_u64(kind, "queueIndex", ev.queue_index)?,
                shares: Amount::new(ev.shares),
                expected_assets: Amount::new(ev.expected_assets),
                tip: Amount::new(ev.tip),
            }
        }
        EventKind::CreditAssigned => {
            let ev: IToken::CreditAssigned = decode(kind, topics, data)?;
            ContractEvent::CreditAssigned {
                account: address(ev.account),
                queue_index: narrow_u64(kind, "queueIndex", ev.queue_index)?,
                keeper: address(ev.keeper),
                assets: Amount::new(ev.assets),
            }
        }
        EventKind::CreditClaimed => {
            let ev: IToken::CreditClaimed = decode(kind, topics, data)?;
            ContractEvent::CreditClaimed {
                account: address(ev.account),
                assets: Amount::new(ev.assets),
            }
        }
    };
    Ok(event)
}

fn decode<E: SolEvent>(kind: EventKind, topics: &[H256], data: &[u8]) -> Result<E, DecodeError> {
    let words = topics.iter().map(|t| B256::from(*t.as_bytes()));
    let event = E::decode_raw_log(words, data, true).map_err(|e| DecodeError::Abi {
        event: kind.name(),
        message: e.to_string(),
    })?;
    // Indexed values are read without validation; an address topic with
    // dirty padding only shows up when re-encoded.
    for (index, (encoded, seen)) in event.encode_topics().iter().zip(topics).enumerate() {
        if encoded.0 .0 != *seen.as_bytes() {
            return Err(DecodeError::NonCanonicalTopic {
                event: kind.name(),
                index,
            });
        }
    }
    Ok(event)
}

fn address(value: AbiAddress) -> Address {
    Address::new(value.0 .0)
}

fn narrow_u64(kind: EventKind, field: &'static str, value: U256) -> Result<u64, DecodeError> {
    u64::try_from(value).map_err(|_| DecodeError::OutOfRange {
        event: kind.name(),
        field,
    })
}
