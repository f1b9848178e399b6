//! Log → [`RawEvent`] conversion.

use stakescan_chain::Log;
use stakescan_store::RawEvent;
use stakescan_types::{Address, ContractFamily, EventKind, Timestamp};

use crate::rules::decode_event;
use crate::signatures::SignatureTable;
use crate::DecodeError;

/// The two contract addresses whose logs are indexed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContractAddresses {
    pub staking: Address,
    pub token: Address,
}

impl ContractAddresses {
    pub fn family_of(&self, address: &Address) -> Option<ContractFamily> {
        if *address == self.staking {
            Some(ContractFamily::Staking)
        } else if *address == self.token {
            Some(ContractFamily::Token)
        } else {
            None
        }
    }

    /// Address filter for log queries.
    pub fn all(&self) -> [Address; 2] {
        [self.staking, self.token]
    }
}

/// What became of one log.
#[derive(Debug)]
pub enum LogOutcome {
    /// Emitted by an address that is not indexed.
    Foreign,
    /// Known contract, signature not in the table.
    Unknown(RawEvent),
    Decoded(RawEvent),
    /// Known signature whose arguments did not decode.
    Failed(RawEvent, DecodeError),
}

/// All persistable events of one block, in log order.
#[derive(Debug, Default)]
pub struct DecodedBlock {
    pub events: Vec<RawEvent>,
    pub unknown: u64,
    pub decode_failures: u64,
    pub foreign: u64,
}

pub struct EventDecoder {
    contracts: ContractAddresses,
    table: SignatureTable,
}

impl EventDecoder {
    pub fn new(contracts: ContractAddresses) -> Self {
        Self {
            contracts,
            table: SignatureTable::new(),
        }
    }

    pub fn contracts(&self) -> &ContractAddresses {
        &self.contracts
    }

    pub fn decode_log(&self, log: &Log, timestamp: Timestamp) -> LogOutcome {
        let Some(family) = self.contracts.family_of(&log.address) else {
            return LogOutcome::Foreign;
        };

        let kind = log
            .topics
            .first()
            .and_then(|topic0| self.table.lookup(family, topic0));
        let event_name = kind.map_or(EventKind::UNKNOWN_NAME, |k| k.name());
        let mut raw = RawEvent {
            family,
            event_name: event_name.to_string(),
            block_height: log.block_height,
            tx_hash: log.tx_hash,
            tx_index: log.tx_index,
            log_index: log.log_index,
            block_timestamp: timestamp,
            contract_address: log.address,
            decoded: None,
            raw_data: log.data.clone(),
            topics: log.topics.clone(),
        };

        let Some(kind) = kind else {
            return LogOutcome::Unknown(raw);
        };
        match decode_event(kind, &log.topics, &log.data) {
            Ok(event) => {
                raw.decoded = Some(event);
                LogOutcome::Decoded(raw)
            }
            Err(err) => LogOutcome::Failed(raw, err),
        }
    }

    /// Decode every log of one block. Undecodable logs are kept (with
    /// `decoded = None`) and counted; foreign logs are dropped.
    pub fn decode_block(&self, logs: &[Log], timestamp: Timestamp) -> DecodedBlock {
        let mut block = DecodedBlock::default();
        for log in logs {
            match self.decode_log(log, timestamp) {
                LogOutcome::Foreign => {
                    tracing::debug!(
                        address = %log.address,
                        height = log.block_height,
                        "ignoring log from unindexed address"
                    );
                    block.foreign += 1;
                }
                LogOutcome::Unknown(raw) => {
                    tracing::debug!(
                        family = %raw.family,
                        height = raw.block_height,
                        log_index = raw.log_index,
                        "unknown event signature"
                    );
                    block.unknown += 1;
                    block.events.push(raw);
                }
                LogOutcome::Decoded(raw) => block.events.push(raw),
                LogOutcome::Failed(raw, err) => {
                    tracing::warn!(
                        height = raw.block_height,
                        tx = %raw.tx_hash,
                        log_index = raw.log_index,
                        error = %err,
                        "failed to decode log"
                    );
                    block.decode_failures += 1;
                    block.events.push(raw);
                }
            }
        }
        block.events.sort_by_key(|e| e.key());
        block
    }
}
