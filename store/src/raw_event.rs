//! Raw event ledger: immutable, deduplicated decoded logs.

use serde::{Deserialize, Serialize};

use stakescan_types::{Address, ContractEvent, ContractFamily, Timestamp, TxHash, H256};

use crate::StoreError;

/// Unique key of a raw event.
///
/// Uniqueness is `(block_height, tx_hash, log_index)`; the byte encoding puts
/// the log index before the hash so that keys iterate in chain order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventKey {
    pub block_height: u64,
    pub log_index: u64,
    pub tx_hash: TxHash,
}

impl EventKey {
    pub const LEN: usize = 48;

    /// `height_be(8) ++ log_index_be(8) ++ tx_hash(32)`.
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut key = [0u8; Self::LEN];
        key[..8].copy_from_slice(&self.block_height.to_be_bytes());
        key[8..16].copy_from_slice(&self.log_index.to_be_bytes());
        key[16..].copy_from_slice(self.tx_hash.as_bytes());
        key
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::LEN {
            return None;
        }
        let block_height = u64::from_be_bytes(bytes[..8].try_into().ok()?);
        let log_index = u64::from_be_bytes(bytes[8..16].try_into().ok()?);
        let tx_hash = TxHash::new(bytes[16..].try_into().ok()?);
        Some(Self {
            block_height,
            log_index,
            tx_hash,
        })
    }

    /// Smallest key at `height`, usable as a range bound.
    pub fn lower_bound(height: u64) -> [u8; Self::LEN] {
        Self {
            block_height: height,
            log_index: 0,
            tx_hash: TxHash::ZERO,
        }
        .to_bytes()
    }
}

/// A log as durably recorded by the indexer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub family: ContractFamily,
    /// Canonical event name, or `"Unknown"` for unrecognized signatures.
    pub event_name: String,
    pub block_height: u64,
    pub tx_hash: TxHash,
    pub tx_index: u64,
    pub log_index: u64,
    pub block_timestamp: Timestamp,
    pub contract_address: Address,
    /// Typed arguments; `None` for unknown signatures and undecodable logs,
    /// which are recorded but never projected.
    pub decoded: Option<ContractEvent>,
    pub raw_data: Vec<u8>,
    pub topics: Vec<H256>,
}

impl RawEvent {
    pub fn key(&self) -> EventKey {
        EventKey {
            block_height: self.block_height,
            log_index: self.log_index,
            tx_hash: self.tx_hash,
        }
    }
}

/// Result of inserting one raw event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The key already existed; the stored row was left untouched.
    Duplicate,
}

/// Read-only access to the raw event ledger, for audit and replay.
pub trait RawEventReader {
    /// Events of one family with `from <= block_height <= to`, in chain order.
    fn raw_events(
        &self,
        family: ContractFamily,
        from: u64,
        to: u64,
    ) -> Result<Vec<RawEvent>, StoreError>;

    fn raw_event_count(&self, family: ContractFamily) -> Result<u64, StoreError>;
}
