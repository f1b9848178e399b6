//! The chain boundary trait and the data it returns.

use async_trait::async_trait;

use stakescan_types::{Address, Timestamp, TxHash, H256};

use crate::ChainError;

/// Block metadata the indexer needs: the height it asked for and the block
/// timestamp every event of the block inherits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockHeader {
    pub height: u64,
    pub hash: H256,
    pub timestamp: Timestamp,
}

/// One contract log as returned by the chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<H256>,
    pub data: Vec<u8>,
    pub block_height: u64,
    pub tx_hash: TxHash,
    pub tx_index: u64,
    pub log_index: u64,
}

/// Read access to a chain. Every call may fail transiently; callers wrap
/// calls in [`crate::with_retry`].
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn head_height(&self) -> Result<u64, ChainError>;

    async fn block(&self, height: u64) -> Result<BlockHeader, ChainError>;

    /// Logs emitted by any of `addresses` in `from..=to`.
    async fn logs(&self, from: u64, to: u64, addresses: &[Address])
        -> Result<Vec<Log>, ChainError>;
}
