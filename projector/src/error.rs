use thiserror::Error;

use stakescan_store::StoreError;
use stakescan_types::Address;

#[derive(Debug, Error)]
pub enum ProjectionError {
    /// The unit of work itself failed; the whole unit must be rolled back.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("{event} for unknown node {node}")]
    UnknownNode { event: &'static str, node: Address },

    #[error("no redemption request {queue_index} for {account}")]
    MissingRedemption { account: Address, queue_index: u64 },

    #[error("redemption request {queue_index} for {account} already exists")]
    DuplicateRedemption { account: Address, queue_index: u64 },

    #[error("{field} overflowed")]
    Overflow { field: &'static str },
}

impl ProjectionError {
    /// Only store failures abort the unit; everything else drops one event.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProjectionError::Store(_))
    }
}
