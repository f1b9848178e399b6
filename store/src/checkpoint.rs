//! Checkpoint storage trait.

use crate::StoreError;

/// Stream key of the single global scan stream.
pub const GLOBAL_STREAM: &str = "global";

/// Durable record of the last fully processed block height per stream.
pub trait CheckpointStore {
    /// The last committed height, or `None` if the stream has never advanced.
    fn checkpoint(&self, stream: &str) -> Result<Option<u64>, StoreError>;

    /// Record `height` as fully processed.
    ///
    /// The checkpoint never decreases: advancing to a height at or below the
    /// stored one leaves it untouched. Returns the stored height afterwards.
    fn advance_checkpoint(&self, stream: &str, height: u64) -> Result<u64, StoreError>;
}
