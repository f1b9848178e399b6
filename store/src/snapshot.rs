//! Hourly snapshot storage trait.

use serde::{Deserialize, Serialize};

use stakescan_types::{Amount, Timestamp};

use crate::StoreError;

/// Protocol-wide metrics captured when a block crosses an hour boundary.
/// Immutable once written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub block_height: u64,
    pub timestamp: Timestamp,
    pub asset_backing: Amount,
    /// Staked minus unstaked.
    pub total_staked: Amount,
    /// Minted plus referral rewards minus burned.
    pub total_supply: Amount,
    pub current_holders: u64,
    pub historical_holders: u64,
    pub total_referral_rewards: Amount,
    pub active_nodes: u64,
    pub total_keeper_tips: Amount,
}

pub trait SnapshotStore {
    /// The snapshot with the greatest block height.
    fn latest_snapshot(&self) -> Result<Option<Snapshot>, StoreError>;

    fn snapshot(&self, block_height: u64) -> Result<Option<Snapshot>, StoreError>;

    /// Up to `limit` snapshots, newest first.
    fn snapshots(&self, limit: usize) -> Result<Vec<Snapshot>, StoreError>;

    /// Persist a snapshot. Returns `false` and writes nothing when one
    /// already exists at the same height.
    fn insert_snapshot(&self, snapshot: &Snapshot) -> Result<bool, StoreError>;
}
