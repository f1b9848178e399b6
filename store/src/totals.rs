//! Protocol-wide running totals.

use serde::{Deserialize, Serialize};

use stakescan_types::Amount;

/// Aggregates maintained incrementally by the projector, in the same unit of
/// work as the events that move them. Snapshots read this row instead of
/// replaying the raw ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolTotals {
    pub total_staked: Amount,
    pub total_unstaked: Amount,
    pub total_minted: Amount,
    pub total_burned: Amount,
    pub total_referral_rewards: Amount,
    pub total_keeper_tips: Amount,
    /// Protocol asset backing: deposits plus rewards minus credited payouts.
    pub asset_backing: Amount,
    /// Addresses with a non-zero balance right now.
    pub current_holders: u64,
    /// Addresses that have ever held a non-zero balance.
    pub historical_holders: u64,
    pub active_nodes: u64,
}
