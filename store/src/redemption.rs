//! Redemption queue rows.

use serde::{Deserialize, Serialize};

use stakescan_types::{Address, Amount};

use crate::account::Activity;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedemptionStatus {
    Pending,
    Credited,
}

/// One burn-for-later-redemption request, keyed by `(account, queue_index)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionRequest {
    pub account: Address,
    /// Position in the contract's redemption queue.
    pub queue_index: u64,
    /// Shares burned.
    pub shares: Amount,
    /// Payout promised at request time.
    pub expected_assets: Amount,
    /// Tip reserved for the keeper that credits the request.
    pub tip: Amount,
    pub requested: Activity,
    /// Earliest height at which a credit may take effect.
    pub unlock_block: u64,
    pub status: RedemptionStatus,
    pub credited: Option<Activity>,
    pub credited_assets: Option<Amount>,
    pub keeper: Option<Address>,
}

impl RedemptionRequest {
    pub fn is_pending(&self) -> bool {
        self.status == RedemptionStatus::Pending
    }

    /// Whether a credit at `height` may transition this request.
    pub fn is_unlocked_at(&self, height: u64) -> bool {
        height >= self.unlock_block
    }
}
