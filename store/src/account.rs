//! Account ledger rows.

use serde::{Deserialize, Serialize};

use stakescan_types::{Address, Amount, Timestamp};

/// A block height and its timestamp, marking when something happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub block: u64,
    pub timestamp: Timestamp,
}

impl Activity {
    pub fn new(block: u64, timestamp: Timestamp) -> Self {
        Self { block, timestamp }
    }
}

/// Per-address protocol balances and lifetime counters.
///
/// Every field is adjusted by event deltas only; nothing here is recomputed
/// from scratch on the projection path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub address: Address,
    /// Liquid token balance (moved only by transfers).
    pub balance: Amount,
    /// Lifetime assets deposited.
    pub deposited: Amount,
    /// Lifetime assets withdrawn (claimed credits).
    pub withdrawn: Amount,
    /// Lifetime shares minted to this account by deposits.
    pub minted: Amount,
    /// Lifetime shares burned into the redemption queue.
    pub burned: Amount,
    /// Referral rewards and keeper tips received.
    pub fees_earned: Amount,
    /// Deposit fees and redemption tips paid.
    pub fees_paid: Amount,
    /// Credited redemptions not yet claimed.
    pub claimable_credits: Amount,
    /// Whether the balance has ever been non-zero.
    pub ever_held: bool,
    pub first_activity: Option<Activity>,
    pub last_activity: Option<Activity>,
}

impl AccountRecord {
    /// A fresh, all-zero row for a first-seen address.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            balance: Amount::ZERO,
            deposited: Amount::ZERO,
            withdrawn: Amount::ZERO,
            minted: Amount::ZERO,
            burned: Amount::ZERO,
            fees_earned: Amount::ZERO,
            fees_paid: Amount::ZERO,
            claimable_credits: Amount::ZERO,
            ever_held: false,
            first_activity: None,
            last_activity: None,
        }
    }

    /// Record activity at `at`.
    pub fn touch(&mut self, at: Activity) {
        if self.first_activity.is_none() {
            self.first_activity = Some(at);
        }
        self.last_activity = Some(at);
    }

    pub fn is_holder(&self) -> bool {
        !self.balance.is_zero()
    }
}
