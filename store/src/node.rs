//! Node operator lifecycle rows.

use serde::{Deserialize, Serialize};

use stakescan_types::{Address, Amount};

use crate::account::Activity;

/// Coarse lifecycle position. Faultiness is tracked separately and is
/// orthogonal to this.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeLifecycle {
    /// Seen (e.g. staked) but never registered.
    Unregistered,
    Active,
    Deactivated,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub address: Address,
    /// Node-class tag from the registration event.
    pub node_type: u8,
    pub active: bool,
    pub faulty: bool,
    pub registered: Option<Activity>,
    pub deactivated: Option<Activity>,
    pub faulted: Option<Activity>,
    pub recovered: Option<Activity>,
    /// Cumulative; survives re-registration.
    pub total_staked: Amount,
    /// Cumulative; survives re-registration.
    pub total_unstaked: Amount,
    /// Height at which the latest unstake matures.
    pub unstake_maturity_block: Option<u64>,
}

impl NodeRecord {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            node_type: 0,
            active: false,
            faulty: false,
            registered: None,
            deactivated: None,
            faulted: None,
            recovered: None,
            total_staked: Amount::ZERO,
            total_unstaked: Amount::ZERO,
            unstake_maturity_block: None,
        }
    }

    pub fn lifecycle(&self) -> NodeLifecycle {
        match (self.registered.is_some(), self.active) {
            (false, _) => NodeLifecycle::Unregistered,
            (true, true) => NodeLifecycle::Active,
            (true, false) => NodeLifecycle::Deactivated,
        }
    }

    /// Active and not currently faulty.
    pub fn is_live(&self) -> bool {
        self.active && !self.faulty
    }
}
