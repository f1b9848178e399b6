//! Projection parameters fixed by the indexed contracts.

use serde::{Deserialize, Serialize};

/// Default number of blocks between an unstake/redemption request and its
/// earliest maturity (one day of 12-second blocks).
pub const DEFAULT_MATURITY_WINDOW: u64 = 7_200;

/// Parameters the projector needs to mirror contract rules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionParams {
    /// Blocks between a request and its unlock height.
    pub maturity_window: u64,
}

impl ProjectionParams {
    /// Height at which a request made at `height` unlocks.
    pub fn unlock_height(&self, height: u64) -> u64 {
        height.saturating_add(self.maturity_window)
    }
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self {
            maturity_window: DEFAULT_MATURITY_WINDOW,
        }
    }
}
