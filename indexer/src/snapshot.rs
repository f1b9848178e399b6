//! Hourly snapshot scheduling.
//!
//! The scheduler watches committed blocks go by and writes a [`Snapshot`]
//! whenever a block's timestamp reaches the next top-of-hour boundary.
//!
//! ```text
//! Uninitialized ──(no snapshot stored)──────────────────► Due
//!       │                                                  │
//!       └──(snapshot stored: boundary from clock or block)─┤
//!                                                          ▼
//!              Idle { next } ──(block.timestamp >= next)──► Due
//!                   ▲                                      │
//!                   └──────(snapshot written)──────────────┘
//! ```
//!
//! When resuming on top of existing snapshots, the first boundary is taken
//! from the wall clock if the scanner is close to real time, and from the
//! block's own timestamp otherwise, so a backfill is never left waiting for
//! an hour that already passed.

use std::sync::Arc;

use tracing::{debug, error, info};

use stakescan_store::{IndexStore, ProtocolTotals, Snapshot};
use stakescan_types::{Amount, Clock, Timestamp};

use crate::{IndexerError, IndexerMetrics};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SchedulerState {
    Uninitialized,
    Idle { next: Timestamp },
    Due,
}

pub struct SnapshotScheduler<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    live_gap_secs: u64,
    state: SchedulerState,
    metrics: Arc<IndexerMetrics>,
}

impl<S: IndexStore> SnapshotScheduler<S> {
    pub fn new(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        live_gap_secs: u64,
        metrics: Arc<IndexerMetrics>,
    ) -> Self {
        Self {
            store,
            clock,
            live_gap_secs,
            state: SchedulerState::Uninitialized,
            metrics,
        }
    }

    /// The boundary the next snapshot waits for, once known.
    pub fn next_boundary(&self) -> Option<Timestamp> {
        match self.state {
            SchedulerState::Idle { next } => Some(next),
            _ => None,
        }
    }

    /// Observe a committed block. Returns the snapshot written, if any.
    pub fn observe(
        &mut self,
        height: u64,
        timestamp: Timestamp,
    ) -> Result<Option<Snapshot>, IndexerError> {
        if self.state == SchedulerState::Uninitialized {
            self.state = self.initial_state(timestamp)?;
        }
        if let SchedulerState::Idle { next } = self.state {
            if timestamp >= next {
                self.state = SchedulerState::Due;
            }
        }
        if self.state != SchedulerState::Due {
            return Ok(None);
        }

        let snapshot = build_snapshot(height, timestamp, &self.store.totals()?);
        if self.store.insert_snapshot(&snapshot)? {
            self.metrics.snapshots_taken.inc();
            info!(
                height,
                timestamp = timestamp.as_secs(),
                holders = snapshot.current_holders,
                "snapshot written"
            );
        } else {
            debug!(height, "snapshot already stored at this height");
        }
        self.state = SchedulerState::Idle {
            next: timestamp.next_hour_boundary(),
        };
        Ok(Some(snapshot))
    }

    fn initial_state(&self, timestamp: Timestamp) -> Result<SchedulerState, IndexerError> {
        if self.store.latest_snapshot()?.is_none() {
            return Ok(SchedulerState::Due);
        }
        let now = self.clock.now();
        let lag = timestamp.elapsed_since(now);
        let basis = if lag <= self.live_gap_secs { now } else { timestamp };
        let next = basis.next_hour_boundary();
        debug!(lag, next = next.as_secs(), "snapshot schedule resumed");
        Ok(SchedulerState::Idle { next })
    }
}

/// Snapshot row for `height` from the running totals.
///
/// Differences that would go negative are clamped to zero and logged; they
/// point at a decoding or ordering defect upstream.
pub fn build_snapshot(height: u64, timestamp: Timestamp, totals: &ProtocolTotals) -> Snapshot {
    let total_staked = clamped_sub(
        height,
        "total_staked",
        totals.total_staked,
        totals.total_unstaked,
    );
    let issued = totals
        .total_minted
        .saturating_add(totals.total_referral_rewards);
    let total_supply = clamped_sub(height, "total_supply", issued, totals.total_burned);

    Snapshot {
        block_height: height,
        timestamp,
        asset_backing: totals.asset_backing,
        total_staked,
        total_supply,
        current_holders: totals.current_holders,
        historical_holders: totals.historical_holders,
        total_referral_rewards: totals.total_referral_rewards,
        active_nodes: totals.active_nodes,
        total_keeper_tips: totals.total_keeper_tips,
    }
}

fn clamped_sub(height: u64, field: &'static str, lhs: Amount, rhs: Amount) -> Amount {
    lhs.checked_sub(rhs).unwrap_or_else(|| {
        error!(
            height,
            field,
            lhs = %lhs,
            rhs = %rhs,
            "snapshot aggregate negative, clamped to zero"
        );
        Amount::ZERO
    })
}
