//! Rebuild derived state from the raw event ledger.
//!
//! Used after a projection rule changes: derived rows are cleared and every
//! stored event is folded through the projector again, in chain order, one
//! unit of work per block. Raw events, snapshots and the checkpoint are left
//! alone.

use tracing::{info, warn};

use stakescan_projector::{Applied, Projector};
use stakescan_store::{IndexStore, RawEvent, UnitOfWork};
use stakescan_types::{ContractFamily, ProjectionParams};

use crate::IndexerError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub blocks: u64,
    pub events: u64,
    pub projected: u64,
    pub failures: u64,
}

/// Clear derived state and refold every raw event.
///
/// Both families are loaded whole and merged by (height, log index); this
/// is an offline maintenance command, not part of the scan loop.
pub fn reproject<S: IndexStore>(
    store: &S,
    params: ProjectionParams,
) -> Result<ReplayReport, IndexerError> {
    let projector = Projector::new(params);
    let mut events = store.raw_events(ContractFamily::Staking, 0, u64::MAX)?;
    events.extend(store.raw_events(ContractFamily::Token, 0, u64::MAX)?);
    events.sort_by_key(|e| (e.block_height, e.log_index));

    store.clear_derived()?;
    info!(events = events.len(), "reprojecting raw events");

    let mut report = ReplayReport::default();
    for block in events.chunk_by(|a, b| a.block_height == b.block_height) {
        let mut unit = store.begin_unit()?;
        for event in block {
            apply(&projector, &mut unit, event, &mut report)?;
        }
        unit.commit()?;
        report.blocks += 1;
    }

    info!(
        blocks = report.blocks,
        events = report.events,
        projected = report.projected,
        failures = report.failures,
        "reprojection finished"
    );
    Ok(report)
}

fn apply<U: UnitOfWork>(
    projector: &Projector,
    unit: &mut U,
    event: &RawEvent,
    report: &mut ReplayReport,
) -> Result<(), IndexerError> {
    report.events += 1;
    match projector.apply(unit, event) {
        Ok(Applied::Projected) => report.projected += 1,
        Ok(_) => {}
        Err(err) if err.is_fatal() => return Err(err.into()),
        Err(err) => {
            warn!(
                height = event.block_height,
                log_index = event.log_index,
                error = %err,
                "projection failed during replay"
            );
            report.failures += 1;
        }
    }
    Ok(())
}
