//! Decode → store → project → commit for one block.
//!
//! Every block is one unit of work: its raw events and all derived rows they
//! touch are committed together or not at all. Events already stored are
//! skipped before projection, so processing a block twice changes nothing.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use stakescan_decoder::EventDecoder;
use stakescan_projector::{Applied, Projector};
use stakescan_store::{IndexStore, InsertOutcome, RawEvent, UnitOfWork};
use stakescan_types::{EventKind, Timestamp};

use crate::{FetchedBlock, IndexerError, IndexerMetrics};

/// What processing one block did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockOutcome {
    pub height: u64,
    pub timestamp: Timestamp,
    pub inserted: u64,
    pub duplicates: u64,
    pub projected: u64,
    pub projection_failures: u64,
    /// Newly stored events whose arguments did not decode.
    pub decode_failures: u64,
}

pub struct BlockPipeline<S> {
    store: Arc<S>,
    decoder: Arc<EventDecoder>,
    projector: Arc<Projector>,
    metrics: Arc<IndexerMetrics>,
}

impl<S> Clone for BlockPipeline<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            decoder: self.decoder.clone(),
            projector: self.projector.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl<S: IndexStore + 'static> BlockPipeline<S> {
    pub fn new(
        store: Arc<S>,
        decoder: Arc<EventDecoder>,
        projector: Arc<Projector>,
        metrics: Arc<IndexerMetrics>,
    ) -> Self {
        Self {
            store,
            decoder,
            projector,
            metrics,
        }
    }

    /// Process `block` on the blocking pool.
    pub async fn process(&self, block: FetchedBlock) -> Result<BlockOutcome, IndexerError> {
        let pipeline = self.clone();
        tokio::task::spawn_blocking(move || pipeline.process_block(&block)).await?
    }

    /// Process `block` on the current thread.
    pub fn process_block(&self, block: &FetchedBlock) -> Result<BlockOutcome, IndexerError> {
        let started = Instant::now();
        let decoded = self.decoder.decode_block(&block.logs, block.header.timestamp);

        let mut outcome = BlockOutcome {
            height: block.header.height,
            timestamp: block.header.timestamp,
            ..BlockOutcome::default()
        };

        let mut unit = self.store.begin_unit()?;
        for event in &decoded.events {
            match unit.insert_raw_event(event)? {
                InsertOutcome::Duplicate => {
                    outcome.duplicates += 1;
                    continue;
                }
                InsertOutcome::Inserted => outcome.inserted += 1,
            }
            if is_decode_failure(event) {
                outcome.decode_failures += 1;
            }
            self.project(&mut unit, event, &mut outcome)?;
        }

        // A block with nothing new drops its unit uncommitted.
        let committed = outcome.inserted > 0;
        if committed {
            unit.commit()?;
        }

        self.record(&outcome, committed, started);
        debug!(
            height = outcome.height,
            inserted = outcome.inserted,
            duplicates = outcome.duplicates,
            projected = outcome.projected,
            "block processed"
        );
        Ok(outcome)
    }

    fn project<U: UnitOfWork>(
        &self,
        unit: &mut U,
        event: &RawEvent,
        outcome: &mut BlockOutcome,
    ) -> Result<(), IndexerError> {
        match self.projector.apply(unit, event) {
            Ok(Applied::Projected) => outcome.projected += 1,
            Ok(Applied::NoChange | Applied::Undecoded) => {}
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => {
                warn!(
                    height = event.block_height,
                    log_index = event.log_index,
                    event = %event.event_name,
                    error = %err,
                    "projection failed, event kept as seen"
                );
                outcome.projection_failures += 1;
            }
        }
        Ok(())
    }

    fn record(&self, outcome: &BlockOutcome, committed: bool, started: Instant) {
        let m = &self.metrics;
        if committed {
            m.blocks_committed.inc();
        }
        m.events_inserted.inc_by(outcome.inserted);
        m.events_duplicate.inc_by(outcome.duplicates);
        m.decode_failures.inc_by(outcome.decode_failures);
        m.projection_failures.inc_by(outcome.projection_failures);
        m.block_process_time_ms
            .observe(started.elapsed().as_secs_f64() * 1_000.0);
    }
}

fn is_decode_failure(event: &RawEvent) -> bool {
    event.decoded.is_none() && event.event_name != EventKind::UNKNOWN_NAME
}

#[cfg(test)]
mod tests {
    use super::*;
    use stakescan_chain::{BlockHeader, Log};
    use stakescan_decoder::signatures::topic0;
    use stakescan_decoder::ContractAddresses;
    use stakescan_nullables::NullStore;
    use stakescan_store::{DerivedStateReader, RawEventReader};
    use stakescan_types::{Address, ContractFamily, ProjectionParams, TxHash, H256};

    const STAKING: Address = Address::new([0x51; 20]);
    const TOKEN: Address = Address::new([0x70; 20]);
    const NODE: Address = Address::new([0xaa; 20]);

    fn pipeline(store: Arc<NullStore>) -> BlockPipeline<NullStore> {
        BlockPipeline::new(
            store,
            Arc::new(EventDecoder::new(ContractAddresses {
                staking: STAKING,
                token: TOKEN,
            })),
            Arc::new(Projector::new(ProjectionParams::default())),
            Arc::new(IndexerMetrics::new().unwrap()),
        )
    }

    fn registered(height: u64, log_index: u64) -> Log {
        let mut node_type = [0u8; 32];
        node_type[31] = 1;
        Log {
            address: STAKING,
            topics: vec![topic0(EventKind::Registered), NODE.to_word()],
            data: node_type.to_vec(),
            block_height: height,
            tx_hash: TxHash::new([9; 32]),
            tx_index: 0,
            log_index,
        }
    }

    fn block(height: u64, logs: Vec<Log>) -> FetchedBlock {
        FetchedBlock {
            header: BlockHeader {
                height,
                hash: H256::ZERO,
                timestamp: Timestamp::new(1_700_000_000),
            },
            logs,
        }
    }

    #[test]
    fn reprocessing_a_block_is_a_no_op() {
        let store = Arc::new(NullStore::new());
        let pipeline = pipeline(store.clone());
        let b = block(100, vec![registered(100, 0)]);

        let first = pipeline.process_block(&b).unwrap();
        assert_eq!(first.inserted, 1);
        assert_eq!(first.projected, 1);

        let second = pipeline.process_block(&b).unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.duplicates, 1);
        assert_eq!(second.projected, 0);
        assert_eq!(store.commit_count(), 1);
        assert_eq!(store.raw_event_count(ContractFamily::Staking).unwrap(), 1);
    }

    #[test]
    fn only_committed_blocks_are_counted() {
        let store = Arc::new(NullStore::new());
        let metrics = Arc::new(IndexerMetrics::new().unwrap());
        let pipeline = BlockPipeline::new(
            store.clone(),
            Arc::new(EventDecoder::new(ContractAddresses {
                staking: STAKING,
                token: TOKEN,
            })),
            Arc::new(Projector::new(ProjectionParams::default())),
            metrics.clone(),
        );
        let b = block(100, vec![registered(100, 0)]);

        pipeline.process_block(&b).unwrap();
        pipeline.process_block(&b).unwrap();
        pipeline.process_block(&block(101, Vec::new())).unwrap();

        assert_eq!(store.commit_count(), 1);
        assert_eq!(metrics.blocks_committed.get(), 1);
        assert_eq!(metrics.events_duplicate.get(), 1);
    }

    #[test]
    fn failed_projection_still_stores_the_event() {
        let store = Arc::new(NullStore::new());
        let pipeline = pipeline(store.clone());
        let faulted = Log {
            topics: vec![topic0(EventKind::Faulted), NODE.to_word()],
            data: Vec::new(),
            ..registered(5, 0)
        };

        let outcome = pipeline.process_block(&block(5, vec![faulted])).unwrap();
        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.projection_failures, 1);
        assert!(store.node(&NODE).unwrap().is_none());
        assert_eq!(store.raw_event_count(ContractFamily::Staking).unwrap(), 1);
    }

    #[test]
    fn undecodable_log_is_stored_and_counted() {
        let store = Arc::new(NullStore::new());
        let pipeline = pipeline(store.clone());
        let short = Log {
            data: Vec::new(),
            ..registered(7, 0)
        };

        let outcome = pipeline.process_block(&block(7, vec![short])).unwrap();
        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.decode_failures, 1);
        assert_eq!(outcome.projected, 0);
    }

    #[test]
    fn failed_commit_surfaces_and_leaves_nothing_behind() {
        let store = Arc::new(NullStore::new());
        let pipeline = pipeline(store.clone());
        store.fail_next_commits(1);

        assert!(pipeline.process_block(&block(8, vec![registered(8, 0)])).is_err());
        assert_eq!(store.raw_event_count(ContractFamily::Staking).unwrap(), 0);

        let retried = pipeline.process_block(&block(8, vec![registered(8, 0)])).unwrap();
        assert_eq!(retried.inserted, 1);
        assert!(store.node(&NODE).unwrap().is_some());
    }

    #[tokio::test]
    async fn process_runs_on_the_blocking_pool() {
        let store = Arc::new(NullStore::new());
        let outcome = pipeline(store)
            .process(block(1, vec![registered(1, 0)]))
            .await
            .unwrap();
        assert_eq!(outcome.height, 1);
        assert_eq!(outcome.projected, 1);
    }
}
