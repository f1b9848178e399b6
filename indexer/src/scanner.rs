//! The scan loop.
//!
//! Each [`Scanner::step`] compares the chain head with the next unprocessed
//! height and picks a mode:
//!
//! - **Live**: the gap is within `finality_buffer`. One block is fetched,
//!   committed and checkpointed.
//! - **Historical**: a batch of up to `batch_size` blocks ending at
//!   `head - finality_buffer` is fetched in parallel, committed in ascending
//!   order and checkpointed once.
//!
//! [`Scanner::run`] repeats steps until a stop is requested. A stop seen
//! mid-batch ends the batch after the block being committed, with the
//! checkpoint on that block. A failed step is logged and backed off; it
//! never ends the loop. A step that fails part way
//! leaves the checkpoint where it was, and the blocks already committed are
//! skipped as duplicates when the batch is retried.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use stakescan_store::{IndexStore, GLOBAL_STREAM};

use crate::metrics::height_gauge;
use crate::{
    BatchFetcher, BlockOutcome, BlockPipeline, FetchedBlock, IndexerConfig, IndexerError,
    IndexerMetrics, SnapshotScheduler, StopSignal,
};

/// Loop parameters, usually taken from [`IndexerConfig`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanSettings {
    pub genesis_height: u64,
    pub finality_buffer: u64,
    pub batch_size: u64,
    pub live_block_delay: Duration,
    pub batch_delay: Duration,
    pub idle_delay: Duration,
    pub error_backoff: Duration,
}

impl ScanSettings {
    pub fn from_config(config: &IndexerConfig) -> Self {
        Self {
            genesis_height: config.genesis_height,
            finality_buffer: config.finality_buffer,
            batch_size: config.batch_size.max(1),
            live_block_delay: Duration::from_millis(config.live_block_delay_ms),
            batch_delay: Duration::from_millis(config.batch_delay_ms),
            idle_delay: Duration::from_millis(config.idle_delay_ms),
            error_backoff: Duration::from_millis(config.error_backoff_ms),
        }
    }
}

/// What one iteration did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Nothing new on chain.
    Idle { head: u64 },
    Live { height: u64 },
    Historical { from: u64, to: u64 },
}

pub struct Scanner<S> {
    store: Arc<S>,
    fetcher: BatchFetcher,
    pipeline: BlockPipeline<S>,
    snapshots: SnapshotScheduler<S>,
    metrics: Arc<IndexerMetrics>,
    settings: ScanSettings,
    next_height: Option<u64>,
    stop: Option<StopSignal>,
}

impl<S: IndexStore + 'static> Scanner<S> {
    pub fn new(
        store: Arc<S>,
        fetcher: BatchFetcher,
        pipeline: BlockPipeline<S>,
        snapshots: SnapshotScheduler<S>,
        metrics: Arc<IndexerMetrics>,
        settings: ScanSettings,
    ) -> Self {
        Self {
            store,
            fetcher,
            pipeline,
            snapshots,
            metrics,
            settings,
            next_height: None,
            stop: None,
        }
    }

    /// Let `stop` cut a historical batch short between blocks.
    pub fn watch_stop(&mut self, stop: StopSignal) {
        self.stop = Some(stop);
    }

    fn stop_requested(&self) -> bool {
        self.stop.as_ref().is_some_and(StopSignal::is_requested)
    }

    /// The next height to process, read from the checkpoint on first use.
    pub fn next_height(&mut self) -> Result<u64, IndexerError> {
        if let Some(next) = self.next_height {
            return Ok(next);
        }
        let checkpoint = self.store.checkpoint(GLOBAL_STREAM)?;
        let next = match checkpoint {
            Some(done) => done.saturating_add(1).max(self.settings.genesis_height),
            None => self.settings.genesis_height,
        };
        if let Some(done) = checkpoint {
            self.metrics.checkpoint_height.set(height_gauge(done));
        }
        info!(?checkpoint, next, "scan position loaded");
        self.next_height = Some(next);
        Ok(next)
    }

    /// One iteration of the loop.
    pub async fn step(&mut self) -> Result<StepOutcome, IndexerError> {
        let next = self.next_height()?;
        let head = self.fetcher.head_height().await?;
        self.metrics.chain_head.set(height_gauge(head));

        if next > head {
            return Ok(StepOutcome::Idle { head });
        }

        if head - next <= self.settings.finality_buffer {
            let block = self.fetcher.fetch_block(next).await?;
            self.commit_block(block).await?;
            self.advance(next)?;
            return Ok(StepOutcome::Live { height: next });
        }

        let to = next
            .saturating_add(self.settings.batch_size - 1)
            .min(head - self.settings.finality_buffer);
        let blocks = self.fetcher.fetch_range(next, to).await?;
        let mut inserted = 0;
        let mut last = to;
        for block in blocks {
            let height = block.height();
            inserted += self.commit_block(block).await?.inserted;
            if height < to && self.stop_requested() {
                info!(height, to, "stop requested, ending batch early");
                last = height;
                break;
            }
        }
        self.advance(last)?;
        info!(from = next, to = last, head, inserted, "historical batch committed");
        Ok(StepOutcome::Historical { from: next, to: last })
    }

    /// Step until a stop is requested. The block being committed when the
    /// request arrives is finished and checkpointed first.
    pub async fn run(mut self, mut stop: StopSignal) {
        info!("scanner running");
        self.watch_stop(stop.clone());
        loop {
            let delay = match self.step().await {
                Ok(StepOutcome::Idle { .. }) => self.settings.idle_delay,
                Ok(StepOutcome::Live { .. }) => self.settings.live_block_delay,
                Ok(StepOutcome::Historical { .. }) => self.settings.batch_delay,
                Err(err) => {
                    self.metrics.scan_errors.inc();
                    error!(
                        error = %err,
                        next = ?self.next_height,
                        "scan iteration failed, backing off"
                    );
                    self.settings.error_backoff
                }
            };
            if stop.is_requested() {
                break;
            }
            tokio::select! {
                _ = stop.requested() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        info!(next = ?self.next_height, "scanner stopped");
    }

    async fn commit_block(&mut self, block: FetchedBlock) -> Result<BlockOutcome, IndexerError> {
        let outcome = self.pipeline.process(block).await?;
        self.snapshots.observe(outcome.height, outcome.timestamp)?;
        Ok(outcome)
    }

    fn advance(&mut self, height: u64) -> Result<(), IndexerError> {
        let stored = self.store.advance_checkpoint(GLOBAL_STREAM, height)?;
        self.metrics.checkpoint_height.set(height_gauge(stored));
        self.next_height = Some(stored.saturating_add(1));
        Ok(())
    }
}
