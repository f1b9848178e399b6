//! Parallel block and log retrieval with bounded concurrency.
//!
//! A historical range is split into sub-batches of contiguous heights. Each
//! sub-batch runs on its own task, but only after a semaphore permit is
//! acquired, so at most `max_concurrent` sub-batches talk to the RPC
//! endpoint at once. Every chain call goes through the retry policy, and a
//! failed sub-batch stops the rest of the range from being launched.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use stakescan_chain::{with_retry_observed, BlockHeader, ChainClient, ChainError, Log, RetryPolicy};
use stakescan_types::Address;

use crate::{IndexerError, IndexerMetrics};

/// One block's header and the logs of the indexed contracts in it.
#[derive(Clone, Debug)]
pub struct FetchedBlock {
    pub header: BlockHeader,
    pub logs: Vec<Log>,
}

impl FetchedBlock {
    pub fn height(&self) -> u64 {
        self.header.height
    }
}

#[derive(Clone)]
pub struct BatchFetcher {
    chain: Arc<dyn ChainClient>,
    addresses: Vec<Address>,
    retry: RetryPolicy,
    sub_batch_size: u64,
    slots: Arc<Semaphore>,
    metrics: Arc<IndexerMetrics>,
}

impl BatchFetcher {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        addresses: Vec<Address>,
        retry: RetryPolicy,
        sub_batch_size: u64,
        max_concurrent: usize,
        metrics: Arc<IndexerMetrics>,
    ) -> Self {
        Self {
            chain,
            addresses,
            retry,
            sub_batch_size: sub_batch_size.max(1),
            slots: Arc::new(Semaphore::new(max_concurrent.max(1))),
            metrics,
        }
    }

    pub async fn head_height(&self) -> Result<u64, ChainError> {
        let chain = &self.chain;
        with_retry_observed(
            &self.retry,
            "head_height",
            |_| self.metrics.chain_retries.inc(),
            || async move { chain.head_height().await },
        )
        .await
    }

    /// One block, fetched sequentially. Used in live mode.
    pub async fn fetch_block(&self, height: u64) -> Result<FetchedBlock, ChainError> {
        let header = self.header(height).await?;
        let logs = self.logs(height, height).await?;
        Ok(FetchedBlock { header, logs })
    }

    /// Every block in `from..=to`, sorted by height.
    ///
    /// Once a sub-batch fails no further sub-batches are launched; the ones
    /// already running are awaited and the first error is returned.
    pub async fn fetch_range(&self, from: u64, to: u64) -> Result<Vec<FetchedBlock>, IndexerError> {
        if from > to {
            return Ok(Vec::new());
        }

        let failed = Arc::new(AtomicBool::new(false));
        let mut tasks = JoinSet::new();
        let mut start = from;
        loop {
            let end = start.saturating_add(self.sub_batch_size - 1).min(to);
            let permit = self.slots.clone().acquire_owned().await?;
            // Set before the failed task releases its permit.
            if failed.load(Ordering::Acquire) {
                debug!(from = start, to, "sub-batch failed, not launching the rest");
                break;
            }
            let fetcher = self.clone();
            let failed = failed.clone();
            tasks.spawn(async move {
                let result = fetcher.fetch_sub_batch(start, end).await;
                if result.is_err() {
                    failed.store(true, Ordering::Release);
                }
                drop(permit);
                result
            });
            if end >= to {
                break;
            }
            start = end + 1;
        }

        let mut blocks = Vec::new();
        let mut first_error: Option<IndexerError> = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(mut fetched)) => blocks.append(&mut fetched),
                Ok(Err(err)) => {
                    first_error.get_or_insert(IndexerError::Chain(err));
                }
                Err(err) => {
                    first_error.get_or_insert(IndexerError::Task(err));
                }
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        blocks.sort_by_key(FetchedBlock::height);
        Ok(blocks)
    }

    async fn fetch_sub_batch(&self, from: u64, to: u64) -> Result<Vec<FetchedBlock>, ChainError> {
        let mut headers = Vec::new();
        for height in from..=to {
            headers.push(self.header(height).await?);
        }

        let logs = self.sub_batch_logs(from, to).await?;
        let mut by_height: BTreeMap<u64, Vec<Log>> = BTreeMap::new();
        for log in logs {
            if log.block_height < from || log.block_height > to {
                warn!(
                    height = log.block_height,
                    from, to, "log outside the queried range dropped"
                );
                continue;
            }
            by_height.entry(log.block_height).or_default().push(log);
        }

        Ok(headers
            .into_iter()
            .map(|header| FetchedBlock {
                logs: by_height.remove(&header.height).unwrap_or_default(),
                header,
            })
            .collect())
    }

    /// One ranged query first, retried like any other call. Only when its
    /// retries are exhausted is the range queried one height at a time, which
    /// covers providers that cap the block span of a log query.
    async fn sub_batch_logs(&self, from: u64, to: u64) -> Result<Vec<Log>, ChainError> {
        if from == to {
            return self.logs(from, to).await;
        }
        match self.logs(from, to).await {
            Ok(logs) => Ok(logs),
            Err(err) => {
                debug!(from, to, error = %err, "ranged log query failed, querying per height");
                let mut logs = Vec::new();
                for height in from..=to {
                    logs.extend(self.logs(height, height).await?);
                }
                Ok(logs)
            }
        }
    }

    async fn header(&self, height: u64) -> Result<BlockHeader, ChainError> {
        let chain = &self.chain;
        with_retry_observed(
            &self.retry,
            "block",
            |_| self.metrics.chain_retries.inc(),
            || async move { chain.block(height).await },
        )
        .await
    }

    async fn logs(&self, from: u64, to: u64) -> Result<Vec<Log>, ChainError> {
        let chain = &self.chain;
        let addresses = &self.addresses;
        with_retry_observed(
            &self.retry,
            "logs",
            |_| self.metrics.chain_retries.inc(),
            || async move { chain.logs(from, to, addresses).await },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use async_trait::async_trait;
    use stakescan_nullables::NullChain;
    use stakescan_types::{Timestamp, TxHash, H256};

    const CONTRACT: Address = Address::new([7; 20]);

    fn log(height: u64, log_index: u64) -> Log {
        Log {
            address: CONTRACT,
            topics: Vec::new(),
            data: Vec::new(),
            block_height: height,
            tx_hash: TxHash::new([height as u8; 32]),
            tx_index: 0,
            log_index,
        }
    }

    fn fetcher(chain: Arc<NullChain>, sub_batch: u64, concurrency: usize) -> BatchFetcher {
        BatchFetcher::new(
            chain,
            vec![CONTRACT],
            RetryPolicy {
                attempts: 3,
                delay: Duration::from_millis(1),
            },
            sub_batch,
            concurrency,
            Arc::new(IndexerMetrics::new().unwrap()),
        )
    }

    #[tokio::test]
    async fn range_is_split_into_sub_batches_and_sorted() {
        let chain = Arc::new(NullChain::new());
        chain.add_blocks(1, 25, Timestamp::new(1_000), 12);
        chain.add_log(log(3, 0));
        chain.add_log(log(17, 0));
        chain.add_log(log(17, 1));

        let blocks = fetcher(chain.clone(), 10, 2).fetch_range(1, 25).await.unwrap();

        let heights: Vec<u64> = blocks.iter().map(FetchedBlock::height).collect();
        assert_eq!(heights, (1..=25).collect::<Vec<_>>());
        assert_eq!(blocks[2].logs.len(), 1);
        assert_eq!(blocks[16].logs.len(), 2);

        let mut queries = chain.log_queries();
        queries.sort();
        assert_eq!(queries, vec![(1, 10), (11, 20), (21, 25)]);
    }

    #[tokio::test]
    async fn rejected_ranged_query_falls_back_to_per_height() {
        let chain = Arc::new(NullChain::new());
        chain.add_blocks(1, 3, Timestamp::new(1_000), 12);
        chain.add_log(log(2, 0));
        chain.reject_ranged_logs(true);

        let blocks = fetcher(chain.clone(), 10, 1).fetch_range(1, 3).await.unwrap();

        assert_eq!(blocks[1].logs.len(), 1);
        assert_eq!(
            chain.log_queries(),
            vec![(1, 3), (1, 3), (1, 3), (1, 1), (2, 2), (3, 3)]
        );
    }

    #[tokio::test]
    async fn transient_ranged_failure_is_retried_not_split() {
        let chain = Arc::new(NullChain::new());
        chain.add_blocks(1, 10, Timestamp::new(1_000), 12);
        chain.add_log(log(6, 0));
        chain.fail_log_calls(1);

        let fetcher = fetcher(chain.clone(), 10, 1);
        let blocks = fetcher.fetch_range(1, 10).await.unwrap();

        assert_eq!(blocks[5].logs.len(), 1);
        assert_eq!(chain.log_queries(), vec![(1, 10), (1, 10)]);
        assert_eq!(fetcher.metrics.chain_retries.get(), 1);
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let chain = Arc::new(NullChain::new());
        chain.add_block(5, Timestamp::new(1_000));
        chain.fail_head_calls(2);
        chain.fail_block_calls(1);

        let fetcher = fetcher(chain, 10, 1);
        assert_eq!(fetcher.head_height().await.unwrap(), 5);
        assert_eq!(fetcher.fetch_block(5).await.unwrap().height(), 5);
        assert_eq!(fetcher.metrics.chain_retries.get(), 3);
    }

    #[tokio::test]
    async fn missing_block_fails_the_whole_range() {
        let chain = Arc::new(NullChain::new());
        chain.add_blocks(1, 4, Timestamp::new(1_000), 12);
        chain.set_head(6);

        let result = fetcher(chain, 2, 2).fetch_range(1, 6).await;
        assert!(matches!(result, Err(IndexerError::Chain(_))));
    }

    #[tokio::test]
    async fn failed_sub_batch_stops_further_launches() {
        let chain = Arc::new(NullChain::new());
        chain.add_blocks(2, 10, Timestamp::new(1_000), 12);

        let result = fetcher(chain.clone(), 2, 1).fetch_range(1, 10).await;

        assert!(matches!(result, Err(IndexerError::Chain(_))));
        assert_eq!(chain.block_queries(), vec![1, 1, 1]);
        assert!(chain.log_queries().is_empty());
    }

    /// Serves every block instantly and holds each log query open for a
    /// while, recording how many were in flight at once.
    #[derive(Default)]
    struct SlowLogs {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl ChainClient for SlowLogs {
        async fn head_height(&self) -> Result<u64, ChainError> {
            Ok(100)
        }

        async fn block(&self, height: u64) -> Result<BlockHeader, ChainError> {
            Ok(BlockHeader {
                height,
                hash: H256::ZERO,
                timestamp: Timestamp::new(height),
            })
        }

        async fn logs(
            &self,
            _from: u64,
            _to: u64,
            _addresses: &[Address],
        ) -> Result<Vec<Log>, ChainError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    async fn peak_log_calls(max_concurrent: usize) -> usize {
        let chain = Arc::new(SlowLogs::default());
        let fetcher = BatchFetcher::new(
            chain.clone(),
            vec![CONTRACT],
            RetryPolicy::default(),
            5,
            max_concurrent,
            Arc::new(IndexerMetrics::new().unwrap()),
        );
        let blocks = fetcher.fetch_range(1, 40).await.unwrap();
        assert_eq!(blocks.len(), 40);
        chain.peak.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn in_flight_sub_batches_never_exceed_the_limit() {
        assert_eq!(peak_log_calls(2).await, 2);
        assert_eq!(peak_log_calls(1).await, 1);
    }

    #[tokio::test]
    async fn empty_range_makes_no_calls() {
        let chain = Arc::new(NullChain::new());
        let blocks = fetcher(chain.clone(), 10, 1).fetch_range(5, 4).await.unwrap();
        assert!(blocks.is_empty());
        assert!(chain.block_queries().is_empty());
    }
}
