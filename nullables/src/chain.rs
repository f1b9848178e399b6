//! Nullable chain: a scripted [`ChainClient`] for testing.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use stakescan_chain::{BlockHeader, ChainClient, ChainError, Log};
use stakescan_types::{Address, Timestamp, H256};

#[derive(Default)]
struct ChainState {
    head: u64,
    blocks: BTreeMap<u64, BlockHeader>,
    logs: Vec<Log>,
    failing_head_calls: u32,
    failing_block_calls: u32,
    failing_log_calls: u32,
    reject_ranged_logs: bool,
    log_queries: Vec<(u64, u64)>,
    block_queries: Vec<u64>,
}

/// An in-memory chain whose blocks, logs and failures are scripted by the
/// test.
pub struct NullChain {
    state: Mutex<ChainState>,
}

impl NullChain {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ChainState::default()),
        }
    }

    /// Add a block; the head follows the highest block added.
    pub fn add_block(&self, height: u64, timestamp: Timestamp) {
        let mut state = self.state.lock().unwrap();
        let mut hash = [0u8; 32];
        hash[24..].copy_from_slice(&height.to_be_bytes());
        state.blocks.insert(
            height,
            BlockHeader {
                height,
                hash: H256::new(hash),
                timestamp,
            },
        );
        state.head = state.head.max(height);
    }

    /// Add blocks `from..=to`, `secs_per_block` apart starting at `start`.
    pub fn add_blocks(&self, from: u64, to: u64, start: Timestamp, secs_per_block: u64) {
        for height in from..=to {
            let offset = (height - from) * secs_per_block;
            self.add_block(height, Timestamp::new(start.as_secs() + offset));
        }
    }

    pub fn add_log(&self, log: Log) {
        self.state.lock().unwrap().logs.push(log);
    }

    /// Override the reported head, e.g. to announce blocks not yet added.
    pub fn set_head(&self, head: u64) {
        self.state.lock().unwrap().head = head;
    }

    pub fn fail_head_calls(&self, count: u32) {
        self.state.lock().unwrap().failing_head_calls = count;
    }

    pub fn fail_block_calls(&self, count: u32) {
        self.state.lock().unwrap().failing_block_calls = count;
    }

    pub fn fail_log_calls(&self, count: u32) {
        self.state.lock().unwrap().failing_log_calls = count;
    }

    /// Make every log query spanning more than one block fail.
    pub fn reject_ranged_logs(&self, reject: bool) {
        self.state.lock().unwrap().reject_ranged_logs = reject;
    }

    /// `(from, to)` of every log query seen, failed ones included.
    pub fn log_queries(&self) -> Vec<(u64, u64)> {
        self.state.lock().unwrap().log_queries.clone()
    }

    /// Heights of every block query seen.
    pub fn block_queries(&self) -> Vec<u64> {
        self.state.lock().unwrap().block_queries.clone()
    }
}

impl Default for NullChain {
    fn default() -> Self {
        Self::new()
    }
}

fn injected(call: &str) -> ChainError {
    ChainError::Transport {
        endpoint: "null".to_string(),
        message: format!("injected {call} failure"),
    }
}

fn take(counter: &mut u32) -> bool {
    if *counter > 0 {
        *counter -= 1;
        true
    } else {
        false
    }
}

#[async_trait]
impl ChainClient for NullChain {
    async fn head_height(&self) -> Result<u64, ChainError> {
        let mut state = self.state.lock().unwrap();
        if take(&mut state.failing_head_calls) {
            return Err(injected("head"));
        }
        Ok(state.head)
    }

    async fn block(&self, height: u64) -> Result<BlockHeader, ChainError> {
        let mut state = self.state.lock().unwrap();
        state.block_queries.push(height);
        if take(&mut state.failing_block_calls) {
            return Err(injected("block"));
        }
        state
            .blocks
            .get(&height)
            .copied()
            .ok_or(ChainError::BlockNotFound(height))
    }

    async fn logs(
        &self,
        from: u64,
        to: u64,
        addresses: &[Address],
    ) -> Result<Vec<Log>, ChainError> {
        let mut state = self.state.lock().unwrap();
        state.log_queries.push((from, to));
        if take(&mut state.failing_log_calls) {
            return Err(injected("logs"));
        }
        if state.reject_ranged_logs && to > from {
            return Err(ChainError::Rpc {
                code: -32005,
                message: "query returned more than 10000 results".to_string(),
            });
        }
        let mut logs: Vec<Log> = state
            .logs
            .iter()
            .filter(|l| l.block_height >= from && l.block_height <= to)
            .filter(|l| addresses.is_empty() || addresses.contains(&l.address))
            .cloned()
            .collect();
        logs.sort_by_key(|l| (l.block_height, l.log_index));
        Ok(logs)
    }
}
