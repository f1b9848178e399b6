//! Indexer configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use stakescan_chain::RetryPolicy;
use stakescan_decoder::ContractAddresses;
use stakescan_types::{Address, ProjectionParams};

use crate::logging::LogFormat;
use crate::IndexerError;

/// Configuration for one indexer process.
///
/// Can be loaded from a TOML file via [`IndexerConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default, so an
/// empty file parses; [`IndexerConfig::validate`] checks what `run` needs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// JSON-RPC endpoints, tried in order and rotated on failure.
    #[serde(default)]
    pub rpc_urls: Vec<String>,

    /// Per-request timeout for chain calls, in seconds.
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,

    /// Staking contract address (0x hex).
    #[serde(default)]
    pub staking_contract: String,

    /// Token contract address (0x hex).
    #[serde(default)]
    pub token_contract: String,

    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in MiB.
    #[serde(default = "default_map_size_mib")]
    pub map_size_mib: usize,

    /// First height to scan when no checkpoint exists.
    #[serde(default)]
    pub genesis_height: u64,

    /// Gap to the chain head at or under which the scanner goes live.
    #[serde(default = "default_finality_buffer")]
    pub finality_buffer: u64,

    /// Blocks per historical batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,

    /// Contiguous heights per parallel sub-batch.
    #[serde(default = "default_sub_batch_size")]
    pub sub_batch_size: u64,

    /// Sub-batches allowed in flight at once.
    #[serde(default = "default_max_concurrent_sub_batches")]
    pub max_concurrent_sub_batches: usize,

    /// Attempts per chain call before the call is fatal.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Sleep between chain call attempts, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Sleep between live blocks, in milliseconds.
    #[serde(default = "default_live_block_delay_ms")]
    pub live_block_delay_ms: u64,

    /// Sleep between historical batches, in milliseconds.
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Sleep when no new block is available, in milliseconds.
    #[serde(default = "default_idle_delay_ms")]
    pub idle_delay_ms: u64,

    /// Back-off after a failed iteration, in milliseconds.
    #[serde(default = "default_error_backoff_ms")]
    pub error_backoff_ms: u64,

    /// Blocks between a request and its unlock height.
    #[serde(default = "default_maturity_window")]
    pub maturity_window: u64,

    /// Wall-clock lag under which the snapshot schedule follows the clock
    /// instead of block time, in seconds.
    #[serde(default = "default_snapshot_live_gap_secs")]
    pub snapshot_live_gap_secs: u64,

    /// Whether to serve the status endpoints.
    #[serde(default = "default_true")]
    pub enable_status: bool,

    /// Bind address of the status server.
    #[serde(default = "default_status_addr")]
    pub status_addr: String,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Defaults ───────────────────────────────────────────────────────────

fn default_rpc_timeout_secs() -> u64 {
    30
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./stakescan_data")
}

fn default_map_size_mib() -> usize {
    16 * 1024
}

fn default_finality_buffer() -> u64 {
    10
}

fn default_batch_size() -> u64 {
    100
}

fn default_sub_batch_size() -> u64 {
    10
}

fn default_max_concurrent_sub_batches() -> usize {
    4
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_live_block_delay_ms() -> u64 {
    200
}

fn default_batch_delay_ms() -> u64 {
    100
}

fn default_idle_delay_ms() -> u64 {
    2_000
}

fn default_error_backoff_ms() -> u64 {
    5_000
}

fn default_maturity_window() -> u64 {
    stakescan_types::params::DEFAULT_MATURITY_WINDOW
}

fn default_snapshot_live_gap_secs() -> u64 {
    600
}

fn default_true() -> bool {
    true
}

fn default_status_addr() -> String {
    "127.0.0.1:7080".to_string()
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl IndexerConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, IndexerError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| IndexerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, IndexerError> {
        toml::from_str(s).map_err(|e| IndexerError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, IndexerError> {
        toml::to_string_pretty(self).map_err(|e| IndexerError::Config(e.to_string()))
    }

    /// Check everything the scan loop depends on.
    pub fn validate(&self) -> Result<(), IndexerError> {
        if self.rpc_urls.is_empty() {
            return Err(IndexerError::Config(
                "at least one rpc url is required".to_string(),
            ));
        }
        self.contracts()?;
        if self.batch_size == 0 {
            return Err(IndexerError::Config("batch_size must be positive".to_string()));
        }
        if self.sub_batch_size == 0 {
            return Err(IndexerError::Config(
                "sub_batch_size must be positive".to_string(),
            ));
        }
        if self.max_concurrent_sub_batches == 0 {
            return Err(IndexerError::Config(
                "max_concurrent_sub_batches must be positive".to_string(),
            ));
        }
        self.log_format()?;
        Ok(())
    }

    /// The two indexed contracts, parsed.
    pub fn contracts(&self) -> Result<ContractAddresses, IndexerError> {
        let staking = parse_contract("staking_contract", &self.staking_contract)?;
        let token = parse_contract("token_contract", &self.token_contract)?;
        if staking == token {
            return Err(IndexerError::Config(
                "staking and token contracts must differ".to_string(),
            ));
        }
        Ok(ContractAddresses { staking, token })
    }

    pub fn log_format(&self) -> Result<LogFormat, IndexerError> {
        self.log_format.parse()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.retry_attempts,
            delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    pub fn projection_params(&self) -> ProjectionParams {
        ProjectionParams {
            maturity_window: self.maturity_window,
        }
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mib.saturating_mul(1024 * 1024)
    }
}

fn parse_contract(field: &str, value: &str) -> Result<Address, IndexerError> {
    if value.is_empty() {
        return Err(IndexerError::Config(format!("{field} is required")));
    }
    let address =
        Address::from_hex(value).map_err(|e| IndexerError::Config(format!("{field}: {e}")))?;
    if address.is_zero() {
        return Err(IndexerError::Config(format!("{field} cannot be the zero address")));
    }
    Ok(address)
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            rpc_urls: Vec::new(),
            rpc_timeout_secs: default_rpc_timeout_secs(),
            staking_contract: String::new(),
            token_contract: String::new(),
            data_dir: default_data_dir(),
            map_size_mib: default_map_size_mib(),
            genesis_height: 0,
            finality_buffer: default_finality_buffer(),
            batch_size: default_batch_size(),
            sub_batch_size: default_sub_batch_size(),
            max_concurrent_sub_batches: default_max_concurrent_sub_batches(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            live_block_delay_ms: default_live_block_delay_ms(),
            batch_delay_ms: default_batch_delay_ms(),
            idle_delay_ms: default_idle_delay_ms(),
            error_backoff_ms: default_error_backoff_ms(),
            maturity_window: default_maturity_window(),
            snapshot_live_gap_secs: default_snapshot_live_gap_secs(),
            enable_status: default_true(),
            status_addr: default_status_addr(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
