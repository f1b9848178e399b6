//! stakescan: index a staking protocol's contracts into LMDB.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use tokio::net::TcpListener;

use stakescan_chain::{ChainClient, JsonRpcClient};
use stakescan_decoder::EventDecoder;
use stakescan_indexer::{
    init_logging, reproject, BatchFetcher, BlockPipeline, IndexerConfig, IndexerMetrics,
    ScanSettings, Scanner, ShutdownController, SnapshotScheduler,
};
use stakescan_projector::Projector;
use stakescan_rpc::StatusState;
use stakescan_store::{
    CheckpointStore, DerivedStateReader, RawEventReader, SnapshotStore, GLOBAL_STREAM,
};
use stakescan_store_lmdb::LmdbEnvironment;
use stakescan_types::{Clock, ContractFamily, SystemClock};
use stakescan_utils::format_duration;

#[derive(Parser)]
#[command(name = "stakescan", about = "Staking protocol event indexer")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base; CLI
    /// flags and env vars override them.
    #[arg(long, env = "STAKESCAN_CONFIG")]
    config: Option<PathBuf>,

    /// JSON-RPC endpoints (comma-separated), tried in order.
    #[arg(long, env = "STAKESCAN_RPC_URLS", value_delimiter = ',')]
    rpc_urls: Vec<String>,

    /// Staking contract address.
    #[arg(long, env = "STAKESCAN_STAKING_CONTRACT")]
    staking_contract: Option<String>,

    /// Token contract address.
    #[arg(long, env = "STAKESCAN_TOKEN_CONTRACT")]
    token_contract: Option<String>,

    /// Data directory for the LMDB environment.
    #[arg(long, env = "STAKESCAN_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// First height to scan when no checkpoint exists.
    #[arg(long, env = "STAKESCAN_GENESIS_HEIGHT")]
    genesis_height: Option<u64>,

    /// Status server bind address.
    #[arg(long, env = "STAKESCAN_STATUS_ADDR")]
    status_addr: Option<String>,

    /// Disable the status server.
    #[arg(long, env = "STAKESCAN_NO_STATUS")]
    no_status: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "STAKESCAN_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "STAKESCAN_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Scan the chain until SIGINT/SIGTERM.
    Run,
    /// Clear derived state and rebuild it from stored raw events.
    Reproject,
    /// Print the indexer's progress and latest snapshot as JSON.
    Status,
    /// Print the effective configuration as TOML.
    Config,
}

impl Cli {
    /// File config (or defaults) with CLI/env overrides applied.
    fn load_config(&self) -> anyhow::Result<IndexerConfig> {
        let mut config = match &self.config {
            Some(path) => IndexerConfig::from_toml_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => IndexerConfig::default(),
        };

        if !self.rpc_urls.is_empty() {
            config.rpc_urls = self.rpc_urls.clone();
        }
        if let Some(staking) = &self.staking_contract {
            config.staking_contract = staking.clone();
        }
        if let Some(token) = &self.token_contract {
            config.token_contract = token.clone();
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(height) = self.genesis_height {
            config.genesis_height = height;
        }
        if let Some(addr) = &self.status_addr {
            config.status_addr = addr.clone();
        }
        if self.no_status {
            config.enable_status = false;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.log_format = format.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    match cli.command {
        Command::Run => {
            init_logging(config.log_format()?, &config.log_level)?;
            run(config).await
        }
        Command::Reproject => {
            init_logging(config.log_format()?, &config.log_level)?;
            reproject_all(config).await
        }
        Command::Status => {
            stakescan_utils::init_tracing();
            status(&config)
        }
        Command::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

fn open_store(config: &IndexerConfig) -> anyhow::Result<Arc<LmdbEnvironment>> {
    let store = LmdbEnvironment::open(&config.data_dir, config.map_size_bytes())
        .with_context(|| format!("opening store at {}", config.data_dir.display()))?;
    Ok(Arc::new(store))
}

async fn run(config: IndexerConfig) -> anyhow::Result<()> {
    config.validate()?;
    let contracts = config.contracts()?;
    let store = open_store(&config)?;
    let metrics = Arc::new(IndexerMetrics::new()?);

    let chain: Arc<dyn ChainClient> = Arc::new(JsonRpcClient::new(
        config.rpc_urls.clone(),
        config.rpc_timeout(),
    )?);
    let fetcher = BatchFetcher::new(
        chain,
        contracts.all().to_vec(),
        config.retry_policy(),
        config.sub_batch_size,
        config.max_concurrent_sub_batches,
        metrics.clone(),
    );
    let pipeline = BlockPipeline::new(
        store.clone(),
        Arc::new(EventDecoder::new(contracts)),
        Arc::new(Projector::new(config.projection_params())),
        metrics.clone(),
    );
    let snapshots = SnapshotScheduler::new(
        store.clone(),
        Arc::new(SystemClock),
        config.snapshot_live_gap_secs,
        metrics.clone(),
    );
    let scanner = Scanner::new(
        store.clone(),
        fetcher,
        pipeline,
        snapshots,
        metrics.clone(),
        ScanSettings::from_config(&config),
    );

    tracing::info!(
        staking = %contracts.staking,
        token = %contracts.token,
        endpoints = config.rpc_urls.len(),
        data_dir = %config.data_dir.display(),
        "starting stakescan"
    );

    let shutdown = ShutdownController::new();
    let scan_task = tokio::spawn(scanner.run(shutdown.signal()));

    let status_task = if config.enable_status {
        let listener = TcpListener::bind(&config.status_addr)
            .await
            .with_context(|| format!("binding status server to {}", config.status_addr))?;
        let state = StatusState {
            checkpoints: store.clone(),
            metrics: metrics.clone(),
        };
        Some(tokio::spawn(stakescan_rpc::serve(
            listener,
            state,
            shutdown.signal(),
        )))
    } else {
        None
    };

    let started = SystemClock.now();
    shutdown.wait_for_signal().await;

    scan_task.await.context("scan loop panicked")?;
    if let Some(task) = status_task {
        task.await.context("status server panicked")??;
    }

    tracing::info!(
        uptime = %format_duration(started.elapsed_since(SystemClock.now())),
        checkpoint = ?store.checkpoint(GLOBAL_STREAM)?,
        "stakescan exited cleanly"
    );
    Ok(())
}

async fn reproject_all(config: IndexerConfig) -> anyhow::Result<()> {
    let store = open_store(&config)?;
    let params = config.projection_params();
    let report = tokio::task::spawn_blocking(move || reproject(store.as_ref(), params))
        .await
        .context("reprojection panicked")??;
    println!(
        "reprojected {} events over {} blocks ({} projected, {} failed)",
        report.events, report.blocks, report.projected, report.failures
    );
    Ok(())
}

fn status(config: &IndexerConfig) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let latest = store.latest_snapshot()?;
    let snapshot_age = latest
        .as_ref()
        .map(|s| format_duration(s.timestamp.elapsed_since(SystemClock.now())));

    let report = json!({
        "checkpoint": store.checkpoint(GLOBAL_STREAM)?,
        "raw_events": {
            "staking": store.raw_event_count(ContractFamily::Staking)?,
            "token": store.raw_event_count(ContractFamily::Token)?,
        },
        "totals": store.totals()?,
        "latest_snapshot": latest,
        "latest_snapshot_age": snapshot_age,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
