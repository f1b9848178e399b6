//! Prometheus metrics for the indexer.
//!
//! [`IndexerMetrics`] owns a dedicated [`Registry`] that the status server's
//! `/metrics` endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge,
    Opts, Registry, TextEncoder,
};

use crate::IndexerError;

/// Central collection of all indexer metrics.
pub struct IndexerMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Blocks that stored at least one new event and committed their unit.
    pub blocks_committed: IntCounter,
    /// Raw events newly written.
    pub events_inserted: IntCounter,
    /// Raw events skipped because their key was already stored.
    pub events_duplicate: IntCounter,
    pub decode_failures: IntCounter,
    /// Non-fatal projection failures (event stored, derived state untouched).
    pub projection_failures: IntCounter,
    /// Chain call attempts that failed and were retried.
    pub chain_retries: IntCounter,
    pub snapshots_taken: IntCounter,
    /// Scan iterations that ended in an error.
    pub scan_errors: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    pub checkpoint_height: IntGauge,
    pub chain_head: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    pub block_process_time_ms: Histogram,
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter, prometheus::Error> {
    register_int_counter_with_registry!(Opts::new(name, help), registry)
}

fn gauge(registry: &Registry, name: &str, help: &str) -> Result<IntGauge, prometheus::Error> {
    register_int_gauge_with_registry!(Opts::new(name, help), registry)
}

impl IndexerMetrics {
    /// Create a fresh set of metrics registered under a new [`Registry`].
    pub fn new() -> Result<Self, IndexerError> {
        let registry = Registry::new();

        // Counters
        let blocks_committed = counter(
            &registry,
            "stakescan_blocks_committed_total",
            "Blocks whose unit of work was committed",
        )?;
        let events_inserted = counter(
            &registry,
            "stakescan_events_inserted_total",
            "Raw events newly stored",
        )?;
        let events_duplicate = counter(
            &registry,
            "stakescan_events_duplicate_total",
            "Raw events skipped as already stored",
        )?;
        let decode_failures = counter(
            &registry,
            "stakescan_decode_failures_total",
            "Logs with a known signature whose arguments did not decode",
        )?;
        let projection_failures = counter(
            &registry,
            "stakescan_projection_failures_total",
            "Stored events whose projection failed",
        )?;
        let chain_retries = counter(
            &registry,
            "stakescan_chain_retries_total",
            "Chain calls retried after a failed attempt",
        )?;
        let snapshots_taken = counter(
            &registry,
            "stakescan_snapshots_total",
            "Hourly snapshots written",
        )?;
        let scan_errors = counter(
            &registry,
            "stakescan_scan_errors_total",
            "Scan iterations that failed and backed off",
        )?;

        // Gauges
        let checkpoint_height = gauge(
            &registry,
            "stakescan_checkpoint_height",
            "Highest fully processed block",
        )?;
        let chain_head = gauge(
            &registry,
            "stakescan_chain_head",
            "Latest chain head reported by the RPC endpoint",
        )?;

        // 0.1 ms to ~1.6 s.
        let block_process_time_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "stakescan_block_process_time_ms",
                "Decode, store and project time per block in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(0.1, 2.0, 15)?),
            registry
        )?;

        Ok(Self {
            registry,
            blocks_committed,
            events_inserted,
            events_duplicate,
            decode_failures,
            projection_failures,
            chain_retries,
            snapshots_taken,
            scan_errors,
            checkpoint_height,
            chain_head,
            block_process_time_ms,
        })
    }

    /// Encode every registered metric in the text exposition format.
    pub fn encode_text(&self) -> Result<String, IndexerError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| IndexerError::Metrics(prometheus::Error::Msg(e.to_string())))
    }
}

/// Gauges are i64; heights beyond that range pin to the maximum.
pub(crate) fn height_gauge(height: u64) -> i64 {
    i64::try_from(height).unwrap_or(i64::MAX)
}
