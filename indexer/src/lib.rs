//! The stakescan indexing engine.
//!
//! [`Scanner`] drives everything: it asks the chain for its head, pulls
//! blocks through the [`BatchFetcher`], hands each one to the
//! [`BlockPipeline`] (decode, store, project, commit), lets the
//! [`SnapshotScheduler`] take hourly snapshots, and advances the checkpoint.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod replay;
pub mod scanner;
pub mod shutdown;
pub mod snapshot;

pub use config::IndexerConfig;
pub use error::IndexerError;
pub use fetcher::{BatchFetcher, FetchedBlock};
pub use logging::{init_logging, LogFormat};
pub use metrics::IndexerMetrics;
pub use pipeline::{BlockOutcome, BlockPipeline};
pub use replay::{reproject, ReplayReport};
pub use scanner::{ScanSettings, Scanner, StepOutcome};
pub use shutdown::{ShutdownController, StopSignal};
pub use snapshot::{build_snapshot, SnapshotScheduler};
