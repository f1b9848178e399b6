use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("chain error: {0}")]
    Chain(#[from] stakescan_chain::ChainError),

    #[error("store error: {0}")]
    Store(#[from] stakescan_store::StoreError),

    /// Only fatal projection errors surface here; the rest are counted and
    /// logged by the pipeline.
    #[error("projection error: {0}")]
    Projection(#[from] stakescan_projector::ProjectionError),

    #[error("config error: {0}")]
    Config(String),

    #[error("logging error: {0}")]
    Logging(String),

    #[error("task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("fetch slots closed")]
    SlotsClosed(#[from] tokio::sync::AcquireError),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}
