//! Axum router and listener.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use stakescan_indexer::{IndexerMetrics, StopSignal};
use stakescan_store::CheckpointStore;

use crate::handlers::{health, metrics, sync};
use crate::RpcError;

/// What the handlers read from.
#[derive(Clone)]
pub struct StatusState {
    pub checkpoints: Arc<dyn CheckpointStore + Send + Sync>,
    pub metrics: Arc<IndexerMetrics>,
}

pub fn router(state: StatusState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sync", get(sync))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Serve on `listener` until a stop is requested.
pub async fn serve(
    listener: TcpListener,
    state: StatusState,
    mut stop: StopSignal,
) -> Result<(), RpcError> {
    let addr: SocketAddr = listener.local_addr()?;
    info!(%addr, "status server listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { stop.requested().await })
        .await?;
    info!("status server stopped");
    Ok(())
}
