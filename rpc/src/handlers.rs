//! Request handlers.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use stakescan_store::GLOBAL_STREAM;

use crate::{RpcError, StatusState};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    /// Highest fully processed block, if any.
    pub checkpoint: Option<u64>,
    /// Last head reported by the chain, if the scanner has seen one.
    pub chain_head: Option<u64>,
    pub lag: Option<u64>,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn sync(State(state): State<StatusState>) -> Result<Json<SyncResponse>, RpcError> {
    let checkpoint = state.checkpoints.checkpoint(GLOBAL_STREAM)?;
    let chain_head = u64::try_from(state.metrics.chain_head.get())
        .ok()
        .filter(|head| *head > 0);
    let lag = match (checkpoint, chain_head) {
        (Some(done), Some(head)) => Some(head.saturating_sub(done)),
        (None, Some(head)) => Some(head),
        _ => None,
    };
    Ok(Json(SyncResponse {
        checkpoint,
        chain_head,
        lag,
    }))
}

pub async fn metrics(State(state): State<StatusState>) -> Result<impl IntoResponse, RpcError> {
    let body = state
        .metrics
        .encode_text()
        .map_err(|e| RpcError::Metrics(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}
