//! HTTP status server for the indexer.
//!
//! Provides:
//! - `GET /health`: liveness
//! - `GET /sync`: checkpoint, last seen chain head and lag
//! - `GET /metrics`: Prometheus text exposition

pub mod error;
pub mod handlers;
pub mod server;

pub use error::RpcError;
pub use server::{router, serve, StatusState};
