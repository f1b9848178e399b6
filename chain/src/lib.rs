//! Chain RPC boundary for the stakescan indexer.
//!
//! [`ChainClient`] is the seam the indexer talks through. [`JsonRpcClient`]
//! implements it over alloy HTTP providers with round-robin endpoint
//! failover, and [`with_retry`] wraps any single call in a fixed-attempt
//! retry.

pub mod client;
pub mod error;
pub mod json_rpc;
pub mod retry;

pub use client::{BlockHeader, ChainClient, Log};
pub use error::ChainError;
pub use json_rpc::JsonRpcClient;
pub use retry::{with_retry, with_retry_observed, RetryPolicy};
