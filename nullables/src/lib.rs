//! Nullable infrastructure for deterministic testing.
//!
//! The indexer reaches the outside world through three seams: the chain
//! RPC boundary, the store and the wall clock. This crate provides
//! test-friendly implementations of each that:
//! - Return deterministic values
//! - Can be scripted and made to fail programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod chain;
pub mod clock;
pub mod store;

pub use chain::NullChain;
pub use clock::NullClock;
pub use store::{NullStore, NullUnit};
