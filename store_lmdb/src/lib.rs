//! LMDB storage backend for the stakescan indexer.
//!
//! Implements all storage traits from `stakescan-store` using the `heed` LMDB bindings.
//! Each logical table maps to one LMDB database within a single environment; a
//! [`LmdbUnit`] wraps one LMDB write transaction.

pub mod checkpoint;
pub mod derived;
pub mod environment;
pub mod error;
pub mod integrity;
pub mod migration;
pub mod raw_event;
pub mod snapshot;
pub mod unit;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use unit::LmdbUnit;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, LmdbError> {
    Ok(bincode::serialize(value)?)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, LmdbError> {
    Ok(bincode::deserialize(bytes)?)
}
