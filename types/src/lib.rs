//! Fundamental types for the stakescan indexer.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! addresses, hashes, amounts, timestamps, the closed set of contract events and the
//! projection parameters.

pub mod address;
pub mod amount;
pub mod error;
pub mod event;
pub mod hash;
pub mod params;
pub mod time;

pub use address::Address;
pub use amount::Amount;
pub use error::TypesError;
pub use event::{ContractEvent, ContractFamily, EventKind};
pub use hash::{TxHash, H256};
pub use params::ProjectionParams;
pub use time::{Clock, SystemClock, Timestamp};
