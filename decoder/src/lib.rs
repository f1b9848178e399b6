//! Contract log decoding.
//!
//! [`EventDecoder`] classifies each log by emitting address, looks up
//! `topics[0]` in a signature table built from the `sol!` event declarations
//! and decodes the arguments into a typed [`stakescan_types::ContractEvent`].
//! The result is always a [`stakescan_store::RawEvent`] ready to persist;
//! logs that could not be decoded carry `decoded = None` and are never
//! projected.

pub mod contracts;
pub mod decoder;
pub mod error;
pub mod rules;
pub mod signatures;

pub use decoder::{ContractAddresses, DecodedBlock, EventDecoder};
pub use error::DecodeError;
pub use signatures::SignatureTable;
