//! Chain account address type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;
use crate::hash::H256;

/// A 20-byte chain address.
///
/// The all-zero address is the mint/burn sentinel and is never tracked as a
/// holder.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Self = Self([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Parse a `0x`-prefixed (or bare) hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypesError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|e| TypesError::InvalidAddress(e.to_string()))?;
        let arr: [u8; 20] = bytes
            .try_into()
            .map_err(|_| TypesError::InvalidAddress(format!("expected 20 bytes: {s}")))?;
        Ok(Self(arr))
    }

    /// Extract an address from a left-padded 32-byte ABI word.
    ///
    /// Returns `None` when any of the 12 padding bytes is non-zero.
    pub fn from_word(word: &H256) -> Option<Self> {
        let bytes = word.as_bytes();
        if bytes[..12].iter().any(|b| *b != 0) {
            return None;
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes[12..]);
        Some(Self(arr))
    }

    /// Left-pad this address into a 32-byte ABI word.
    pub fn to_word(&self) -> H256 {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(&self.0);
        H256::new(word)
    }
}

impl FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{})", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}
