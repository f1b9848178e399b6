//! LMDB implementation of CheckpointStore.
//!
//! Checkpoints live in `meta_db` under `checkpoint:<stream>` as big-endian
//! u64 values.

use stakescan_store::{CheckpointStore, StoreError};

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

fn checkpoint_key(stream: &str) -> Vec<u8> {
    format!("checkpoint:{stream}").into_bytes()
}

fn parse_height(bytes: &[u8]) -> Result<u64, LmdbError> {
    let arr: [u8; 8] = bytes.try_into().map_err(|_| {
        LmdbError::Serialization("checkpoint has unexpected byte length".to_string())
    })?;
    Ok(u64::from_be_bytes(arr))
}

impl CheckpointStore for LmdbEnvironment {
    fn checkpoint(&self, stream: &str) -> Result<Option<u64>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .meta_db
            .get(&rtxn, &checkpoint_key(stream))
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(parse_height(bytes)?)),
            None => Ok(None),
        }
    }

    fn advance_checkpoint(&self, stream: &str, height: u64) -> Result<u64, StoreError> {
        let key = checkpoint_key(stream);
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let current = self
            .meta_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
            .map(parse_height)
            .transpose()?;

        if let Some(stored) = current {
            if height <= stored {
                tracing::debug!(stream, stored, requested = height, "checkpoint not lowered");
                return Ok(stored);
            }
        }

        self.meta_db
            .put(&mut wtxn, &key, &height.to_be_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(height)
    }
}
