//! LMDB implementation of SnapshotStore.
//!
//! Keys are big-endian heights, so LMDB's byte order is height order and the
//! newest snapshot is the last key.

use stakescan_store::{Snapshot, SnapshotStore, StoreError};

use crate::environment::LmdbEnvironment;
use crate::{decode, encode, LmdbError};

impl SnapshotStore for LmdbEnvironment {
    fn latest_snapshot(&self) -> Result<Option<Snapshot>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self.snapshots_db.last(&rtxn).map_err(LmdbError::from)? {
            Some((_, value)) => Ok(Some(decode(value)?)),
            None => Ok(None),
        }
    }

    fn snapshot(&self, block_height: u64) -> Result<Option<Snapshot>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .snapshots_db
            .get(&rtxn, &block_height.to_be_bytes()[..])
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn snapshots(&self, limit: usize) -> Result<Vec<Snapshot>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut out = Vec::new();
        for result in self
            .snapshots_db
            .rev_iter(&rtxn)
            .map_err(LmdbError::from)?
            .take(limit)
        {
            let (_, value) = result.map_err(LmdbError::from)?;
            out.push(decode(value)?);
        }
        Ok(out)
    }

    fn insert_snapshot(&self, snapshot: &Snapshot) -> Result<bool, StoreError> {
        let key = snapshot.block_height.to_be_bytes();
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .snapshots_db
            .get(&wtxn, &key[..])
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Ok(false);
        }
        let bytes = encode(snapshot)?;
        self.snapshots_db
            .put(&mut wtxn, &key[..], &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(true)
    }
}
