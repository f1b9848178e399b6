//! Unit of work: groups the raw event inserts and derived-row writes of one
//! block into a single LMDB write transaction.
//!
//! # Usage
//!
//! ```ignore
//! let mut unit = env.begin_unit()?;
//! unit.insert_raw_event(&event)?;
//! unit.put_account(&account)?;
//! unit.commit()?;
//! ```
//!
//! If the unit is dropped without calling [`UnitOfWork::commit`], all
//! operations are rolled back (the underlying LMDB transaction is aborted).

use heed::RwTxn;

use stakescan_store::{
    AccountRecord, InsertOutcome, NodeRecord, ProtocolTotals, RawEvent, RedemptionRequest,
    StoreError, UnitOfWork,
};
use stakescan_types::Address;

use crate::environment::LmdbEnvironment;
use crate::{decode, encode, LmdbError};

/// Key of the running totals row in `meta_db`.
pub(crate) const TOTALS_KEY: &[u8] = b"protocol_totals";

/// `account(20) ++ queue_index_be(8)`.
pub(crate) fn redemption_key(account: &Address, queue_index: u64) -> [u8; 28] {
    let mut key = [0u8; 28];
    key[..20].copy_from_slice(account.as_bytes());
    key[20..].copy_from_slice(&queue_index.to_be_bytes());
    key
}

/// One LMDB write transaction spanning a whole unit of work.
pub struct LmdbUnit<'a> {
    txn: RwTxn<'a>,
    env: &'a LmdbEnvironment,
}

impl<'a> LmdbUnit<'a> {
    pub(crate) fn new(env: &'a LmdbEnvironment) -> Result<Self, StoreError> {
        let txn = env.env.write_txn().map_err(LmdbError::from)?;
        Ok(Self { txn, env })
    }
}

impl UnitOfWork for LmdbUnit<'_> {
    fn insert_raw_event(&mut self, event: &RawEvent) -> Result<InsertOutcome, StoreError> {
        let db = self.env.events_db(event.family);
        let key = event.key().to_bytes();
        if db
            .get(&self.txn, &key[..])
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Ok(InsertOutcome::Duplicate);
        }
        let bytes = encode(event)?;
        db.put(&mut self.txn, &key[..], &bytes)
            .map_err(LmdbError::from)?;
        Ok(InsertOutcome::Inserted)
    }

    fn account(&self, address: &Address) -> Result<Option<AccountRecord>, StoreError> {
        match self
            .env
            .accounts_db
            .get(&self.txn, address.as_bytes().as_slice())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn put_account(&mut self, account: &AccountRecord) -> Result<(), StoreError> {
        let bytes = encode(account)?;
        self.env
            .accounts_db
            .put(&mut self.txn, account.address.as_bytes().as_slice(), &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn node(&self, address: &Address) -> Result<Option<NodeRecord>, StoreError> {
        match self
            .env
            .nodes_db
            .get(&self.txn, address.as_bytes().as_slice())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn put_node(&mut self, node: &NodeRecord) -> Result<(), StoreError> {
        let bytes = encode(node)?;
        self.env
            .nodes_db
            .put(&mut self.txn, node.address.as_bytes().as_slice(), &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn redemption(
        &self,
        account: &Address,
        queue_index: u64,
    ) -> Result<Option<RedemptionRequest>, StoreError> {
        let key = redemption_key(account, queue_index);
        match self
            .env
            .redemptions_db
            .get(&self.txn, &key[..])
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn put_redemption(&mut self, request: &RedemptionRequest) -> Result<(), StoreError> {
        let key = redemption_key(&request.account, request.queue_index);
        let bytes = encode(request)?;
        self.env
            .redemptions_db
            .put(&mut self.txn, &key[..], &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn totals(&self) -> Result<ProtocolTotals, StoreError> {
        match self
            .env
            .meta_db
            .get(&self.txn, TOTALS_KEY)
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(decode(bytes)?),
            None => Ok(ProtocolTotals::default()),
        }
    }

    fn put_totals(&mut self, totals: &ProtocolTotals) -> Result<(), StoreError> {
        let bytes = encode(totals)?;
        self.env
            .meta_db
            .put(&mut self.txn, TOTALS_KEY, &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
