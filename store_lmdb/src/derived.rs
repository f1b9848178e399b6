//! LMDB implementation of DerivedStateReader.

use std::ops::Bound;

use stakescan_store::{
    AccountRecord, DerivedStateReader, NodeRecord, ProtocolTotals, RedemptionRequest, StoreError,
};
use stakescan_types::Address;

use crate::environment::LmdbEnvironment;
use crate::unit::{redemption_key, TOTALS_KEY};
use crate::{decode, LmdbError};

impl DerivedStateReader for LmdbEnvironment {
    fn account(&self, address: &Address) -> Result<Option<AccountRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .accounts_db
            .get(&rtxn, address.as_bytes().as_slice())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn accounts(&self) -> Result<Vec<AccountRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut out = Vec::new();
        for result in self.accounts_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_, value) = result.map_err(LmdbError::from)?;
            out.push(decode(value)?);
        }
        Ok(out)
    }

    fn node(&self, address: &Address) -> Result<Option<NodeRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .nodes_db
            .get(&rtxn, address.as_bytes().as_slice())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn nodes(&self) -> Result<Vec<NodeRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut out = Vec::new();
        for result in self.nodes_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_, value) = result.map_err(LmdbError::from)?;
            out.push(decode(value)?);
        }
        Ok(out)
    }

    fn redemption(
        &self,
        account: &Address,
        queue_index: u64,
    ) -> Result<Option<RedemptionRequest>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let key = redemption_key(account, queue_index);
        match self
            .redemptions_db
            .get(&rtxn, &key[..])
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn redemptions(&self, account: &Address) -> Result<Vec<RedemptionRequest>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let lower = redemption_key(account, 0);
        let upper = redemption_key(account, u64::MAX);
        let bounds = (
            Bound::Included(lower.as_slice()),
            Bound::Included(upper.as_slice()),
        );
        let mut out = Vec::new();
        for result in self
            .redemptions_db
            .range(&rtxn, &bounds)
            .map_err(LmdbError::from)?
        {
            let (_, value) = result.map_err(LmdbError::from)?;
            out.push(decode(value)?);
        }
        Ok(out)
    }

    fn totals(&self) -> Result<ProtocolTotals, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .meta_db
            .get(&rtxn, TOTALS_KEY)
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(decode(bytes)?),
            None => Ok(ProtocolTotals::default()),
        }
    }
}
