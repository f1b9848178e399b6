//! LMDB implementation of RawEventReader.
//!
//! Raw events are written only through [`crate::LmdbUnit`]; this module is
//! the read side used for audit and replay.

use std::ops::Bound;

use stakescan_store::{EventKey, RawEvent, RawEventReader, StoreError};
use stakescan_types::ContractFamily;

use crate::environment::LmdbEnvironment;
use crate::{decode, LmdbError};

impl RawEventReader for LmdbEnvironment {
    fn raw_events(
        &self,
        family: ContractFamily,
        from: u64,
        to: u64,
    ) -> Result<Vec<RawEvent>, StoreError> {
        if from > to {
            return Ok(Vec::new());
        }
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let lower = EventKey::lower_bound(from);
        let upper = to.checked_add(1).map(EventKey::lower_bound);
        let bounds = match upper.as_ref() {
            Some(upper) => (
                Bound::Included(lower.as_slice()),
                Bound::Excluded(upper.as_slice()),
            ),
            None => (Bound::Included(lower.as_slice()), Bound::Unbounded),
        };

        let mut out = Vec::new();
        for result in self
            .events_db(family)
            .range(&rtxn, &bounds)
            .map_err(LmdbError::from)?
        {
            let (_, value) = result.map_err(LmdbError::from)?;
            out.push(decode(value)?);
        }
        Ok(out)
    }

    fn raw_event_count(&self, family: ContractFamily) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.events_db(family).len(&rtxn).map_err(LmdbError::from)?)
    }
}
