//! Read-only access to derived state for downstream consumers.

use stakescan_types::Address;

use crate::{AccountRecord, NodeRecord, ProtocolTotals, RedemptionRequest, StoreError};

/// Query surface over the projected tables. Only the projector writes them,
/// and only through a [`crate::UnitOfWork`].
pub trait DerivedStateReader {
    fn account(&self, address: &Address) -> Result<Option<AccountRecord>, StoreError>;

    fn accounts(&self) -> Result<Vec<AccountRecord>, StoreError>;

    fn node(&self, address: &Address) -> Result<Option<NodeRecord>, StoreError>;

    fn nodes(&self) -> Result<Vec<NodeRecord>, StoreError>;

    fn redemption(
        &self,
        account: &Address,
        queue_index: u64,
    ) -> Result<Option<RedemptionRequest>, StoreError>;

    /// All requests of one account, ordered by queue index.
    fn redemptions(&self, account: &Address) -> Result<Vec<RedemptionRequest>, StoreError>;

    /// Running totals; all-zero before the first projected event.
    fn totals(&self) -> Result<ProtocolTotals, StoreError>;
}
