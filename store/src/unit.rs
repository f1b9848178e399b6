//! Unit-of-work transaction context.

use stakescan_types::Address;

use crate::{
    AccountRecord, InsertOutcome, NodeRecord, ProtocolTotals, RawEvent, RedemptionRequest,
    StoreError,
};

/// One atomic unit of work: raw event inserts plus the derived rows they
/// move. It is opened by the component that owns the unit (the block
/// pipeline) and passed explicitly to everything that writes within it.
///
/// Reads observe the unit's own uncommitted writes. Either every write is
/// committed or none is.
pub trait UnitOfWork {
    /// Insert one raw event. An existing key is reported as
    /// [`InsertOutcome::Duplicate`] and never overwritten.
    fn insert_raw_event(&mut self, event: &RawEvent) -> Result<InsertOutcome, StoreError>;

    fn account(&self, address: &Address) -> Result<Option<AccountRecord>, StoreError>;

    fn put_account(&mut self, account: &AccountRecord) -> Result<(), StoreError>;

    fn node(&self, address: &Address) -> Result<Option<NodeRecord>, StoreError>;

    fn put_node(&mut self, node: &NodeRecord) -> Result<(), StoreError>;

    fn redemption(
        &self,
        account: &Address,
        queue_index: u64,
    ) -> Result<Option<RedemptionRequest>, StoreError>;

    fn put_redemption(&mut self, request: &RedemptionRequest) -> Result<(), StoreError>;

    fn totals(&self) -> Result<ProtocolTotals, StoreError>;

    fn put_totals(&mut self, totals: &ProtocolTotals) -> Result<(), StoreError>;

    /// Make every write of this unit durable.
    fn commit(self) -> Result<(), StoreError>
    where
        Self: Sized;
}
