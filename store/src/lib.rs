//! Abstract storage traits for the stakescan indexer.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.
//!
//! Writes that belong to one unit of work (raw events of a block plus the
//! derived rows they touch) go through a [`UnitOfWork`] opened with
//! [`IndexStore::begin_unit`]; the checkpoint and snapshots are written
//! outside of it.

pub mod account;
pub mod checkpoint;
pub mod derived;
pub mod error;
pub mod node;
pub mod raw_event;
pub mod redemption;
pub mod snapshot;
pub mod totals;
pub mod unit;

pub use account::{AccountRecord, Activity};
pub use checkpoint::{CheckpointStore, GLOBAL_STREAM};
pub use derived::DerivedStateReader;
pub use error::StoreError;
pub use node::{NodeLifecycle, NodeRecord};
pub use raw_event::{EventKey, InsertOutcome, RawEvent, RawEventReader};
pub use redemption::{RedemptionRequest, RedemptionStatus};
pub use snapshot::{Snapshot, SnapshotStore};
pub use totals::ProtocolTotals;
pub use unit::UnitOfWork;

/// A complete indexer store: durable checkpoint, raw event ledger, derived
/// state and snapshots.
pub trait IndexStore:
    CheckpointStore + SnapshotStore + DerivedStateReader + RawEventReader + Send + Sync
{
    /// Transaction context for one unit of work.
    type Unit<'a>: UnitOfWork
    where
        Self: 'a;

    /// Open a new unit of work. Dropping it without calling
    /// [`UnitOfWork::commit`] discards every write made through it.
    fn begin_unit(&self) -> Result<Self::Unit<'_>, StoreError>;

    /// Delete all derived rows (accounts, nodes, redemptions, totals).
    ///
    /// Raw events, snapshots and checkpoints are kept so derived state can be
    /// rebuilt from the raw ledger.
    fn clear_derived(&self) -> Result<(), StoreError>;
}
