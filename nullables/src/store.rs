//! Nullable store: thread-safe in-memory storage for testing.
//!
//! A [`NullUnit`] works on a private copy of the unit-scoped tables and
//! swaps it in on commit, so a dropped unit leaves no trace. Units are not
//! isolated from each other; callers must not overlap them.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;

use stakescan_store::{
    AccountRecord, CheckpointStore, DerivedStateReader, EventKey, IndexStore, InsertOutcome,
    NodeRecord, ProtocolTotals, RawEvent, RawEventReader, RedemptionRequest, Snapshot,
    SnapshotStore, StoreError, UnitOfWork,
};
use stakescan_types::{Address, ContractFamily};

/// The tables a unit of work may touch.
#[derive(Clone, Default)]
struct Tables {
    events: BTreeMap<(ContractFamily, [u8; EventKey::LEN]), RawEvent>,
    accounts: BTreeMap<Address, AccountRecord>,
    nodes: BTreeMap<Address, NodeRecord>,
    redemptions: BTreeMap<(Address, u64), RedemptionRequest>,
    totals: ProtocolTotals,
}

/// An in-memory [`IndexStore`] for testing.
/// Thread-safe for use with tokio's multi-threaded runtime.
pub struct NullStore {
    tables: Mutex<Tables>,
    snapshots: Mutex<BTreeMap<u64, Snapshot>>,
    checkpoints: Mutex<HashMap<String, u64>>,
    failing_commits: AtomicU32,
    commits: AtomicU64,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            snapshots: Mutex::new(BTreeMap::new()),
            checkpoints: Mutex::new(HashMap::new()),
            failing_commits: AtomicU32::new(0),
            commits: AtomicU64::new(0),
        }
    }

    /// Make the next `count` unit commits fail with a backend error.
    pub fn fail_next_commits(&self, count: u32) {
        self.failing_commits.store(count, Ordering::SeqCst);
    }

    /// Number of successfully committed units.
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }

    fn take_commit_failure(&self) -> bool {
        self.failing_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckpointStore for NullStore {
    fn checkpoint(&self, stream: &str) -> Result<Option<u64>, StoreError> {
        Ok(self.checkpoints.lock().unwrap().get(stream).copied())
    }

    fn advance_checkpoint(&self, stream: &str, height: u64) -> Result<u64, StoreError> {
        let mut checkpoints = self.checkpoints.lock().unwrap();
        let entry = checkpoints.entry(stream.to_string()).or_insert(height);
        if height > *entry {
            *entry = height;
        }
        Ok(*entry)
    }
}

impl SnapshotStore for NullStore {
    fn latest_snapshot(&self) -> Result<Option<Snapshot>, StoreError> {
        Ok(self
            .snapshots
            .lock()
            .unwrap()
            .values()
            .next_back()
            .cloned())
    }

    fn snapshot(&self, block_height: u64) -> Result<Option<Snapshot>, StoreError> {
        Ok(self.snapshots.lock().unwrap().get(&block_height).cloned())
    }

    fn snapshots(&self, limit: usize) -> Result<Vec<Snapshot>, StoreError> {
        Ok(self
            .snapshots
            .lock()
            .unwrap()
            .values()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    fn insert_snapshot(&self, snapshot: &Snapshot) -> Result<bool, StoreError> {
        let mut snapshots = self.snapshots.lock().unwrap();
        if snapshots.contains_key(&snapshot.block_height) {
            return Ok(false);
        }
        snapshots.insert(snapshot.block_height, snapshot.clone());
        Ok(true)
    }
}

impl DerivedStateReader for NullStore {
    fn account(&self, address: &Address) -> Result<Option<AccountRecord>, StoreError> {
        Ok(self.tables.lock().unwrap().accounts.get(address).cloned())
    }

    fn accounts(&self) -> Result<Vec<AccountRecord>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .accounts
            .values()
            .cloned()
            .collect())
    }

    fn node(&self, address: &Address) -> Result<Option<NodeRecord>, StoreError> {
        Ok(self.tables.lock().unwrap().nodes.get(address).cloned())
    }

    fn nodes(&self) -> Result<Vec<NodeRecord>, StoreError> {
        Ok(self.tables.lock().unwrap().nodes.values().cloned().collect())
    }

    fn redemption(
        &self,
        account: &Address,
        queue_index: u64,
    ) -> Result<Option<RedemptionRequest>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .redemptions
            .get(&(*account, queue_index))
            .cloned())
    }

    fn redemptions(&self, account: &Address) -> Result<Vec<RedemptionRequest>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .redemptions
            .range((*account, 0)..=(*account, u64::MAX))
            .map(|(_, r)| r.clone())
            .collect())
    }

    fn totals(&self) -> Result<ProtocolTotals, StoreError> {
        Ok(self.tables.lock().unwrap().totals.clone())
    }
}

impl RawEventReader for NullStore {
    fn raw_events(
        &self,
        family: ContractFamily,
        from: u64,
        to: u64,
    ) -> Result<Vec<RawEvent>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .events
            .iter()
            .filter(|((f, _), e)| *f == family && e.block_height >= from && e.block_height <= to)
            .map(|(_, e)| e.clone())
            .collect())
    }

    fn raw_event_count(&self, family: ContractFamily) -> Result<u64, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .events
            .keys()
            .filter(|(f, _)| *f == family)
            .count() as u64)
    }
}

impl IndexStore for NullStore {
    type Unit<'a> = NullUnit<'a>;

    fn begin_unit(&self) -> Result<NullUnit<'_>, StoreError> {
        let working = self.tables.lock().unwrap().clone();
        Ok(NullUnit {
            store: self,
            working,
        })
    }

    fn clear_derived(&self) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        tables.accounts.clear();
        tables.nodes.clear();
        tables.redemptions.clear();
        tables.totals = ProtocolTotals::default();
        Ok(())
    }
}

/// A unit of work over a [`NullStore`].
pub struct NullUnit<'a> {
    store: &'a NullStore,
    working: Tables,
}

impl UnitOfWork for NullUnit<'_> {
    fn insert_raw_event(&mut self, event: &RawEvent) -> Result<InsertOutcome, StoreError> {
        let key = (event.family, event.key().to_bytes());
        if self.working.events.contains_key(&key) {
            return Ok(InsertOutcome::Duplicate);
        }
        self.working.events.insert(key, event.clone());
        Ok(InsertOutcome::Inserted)
    }

    fn account(&self, address: &Address) -> Result<Option<AccountRecord>, StoreError> {
        Ok(self.working.accounts.get(address).cloned())
    }

    fn put_account(&mut self, account: &AccountRecord) -> Result<(), StoreError> {
        self.working
            .accounts
            .insert(account.address, account.clone());
        Ok(())
    }

    fn node(&self, address: &Address) -> Result<Option<NodeRecord>, StoreError> {
        Ok(self.working.nodes.get(address).cloned())
    }

    fn put_node(&mut self, node: &NodeRecord) -> Result<(), StoreError> {
        self.working.nodes.insert(node.address, node.clone());
        Ok(())
    }

    fn redemption(
        &self,
        account: &Address,
        queue_index: u64,
    ) -> Result<Option<RedemptionRequest>, StoreError> {
        Ok(self
            .working
            .redemptions
            .get(&(*account, queue_index))
            .cloned())
    }

    fn put_redemption(&mut self, request: &RedemptionRequest) -> Result<(), StoreError> {
        self.working
            .redemptions
            .insert((request.account, request.queue_index), request.clone());
        Ok(())
    }

    fn totals(&self) -> Result<ProtocolTotals, StoreError> {
        Ok(self.working.totals.clone())
    }

    fn put_totals(&mut self, totals: &ProtocolTotals) -> Result<(), StoreError> {
        self.working.totals = totals.clone();
        Ok(())
    }

    fn commit(self) -> Result<(), StoreError> {
        if self.store.take_commit_failure() {
            return Err(StoreError::Backend("injected commit failure".to_string()));
        }
        *self.store.tables.lock().unwrap() = self.working;
        self.store.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
