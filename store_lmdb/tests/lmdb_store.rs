use stakescan_store::{
    AccountRecord, Activity, CheckpointStore, DerivedStateReader, IndexStore, InsertOutcome,
    ProtocolTotals, RawEvent, RawEventReader, RedemptionRequest, RedemptionStatus, Snapshot,
    SnapshotStore, UnitOfWork, GLOBAL_STREAM,
};
use stakescan_store_lmdb::LmdbEnvironment;
use stakescan_types::{Address, Amount, ContractEvent, ContractFamily, Timestamp, TxHash};

const MAP_SIZE: usize = 10 * 1024 * 1024;

fn open() -> (tempfile::TempDir, LmdbEnvironment) {
    let dir = tempfile::tempdir().unwrap();
    let store = LmdbEnvironment::open(dir.path(), MAP_SIZE).unwrap();
    (dir, store)
}

fn transfer(height: u64, log_index: u64, tx: u8) -> RawEvent {
    RawEvent {
        family: ContractFamily::Token,
        event_name: "Transfer".to_string(),
        block_height: height,
        tx_hash: TxHash::new([tx; 32]),
        tx_index: 0,
        log_index,
        block_timestamp: Timestamp::new(1_700_000_000 + height),
        contract_address: Address::new([0xaa; 20]),
        decoded: Some(ContractEvent::Transfer {
            from: Address::ZERO,
            to: Address::new([1; 20]),
            value: Amount::from_u64(10),
        }),
        raw_data: vec![0; 32],
        topics: Vec::new(),
    }
}

fn snapshot(height: u64) -> Snapshot {
    Snapshot {
        block_height: height,
        timestamp: Timestamp::new(3_600 * height),
        asset_backing: Amount::from_u64(height),
        total_staked: Amount::ZERO,
        total_supply: Amount::from_u64(1_000),
        current_holders: 1,
        historical_holders: 2,
        total_referral_rewards: Amount::ZERO,
        active_nodes: 0,
        total_keeper_tips: Amount::ZERO,
    }
}

#[test]
fn duplicate_raw_event_is_reported_not_rewritten() {
    let (_dir, store) = open();

    let mut unit = store.begin_unit().unwrap();
    assert_eq!(
        unit.insert_raw_event(&transfer(5, 0, 1)).unwrap(),
        InsertOutcome::Inserted
    );
    unit.commit().unwrap();

    let mut unit = store.begin_unit().unwrap();
    assert_eq!(
        unit.insert_raw_event(&transfer(5, 0, 1)).unwrap(),
        InsertOutcome::Duplicate
    );
    unit.commit().unwrap();

    assert_eq!(store.raw_event_count(ContractFamily::Token).unwrap(), 1);
    assert_eq!(store.raw_event_count(ContractFamily::Staking).unwrap(), 0);
}

#[test]
fn dropped_unit_rolls_back() {
    let (_dir, store) = open();
    {
        let mut unit = store.begin_unit().unwrap();
        unit.insert_raw_event(&transfer(1, 0, 1)).unwrap();
        unit.put_account(&AccountRecord::new(Address::new([1; 20])))
            .unwrap();
    }
    assert_eq!(store.raw_event_count(ContractFamily::Token).unwrap(), 0);
    assert!(store.account(&Address::new([1; 20])).unwrap().is_none());
}

#[test]
fn raw_events_range_is_inclusive_and_ordered() {
    let (_dir, store) = open();
    let mut unit = store.begin_unit().unwrap();
    for (height, log) in [(3, 1), (1, 0), (2, 4), (2, 0), (4, 0)] {
        unit.insert_raw_event(&transfer(height, log, height as u8))
            .unwrap();
    }
    unit.commit().unwrap();

    let events = store.raw_events(ContractFamily::Token, 2, 3).unwrap();
    let keys: Vec<_> = events.iter().map(|e| (e.block_height, e.log_index)).collect();
    assert_eq!(keys, vec![(2, 0), (2, 4), (3, 1)]);
    assert!(store
        .raw_events(ContractFamily::Token, 5, 4)
        .unwrap()
        .is_empty());
    assert_eq!(
        store
            .raw_events(ContractFamily::Token, 0, u64::MAX)
            .unwrap()
            .len(),
        5
    );
}

#[test]
fn checkpoint_never_decreases() {
    let (_dir, store) = open();
    assert_eq!(store.checkpoint(GLOBAL_STREAM).unwrap(), None);
    assert_eq!(store.advance_checkpoint(GLOBAL_STREAM, 10).unwrap(), 10);
    assert_eq!(store.advance_checkpoint(GLOBAL_STREAM, 7).unwrap(), 10);
    assert_eq!(store.checkpoint(GLOBAL_STREAM).unwrap(), Some(10));
    assert_eq!(store.advance_checkpoint(GLOBAL_STREAM, 11).unwrap(), 11);
}

#[test]
fn checkpoint_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = LmdbEnvironment::open(dir.path(), MAP_SIZE).unwrap();
        store.advance_checkpoint(GLOBAL_STREAM, 42).unwrap();
    }
    let store = LmdbEnvironment::open(dir.path(), MAP_SIZE).unwrap();
    assert_eq!(store.checkpoint(GLOBAL_STREAM).unwrap(), Some(42));
}

#[test]
fn snapshots_are_unique_per_height_and_newest_first() {
    let (_dir, store) = open();
    assert!(store.latest_snapshot().unwrap().is_none());
    assert!(store.insert_snapshot(&snapshot(10)).unwrap());
    assert!(store.insert_snapshot(&snapshot(30)).unwrap());
    assert!(store.insert_snapshot(&snapshot(20)).unwrap());
    assert!(!store.insert_snapshot(&snapshot(20)).unwrap());

    assert_eq!(store.latest_snapshot().unwrap().unwrap().block_height, 30);
    let heights: Vec<_> = store
        .snapshots(2)
        .unwrap()
        .iter()
        .map(|s| s.block_height)
        .collect();
    assert_eq!(heights, vec![30, 20]);
    assert_eq!(store.snapshot(10).unwrap(), Some(snapshot(10)));
}

#[test]
fn redemptions_are_scoped_to_account() {
    let (_dir, store) = open();
    let alice = Address::new([1; 20]);
    let bob = Address::new([2; 20]);
    let request = |account: Address, queue_index: u64| RedemptionRequest {
        account,
        queue_index,
        shares: Amount::from_u64(5),
        expected_assets: Amount::from_u64(5),
        tip: Amount::ZERO,
        requested: Activity::new(1, Timestamp::new(1)),
        unlock_block: 7_201,
        status: RedemptionStatus::Pending,
        credited: None,
        credited_assets: None,
        keeper: None,
    };

    let mut unit = store.begin_unit().unwrap();
    unit.put_redemption(&request(alice, 2)).unwrap();
    unit.put_redemption(&request(alice, 0)).unwrap();
    unit.put_redemption(&request(bob, 1)).unwrap();
    unit.commit().unwrap();

    let alice_queue: Vec<_> = store
        .redemptions(&alice)
        .unwrap()
        .iter()
        .map(|r| r.queue_index)
        .collect();
    assert_eq!(alice_queue, vec![0, 2]);
    assert!(store.redemption(&bob, 0).unwrap().is_none());
    assert!(store.redemption(&bob, 1).unwrap().is_some());
}

#[test]
fn clear_derived_keeps_raw_events_and_checkpoint() {
    let (_dir, store) = open();
    let alice = Address::new([1; 20]);

    let mut unit = store.begin_unit().unwrap();
    unit.insert_raw_event(&transfer(1, 0, 1)).unwrap();
    unit.put_account(&AccountRecord::new(alice)).unwrap();
    unit.put_totals(&ProtocolTotals {
        current_holders: 3,
        ..ProtocolTotals::default()
    })
    .unwrap();
    unit.commit().unwrap();
    store.advance_checkpoint(GLOBAL_STREAM, 1).unwrap();

    store.clear_derived().unwrap();

    assert!(store.accounts().unwrap().is_empty());
    assert_eq!(store.totals().unwrap(), ProtocolTotals::default());
    assert_eq!(store.raw_event_count(ContractFamily::Token).unwrap(), 1);
    assert_eq!(store.checkpoint(GLOBAL_STREAM).unwrap(), Some(1));
}
