//! The scan loop against a real LMDB environment.

use std::sync::Arc;
use std::time::Duration;

use stakescan_chain::{Log, RetryPolicy};
use stakescan_decoder::signatures::topic0;
use stakescan_decoder::{ContractAddresses, EventDecoder};
use stakescan_indexer::{
    reproject, BatchFetcher, BlockPipeline, IndexerMetrics, ScanSettings, Scanner,
    SnapshotScheduler, StepOutcome,
};
use stakescan_nullables::{NullChain, NullClock};
use stakescan_projector::Projector;
use stakescan_store::{
    CheckpointStore, DerivedStateReader, RawEventReader, SnapshotStore, GLOBAL_STREAM,
};
use stakescan_store_lmdb::LmdbEnvironment;
use stakescan_types::{
    Address, Amount, ContractFamily, EventKind, ProjectionParams, Timestamp, TxHash,
};

const MAP_SIZE: usize = 64 * 1024 * 1024;
const STAKING: Address = Address::new([0x51; 20]);
const TOKEN: Address = Address::new([0x70; 20]);
const BOB: Address = Address::new([0xb0; 20]);
const CAROL: Address = Address::new([0xca; 20]);

fn transfer(height: u64, log_index: u64, from: Address, to: Address, value: u64) -> Log {
    let mut data = [0u8; 32];
    data[24..].copy_from_slice(&value.to_be_bytes());
    Log {
        address: TOKEN,
        topics: vec![topic0(EventKind::Transfer), from.to_word(), to.to_word()],
        data: data.to_vec(),
        block_height: height,
        tx_hash: TxHash::new([height as u8; 32]),
        tx_index: 0,
        log_index,
    }
}

fn scanner(
    chain: Arc<NullChain>,
    store: Arc<LmdbEnvironment>,
    metrics: Arc<IndexerMetrics>,
) -> Scanner<LmdbEnvironment> {
    let contracts = ContractAddresses {
        staking: STAKING,
        token: TOKEN,
    };
    let fetcher = BatchFetcher::new(
        chain,
        contracts.all().to_vec(),
        RetryPolicy {
            attempts: 2,
            delay: Duration::from_millis(1),
        },
        3,
        2,
        metrics.clone(),
    );
    let pipeline = BlockPipeline::new(
        store.clone(),
        Arc::new(EventDecoder::new(contracts)),
        Arc::new(Projector::new(ProjectionParams::default())),
        metrics.clone(),
    );
    let snapshots = SnapshotScheduler::new(
        store.clone(),
        Arc::new(NullClock::new(1_700_000_000)),
        600,
        metrics.clone(),
    );
    Scanner::new(
        store,
        fetcher,
        pipeline,
        snapshots,
        metrics,
        ScanSettings {
            genesis_height: 1,
            finality_buffer: 1,
            batch_size: 4,
            live_block_delay: Duration::ZERO,
            batch_delay: Duration::ZERO,
            idle_delay: Duration::ZERO,
            error_backoff: Duration::ZERO,
        },
    )
}

#[tokio::test]
async fn scan_persists_events_state_and_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LmdbEnvironment::open(dir.path(), MAP_SIZE).unwrap());
    let chain = Arc::new(NullChain::new());
    chain.add_blocks(1, 9, Timestamp::new(1_700_000_000), 12);
    chain.add_log(transfer(2, 0, Address::ZERO, BOB, 300));
    chain.add_log(transfer(5, 0, BOB, CAROL, 120));
    chain.add_log(transfer(8, 3, CAROL, Address::ZERO, 20));

    let metrics = Arc::new(IndexerMetrics::new().unwrap());
    let mut scanner = scanner(chain.clone(), store.clone(), metrics.clone());
    loop {
        if let StepOutcome::Idle { .. } = scanner.step().await.unwrap() {
            break;
        }
    }

    assert_eq!(store.checkpoint(GLOBAL_STREAM).unwrap(), Some(9));
    assert_eq!(store.raw_event_count(ContractFamily::Token).unwrap(), 3);
    assert_eq!(
        store.account(&BOB).unwrap().unwrap().balance,
        Amount::from_u64(180)
    );
    assert_eq!(
        store.account(&CAROL).unwrap().unwrap().balance,
        Amount::from_u64(100)
    );
    let totals = store.totals().unwrap();
    assert_eq!(totals.current_holders, 2);
    assert_eq!(totals.historical_holders, 2);
    assert_eq!(store.snapshots(5).unwrap().len(), 1);
    assert_eq!(metrics.events_inserted.get(), 3);

    // A second scanner over the same environment resumes and finds nothing.
    let mut again = crate::scanner(chain, store.clone(), metrics.clone());
    assert_eq!(again.step().await.unwrap(), StepOutcome::Idle { head: 9 });

    let report = reproject(store.as_ref(), ProjectionParams::default()).unwrap();
    assert_eq!(report.events, 3);
    assert_eq!(store.totals().unwrap(), totals);
}
