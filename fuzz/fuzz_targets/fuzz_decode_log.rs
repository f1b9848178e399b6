#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use stakescan_chain::Log;
use stakescan_decoder::decoder::LogOutcome;
use stakescan_decoder::signatures::topic0;
use stakescan_decoder::{ContractAddresses, EventDecoder};
use stakescan_types::{Address, EventKind, Timestamp, TxHash, H256};

const STAKING: Address = Address::new([0x51; 20]);
const TOKEN: Address = Address::new([0x70; 20]);

#[derive(Debug, Arbitrary)]
struct FuzzLog {
    /// 0 = staking, 1 = token, anything else a foreign address.
    emitter: u8,
    /// Picks a known signature when `known_signature` is set.
    selector: u8,
    known_signature: bool,
    extra_topics: Vec<[u8; 32]>,
    data: Vec<u8>,
    height: u64,
    log_index: u64,
    timestamp: u64,
}

// Whole-log decoding: the outcome must agree with the emitter, and a
// decoded event must carry the log's position.
fuzz_target!(|input: FuzzLog| {
    let decoder = EventDecoder::new(ContractAddresses {
        staking: STAKING,
        token: TOKEN,
    });
    let address = match input.emitter {
        0 => STAKING,
        1 => TOKEN,
        other => Address::new([other; 20]),
    };

    let mut topics = Vec::new();
    if input.known_signature {
        let kind = EventKind::ALL[input.selector as usize % EventKind::ALL.len()];
        topics.push(topic0(kind));
    }
    topics.extend(input.extra_topics.into_iter().take(4).map(H256::new));

    let log = Log {
        address,
        topics,
        data: input.data,
        block_height: input.height,
        tx_hash: TxHash::new([0; 32]),
        tx_index: 0,
        log_index: input.log_index,
    };

    match decoder.decode_log(&log, Timestamp::new(input.timestamp)) {
        LogOutcome::Foreign => assert!(address != STAKING && address != TOKEN),
        LogOutcome::Unknown(raw) | LogOutcome::Failed(raw, _) => {
            assert!(raw.decoded.is_none());
            assert_eq!(raw.block_height, log.block_height);
        }
        LogOutcome::Decoded(raw) => {
            assert!(raw.decoded.is_some());
            assert_eq!(raw.log_index, log.log_index);
        }
    }
});
