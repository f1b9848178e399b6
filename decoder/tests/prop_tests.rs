use proptest::prelude::*;

use stakescan_chain::Log;
use stakescan_decoder::decoder::LogOutcome;
use stakescan_decoder::{ContractAddresses, EventDecoder};
use stakescan_types::{Address, EventKind, Timestamp, TxHash, H256};

const TOKEN: Address = Address::new([0x70; 20]);
const STAKING: Address = Address::new([0x51; 20]);

fn decoder() -> EventDecoder {
    EventDecoder::new(ContractAddresses {
        staking: STAKING,
        token: TOKEN,
    })
}

fn arb_topic() -> impl Strategy<Value = H256> {
    prop_oneof![
        any::<[u8; 32]>().prop_map(H256::new),
        prop::sample::select(EventKind::ALL.to_vec())
            .prop_map(|k| H256::keccak(k.signature().as_bytes())),
        any::<[u8; 20]>().prop_map(|b| Address::new(b).to_word()),
    ]
}

proptest! {
    #[test]
    fn decoding_never_panics_and_keeps_known_logs(
        on_token in any::<bool>(),
        topics in prop::collection::vec(arb_topic(), 0..5),
        data in prop::collection::vec(any::<u8>(), 0..200),
    ) {
        let log = Log {
            address: if on_token { TOKEN } else { STAKING },
            topics,
            data,
            block_height: 1,
            tx_hash: TxHash::ZERO,
            tx_index: 0,
            log_index: 0,
        };
        let block = decoder().decode_block(std::slice::from_ref(&log), Timestamp::EPOCH);
        prop_assert_eq!(block.events.len(), 1);
        prop_assert_eq!(block.foreign, 0);
        let event = &block.events[0];
        if let Some(decoded) = &event.decoded {
            prop_assert_eq!(decoded.name(), event.event_name.as_str());
            prop_assert_eq!(decoded.kind().family(), event.family);
        }
    }

    #[test]
    fn foreign_addresses_are_dropped(address in any::<[u8; 20]>()) {
        let address = Address::new(address);
        prop_assume!(address != TOKEN && address != STAKING);
        let log = Log {
            address,
            topics: vec![H256::keccak(b"Transfer(address,address,uint256)")],
            data: Vec::new(),
            block_height: 1,
            tx_hash: TxHash::ZERO,
            tx_index: 0,
            log_index: 0,
        };
        prop_assert!(matches!(decoder().decode_log(&log, Timestamp::EPOCH), LogOutcome::Foreign));
    }
}
