#![no_main]

use libfuzzer_sys::fuzz_target;
use stakescan_decoder::rules::decode_event;
use stakescan_decoder::signatures::topic0;
use stakescan_types::{EventKind, H256};

// The right signature topic followed by arbitrary indexed topics and data
// for every known event kind. Decoding may fail but must never panic.
fuzz_target!(|input: (u8, Vec<[u8; 32]>, Vec<u8>)| {
    let (selector, topics, data) = input;
    let kind = EventKind::ALL[selector as usize % EventKind::ALL.len()];
    let topics: Vec<H256> = std::iter::once(topic0(kind))
        .chain(topics.into_iter().take(3).map(H256::new))
        .collect();
    let _ = decode_event(kind, &topics, &data);
});
