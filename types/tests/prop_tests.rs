use proptest::prelude::*;

use stakescan_types::{Address, Amount, Timestamp, H256};

proptest! {
    /// Address hex roundtrip: Display -> from_hex produces the identical address.
    #[test]
    fn address_hex_roundtrip(bytes in prop::array::uniform20(0u8..)) {
        let addr = Address::new(bytes);
        prop_assert_eq!(Address::from_hex(&addr.to_string()).unwrap(), addr);
    }

    /// Address word roundtrip: an address survives ABI left-padding.
    #[test]
    fn address_word_roundtrip(bytes in prop::array::uniform20(0u8..)) {
        let addr = Address::new(bytes);
        prop_assert_eq!(Address::from_word(&addr.to_word()), Some(addr));
    }

    /// H256::is_zero is true only for all-zero bytes.
    #[test]
    fn h256_is_zero_correct(bytes in prop::array::uniform32(0u8..)) {
        let hash = H256::new(bytes);
        prop_assert_eq!(hash.is_zero(), bytes == [0u8; 32]);
    }

    /// The next hour boundary is strictly after the timestamp, on the hour,
    /// and no more than an hour away.
    #[test]
    fn next_hour_boundary_bounds(secs in 0u64..4_000_000_000) {
        let t = Timestamp::new(secs);
        let next = t.next_hour_boundary();
        prop_assert!(next > t);
        prop_assert_eq!(next.as_secs() % 3600, 0);
        prop_assert!(next.as_secs() - secs <= 3600);
    }

    /// Amount subtraction never goes negative: checked_sub fails exactly when
    /// saturating_sub clamps.
    #[test]
    fn amount_sub_consistency(a in any::<u64>(), b in any::<u64>()) {
        let x = Amount::from_u64(a);
        let y = Amount::from_u64(b);
        match x.checked_sub(y) {
            Some(diff) => prop_assert_eq!(diff, x.saturating_sub(y)),
            None => prop_assert_eq!(x.saturating_sub(y), Amount::ZERO),
        }
    }

    /// Amount bincode roundtrip through the fixed-width encoding.
    #[test]
    fn amount_bincode_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let amount = Amount::from_be_bytes(bytes);
        let encoded = bincode::serialize(&amount).unwrap();
        let decoded: Amount = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, amount);
    }
}
