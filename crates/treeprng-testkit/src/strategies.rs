//! Property test strategies for treeprng keys
//!
//! Strategies generate every key variant the canonicalizer normalizes,
//! including the same number in several widths, so properties can check
//! that representation never leaks into the hash.

use num_bigint::BigInt;
use proptest::prelude::*;

// Re-export proptest for convenience
pub use proptest;

use treeprng::Key;

/// Strategy for integers, spread across every representation of the value
///
/// The same logical number may come out as `Int`, `BigInt` or an integral
/// `Float` (when it is exactly representable).
pub fn arb_integer_key() -> impl Strategy<Value = Key> {
    prop_oneof![
        any::<i64>().prop_map(Key::Int),
        any::<i64>().prop_map(|v| Key::BigInt(BigInt::from(v))),
        any::<i128>().prop_map(|v| Key::BigInt(BigInt::from(v))),
        (-(1i64 << 53)..(1i64 << 53)).prop_map(|v| Key::Float(v as f64)),
    ]
}

/// Strategy for leaf keys (no sequences)
pub fn arb_scalar_key() -> impl Strategy<Value = Key> {
    prop_oneof![
        Just(Key::None),
        any::<bool>().prop_map(Key::Bool),
        arb_integer_key(),
        any::<f64>().prop_map(Key::Float),
        "[a-z]{0,8}".prop_map(Key::Str),
        prop::collection::vec(any::<u8>(), 0..8).prop_map(Key::Bytes),
    ]
}

/// Strategy for arbitrary nested keys, lists and tuples included
pub fn arb_key() -> impl Strategy<Value = Key> {
    arb_scalar_key().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Key::List),
            prop::collection::vec(inner, 0..4).prop_map(Key::Tuple),
        ]
    })
}

/// Strategy for key paths from the root
pub fn arb_key_path() -> impl Strategy<Value = Vec<Key>> {
    prop::collection::vec(arb_key(), 1..5)
}

/// Strategy for an integer value paired with two of its representations
pub fn arb_equal_integer_pair() -> impl Strategy<Value = (Key, Key)> {
    (-(1i64 << 53)..(1i64 << 53)).prop_flat_map(|v| {
        let forms = vec![
            Key::Int(v),
            Key::BigInt(BigInt::from(v)),
            Key::Float(v as f64),
        ];
        (prop::sample::select(forms.clone()), prop::sample::select(forms))
    })
}
