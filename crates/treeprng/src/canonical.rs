//! Canonical key encoding
//!
//! Keys are normalized so that equal numbers share one representation, then
//! written in a fixed, versioned byte layout. The layout is this crate's own
//! stable contract and the only thing hashed when a path is extended.
//!
//! Normalization rules:
//! - a finite float with no fractional part becomes an integer (`-0.0` is `0`)
//! - an integer that fits in `i64` is stored as [`Key::Int`], wider ones as [`Key::BigInt`]
//! - lists and tuples are normalized element-wise and keep their flavor
//! - bytes, maps, strings and the remaining scalars pass through unmodified
//!
//! Layout (v1): one version byte, then a self-delimiting tagged value.
//!
//! | tag    | value   | payload                                              |
//! |--------|---------|------------------------------------------------------|
//! | `0x00` | none    |                                                      |
//! | `0x01` | false   |                                                      |
//! | `0x02` | true    |                                                      |
//! | `0x03` | integer | u64 BE length, minimal two's-complement BE bytes      |
//! | `0x04` | float   | 8 bytes, BE IEEE-754 bits, one canonical NaN          |
//! | `0x05` | string  | u64 BE length, UTF-8 bytes                            |
//! | `0x06` | bytes   | u64 BE length, raw bytes                              |
//! | `0x07` | list    | u64 BE count, items                                   |
//! | `0x08` | tuple   | u64 BE count, items                                   |
//! | `0x09` | map     | u64 BE count, key then value per entry                |

use std::borrow::Cow;

use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive};

use crate::key::Key;

/// Version byte that prefixes every canonical encoding
pub const ENCODING_VERSION: u8 = 1;

const TAG_NONE: u8 = 0x00;
const TAG_FALSE: u8 = 0x01;
const TAG_TRUE: u8 = 0x02;
const TAG_INT: u8 = 0x03;
const TAG_FLOAT: u8 = 0x04;
const TAG_STR: u8 = 0x05;
const TAG_BYTES: u8 = 0x06;
const TAG_LIST: u8 = 0x07;
const TAG_TUPLE: u8 = 0x08;
const TAG_MAP: u8 = 0x09;

// 2^63, exactly representable as f64
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Normalize a key so that logically equal keys are structurally equal
///
/// Returns the input borrowed when it is already canonical, so
/// `canonicalize(&canonicalize(k)) == canonicalize(k)` and the second call
/// never allocates.
pub fn canonicalize(key: &Key) -> Cow<'_, Key> {
    match key {
        Key::Float(value) => match integral_float(*value) {
            Some(int) => Cow::Owned(int),
            None => Cow::Borrowed(key),
        },
        Key::BigInt(value) => match value.to_i64() {
            Some(int) => Cow::Owned(Key::Int(int)),
            None => Cow::Borrowed(key),
        },
        Key::List(items) => match normalize_items(items) {
            Some(items) => Cow::Owned(Key::List(items)),
            None => Cow::Borrowed(key),
        },
        Key::Tuple(items) => match normalize_items(items) {
            Some(items) => Cow::Owned(Key::Tuple(items)),
            None => Cow::Borrowed(key),
        },
        _ => Cow::Borrowed(key),
    }
}

/// Canonical byte encoding of a key, version byte included
pub fn canonical_bytes(key: &Key) -> Vec<u8> {
    let key = canonicalize(key);
    let mut out = Vec::with_capacity(16);
    out.push(ENCODING_VERSION);
    write_key(&key, &mut out);
    out
}

/// Rebuild a sequence from the first element whose normal form differs.
///
/// Everything before that element is reused as is; everything from it on is
/// normalized. `None` means the sequence was already canonical.
fn normalize_items(items: &[Key]) -> Option<Vec<Key>> {
    for (idx, item) in items.iter().enumerate() {
        if let Cow::Owned(first) = canonicalize(item) {
            let mut rebuilt = Vec::with_capacity(items.len());
            rebuilt.extend_from_slice(&items[..idx]);
            rebuilt.push(first);
            rebuilt.extend(
                items[idx + 1..]
                    .iter()
                    .map(|rest| canonicalize(rest).into_owned()),
            );
            return Some(rebuilt);
        }
    }
    None
}

fn integral_float(value: f64) -> Option<Key> {
    if !value.is_finite() || value.fract() != 0.0 {
        return None;
    }
    if (-I64_BOUND..I64_BOUND).contains(&value) {
        Some(Key::Int(value as i64))
    } else {
        BigInt::from_f64(value).map(Key::BigInt)
    }
}

fn write_key(key: &Key, out: &mut Vec<u8>) {
    match key {
        Key::None => out.push(TAG_NONE),
        Key::Bool(false) => out.push(TAG_FALSE),
        Key::Bool(true) => out.push(TAG_TRUE),
        Key::Int(value) => write_int(&BigInt::from(*value), out),
        Key::BigInt(value) => write_int(value, out),
        Key::Float(value) => {
            let bits = if value.is_nan() {
                f64::NAN.to_bits()
            } else {
                value.to_bits()
            };
            out.push(TAG_FLOAT);
            out.extend_from_slice(&bits.to_be_bytes());
        }
        Key::Str(value) => {
            out.push(TAG_STR);
            write_len(value.len(), out);
            out.extend_from_slice(value.as_bytes());
        }
        Key::Bytes(value) => {
            out.push(TAG_BYTES);
            write_len(value.len(), out);
            out.extend_from_slice(value);
        }
        Key::List(items) => write_items(TAG_LIST, items, out),
        Key::Tuple(items) => write_items(TAG_TUPLE, items, out),
        Key::Map(entries) => {
            out.push(TAG_MAP);
            write_len(entries.len(), out);
            for (entry_key, entry_value) in entries {
                write_key(entry_key, out);
                write_key(entry_value, out);
            }
        }
    }
}

fn write_int(value: &BigInt, out: &mut Vec<u8>) {
    let bytes = value.to_signed_bytes_be();
    out.push(TAG_INT);
    write_len(bytes.len(), out);
    out.extend_from_slice(&bytes);
}

fn write_items(tag: u8, items: &[Key], out: &mut Vec<u8>) {
    out.push(tag);
    write_len(items.len(), out);
    for item in items {
        write_key(item, out);
    }
}

fn write_len(len: usize, out: &mut Vec<u8>) {
    out.extend_from_slice(&(len as u64).to_be_bytes());
}
