//! Key values that address nodes in the tree
//!
//! A [`Key`] is one path component. Children are addressed by the canonical
//! encoding of a key, not by its representation: `Key::Float(3.0)`, `Key::Int(3)`
//! and `Key::BigInt(3.into())` all address the same child.

use num_bigint::{BigInt, BigUint};
use serde::{Deserialize, Serialize};

/// One component of a node address
///
/// The serde representation is externally tagged so that the two sequence
/// flavors, and the integer widths, survive a round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    /// The unit key
    #[default]
    None,
    /// A boolean
    Bool(bool),
    /// A fixed-width integer
    Int(i64),
    /// An integer of any width
    BigInt(BigInt),
    /// A floating point number
    Float(f64),
    /// A UTF-8 string
    Str(String),
    /// Raw bytes, encoded verbatim
    Bytes(Vec<u8>),
    /// Variable-arity ordered sequence
    List(Vec<Key>),
    /// Fixed-arity ordered sequence, encoded distinctly from [`Key::List`]
    Tuple(Vec<Key>),
    /// Key/value pairs in the order given
    ///
    /// Entries are neither sorted nor normalized; callers that want `{1: x}`
    /// and `{1.0: x}` to match must normalize the entries themselves.
    Map(Vec<(Key, Key)>),
}

impl Key {
    /// Build a tuple key from anything that converts into keys
    pub fn tuple<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Key>,
    {
        Key::Tuple(items.into_iter().map(Into::into).collect())
    }

    /// Build a list key from anything that converts into keys
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Key>,
    {
        Key::List(items.into_iter().map(Into::into).collect())
    }

    /// Short name of the variant, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Key::None => "none",
            Key::Bool(_) => "bool",
            Key::Int(_) => "int",
            Key::BigInt(_) => "bigint",
            Key::Float(_) => "float",
            Key::Str(_) => "str",
            Key::Bytes(_) => "bytes",
            Key::List(_) => "list",
            Key::Tuple(_) => "tuple",
            Key::Map(_) => "map",
        }
    }
}

macro_rules! key_from_narrow_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Key {
                fn from(value: $ty) -> Self {
                    Key::Int(i64::from(value))
                }
            }
        )*
    };
}

macro_rules! key_from_wide_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Key {
                fn from(value: $ty) -> Self {
                    Key::BigInt(BigInt::from(value))
                }
            }
        )*
    };
}

key_from_narrow_int!(i8, i16, i32, i64, u8, u16, u32);
key_from_wide_int!(u64, i128, u128, usize, isize);

impl From<BigInt> for Key {
    fn from(value: BigInt) -> Self {
        Key::BigInt(value)
    }
}

impl From<BigUint> for Key {
    fn from(value: BigUint) -> Self {
        Key::BigInt(BigInt::from(value))
    }
}

impl From<f64> for Key {
    fn from(value: f64) -> Self {
        Key::Float(value)
    }
}

impl From<f32> for Key {
    fn from(value: f32) -> Self {
        Key::Float(f64::from(value))
    }
}

impl From<bool> for Key {
    fn from(value: bool) -> Self {
        Key::Bool(value)
    }
}

impl From<()> for Key {
    fn from(_: ()) -> Self {
        Key::None
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(value.to_owned())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(value)
    }
}

impl From<&String> for Key {
    fn from(value: &String) -> Self {
        Key::Str(value.clone())
    }
}

impl From<&Key> for Key {
    fn from(value: &Key) -> Self {
        value.clone()
    }
}

impl<T: Into<Key>> From<Option<T>> for Key {
    fn from(value: Option<T>) -> Self {
        value.map_or(Key::None, Into::into)
    }
}

impl<T: Into<Key>> From<Vec<T>> for Key {
    fn from(value: Vec<T>) -> Self {
        Key::list(value)
    }
}

impl<T: Into<Key> + Clone> From<&[T]> for Key {
    fn from(value: &[T]) -> Self {
        Key::list(value.iter().cloned())
    }
}

macro_rules! key_from_tuple {
    ($($name:ident),+) => {
        impl<$($name: Into<Key>),+> From<($($name,)+)> for Key {
            #[allow(non_snake_case)]
            fn from(($($name,)+): ($($name,)+)) -> Self {
                Key::Tuple(vec![$($name.into()),+])
            }
        }
    };
}

key_from_tuple!(A);
key_from_tuple!(A, B);
key_from_tuple!(A, B, C);
key_from_tuple!(A, B, C, D);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wide_integers_enter_as_bigint() {
        assert_eq!(Key::from(3u32), Key::Int(3));
        assert_eq!(Key::from(3u64), Key::BigInt(BigInt::from(3)));
        assert_eq!(Key::from(-3i128), Key::BigInt(BigInt::from(-3)));
    }

    #[test]
    fn test_sequence_flavors_stay_distinct() {
        let list = Key::from(vec![1, 2]);
        let tuple = Key::from((1, 2));
        assert_eq!(list, Key::List(vec![Key::Int(1), Key::Int(2)]));
        assert_eq!(tuple, Key::Tuple(vec![Key::Int(1), Key::Int(2)]));
        assert_ne!(list, tuple);
    }

    #[test]
    fn test_option_maps_to_none() {
        assert_eq!(Key::from(None::<i32>), Key::None);
        assert_eq!(Key::from(Some("frodo")), Key::Str("frodo".into()));
    }

    #[test]
    fn test_serde_keeps_variant() {
        let key = Key::tuple(["hobbits", "frodo"]);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, r#"{"tuple":[{"str":"hobbits"},{"str":"frodo"}]}"#);
        let back: Key = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
