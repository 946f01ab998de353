// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bridge between static Rust types and the dynamic [`Value`] model.
//!
//! ```
//! use savegraph::persist::Persist;
//! use std::collections::BTreeMap;
//!
//! let scores = BTreeMap::from([("ann".to_string(), 3u32)]);
//! assert_eq!(<BTreeMap<String, u32>>::type_info().name(), "Dictionary<string,uint>");
//! let back = BTreeMap::<String, u32>::from_value(scores.to_value()).unwrap();
//! assert_eq!(back, scores);
//! ```

use crate::error::{CodecError, Result};
use crate::types::{PrimitiveKind, TypeInfo, TypeRef};
use crate::value::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;

/// A Rust type with a registry-visible shape.
pub trait Persist: Sized {
    /// Declared type used for lookups and type checking.
    fn type_info() -> TypeRef;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self>;
}

fn mismatch<T: Persist>(found: &Value) -> CodecError {
    CodecError::mismatch(T::type_info().name(), found.kind_name())
}

macro_rules! impl_persist_primitive {
    ($($ty:ty => $variant:ident / $kind:ident),* $(,)?) => {
        $(
            impl Persist for $ty {
                fn type_info() -> TypeRef {
                    TypeInfo::primitive(PrimitiveKind::$kind)
                }

                fn to_value(&self) -> Value {
                    Value::$variant(self.clone())
                }

                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(mismatch::<Self>(&other)),
                    }
                }
            }
        )*
    };
}

impl_persist_primitive!(
    bool => Bool / Bool,
    u8 => U8 / U8,
    i8 => I8 / I8,
    u16 => U16 / U16,
    i16 => I16 / I16,
    u32 => U32 / U32,
    i32 => I32 / I32,
    u64 => U64 / U64,
    i64 => I64 / I64,
    f32 => F32 / F32,
    f64 => F64 / F64,
    char => Char / Char,
    String => String / String,
);

impl<T: Persist> Persist for Option<T> {
    fn type_info() -> TypeRef {
        T::type_info()
    }

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: Persist> Persist for Vec<T> {
    fn type_info() -> TypeRef {
        TypeInfo::list(T::type_info())
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(Persist::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl<T: Persist> Persist for VecDeque<T> {
    fn type_info() -> TypeRef {
        TypeInfo::queue(T::type_info())
    }

    fn to_value(&self) -> Value {
        Value::Queue(self.iter().map(Persist::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Queue(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl<T: Persist + Ord> Persist for BTreeSet<T> {
    fn type_info() -> TypeRef {
        TypeInfo::hash_set(T::type_info())
    }

    fn to_value(&self) -> Value {
        Value::Set(self.iter().map(Persist::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Set(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl<T: Persist + Eq + Hash> Persist for HashSet<T> {
    fn type_info() -> TypeRef {
        TypeInfo::hash_set(T::type_info())
    }

    fn to_value(&self) -> Value {
        Value::Set(self.iter().map(Persist::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Set(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl<K: Persist + Ord, V: Persist> Persist for BTreeMap<K, V> {
    fn type_info() -> TypeRef {
        TypeInfo::dictionary(K::type_info(), V::type_info())
    }

    fn to_value(&self) -> Value {
        Value::Dict(
            self.iter()
                .map(|(k, v)| (k.to_value(), v.to_value()))
                .collect(),
        )
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Dict(entries) => entries
                .into_iter()
                .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl<K: Persist + Eq + Hash, V: Persist> Persist for HashMap<K, V> {
    fn type_info() -> TypeRef {
        TypeInfo::dictionary(K::type_info(), V::type_info())
    }

    fn to_value(&self) -> Value {
        Value::Dict(
            self.iter()
                .map(|(k, v)| (k.to_value(), v.to_value()))
                .collect(),
        )
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Dict(entries) => entries
                .into_iter()
                .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(<Vec<i32>>::type_info().name(), "List<int>");
        assert_eq!(<VecDeque<String>>::type_info().name(), "Queue<string>");
        assert_eq!(<HashSet<u8>>::type_info().name(), "HashSet<byte>");
        assert_eq!(
            <HashMap<String, Vec<f64>>>::type_info().name(),
            "Dictionary<string,List<double>>"
        );
        assert_eq!(<Option<String>>::type_info().name(), "string");
    }

    #[test]
    fn test_value_conversion() {
        let map: HashMap<String, Vec<u16>> =
            HashMap::from([("a".to_string(), vec![1, 2]), ("b".to_string(), vec![])]);
        assert_eq!(
            HashMap::<String, Vec<u16>>::from_value(map.to_value()).expect("map"),
            map
        );

        let none: Option<String> = None;
        assert_eq!(none.to_value(), Value::Null);
        assert_eq!(Option::<String>::from_value(Value::Null).expect("none"), None);
    }

    #[test]
    fn test_mismatch() {
        let err = Vec::<i32>::from_value(Value::I32(1)).expect_err("mismatch");
        assert!(matches!(err, CodecError::TypeMismatch { .. }));
        let err = Vec::<i32>::from_value(Value::List(vec![Value::from("x")])).expect_err("elem");
        assert!(matches!(err, CodecError::TypeMismatch { .. }));
    }
}
