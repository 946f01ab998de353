// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic values walked by the descriptors.
//!
//! [`Value`] carries a total order (floats compare by `total_cmp`) so any
//! value can key a dictionary or live in a set, and structural equality is
//! the equality used for round-trip checks.

use crate::error::{CodecError, Result};
use crate::types::{GenericKind, PrimitiveKind, TypeInfo, TypeShape};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

/// A dynamic value that can hold an instance of any supported type.
#[derive(Debug, Clone)]
pub enum Value {
    Null,

    // Primitives
    Bool(bool),
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
    Char(char),
    String(String),
    Bytes(Vec<u8>),

    /// Enum stored as its underlying integer.
    Enum(i64),

    // Containers
    Array(ArrayValue),
    List(Vec<Value>),
    Queue(VecDeque<Value>),
    /// Last element is the top of the stack.
    Stack(Vec<Value>),
    Set(BTreeSet<Value>),
    Dict(BTreeMap<Value, Value>),

    // Composites
    Object(ObjectValue),
}

/// Row-major array of rank 1..=3.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ArrayValue {
    dims: Vec<usize>,
    items: Vec<Value>,
}

impl ArrayValue {
    /// One-dimensional array.
    pub fn vector(items: Vec<Value>) -> Self {
        Self {
            dims: vec![items.len()],
            items,
        }
    }

    /// Array with explicit bounds; `items.len()` must equal the product of `dims`.
    pub fn new(dims: Vec<usize>, items: Vec<Value>) -> Result<Self> {
        let expected: usize = dims.iter().product();
        if dims.is_empty() || expected != items.len() {
            return Err(CodecError::mismatch(
                format!("{} items for bounds {:?}", expected, dims),
                format!("{} items", items.len()),
            ));
        }
        Ok(Self { dims, items })
    }

    /// Array of the given bounds with every slot set to `fill`.
    pub fn filled(dims: Vec<usize>, fill: Value) -> Self {
        let count = dims.iter().product();
        Self {
            dims,
            items: vec![fill; count],
        }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub(crate) fn items_mut(&mut self) -> &mut [Value] {
        &mut self.items
    }

    /// Element at a multi-dimensional index.
    pub fn get(&self, index: &[usize]) -> Option<&Value> {
        if index.len() != self.dims.len() {
            return None;
        }
        let mut flat = 0;
        for (i, (&idx, &dim)) in index.iter().zip(&self.dims).enumerate() {
            if idx >= dim {
                return None;
            }
            flat = if i == 0 { idx } else { flat * dim + idx };
        }
        self.items.get(flat)
    }
}

/// Instance of a member-based type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ObjectValue {
    type_name: Arc<str>,
    fields: BTreeMap<String, Value>,
    /// Entries of the built-in collection this type derives from.
    base: Option<Box<Value>>,
}

impl ObjectValue {
    pub fn new(type_name: impl Into<Arc<str>>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
            base: None,
        }
    }

    /// Builder-style field assignment.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Builder-style base collection assignment.
    pub fn with_base(mut self, base: Value) -> Self {
        self.base = Some(Box::new(base));
        self
    }

    /// Runtime type name (the polymorphism tag).
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields.get_mut(name)
    }

    /// Set a field, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(name.into(), value)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn base(&self) -> Option<&Value> {
        self.base.as_deref()
    }

    pub fn base_mut(&mut self) -> Option<&mut Value> {
        self.base.as_deref_mut()
    }

    pub fn set_base(&mut self, base: Value) {
        self.base = Some(Box::new(base));
    }
}

impl Value {
    fn variant_index(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::U8(_) => 2,
            Self::I8(_) => 3,
            Self::U16(_) => 4,
            Self::I16(_) => 5,
            Self::U32(_) => 6,
            Self::I32(_) => 7,
            Self::U64(_) => 8,
            Self::I64(_) => 9,
            Self::F32(_) => 10,
            Self::F64(_) => 11,
            Self::Char(_) => 12,
            Self::String(_) => 13,
            Self::Bytes(_) => 14,
            Self::Enum(_) => 15,
            Self::Array(_) => 16,
            Self::List(_) => 17,
            Self::Queue(_) => 18,
            Self::Stack(_) => 19,
            Self::Set(_) => 20,
            Self::Dict(_) => 21,
            Self::Object(_) => 22,
        }
    }

    /// Short human-readable kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Enum(_) => "enum",
            Self::Array(_) => "array",
            Self::List(_) => "list",
            Self::Queue(_) => "queue",
            Self::Stack(_) => "stack",
            Self::Set(_) => "set",
            Self::Dict(_) => "dictionary",
            Self::Object(_) => "object",
            other => other.primitive_kind().map_or("value", PrimitiveKind::name),
        }
    }

    /// Primitive kind of a leaf value.
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        Some(match self {
            Self::Bool(_) => PrimitiveKind::Bool,
            Self::U8(_) => PrimitiveKind::U8,
            Self::I8(_) => PrimitiveKind::I8,
            Self::U16(_) => PrimitiveKind::U16,
            Self::I16(_) => PrimitiveKind::I16,
            Self::U32(_) => PrimitiveKind::U32,
            Self::I32(_) => PrimitiveKind::I32,
            Self::U64(_) => PrimitiveKind::U64,
            Self::I64(_) => PrimitiveKind::I64,
            Self::F32(_) => PrimitiveKind::F32,
            Self::F64(_) => PrimitiveKind::F64,
            Self::Char(_) => PrimitiveKind::Char,
            Self::String(_) => PrimitiveKind::String,
            Self::Bytes(_) => PrimitiveKind::Bytes,
            _ => return None,
        })
    }

    /// Name of the concrete runtime type, when the value itself carries it.
    pub fn runtime_type_name(&self) -> Option<&str> {
        match self {
            Self::Object(obj) => Some(obj.type_name()),
            other => other.primitive_kind().map(PrimitiveKind::name),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::I32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I64(v) | Self::Enum(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut ObjectValue> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            Self::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Field of an object value.
    pub fn get_field(&self, name: &str) -> Option<&Value> {
        self.as_object().and_then(|obj| obj.get(name))
    }

    /// Number of elements held by a container value.
    pub fn container_len(&self) -> Option<usize> {
        Some(match self {
            Self::Array(a) => a.len(),
            Self::List(v) | Self::Stack(v) => v.len(),
            Self::Queue(q) => q.len(),
            Self::Set(s) => s.len(),
            Self::Dict(d) => d.len(),
            _ => return None,
        })
    }

    /// Default state of a slot of type `ty`.
    ///
    /// Value types get their zero state (value composites recursively),
    /// everything nullable starts as `Null`.
    pub fn default_for(ty: &TypeInfo) -> Value {
        match ty.shape() {
            TypeShape::Primitive(kind) => Self::zero(*kind),
            TypeShape::Enum(_) => Self::Enum(0),
            TypeShape::Composite(c) if c.value_type => Self::new_instance(ty),
            _ => Self::Null,
        }
    }

    /// Instance produced by the type's parameterless constructor.
    pub fn new_instance(ty: &TypeInfo) -> Value {
        match ty.shape() {
            TypeShape::Composite(c) => {
                let mut obj = ObjectValue::new(ty.name_arc().clone());
                for member in &c.members {
                    if member.ty.name() == ty.name() {
                        obj.set(member.name.clone(), Self::Null);
                    } else {
                        obj.set(member.name.clone(), Self::default_for(&member.ty));
                    }
                }
                if let Some(base) = &c.base {
                    if let Some(empty) = Self::empty_collection(base) {
                        obj.set_base(empty);
                    }
                }
                Self::Object(obj)
            }
            _ => Self::default_for(ty),
        }
    }

    /// Empty container of a collection type.
    pub fn empty_collection(ty: &TypeInfo) -> Option<Value> {
        match ty.shape() {
            TypeShape::Array { rank, .. } => Some(Self::Array(ArrayValue {
                dims: vec![0; *rank],
                items: Vec::new(),
            })),
            TypeShape::Generic { definition, .. } => match definition {
                GenericKind::List => Some(Self::List(Vec::new())),
                GenericKind::Queue => Some(Self::Queue(VecDeque::new())),
                GenericKind::Stack => Some(Self::Stack(Vec::new())),
                GenericKind::HashSet => Some(Self::Set(BTreeSet::new())),
                GenericKind::Dictionary => Some(Self::Dict(BTreeMap::new())),
                GenericKind::Other(_) => None,
            },
            _ => None,
        }
    }

    fn zero(kind: PrimitiveKind) -> Value {
        match kind {
            PrimitiveKind::Bool => Self::Bool(false),
            PrimitiveKind::U8 => Self::U8(0),
            PrimitiveKind::I8 => Self::I8(0),
            PrimitiveKind::U16 => Self::U16(0),
            PrimitiveKind::I16 => Self::I16(0),
            PrimitiveKind::U32 => Self::U32(0),
            PrimitiveKind::I32 => Self::I32(0),
            PrimitiveKind::U64 => Self::U64(0),
            PrimitiveKind::I64 => Self::I64(0),
            PrimitiveKind::F32 => Self::F32(0.0),
            PrimitiveKind::F64 => Self::F64(0.0),
            PrimitiveKind::Char => Self::Char('\0'),
            PrimitiveKind::String | PrimitiveKind::Bytes => Self::Null,
        }
    }

    /// Merge `other` into this container using its native insertion
    /// operation (add / enqueue / push / add-to-set / insert).
    pub fn merge_from(&mut self, other: Value) -> Result<()> {
        match (self, other) {
            (Self::List(dst), Self::List(src)) => dst.extend(src),
            (Self::Queue(dst), Self::Queue(src)) => dst.extend(src),
            (Self::Stack(dst), Self::Stack(src)) => dst.extend(src),
            (Self::Set(dst), Self::Set(src)) => dst.extend(src),
            (Self::Dict(dst), Self::Dict(src)) => dst.extend(src),
            (_, Self::Null) => {}
            (dst, src) => {
                return Err(CodecError::mismatch(dst.kind_name(), src.kind_name()));
            }
        }
        Ok(())
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::U8(a), Self::U8(b)) => a.cmp(b),
            (Self::I8(a), Self::I8(b)) => a.cmp(b),
            (Self::U16(a), Self::U16(b)) => a.cmp(b),
            (Self::I16(a), Self::I16(b)) => a.cmp(b),
            (Self::U32(a), Self::U32(b)) => a.cmp(b),
            (Self::I32(a), Self::I32(b)) => a.cmp(b),
            (Self::U64(a), Self::U64(b)) => a.cmp(b),
            (Self::I64(a), Self::I64(b)) => a.cmp(b),
            (Self::F32(a), Self::F32(b)) => a.total_cmp(b),
            (Self::F64(a), Self::F64(b)) => a.total_cmp(b),
            (Self::Char(a), Self::Char(b)) => a.cmp(b),
            (Self::String(a), Self::String(b)) => a.cmp(b),
            (Self::Bytes(a), Self::Bytes(b)) => a.cmp(b),
            (Self::Enum(a), Self::Enum(b)) => a.cmp(b),
            (Self::Array(a), Self::Array(b)) => a.cmp(b),
            (Self::List(a), Self::List(b)) => a.cmp(b),
            (Self::Queue(a), Self::Queue(b)) => a.cmp(b),
            (Self::Stack(a), Self::Stack(b)) => a.cmp(b),
            (Self::Set(a), Self::Set(b)) => a.cmp(b),
            (Self::Dict(a), Self::Dict(b)) => a.cmp(b),
            (Self::Object(a), Self::Object(b)) => a.cmp(b),
            (a, b) => a.variant_index().cmp(&b.variant_index()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

macro_rules! impl_from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_primitive!(
    bool => Bool,
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    u64 => U64,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    char => Char,
    String => String,
    Vec<u8> => Bytes,
    ArrayValue => Array,
    ObjectValue => Object,
);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CompositeBuilder;

    #[test]
    fn test_float_values_have_total_order() {
        assert_eq!(Value::F64(f64::NAN), Value::F64(f64::NAN));
        assert!(Value::F32(1.0) < Value::F32(2.0));

        let mut set = BTreeSet::new();
        set.insert(Value::F64(0.5));
        set.insert(Value::F64(0.5));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_different_kinds_never_equal() {
        assert_ne!(Value::I32(1), Value::I64(1));
        assert_ne!(Value::List(vec![]), Value::Stack(vec![]));
        assert_ne!(Value::Null, Value::String(String::new()));
    }

    #[test]
    fn test_array_indexing() {
        let arr = ArrayValue::new(
            vec![2, 3],
            (0..6).map(Value::I32).collect(),
        )
        .expect("bounds");
        assert_eq!(arr.rank(), 2);
        assert_eq!(arr.get(&[0, 2]), Some(&Value::I32(2)));
        assert_eq!(arr.get(&[1, 0]), Some(&Value::I32(3)));
        assert_eq!(arr.get(&[2, 0]), None);
        assert_eq!(arr.get(&[1]), None);
        assert!(ArrayValue::new(vec![2, 2], vec![Value::I32(1)]).is_err());
    }

    #[test]
    fn test_new_instance_uses_member_defaults() {
        let vec2 = CompositeBuilder::value_type("Vec2")
            .field("x", PrimitiveKind::F32)
            .field("y", PrimitiveKind::F32)
            .build();
        let unit = CompositeBuilder::class("Unit")
            .field("name", PrimitiveKind::String)
            .field("level", PrimitiveKind::U16)
            .member("pos", vec2)
            .build();

        let instance = Value::new_instance(&unit);
        let obj = instance.as_object().expect("object");
        assert_eq!(obj.type_name(), "Unit");
        assert_eq!(obj.get("name"), Some(&Value::Null));
        assert_eq!(obj.get("level"), Some(&Value::U16(0)));
        assert_eq!(
            obj.get("pos").and_then(|p| p.get_field("x")),
            Some(&Value::F32(0.0))
        );
        assert!(Value::default_for(&unit).is_null());
    }

    #[test]
    fn test_merge_uses_native_insertion() {
        let mut dict = Value::Dict(BTreeMap::from([(Value::from("a"), Value::I32(1))]));
        dict.merge_from(Value::Dict(BTreeMap::from([
            (Value::from("a"), Value::I32(9)),
            (Value::from("b"), Value::I32(2)),
        ])))
        .expect("merge");
        assert_eq!(dict.container_len(), Some(2));

        let mut stack = Value::Stack(vec![Value::I32(1)]);
        stack
            .merge_from(Value::Stack(vec![Value::I32(2), Value::I32(3)]))
            .expect("merge");
        assert_eq!(
            stack,
            Value::Stack(vec![Value::I32(1), Value::I32(2), Value::I32(3)])
        );

        let mut list = Value::List(vec![]);
        assert!(list.merge_from(Value::Set(BTreeSet::new())).is_err());
    }
}
