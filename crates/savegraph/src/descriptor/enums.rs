// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Enumerations, written as their underlying integer.

use super::{null_for_value_type, Descriptor, DescriptorKind};
use crate::error::{CodecError, Result};
use crate::protocol::{ReadContext, WriteContext};
use crate::types::{PrimitiveKind, TypeRef, TypeShape};
use crate::value::Value;

#[derive(Debug)]
pub struct EnumDescriptor {
    ty: TypeRef,
    underlying: PrimitiveKind,
}

impl EnumDescriptor {
    /// Returns `None` when `ty` is not an enumeration.
    pub fn new(ty: TypeRef) -> Option<Self> {
        let underlying = match ty.shape() {
            TypeShape::Enum(shape) => shape.underlying,
            _ => return None,
        };
        Some(Self { ty, underlying })
    }

    pub fn underlying(&self) -> PrimitiveKind {
        self.underlying
    }
}

/// Narrow `value` to the underlying integer kind.
fn to_underlying(kind: PrimitiveKind, value: i64) -> Option<Value> {
    Some(match kind {
        PrimitiveKind::U8 => Value::U8(u8::try_from(value).ok()?),
        PrimitiveKind::I8 => Value::I8(i8::try_from(value).ok()?),
        PrimitiveKind::U16 => Value::U16(u16::try_from(value).ok()?),
        PrimitiveKind::I16 => Value::I16(i16::try_from(value).ok()?),
        PrimitiveKind::U32 => Value::U32(u32::try_from(value).ok()?),
        PrimitiveKind::I32 => Value::I32(i32::try_from(value).ok()?),
        PrimitiveKind::U64 => Value::U64(u64::try_from(value).ok()?),
        PrimitiveKind::I64 => Value::I64(value),
        _ => return None,
    })
}

fn from_underlying(value: &Value) -> Option<i64> {
    match *value {
        Value::U8(v) => Some(i64::from(v)),
        Value::I8(v) => Some(i64::from(v)),
        Value::U16(v) => Some(i64::from(v)),
        Value::I16(v) => Some(i64::from(v)),
        Value::U32(v) => Some(i64::from(v)),
        Value::I32(v) => Some(i64::from(v)),
        Value::U64(v) => i64::try_from(v).ok(),
        Value::I64(v) => Some(v),
        _ => None,
    }
}

impl Descriptor for EnumDescriptor {
    fn type_ref(&self) -> &TypeRef {
        &self.ty
    }

    fn kind(&self) -> DescriptorKind {
        DescriptorKind::Enum
    }

    fn write(&self, value: &Value, ctx: &mut WriteContext<'_>) -> Result<()> {
        let raw = match value {
            Value::Enum(raw) => *raw,
            Value::Null => return Err(null_for_value_type(&self.ty)),
            other => return Err(CodecError::mismatch(self.ty.name(), other.kind_name())),
        };
        let encoded = to_underlying(self.underlying, raw).ok_or_else(|| {
            CodecError::mismatch(
                format!("{} value fitting {}", self.ty.name(), self.underlying),
                raw.to_string(),
            )
        })?;
        ctx.writer().write_primitive(&encoded)
    }

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<Value> {
        let raw = ctx.reader().read_primitive(self.underlying)?;
        if raw.is_null() {
            return Err(null_for_value_type(&self.ty));
        }
        from_underlying(&raw)
            .map(Value::Enum)
            .ok_or_else(|| CodecError::mismatch(self.underlying.name(), raw.kind_name()))
    }
}
