// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Leaf descriptors seeded into every registry.

use super::{null_for_value_type, Descriptor, DescriptorKind};
use crate::error::{CodecError, Result};
use crate::protocol::{ReadContext, WriteContext};
use crate::types::{PrimitiveKind, TypeInfo, TypeRef};
use crate::value::Value;

#[derive(Debug)]
pub struct PrimitiveDescriptor {
    ty: TypeRef,
    kind: PrimitiveKind,
}

impl PrimitiveDescriptor {
    pub fn new(kind: PrimitiveKind) -> Self {
        Self {
            ty: TypeInfo::primitive(kind),
            kind,
        }
    }

    pub fn primitive_kind(&self) -> PrimitiveKind {
        self.kind
    }
}

impl Descriptor for PrimitiveDescriptor {
    fn type_ref(&self) -> &TypeRef {
        &self.ty
    }

    fn kind(&self) -> DescriptorKind {
        DescriptorKind::Primitive
    }

    fn write(&self, value: &Value, ctx: &mut WriteContext<'_>) -> Result<()> {
        if value.is_null() {
            if self.kind.is_nullable() {
                return ctx.writer().write_null();
            }
            return Err(null_for_value_type(&self.ty));
        }
        if value.primitive_kind() != Some(self.kind) {
            return Err(CodecError::mismatch(self.kind.name(), value.kind_name()));
        }
        ctx.writer().write_primitive(value)
    }

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<Value> {
        let value = ctx.reader().read_primitive(self.kind)?;
        if value.is_null() && !self.kind.is_nullable() {
            return Err(null_for_value_type(&self.ty));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::format::tape::{TapeReader, TapeWriter, Token};
    use crate::descriptor::DescriptorRef;
    use crate::registry::Registry;
    use std::sync::Arc;

    #[test]
    fn test_write_checks_kind() {
        let registry = Registry::new();
        let settings = Settings::default();
        let desc: DescriptorRef = Arc::new(PrimitiveDescriptor::new(PrimitiveKind::I32));
        let mut tape = TapeWriter::new();
        let mut ctx = WriteContext::new(&registry, &mut tape, &settings);

        assert!(ctx.write_value(&Value::I32(7), &desc).is_ok());
        assert!(matches!(
            ctx.write_value(&Value::I64(7), &desc),
            Err(CodecError::TypeMismatch { .. })
        ));
        assert!(matches!(
            ctx.write_value(&Value::Null, &desc),
            Err(CodecError::TypeMismatch { .. })
        ));
        assert_eq!(tape.into_tokens(), vec![Token::Primitive(Value::I32(7))]);
    }

    #[test]
    fn test_nullable_string_and_read_into_unsupported() {
        let registry = Registry::new();
        let settings = Settings::default();
        let desc: DescriptorRef = Arc::new(PrimitiveDescriptor::new(PrimitiveKind::String));

        let mut reader = TapeReader::new(vec![Token::Null, Token::Primitive(Value::from("x"))]);
        let mut ctx = ReadContext::new(&registry, &mut reader, &settings);
        assert_eq!(ctx.read_value(&desc).expect("null"), Value::Null);

        let mut target = Value::from("old");
        assert!(matches!(
            ctx.read_value_into(&desc, &mut target),
            Err(CodecError::NotImplemented(_))
        ));
        assert_eq!(target, Value::from("old"));
    }
}
