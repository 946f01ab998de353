// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Lists, queues, stacks and hash-sets.

use super::{read_exact_items, read_items, Descriptor, DescriptorKind, DescriptorRef};
use crate::error::{CodecError, Result};
use crate::protocol::{ReadContext, WriteContext};
use crate::registry::Registry;
use crate::types::{GenericKind, TypeRef};
use crate::value::Value;
use std::collections::{BTreeSet, VecDeque};

/// Container shape served by a [`SequenceDescriptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    List,
    Queue,
    /// Written top first, so the payload reads like the stack pops.
    Stack,
    HashSet,
}

impl SequenceKind {
    pub fn from_generic(kind: &GenericKind) -> Option<Self> {
        match kind {
            GenericKind::List => Some(Self::List),
            GenericKind::Queue => Some(Self::Queue),
            GenericKind::Stack => Some(Self::Stack),
            GenericKind::HashSet => Some(Self::HashSet),
            _ => None,
        }
    }

    /// Build the container from items in payload order.
    fn collect(self, mut items: Vec<Value>) -> Value {
        match self {
            Self::List => Value::List(items),
            Self::Queue => Value::Queue(VecDeque::from(items)),
            Self::Stack => {
                items.reverse();
                Value::Stack(items)
            }
            Self::HashSet => Value::Set(items.into_iter().collect::<BTreeSet<_>>()),
        }
    }
}

#[derive(Debug)]
pub struct SequenceDescriptor {
    ty: TypeRef,
    kind: SequenceKind,
    element: DescriptorRef,
}

impl SequenceDescriptor {
    pub fn new(ty: TypeRef, kind: SequenceKind, element: DescriptorRef) -> Self {
        Self { ty, kind, element }
    }

    pub fn sequence_kind(&self) -> SequenceKind {
        self.kind
    }

    pub fn element(&self) -> &DescriptorRef {
        &self.element
    }

    /// Items of `value` in payload order.
    fn payload_items<'v>(&self, value: &'v Value) -> Result<Vec<&'v Value>> {
        Ok(match (self.kind, value) {
            (SequenceKind::List, Value::List(items)) => items.iter().collect(),
            (SequenceKind::Queue, Value::Queue(items)) => items.iter().collect(),
            (SequenceKind::Stack, Value::Stack(items)) => items.iter().rev().collect(),
            (SequenceKind::HashSet, Value::Set(items)) => items.iter().collect(),
            (_, other) => return Err(CodecError::mismatch(self.ty.name(), other.kind_name())),
        })
    }
}

impl Descriptor for SequenceDescriptor {
    fn type_ref(&self) -> &TypeRef {
        &self.ty
    }

    fn kind(&self) -> DescriptorKind {
        DescriptorKind::Sequence
    }

    fn write(&self, value: &Value, ctx: &mut WriteContext<'_>) -> Result<()> {
        if value.is_null() {
            return ctx.writer().write_null();
        }
        let items = self.payload_items(value)?;
        ctx.writer().start_write_collection(items.len())?;
        for (i, item) in items.into_iter().enumerate() {
            ctx.writer().start_write_collection_item(i)?;
            ctx.write_value(item, &self.element)?;
            ctx.writer().end_write_collection_item(i)?;
        }
        ctx.writer().end_write_collection()
    }

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<Value> {
        if ctx.reader().start_read_collection()? {
            return Ok(Value::Null);
        }
        let mut items = Vec::new();
        read_items(ctx, |ctx| {
            items.push(ctx.read_value(&self.element)?);
            Ok(())
        })?;
        Ok(self.kind.collect(items))
    }

    /// Positional replacement: the payload must hold exactly as many items
    /// as the target. A hash-set is replaced as a whole and its payload
    /// must not repeat an element, so the target keeps its size.
    fn read_into(&self, ctx: &mut ReadContext<'_>, target: &mut Value) -> Result<()> {
        let expected = self.payload_items(target)?.len();
        if ctx.reader().start_read_collection()? {
            return Err(CodecError::NullPayload {
                type_name: self.ty.name().to_string(),
            });
        }

        let mut staged = Vec::with_capacity(expected);
        read_exact_items(ctx, expected, |ctx, _| {
            staged.push(ctx.read_value(&self.element)?);
            Ok(())
        })?;
        let replacement = self.kind.collect(staged);
        if let Value::Set(set) = &replacement {
            if set.len() != expected {
                return Err(CodecError::malformed(format!(
                    "{} payload repeats {} element(s)",
                    self.ty.name(),
                    expected - set.len()
                )));
            }
        }
        *target = replacement;
        Ok(())
    }

    fn children(&self, _registry: &Registry) -> Result<Vec<DescriptorRef>> {
        Ok(vec![self.element.clone()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::format::tape::{TapeReader, TapeWriter, Token};
    use crate::types::{PrimitiveKind, TypeInfo};
    use std::sync::Arc;

    fn descriptor(registry: &Registry, kind: SequenceKind) -> DescriptorRef {
        let int = TypeInfo::primitive(PrimitiveKind::I32);
        let element = registry.get_or_create(&int).expect("int");
        Arc::new(SequenceDescriptor::new(TypeInfo::stack(int), kind, element))
    }

    #[test]
    fn test_stack_written_top_first() {
        let registry = Registry::new();
        let settings = Settings::default();
        let desc = descriptor(&registry, SequenceKind::Stack);
        let stack = Value::Stack(vec![Value::I32(1), Value::I32(2), Value::I32(3)]);

        let mut tape = TapeWriter::new();
        WriteContext::new(&registry, &mut tape, &settings)
            .write_value(&stack, &desc)
            .expect("write");
        let tokens = tape.into_tokens();
        assert_eq!(tokens[2], Token::Primitive(Value::I32(3)));

        let mut reader = TapeReader::new(tokens);
        let back = ReadContext::new(&registry, &mut reader, &settings)
            .read_value(&desc)
            .expect("read");
        assert_eq!(back, stack);
    }

    #[test]
    fn test_read_into_wrong_container_kind() {
        let registry = Registry::new();
        let settings = Settings::default();
        let desc = descriptor(&registry, SequenceKind::Queue);

        let mut reader = TapeReader::new(vec![Token::CollectionStart(0), Token::CollectionEnd]);
        let mut target = Value::List(Vec::new());
        let err = ReadContext::new(&registry, &mut reader, &settings)
            .read_value_into(&desc, &mut target)
            .expect_err("kind");
        assert!(matches!(err, CodecError::TypeMismatch { .. }));
    }

    #[test]
    fn test_read_into_null_collection() {
        let registry = Registry::new();
        let settings = Settings::default();
        let desc = descriptor(&registry, SequenceKind::List);

        let mut reader = TapeReader::new(vec![Token::Null]);
        let mut target = Value::List(vec![Value::I32(4)]);
        let err = ReadContext::new(&registry, &mut reader, &settings)
            .read_value_into(&desc, &mut target)
            .expect_err("null");
        assert!(matches!(err, CodecError::NullPayload { .. }));
        assert_eq!(target, Value::List(vec![Value::I32(4)]));
    }

    #[test]
    fn test_set_read_into_rejects_repeated_elements() {
        let registry = Registry::new();
        let settings = Settings::default();
        let desc = descriptor(&registry, SequenceKind::HashSet);
        let mut tokens = vec![Token::CollectionStart(3)];
        for (i, v) in [1, 2, 1].into_iter().enumerate() {
            tokens.extend([Token::ItemStart(i), Token::Primitive(Value::I32(v)), Token::ItemEnd]);
        }
        tokens.push(Token::CollectionEnd);

        let before = Value::Set([7, 8, 9].into_iter().map(Value::I32).collect());
        let mut target = before.clone();
        let mut reader = TapeReader::new(tokens.clone());
        let err = ReadContext::new(&registry, &mut reader, &settings)
            .read_value_into(&desc, &mut target)
            .expect_err("repeated element");
        assert!(matches!(err, CodecError::MalformedStream(_)));
        assert_eq!(target, before);

        // A fresh read keeps the distinct elements.
        let mut reader = TapeReader::new(tokens);
        let back = ReadContext::new(&registry, &mut reader, &settings)
            .read_value(&desc)
            .expect("fresh");
        assert_eq!(back, Value::Set([1, 2].into_iter().map(Value::I32).collect()));
    }
}
