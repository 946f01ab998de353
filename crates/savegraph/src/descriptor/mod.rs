// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-type serialization strategies.
//!
//! Every supported type owns exactly one live [`Descriptor`] in a
//! [`Registry`](crate::Registry). Descriptors hold their nested element,
//! key and value descriptors by shared reference, so the registry's
//! descriptors form a directed graph rather than a tree.

mod array;
mod composite;
mod dictionary;
mod enums;
mod polymorphic;
mod primitive;
mod sequence;

pub use array::ArrayDescriptor;
pub use composite::CompositeDescriptor;
pub use dictionary::DictionaryDescriptor;
pub use enums::EnumDescriptor;
pub use polymorphic::PolymorphicDescriptor;
pub use primitive::PrimitiveDescriptor;
pub use sequence::{SequenceDescriptor, SequenceKind};

pub(crate) use polymorphic::{read_envelope, read_envelope_into};

use crate::error::{CodecError, Result};
use crate::protocol::{ReadContext, WriteContext};
use crate::registry::Registry;
use crate::types::TypeRef;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Shared handle to a registry-owned descriptor.
pub type DescriptorRef = Arc<dyn Descriptor>;

/// Priority of descriptors produced by automatic classification.
pub const AUTO_PRIORITY: i32 = 0;

/// Classification of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    Primitive,
    Enum,
    Composite,
    /// Abstract, interface or `object` slot; values always carry a tag.
    Polymorphic,
    Array,
    /// List, queue, stack or hash-set.
    Sequence,
    Dictionary,
    /// Hand-written leaf descriptor.
    Custom,
}

impl DescriptorKind {
    pub fn is_collection(self) -> bool {
        matches!(self, Self::Array | Self::Sequence | Self::Dictionary)
    }

    pub fn is_dictionary(self) -> bool {
        self == Self::Dictionary
    }
}

/// Serialization strategy for one runtime type.
pub trait Descriptor: Send + Sync + fmt::Debug {
    /// The type this descriptor serves.
    fn type_ref(&self) -> &TypeRef;

    fn kind(&self) -> DescriptorKind;

    /// Conflict resolution rank; a registration replaces an existing
    /// descriptor only with an equal or higher priority.
    fn priority(&self) -> i32 {
        AUTO_PRIORITY
    }

    /// Emit `value` through the context's writer.
    fn write(&self, value: &Value, ctx: &mut WriteContext<'_>) -> Result<()>;

    /// Read and allocate a fresh value.
    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<Value>;

    /// Repopulate `target` in place. Leaves `target` untouched on error.
    fn read_into(&self, _ctx: &mut ReadContext<'_>, _target: &mut Value) -> Result<()> {
        Err(CodecError::NotImplemented(format!(
            "read-into is meaningless for {}",
            self.type_ref().name()
        )))
    }

    /// Nested descriptors, resolved eagerly. Used by
    /// [`Registry::validate`].
    fn children(&self, _registry: &Registry) -> Result<Vec<DescriptorRef>> {
        Ok(Vec::new())
    }
}

/// Fresh-read loop over the items of an already opened collection frame.
/// Consumes the collection end and returns the number of items read.
pub(crate) fn read_items(
    ctx: &mut ReadContext<'_>,
    mut item: impl FnMut(&mut ReadContext<'_>) -> Result<()>,
) -> Result<usize> {
    let mut count = 0;
    while ctx.reader().start_read_collection_item()? {
        item(ctx)?;
        count += 1;
        if ctx.reader().end_read_collection_item()? {
            break;
        }
    }
    ctx.reader().end_read_collection()?;
    Ok(count)
}

/// Read-into loop: exactly `expected` items must follow in the already
/// opened collection frame. Consumes the collection end.
pub(crate) fn read_exact_items(
    ctx: &mut ReadContext<'_>,
    expected: usize,
    mut item: impl FnMut(&mut ReadContext<'_>, usize) -> Result<()>,
) -> Result<()> {
    if expected == 0 {
        if ctx.reader().start_read_collection_item()? {
            return Err(CodecError::TooManyElements { expected });
        }
        return ctx.reader().end_read_collection();
    }
    for i in 0..expected {
        if !ctx.reader().start_read_collection_item()? {
            return Err(CodecError::TooFewElements { expected, found: i });
        }
        item(ctx, i)?;
        let last = ctx.reader().end_read_collection_item()?;
        if last && i + 1 < expected {
            return Err(CodecError::TooFewElements {
                expected,
                found: i + 1,
            });
        }
        if !last && i + 1 == expected {
            return Err(CodecError::TooManyElements { expected });
        }
    }
    ctx.reader().end_read_collection()
}

/// Null payload for a type that cannot hold null.
pub(crate) fn null_for_value_type(ty: &TypeRef) -> CodecError {
    CodecError::mismatch(ty.name(), "null")
}

/// Short rendering of a key for error messages.
pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Char(c) => c.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::U8(v) => v.to_string(),
        Value::I8(v) => v.to_string(),
        Value::U16(v) => v.to_string(),
        Value::I16(v) => v.to_string(),
        Value::U32(v) => v.to_string(),
        Value::I32(v) => v.to_string(),
        Value::U64(v) => v.to_string(),
        Value::I64(v) | Value::Enum(v) => v.to_string(),
        other => format!("{:?}", other),
    }
}
