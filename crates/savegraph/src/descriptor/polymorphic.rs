// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Abstract, interface and `object` slots.
//!
//! Values in these slots are always written as a tagged envelope
//! `{ __type: <tag>, value: <payload> }` and the tag is resolved back to a
//! concrete type through the registry on read.

use super::{Descriptor, DescriptorKind, DescriptorRef};
use crate::error::{CodecError, Result};
use crate::protocol::{ReadContext, WriteContext, TYPE_FIELD, VALUE_FIELD};
use crate::types::TypeRef;
use crate::value::Value;

#[derive(Debug)]
pub struct PolymorphicDescriptor {
    ty: TypeRef,
}

impl PolymorphicDescriptor {
    /// Returns `None` when slots of `ty` are not polymorphic.
    pub fn new(ty: TypeRef) -> Option<Self> {
        if !ty.is_polymorphic() {
            return None;
        }
        Some(Self { ty })
    }
}

impl Descriptor for PolymorphicDescriptor {
    fn type_ref(&self) -> &TypeRef {
        &self.ty
    }

    fn kind(&self) -> DescriptorKind {
        DescriptorKind::Polymorphic
    }

    fn write(&self, value: &Value, ctx: &mut WriteContext<'_>) -> Result<()> {
        if value.is_null() {
            return ctx.writer().write_null();
        }
        let runtime_name = value.runtime_type_name().ok_or_else(|| {
            CodecError::unsupported(
                self.ty.name(),
                format!("a {} value carries no runtime type tag", value.kind_name()),
            )
        })?;
        if runtime_name == self.ty.name() {
            return Err(CodecError::unsupported(
                self.ty.name(),
                "abstract types cannot be instantiated",
            ));
        }
        let runtime = ctx.registry().runtime_descriptor(runtime_name)?;
        ctx.write_tagged(value, &runtime)
    }

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<Value> {
        if ctx.reader().start_read_object()? {
            return Ok(Value::Null);
        }
        self.expect_tag(ctx)?;
        read_envelope(ctx)
    }

    fn read_into(&self, ctx: &mut ReadContext<'_>, target: &mut Value) -> Result<()> {
        if ctx.reader().start_read_object()? {
            return Err(CodecError::NullPayload {
                type_name: self.ty.name().to_string(),
            });
        }
        self.expect_tag(ctx)?;
        read_envelope_into(ctx, target)
    }
}

impl PolymorphicDescriptor {
    fn expect_tag(&self, ctx: &mut ReadContext<'_>) -> Result<()> {
        match ctx.reader().read_property_name()? {
            Some(name) if name == TYPE_FIELD => Ok(()),
            _ => Err(CodecError::malformed(format!(
                "value of abstract type {} has no type tag",
                self.ty.name()
            ))),
        }
    }
}

/// Resolve the tag and position the reader on the payload. `None` when the
/// tag is unknown and skipping is enabled; the envelope is then consumed.
fn open_envelope(ctx: &mut ReadContext<'_>) -> Result<Option<DescriptorRef>> {
    let tag = ctx.read_tag()?;
    let Some(ty) = ctx.registry().resolve_tag(&tag) else {
        if !ctx.settings().skip_unknown_type_tags {
            return Err(CodecError::UnknownTypeTag(tag));
        }
        log::warn!("[codec] skipping value with unknown type tag {}", tag);
        ctx.skip_remaining_properties()?;
        ctx.reader().end_read_object()?;
        return Ok(None);
    };
    let descriptor = ctx.registry().get_or_create(&ty)?;

    match ctx.reader().read_property_name()? {
        Some(name) if name == VALUE_FIELD => Ok(Some(descriptor)),
        Some(name) => Err(CodecError::malformed(format!(
            "expected `{}` after type tag {}, found `{}`",
            VALUE_FIELD, tag, name
        ))),
        None => Err(CodecError::malformed(format!(
            "tagged {} value has no payload",
            tag
        ))),
    }
}

fn close_envelope(ctx: &mut ReadContext<'_>) -> Result<()> {
    if let Some(extra) = ctx.reader().read_property_name()? {
        return Err(CodecError::malformed(format!(
            "unexpected property `{}` in tagged value",
            extra
        )));
    }
    ctx.reader().end_read_object()
}

/// Read a tagged envelope whose `__type` property name was just consumed.
pub(crate) fn read_envelope(ctx: &mut ReadContext<'_>) -> Result<Value> {
    let Some(descriptor) = open_envelope(ctx)? else {
        return Ok(Value::Null);
    };
    let value = ctx.read_value(&descriptor)?;
    close_envelope(ctx)?;
    Ok(value)
}

/// Read-into variant of [`read_envelope`]. A skipped unknown tag leaves
/// `target` untouched.
pub(crate) fn read_envelope_into(ctx: &mut ReadContext<'_>, target: &mut Value) -> Result<()> {
    let Some(descriptor) = open_envelope(ctx)? else {
        return Ok(());
    };
    ctx.read_value_into(&descriptor, target)?;
    close_envelope(ctx)
}
