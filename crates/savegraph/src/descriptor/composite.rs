// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Member-based (class / struct) descriptor.

use super::{null_for_value_type, read_envelope, read_envelope_into, Descriptor, DescriptorKind, DescriptorRef};
use crate::error::{CodecError, Result};
use crate::members::MemberTable;
use crate::protocol::{ReadContext, WriteContext, BASE_VALUES_FIELD, TYPE_FIELD};
use crate::registry::Registry;
use crate::types::{CompositeShape, TypeRef};
use crate::value::{ObjectValue, Value};
use std::sync::OnceLock;

#[derive(Debug)]
pub struct CompositeDescriptor {
    ty: TypeRef,
    members: OnceLock<MemberTable>,
}

impl CompositeDescriptor {
    /// Returns `None` when `ty` is not a composite.
    pub fn new(ty: TypeRef) -> Option<Self> {
        ty.as_composite()?;
        Some(Self {
            ty,
            members: OnceLock::new(),
        })
    }

    fn shape(&self) -> Result<&CompositeShape> {
        self.ty
            .as_composite()
            .ok_or_else(|| CodecError::Internal(format!("{} is not a composite", self.ty.name())))
    }

    /// Member table, built through `registry` on first use.
    pub fn members(&self, registry: &Registry) -> Result<&MemberTable> {
        if let Some(table) = self.members.get() {
            return Ok(table);
        }
        let table = MemberTable::build(registry, &self.ty, self.shape()?)?;
        // A concurrent builder may have won; both tables are equivalent.
        let _ = self.members.set(table);
        self.members
            .get()
            .ok_or_else(|| CodecError::Internal("member table vanished".into()))
    }

    /// Parameterless-constructor state with resolved member defaults.
    fn fresh_object(&self, table: &MemberTable) -> ObjectValue {
        let mut obj = match Value::new_instance(&self.ty) {
            Value::Object(obj) => obj,
            _ => ObjectValue::new(self.ty.name_arc().clone()),
        };
        for entry in table.entries() {
            if entry.ty.name() != self.ty.name() {
                obj.set(entry.name.clone(), Value::default_for(&entry.ty));
            }
        }
        if let Some(base) = table.base() {
            if obj.base().is_none() {
                if let Some(empty) = Value::empty_collection(base.type_ref()) {
                    obj.set_base(empty);
                }
            }
        }
        obj
    }

    /// Property loop shared by `read` and `read_into`. `next` is the first
    /// property name, already consumed by the caller.
    fn read_members(
        &self,
        ctx: &mut ReadContext<'_>,
        table: &MemberTable,
        obj: &mut ObjectValue,
        mut next: Option<String>,
    ) -> Result<()> {
        let mut previous: Option<String> = None;
        while let Some(name) = next {
            if previous.as_deref() == Some(name.as_str()) {
                return Err(CodecError::malformed(format!(
                    "property `{}` of {} repeated in immediate succession",
                    name,
                    self.ty.name()
                )));
            }

            match (name.as_str(), table.base()) {
                (BASE_VALUES_FIELD, Some(base)) => {
                    let entries = ctx.read_value(base)?;
                    match obj.base_mut() {
                        Some(live) => live.merge_from(entries)?,
                        None if !entries.is_null() => obj.set_base(entries),
                        None => {}
                    }
                }
                _ => match table.get(&name) {
                    Some(entry) => {
                        let value = ctx.read_value(&entry.descriptor)?;
                        obj.set(name.clone(), value);
                    }
                    // Unknown, renamed or skipped member.
                    None => ctx.reader().skip()?,
                },
            }

            previous = Some(name);
            next = ctx.reader().read_property_name()?;
        }
        Ok(())
    }

    fn null_result(&self) -> Result<Value> {
        if self.ty.is_value_type() {
            return Err(null_for_value_type(&self.ty));
        }
        Ok(Value::Null)
    }
}

impl Descriptor for CompositeDescriptor {
    fn type_ref(&self) -> &TypeRef {
        &self.ty
    }

    fn kind(&self) -> DescriptorKind {
        DescriptorKind::Composite
    }

    fn write(&self, value: &Value, ctx: &mut WriteContext<'_>) -> Result<()> {
        let obj = match value {
            Value::Object(obj) => obj,
            Value::Null if self.ty.is_value_type() => return Err(null_for_value_type(&self.ty)),
            Value::Null => return ctx.writer().write_null(),
            other => return Err(CodecError::mismatch(self.ty.name(), other.kind_name())),
        };

        if obj.type_name() != self.ty.name() {
            // Derived runtime type: tag it and hand over entirely.
            let runtime = ctx.registry().runtime_descriptor(obj.type_name())?;
            return ctx.write_tagged(value, &runtime);
        }

        let table = self.members(ctx.registry())?;
        ctx.writer().start_write_object()?;
        for entry in table.entries() {
            match obj.get(&entry.name) {
                Some(field) => ctx.write_property(&entry.name, field, &entry.descriptor)?,
                None => {
                    let default = Value::default_for(&entry.ty);
                    ctx.write_property(&entry.name, &default, &entry.descriptor)?;
                }
            }
        }
        if let (Some(base), Some(values)) = (table.base(), obj.base()) {
            ctx.write_property(BASE_VALUES_FIELD, values, base)?;
        }
        ctx.writer().end_write_object()
    }

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<Value> {
        if ctx.reader().start_read_object()? {
            return self.null_result();
        }
        let first = ctx.reader().read_property_name()?;
        if first.as_deref() == Some(TYPE_FIELD) {
            return read_envelope(ctx);
        }

        let table = self.members(ctx.registry())?;
        let mut obj = self.fresh_object(table);
        self.read_members(ctx, table, &mut obj, first)?;
        ctx.reader().end_read_object()?;
        Ok(Value::Object(obj))
    }

    fn read_into(&self, ctx: &mut ReadContext<'_>, target: &mut Value) -> Result<()> {
        if ctx.reader().start_read_object()? {
            return Err(CodecError::NullPayload {
                type_name: self.ty.name().to_string(),
            });
        }
        let first = ctx.reader().read_property_name()?;
        if first.as_deref() == Some(TYPE_FIELD) {
            return read_envelope_into(ctx, target);
        }

        let existing = match target {
            Value::Object(obj) if obj.type_name() == self.ty.name() => obj,
            other => {
                let found = other
                    .runtime_type_name()
                    .unwrap_or_else(|| other.kind_name())
                    .to_string();
                return Err(CodecError::mismatch(self.ty.name(), found));
            }
        };

        let table = self.members(ctx.registry())?;
        let mut staged = existing.clone();
        self.read_members(ctx, table, &mut staged, first)?;
        ctx.reader().end_read_object()?;
        *existing = staged;
        Ok(())
    }

    fn children(&self, registry: &Registry) -> Result<Vec<DescriptorRef>> {
        let table = self.members(registry)?;
        let mut nested: Vec<DescriptorRef> =
            table.entries().iter().map(|e| e.descriptor.clone()).collect();
        nested.extend(table.base().cloned());
        Ok(nested)
    }
}
