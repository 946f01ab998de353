// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Key/value dictionaries.

use super::{describe, Descriptor, DescriptorKind, DescriptorRef};
use crate::error::{CodecError, Result};
use crate::protocol::{ReadContext, WriteContext};
use crate::registry::Registry;
use crate::types::TypeRef;
use crate::value::Value;
use std::collections::BTreeMap;

#[derive(Debug)]
pub struct DictionaryDescriptor {
    ty: TypeRef,
    key: DescriptorRef,
    value: DescriptorRef,
}

impl DictionaryDescriptor {
    pub fn new(ty: TypeRef, key: DescriptorRef, value: DescriptorRef) -> Self {
        Self { ty, key, value }
    }

    pub fn key(&self) -> &DescriptorRef {
        &self.key
    }

    pub fn value(&self) -> &DescriptorRef {
        &self.value
    }

    /// Read every entry of an already opened dictionary frame, in payload
    /// order. Consumes the dictionary end.
    fn read_entries(&self, ctx: &mut ReadContext<'_>) -> Result<Vec<(Value, Value)>> {
        let mut entries = Vec::new();
        while ctx.reader().start_read_dictionary_key()? {
            let key = ctx.read_value(&self.key)?;
            ctx.reader().end_read_dictionary_key()?;
            if key.is_null() {
                return Err(CodecError::malformed(format!(
                    "null key in {}",
                    self.ty.name()
                )));
            }

            ctx.reader().start_read_dictionary_value()?;
            let value = ctx.read_value(&self.value)?;
            let last = ctx.reader().end_read_dictionary_value()?;
            entries.push((key, value));
            if last {
                break;
            }
        }
        ctx.reader().end_read_dictionary()?;
        Ok(entries)
    }
}

impl Descriptor for DictionaryDescriptor {
    fn type_ref(&self) -> &TypeRef {
        &self.ty
    }

    fn kind(&self) -> DescriptorKind {
        DescriptorKind::Dictionary
    }

    fn write(&self, value: &Value, ctx: &mut WriteContext<'_>) -> Result<()> {
        let map = match value {
            Value::Dict(map) => map,
            Value::Null => return ctx.writer().write_null(),
            other => return Err(CodecError::mismatch(self.ty.name(), other.kind_name())),
        };
        ctx.writer().start_write_dictionary(map.len())?;
        for (i, (key, item)) in map.iter().enumerate() {
            ctx.writer().start_write_dictionary_key(i)?;
            ctx.write_value(key, &self.key)?;
            ctx.writer().end_write_dictionary_key(i)?;
            ctx.writer().start_write_dictionary_value(i)?;
            ctx.write_value(item, &self.value)?;
            ctx.writer().end_write_dictionary_value(i)?;
        }
        ctx.writer().end_write_dictionary()
    }

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<Value> {
        if ctx.reader().start_read_dictionary()? {
            return Ok(Value::Null);
        }
        // Later duplicates of a key overwrite earlier ones.
        let map: BTreeMap<Value, Value> = self.read_entries(ctx)?.into_iter().collect();
        Ok(Value::Dict(map))
    }

    /// Value merge: every payload key must already exist in the target,
    /// only those keys' values change.
    fn read_into(&self, ctx: &mut ReadContext<'_>, target: &mut Value) -> Result<()> {
        let map = match target {
            Value::Dict(map) => map,
            other => return Err(CodecError::mismatch(self.ty.name(), other.kind_name())),
        };
        if ctx.reader().start_read_dictionary()? {
            return Err(CodecError::NullPayload {
                type_name: self.ty.name().to_string(),
            });
        }

        let updates = self.read_entries(ctx)?;
        if let Some((missing, _)) = updates.iter().find(|(k, _)| !map.contains_key(k)) {
            return Err(CodecError::KeyNotFound(describe(missing)));
        }
        for (key, value) in updates {
            if let Some(slot) = map.get_mut(&key) {
                *slot = value;
            }
        }
        Ok(())
    }

    fn children(&self, _registry: &Registry) -> Result<Vec<DescriptorRef>> {
        Ok(vec![self.key.clone(), self.value.clone()])
    }
}
