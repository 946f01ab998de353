// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reader/Writer framing protocol.
//!
//! A concrete format implements [`Writer`] and [`Reader`]; descriptors only
//! ever talk to them through [`WriteContext`] and [`ReadContext`], which bind
//! the format to a [`Registry`] and the active [`Settings`].
//!
//! # Framing
//!
//! ```text
//! object      := start_object (property)* end_object | null
//! property    := start_property(name) value end_property
//! collection  := start_collection(n) (start_item(i) value end_item(i))* end_collection | null
//! dictionary  := start_dictionary(n) (key_frame value_frame)* end_dictionary | null
//! ```
//!
//! The write order of nested elements is the read order; a format must
//! preserve nesting and ordering and nothing else.

use crate::config::Settings;
use crate::descriptor::DescriptorRef;
use crate::error::{CodecError, Result};
use crate::registry::Registry;
use crate::types::{PrimitiveKind, TypeRef};
use crate::value::Value;

/// Property carrying the polymorphism tag of a tagged envelope.
pub const TYPE_FIELD: &str = "__type";

/// Property carrying the payload of a tagged envelope.
pub const VALUE_FIELD: &str = "value";

/// Reserved property holding the entries of a composite's base collection.
pub const BASE_VALUES_FIELD: &str = "__values";

/// Output half of the framing protocol.
pub trait Writer {
    fn write_null(&mut self) -> Result<()>;

    /// Emit one leaf value (a primitive variant of [`Value`]).
    fn write_primitive(&mut self, value: &Value) -> Result<()>;

    fn start_write_object(&mut self) -> Result<()>;
    fn end_write_object(&mut self) -> Result<()>;

    fn start_write_property(&mut self, name: &str) -> Result<()>;
    fn end_write_property(&mut self, _name: &str) -> Result<()> {
        Ok(())
    }

    fn start_write_collection(&mut self, len: usize) -> Result<()>;
    fn end_write_collection(&mut self) -> Result<()>;
    fn start_write_collection_item(&mut self, index: usize) -> Result<()>;
    fn end_write_collection_item(&mut self, index: usize) -> Result<()>;

    fn start_write_dictionary(&mut self, len: usize) -> Result<()>;
    fn end_write_dictionary(&mut self) -> Result<()>;
    fn start_write_dictionary_key(&mut self, index: usize) -> Result<()>;
    fn end_write_dictionary_key(&mut self, index: usize) -> Result<()>;
    fn start_write_dictionary_value(&mut self, index: usize) -> Result<()>;
    fn end_write_dictionary_value(&mut self, index: usize) -> Result<()>;
}

/// Input half of the framing protocol.
///
/// Boolean returns replace exceptions as control flow: `true` from a
/// `start_read_*` container call means the payload is null; the
/// `*_item`/`*_key` calls report whether an item follows and the
/// `end_*` item calls report whether it was the last one.
pub trait Reader {
    /// Next property name of the current object, `None` once the object
    /// has no more properties. Does not consume the object end.
    fn read_property_name(&mut self) -> Result<Option<String>>;

    /// Read one leaf of `kind`. A null token yields [`Value::Null`].
    fn read_primitive(&mut self, kind: PrimitiveKind) -> Result<Value>;

    /// Returns `true` if the object is null.
    fn start_read_object(&mut self) -> Result<bool>;
    fn end_read_object(&mut self) -> Result<()>;

    /// Returns `true` if the collection is null.
    fn start_read_collection(&mut self) -> Result<bool>;
    fn end_read_collection(&mut self) -> Result<()>;
    /// Returns `false` when no further item follows.
    fn start_read_collection_item(&mut self) -> Result<bool>;
    /// Returns `true` when the item just read was the last one.
    fn end_read_collection_item(&mut self) -> Result<bool>;

    /// Returns `true` if the dictionary is null.
    fn start_read_dictionary(&mut self) -> Result<bool>;
    fn end_read_dictionary(&mut self) -> Result<()>;
    /// Returns `false` when no further entry follows.
    fn start_read_dictionary_key(&mut self) -> Result<bool>;
    fn end_read_dictionary_key(&mut self) -> Result<()>;
    fn start_read_dictionary_value(&mut self) -> Result<()>;
    /// Returns `true` when the entry just read was the last one.
    fn end_read_dictionary_value(&mut self) -> Result<bool>;

    /// Discard one value (leaf, object, collection or dictionary).
    fn skip(&mut self) -> Result<()>;
}

/// One write pass over a value graph.
pub struct WriteContext<'a> {
    registry: &'a Registry,
    writer: &'a mut dyn Writer,
    settings: &'a Settings,
    depth: usize,
}

impl<'a> WriteContext<'a> {
    pub fn new(registry: &'a Registry, writer: &'a mut dyn Writer, settings: &'a Settings) -> Self {
        Self {
            registry,
            writer,
            settings,
            depth: 0,
        }
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn settings(&self) -> &'a Settings {
        self.settings
    }

    pub fn writer(&mut self) -> &mut dyn Writer {
        &mut *self.writer
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Write `value` through `descriptor` one nesting level deeper.
    pub fn write_value(&mut self, value: &Value, descriptor: &DescriptorRef) -> Result<()> {
        enter(&mut self.depth, self.settings.depth_limit)?;
        let result = descriptor.write(value, self);
        self.depth -= 1;
        result
    }

    /// Frame one named member.
    pub fn write_property(
        &mut self,
        name: &str,
        value: &Value,
        descriptor: &DescriptorRef,
    ) -> Result<()> {
        self.writer.start_write_property(name)?;
        self.write_value(value, descriptor)?;
        self.writer.end_write_property(name)
    }

    /// Emit the polymorphism tag of `ty` as the `__type` property.
    pub fn write_type(&mut self, ty: &TypeRef) -> Result<()> {
        self.writer.start_write_property(TYPE_FIELD)?;
        self.writer
            .write_primitive(&Value::String(ty.name().to_string()))?;
        self.writer.end_write_property(TYPE_FIELD)
    }

    /// Write `value` wrapped in a tagged envelope for `runtime`:
    /// `{ __type: <tag>, value: <payload> }`.
    pub fn write_tagged(&mut self, value: &Value, runtime: &DescriptorRef) -> Result<()> {
        self.writer.start_write_object()?;
        self.write_type(runtime.type_ref())?;
        self.write_property(VALUE_FIELD, value, runtime)?;
        self.writer.end_write_object()
    }
}

/// One read pass over a payload.
pub struct ReadContext<'a> {
    registry: &'a Registry,
    reader: &'a mut dyn Reader,
    settings: &'a Settings,
    depth: usize,
}

impl<'a> ReadContext<'a> {
    pub fn new(registry: &'a Registry, reader: &'a mut dyn Reader, settings: &'a Settings) -> Self {
        Self {
            registry,
            reader,
            settings,
            depth: 0,
        }
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn settings(&self) -> &'a Settings {
        self.settings
    }

    pub fn reader(&mut self) -> &mut dyn Reader {
        &mut *self.reader
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Read a fresh value through `descriptor` one nesting level deeper.
    pub fn read_value(&mut self, descriptor: &DescriptorRef) -> Result<Value> {
        enter(&mut self.depth, self.settings.depth_limit)?;
        let result = descriptor.read(self);
        self.depth -= 1;
        result
    }

    /// Populate `target` through `descriptor` one nesting level deeper.
    pub fn read_value_into(&mut self, descriptor: &DescriptorRef, target: &mut Value) -> Result<()> {
        enter(&mut self.depth, self.settings.depth_limit)?;
        let result = descriptor.read_into(self, target);
        self.depth -= 1;
        result
    }

    /// Read a raw polymorphism tag (the value of a `__type` property).
    pub fn read_tag(&mut self) -> Result<String> {
        match self.reader.read_primitive(PrimitiveKind::String)? {
            Value::String(tag) => Ok(tag),
            other => Err(CodecError::malformed(format!(
                "type tag must be a string, found {}",
                other.kind_name()
            ))),
        }
    }

    /// Read a polymorphism tag and resolve it through the registry.
    pub fn read_type(&mut self) -> Result<TypeRef> {
        let tag = self.read_tag()?;
        self.registry
            .resolve_tag(&tag)
            .ok_or(CodecError::UnknownTypeTag(tag))
    }

    /// Consume the remaining properties of the current object.
    pub(crate) fn skip_remaining_properties(&mut self) -> Result<()> {
        while self.reader.read_property_name()?.is_some() {
            self.reader.skip()?;
        }
        Ok(())
    }
}

fn enter(depth: &mut usize, limit: usize) -> Result<()> {
    if *depth >= limit {
        return Err(CodecError::DepthLimitExceeded { limit });
    }
    *depth += 1;
    Ok(())
}
