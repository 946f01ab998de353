// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Save and load verbs over byte buffers and token tapes.
//!
//! Each call is one complete pass: the caller gets a fully reconstructed
//! value or an error, never a half-populated one.

use crate::config::Settings;
use crate::error::Result;
use crate::format::{BinaryReader, BinaryWriter, TapeReader, TapeWriter, Token};
use crate::protocol::{ReadContext, WriteContext};
use crate::registry::Registry;
use crate::types::TypeRef;
use crate::value::Value;

/// Serialize `value` as declared type `ty` to the binary format.
pub fn serialize(registry: &Registry, ty: &TypeRef, value: &Value) -> Result<Vec<u8>> {
    serialize_with(registry, &Settings::default(), ty, value)
}

pub fn serialize_with(
    registry: &Registry,
    settings: &Settings,
    ty: &TypeRef,
    value: &Value,
) -> Result<Vec<u8>> {
    let descriptor = registry.get_or_create(ty)?;
    let mut writer = BinaryWriter::new();
    WriteContext::new(registry, &mut writer, settings).write_value(value, &descriptor)?;
    writer.finish()
}

/// Deserialize a fresh value of declared type `ty`.
pub fn deserialize(registry: &Registry, ty: &TypeRef, bytes: &[u8]) -> Result<Value> {
    deserialize_with(registry, &Settings::default(), ty, bytes)
}

pub fn deserialize_with(
    registry: &Registry,
    settings: &Settings,
    ty: &TypeRef,
    bytes: &[u8],
) -> Result<Value> {
    let descriptor = registry.get_or_create(ty)?;
    let mut reader = BinaryReader::new(bytes)?;
    let value = ReadContext::new(registry, &mut reader, settings).read_value(&descriptor)?;
    reader.finish()?;
    Ok(value)
}

/// Populate `target` in place. On error `target` is left untouched.
pub fn deserialize_into(
    registry: &Registry,
    ty: &TypeRef,
    bytes: &[u8],
    target: &mut Value,
) -> Result<()> {
    deserialize_into_with(registry, &Settings::default(), ty, bytes, target)
}

pub fn deserialize_into_with(
    registry: &Registry,
    settings: &Settings,
    ty: &TypeRef,
    bytes: &[u8],
    target: &mut Value,
) -> Result<()> {
    let descriptor = registry.get_or_create(ty)?;
    let mut reader = BinaryReader::new(bytes)?;
    let mut staged = target.clone();
    ReadContext::new(registry, &mut reader, settings).read_value_into(&descriptor, &mut staged)?;
    reader.finish()?;
    *target = staged;
    Ok(())
}

/// Write `value` to an in-memory token tape.
pub fn write_tape(
    registry: &Registry,
    settings: &Settings,
    ty: &TypeRef,
    value: &Value,
) -> Result<Vec<Token>> {
    let descriptor = registry.get_or_create(ty)?;
    let mut writer = TapeWriter::new();
    WriteContext::new(registry, &mut writer, settings).write_value(value, &descriptor)?;
    Ok(writer.into_tokens())
}

/// Read a fresh value from a token tape.
pub fn read_tape(
    registry: &Registry,
    settings: &Settings,
    ty: &TypeRef,
    tokens: Vec<Token>,
) -> Result<Value> {
    let descriptor = registry.get_or_create(ty)?;
    let mut reader = TapeReader::new(tokens);
    let value = ReadContext::new(registry, &mut reader, settings).read_value(&descriptor)?;
    reader.finish()?;
    Ok(value)
}

/// Populate `target` from a token tape. On error `target` is left untouched.
pub fn read_tape_into(
    registry: &Registry,
    settings: &Settings,
    ty: &TypeRef,
    tokens: Vec<Token>,
    target: &mut Value,
) -> Result<()> {
    let descriptor = registry.get_or_create(ty)?;
    let mut reader = TapeReader::new(tokens);
    let mut staged = target.clone();
    ReadContext::new(registry, &mut reader, settings).read_value_into(&descriptor, &mut staged)?;
    reader.finish()?;
    *target = staged;
    Ok(())
}
