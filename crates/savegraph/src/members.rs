// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Member table extraction for composite descriptors.
//!
//! The table is built once per composite descriptor, on first use, and holds
//! the serializable members in declaration order together with the nested
//! descriptor of each member.

use crate::descriptor::DescriptorRef;
use crate::error::{CodecError, Result};
use crate::registry::Registry;
use crate::types::{CompositeShape, TypeInfo, TypeRef};
use std::collections::{HashMap, HashSet};

/// One serializable member.
#[derive(Debug, Clone)]
pub struct MemberEntry {
    pub name: String,
    /// Declared type with forward references resolved.
    pub ty: TypeRef,
    pub descriptor: DescriptorRef,
}

/// Cached member list of one composite type.
#[derive(Debug)]
pub struct MemberTable {
    entries: Vec<MemberEntry>,
    index: HashMap<String, usize>,
    base: Option<DescriptorRef>,
}

impl MemberTable {
    /// Structural checks run at classification time: member names must be
    /// unique and a value type cannot directly contain itself.
    pub fn check_shape(owner: &TypeInfo, shape: &CompositeShape) -> Result<()> {
        let mut seen = HashSet::with_capacity(shape.members.len());
        for member in &shape.members {
            if !seen.insert(member.name.as_str()) {
                return Err(CodecError::unsupported(
                    owner.name(),
                    format!("duplicate member name `{}`", member.name),
                ));
            }
            if shape.value_type && member.ty.name() == owner.name() {
                return Err(CodecError::unsupported(
                    owner.name(),
                    format!("value type contains itself through member `{}`", member.name),
                ));
            }
        }
        Ok(())
    }

    /// Resolve every non-skipped member through `registry`.
    pub fn build(registry: &Registry, owner: &TypeInfo, shape: &CompositeShape) -> Result<Self> {
        Self::check_shape(owner, shape)?;

        let mut entries = Vec::with_capacity(shape.members.len());
        let mut index = HashMap::with_capacity(shape.members.len());
        for member in shape.members.iter().filter(|m| !m.skip) {
            let descriptor = registry.get_or_create(&member.ty).map_err(|e| match e {
                CodecError::UnsupportedType { type_name, reason } => CodecError::unsupported(
                    owner.name(),
                    format!("member `{}` of type {}: {}", member.name, type_name, reason),
                ),
                other => other,
            })?;
            index.insert(member.name.clone(), entries.len());
            entries.push(MemberEntry {
                name: member.name.clone(),
                ty: descriptor.type_ref().clone(),
                descriptor,
            });
        }

        let base = match &shape.base {
            Some(base) => Some(registry.get_or_create(base)?),
            None => None,
        };

        Ok(Self {
            entries,
            index,
            base,
        })
    }

    pub fn entries(&self) -> &[MemberEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&MemberEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// Descriptor of the built-in collection the composite derives from.
    pub fn base(&self) -> Option<&DescriptorRef> {
        self.base.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
