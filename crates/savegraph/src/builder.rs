// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builder API for composite and enum [`TypeInfo`]s.

use crate::types::{
    Abstraction, CompositeShape, EnumShape, EnumVariant, MemberDef, PrimitiveKind, TypeInfo,
    TypeRef,
};

/// Builder for member-based types.
#[derive(Debug)]
pub struct CompositeBuilder {
    name: String,
    shape: CompositeShape,
}

impl CompositeBuilder {
    /// Reference type with a parameterless constructor.
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape: CompositeShape::default(),
        }
    }

    /// Value type (always default-constructible, never null).
    pub fn value_type(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape: CompositeShape {
                value_type: true,
                ..CompositeShape::default()
            },
        }
    }

    pub fn abstract_class(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape: CompositeShape {
                constructible: false,
                abstraction: Abstraction::Abstract,
                ..CompositeShape::default()
            },
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape: CompositeShape {
                constructible: false,
                abstraction: Abstraction::Interface,
                ..CompositeShape::default()
            },
        }
    }

    /// Add a member with an arbitrary type.
    pub fn member(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.shape.members.push(MemberDef::new(name, ty));
        self
    }

    /// Add a primitive member.
    pub fn field(self, name: impl Into<String>, kind: PrimitiveKind) -> Self {
        self.member(name, TypeInfo::primitive(kind))
    }

    /// Add a member excluded from serialization.
    pub fn skipped_member(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.shape.members.push(MemberDef::new(name, ty).skipped());
        self
    }

    /// The reference type exposes no parameterless constructor.
    pub fn without_default_constructor(mut self) -> Self {
        self.shape.constructible = false;
        self
    }

    /// The type is a thin subclass of a built-in collection.
    pub fn base_collection(mut self, base: TypeRef) -> Self {
        self.shape.base = Some(base);
        self
    }

    pub fn build(self) -> TypeRef {
        TypeInfo::composite(self.name, self.shape)
    }
}

/// Builder for enumerations.
#[derive(Debug)]
pub struct EnumBuilder {
    name: String,
    underlying: PrimitiveKind,
    variants: Vec<EnumVariant>,
    next_value: i64,
}

impl EnumBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            underlying: PrimitiveKind::I32,
            variants: Vec::new(),
            next_value: 0,
        }
    }

    /// Underlying integer kind (default `int`). Non-integer kinds are ignored.
    pub fn underlying(mut self, kind: PrimitiveKind) -> Self {
        if kind.is_integer() {
            self.underlying = kind;
        }
        self
    }

    /// Add a variant with the next sequential value.
    pub fn variant(mut self, name: impl Into<String>) -> Self {
        let value = self.next_value;
        self.variants.push(EnumVariant::new(name, value));
        self.next_value = value + 1;
        self
    }

    /// Add a variant with an explicit value.
    pub fn variant_with_value(mut self, name: impl Into<String>, value: i64) -> Self {
        self.variants.push(EnumVariant::new(name, value));
        self.next_value = value + 1;
        self
    }

    pub fn build(self) -> TypeRef {
        TypeInfo::enumeration(
            self.name,
            EnumShape {
                underlying: self.underlying,
                variants: self.variants,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeShape;

    #[test]
    fn test_composite_builder() {
        let player = CompositeBuilder::class("Game.Player")
            .field("name", PrimitiveKind::String)
            .field("hp", PrimitiveKind::I32)
            .skipped_member("cached_path", TypeInfo::primitive(PrimitiveKind::String))
            .build();

        let shape = player.as_composite().expect("composite");
        assert_eq!(player.name(), "Game.Player");
        assert_eq!(shape.members.len(), 3);
        assert!(shape.members[2].skip);
        assert!(shape.constructible);
        assert!(!shape.value_type);
    }

    #[test]
    fn test_interface_builder_is_polymorphic() {
        let weapon = CompositeBuilder::interface("IWeapon").build();
        assert!(weapon.is_polymorphic());
    }

    #[test]
    fn test_enum_builder_values() {
        let color = EnumBuilder::new("Color")
            .underlying(PrimitiveKind::U8)
            .variant("Red")
            .variant_with_value("Green", 10)
            .variant("Blue")
            .build();

        match color.shape() {
            TypeShape::Enum(e) => {
                assert_eq!(e.underlying, PrimitiveKind::U8);
                assert_eq!(e.variant("Red").map(|v| v.value), Some(0));
                assert_eq!(e.variant("Blue").map(|v| v.value), Some(11));
                assert_eq!(
                    e.variant_by_value(10).map(|v| v.name.as_str()),
                    Some("Green")
                );
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }
}
