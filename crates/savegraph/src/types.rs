// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime type information.
//!
//! A [`TypeInfo`] is the explicit, registration-time description of one
//! runtime type. Its [`TypeInfo::name`] doubles as the stable polymorphism
//! tag written ahead of values held in abstract slots, so names must be
//! unique per shape within one registry.

use std::fmt;
use std::sync::Arc;

/// Shared handle to a type description.
pub type TypeRef = Arc<TypeInfo>;

/// Leaf kinds seeded into every registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Bool,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
    Char,
    String,
    Bytes,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 14] = [
        Self::Bool,
        Self::U8,
        Self::I8,
        Self::U16,
        Self::I16,
        Self::U32,
        Self::I32,
        Self::U64,
        Self::I64,
        Self::F32,
        Self::F64,
        Self::Char,
        Self::String,
        Self::Bytes,
    ];

    /// Stable type name, also used as the polymorphism tag.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::U8 => "byte",
            Self::I8 => "sbyte",
            Self::U16 => "ushort",
            Self::I16 => "short",
            Self::U32 => "uint",
            Self::I32 => "int",
            Self::U64 => "ulong",
            Self::I64 => "long",
            Self::F32 => "float",
            Self::F64 => "double",
            Self::Char => "char",
            Self::String => "string",
            Self::Bytes => "bytes",
        }
    }

    /// Reference-like leaves accept `null`.
    pub fn is_nullable(self) -> bool {
        matches!(self, Self::String | Self::Bytes)
    }

    /// Integer kinds usable as an enum's underlying type.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::U8
                | Self::I8
                | Self::U16
                | Self::I16
                | Self::U32
                | Self::I32
                | Self::U64
                | Self::I64
        )
    }

    /// One-byte code used by the binary format.
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Built-in generic container shapes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GenericKind {
    List,
    Dictionary,
    Queue,
    Stack,
    HashSet,
    /// Any other iterable generic; always unsupported.
    Other(Arc<str>),
}

impl GenericKind {
    pub fn name(&self) -> &str {
        match self {
            Self::List => "List",
            Self::Dictionary => "Dictionary",
            Self::Queue => "Queue",
            Self::Stack => "Stack",
            Self::HashSet => "HashSet",
            Self::Other(name) => name,
        }
    }

    /// Supported definition named `name`; never yields `Other`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "List" => Some(Self::List),
            "Dictionary" => Some(Self::Dictionary),
            "Queue" => Some(Self::Queue),
            "Stack" => Some(Self::Stack),
            "HashSet" => Some(Self::HashSet),
            _ => None,
        }
    }
}

/// How a reference composite may be instantiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Abstraction {
    #[default]
    Concrete,
    Abstract,
    Interface,
}

/// Enumeration variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumVariant {
    pub name: String,
    pub value: i64,
}

impl EnumVariant {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Enumeration shape: named integers over an underlying integer kind.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumShape {
    pub underlying: PrimitiveKind,
    pub variants: Vec<EnumVariant>,
}

impl EnumShape {
    pub fn variant(&self, name: &str) -> Option<&EnumVariant> {
        self.variants.iter().find(|v| v.name == name)
    }

    pub fn variant_by_value(&self, value: i64) -> Option<&EnumVariant> {
        self.variants.iter().find(|v| v.value == value)
    }
}

/// One serializable member of a composite.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDef {
    pub name: String,
    pub ty: TypeRef,
    /// Excluded from serialization (never written, ignored when read).
    pub skip: bool,
}

impl MemberDef {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            skip: false,
        }
    }

    pub fn skipped(mut self) -> Self {
        self.skip = true;
        self
    }
}

/// Member-based type (class or struct).
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeShape {
    /// Members in declaration order.
    pub members: Vec<MemberDef>,
    /// Value types always have a default state.
    pub value_type: bool,
    /// Reference type exposes a parameterless constructor.
    pub constructible: bool,
    pub abstraction: Abstraction,
    /// Built-in collection this type is a thin subclass of.
    pub base: Option<TypeRef>,
}

impl Default for CompositeShape {
    fn default() -> Self {
        Self {
            members: Vec::new(),
            value_type: false,
            constructible: true,
            abstraction: Abstraction::Concrete,
            base: None,
        }
    }
}

/// Structural classification of a type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeShape {
    Primitive(PrimitiveKind),
    Enum(EnumShape),
    /// Fixed-rank array; only ranks 1..=3 are supported.
    Array { element: TypeRef, rank: usize },
    /// Iterable generic container.
    Generic {
        definition: GenericKind,
        args: Vec<TypeRef>,
    },
    Composite(CompositeShape),
    /// The universal root type; every slot of this type is polymorphic.
    Any,
    /// Forward reference by name, resolved through the registry tag table.
    Ref,
}

/// A complete runtime type description.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeInfo {
    name: Arc<str>,
    shape: TypeShape,
}

/// Name of the universal root type.
pub const ANY_TYPE_NAME: &str = "object";

impl TypeInfo {
    pub fn new(name: impl Into<Arc<str>>, shape: TypeShape) -> TypeRef {
        Arc::new(Self {
            name: name.into(),
            shape,
        })
    }

    pub fn primitive(kind: PrimitiveKind) -> TypeRef {
        Self::new(kind.name(), TypeShape::Primitive(kind))
    }

    pub fn any() -> TypeRef {
        Self::new(ANY_TYPE_NAME, TypeShape::Any)
    }

    /// Forward reference to a type declared elsewhere (e.g. a recursive member).
    pub fn named(name: impl Into<Arc<str>>) -> TypeRef {
        Self::new(name, TypeShape::Ref)
    }

    pub fn enumeration(name: impl Into<Arc<str>>, shape: EnumShape) -> TypeRef {
        Self::new(name, TypeShape::Enum(shape))
    }

    pub fn composite(name: impl Into<Arc<str>>, shape: CompositeShape) -> TypeRef {
        Self::new(name, TypeShape::Composite(shape))
    }

    /// Array of `rank` dimensions; the name follows `T[]`, `T[,]`, `T[,,]`.
    pub fn array(element: TypeRef, rank: usize) -> TypeRef {
        let commas = ",".repeat(rank.saturating_sub(1));
        let name = format!("{}[{}]", element.name(), commas);
        Self::new(name, TypeShape::Array { element, rank })
    }

    pub fn generic(definition: GenericKind, args: Vec<TypeRef>) -> TypeRef {
        let arg_names: Vec<&str> = args.iter().map(|a| a.name()).collect();
        let name = format!("{}<{}>", definition.name(), arg_names.join(","));
        Self::new(name, TypeShape::Generic { definition, args })
    }

    /// Rebuild an array or generic container type from its stable name.
    /// Leaf names (primitives, enums, composites) are resolved by `leaf`.
    pub fn parse_name(
        name: &str,
        leaf: &mut dyn FnMut(&str) -> Option<TypeRef>,
    ) -> Option<TypeRef> {
        let name = name.trim();
        if let Some(head) = name.strip_suffix(']') {
            let open = head.rfind('[')?;
            let commas = &head[open + 1..];
            if !commas.bytes().all(|b| b == b',') {
                return None;
            }
            let element = Self::parse_name(&head[..open], leaf)?;
            return Some(Self::array(element, commas.len() + 1));
        }
        if let Some(head) = name.strip_suffix('>') {
            let open = head.find('<')?;
            let definition = GenericKind::from_name(&head[..open])?;
            let args = split_type_args(&head[open + 1..])
                .into_iter()
                .map(|arg| Self::parse_name(arg, leaf))
                .collect::<Option<Vec<_>>>()?;
            return Some(Self::generic(definition, args));
        }
        leaf(name)
    }

    pub fn list(element: TypeRef) -> TypeRef {
        Self::generic(GenericKind::List, vec![element])
    }

    pub fn queue(element: TypeRef) -> TypeRef {
        Self::generic(GenericKind::Queue, vec![element])
    }

    pub fn stack(element: TypeRef) -> TypeRef {
        Self::generic(GenericKind::Stack, vec![element])
    }

    pub fn hash_set(element: TypeRef) -> TypeRef {
        Self::generic(GenericKind::HashSet, vec![element])
    }

    pub fn dictionary(key: TypeRef, value: TypeRef) -> TypeRef {
        Self::generic(GenericKind::Dictionary, vec![key, value])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn name_arc(&self) -> &Arc<str> {
        &self.name
    }

    pub fn shape(&self) -> &TypeShape {
        &self.shape
    }

    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self.shape {
            TypeShape::Primitive(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn as_composite(&self) -> Option<&CompositeShape> {
        match &self.shape {
            TypeShape::Composite(c) => Some(c),
            _ => None,
        }
    }

    /// Value types never hold `null`.
    pub fn is_value_type(&self) -> bool {
        match &self.shape {
            TypeShape::Primitive(kind) => !kind.is_nullable(),
            TypeShape::Enum(_) => true,
            TypeShape::Composite(c) => c.value_type,
            _ => false,
        }
    }

    /// Slots of this type always carry a type tag.
    pub fn is_polymorphic(&self) -> bool {
        match &self.shape {
            TypeShape::Any => true,
            TypeShape::Composite(c) => !c.value_type && c.abstraction != Abstraction::Concrete,
            _ => false,
        }
    }

    pub fn is_forward_ref(&self) -> bool {
        matches!(self.shape, TypeShape::Ref)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Split `a,B<c,d>,e[,]` at commas outside `<>` and `[]`.
fn split_type_args(args: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in args.char_indices() {
        match c {
            '<' | '[' => depth += 1,
            '>' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&args[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&args[start..]);
    parts
}
