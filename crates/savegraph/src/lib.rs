// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # savegraph - object-graph save/load codec
//!
//! Walks nested values of types described at registration time, maps each
//! node to a framed stream through a format-agnostic [`Reader`]/[`Writer`]
//! protocol, and rebuilds them later, either as fresh values or in place.
//!
//! ## Quick Start
//!
//! ```rust
//! use savegraph::{codec, CompositeBuilder, ObjectValue, PrimitiveKind, Registry, TypeInfo, Value};
//!
//! # fn main() -> savegraph::Result<()> {
//! let registry = Registry::new();
//! let player = CompositeBuilder::class("Game.Player")
//!     .field("name", PrimitiveKind::String)
//!     .field("level", PrimitiveKind::I32)
//!     .member("scores", TypeInfo::list(TypeInfo::primitive(PrimitiveKind::I32)))
//!     .build();
//!
//! let value = Value::Object(
//!     ObjectValue::new("Game.Player")
//!         .with("name", "ann")
//!         .with("level", 7)
//!         .with("scores", Value::List(vec![Value::I32(3), Value::I32(9)])),
//! );
//!
//! let bytes = codec::serialize(&registry, &player, &value)?;
//! assert_eq!(codec::deserialize(&registry, &player, &bytes)?, value);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |  codec (serialize / deserialize / deserialize_into)   archive       |
//! +---------------------------------------------------------------------+
//! |  registry: type name -> descriptor, tag table, single-slot cache    |
//! +---------------------------------------------------------------------+
//! |  descriptors: primitive | enum | composite | polymorphic |          |
//! |               array(1..=3) | list/queue/stack/set | dictionary      |
//! +---------------------------------------------------------------------+
//! |  protocol: Writer / Reader framing calls                            |
//! +---------------------------------------------------------------------+
//! |  formats: tape (tokens) | binary (little-endian)                    |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Registry`] | Owns one live descriptor per type, classifies on first use |
//! | [`Descriptor`] | Write / read / read-into strategy for one type |
//! | [`TypeInfo`] | Registration-time description of a runtime type |
//! | [`Value`] | Dynamic instance walked by the descriptors |
//! | [`Archive`] | Keyed save store persisted to a file |

/// Keyed save store backed by one file.
pub mod archive;
/// Fluent builders for composite and enum types.
pub mod builder;
/// Save and load verbs over byte buffers and token tapes.
pub mod codec;
/// Codec and archive settings (YAML-loadable).
pub mod config;
/// Per-type serialization strategies.
pub mod descriptor;
/// Error taxonomy.
pub mod error;
/// Concrete formats (token tape, binary).
pub mod format;
/// Member table extraction for composites.
pub mod members;
/// Static Rust types to dynamic values.
pub mod persist;
/// Reader/Writer framing protocol.
pub mod protocol;
/// Type registry.
pub mod registry;
/// Runtime type information.
pub mod types;
/// Dynamic values.
pub mod value;

pub use archive::{Archive, ArchiveEntry};
pub use builder::{CompositeBuilder, EnumBuilder};
pub use config::Settings;
pub use descriptor::{
    ArrayDescriptor, CompositeDescriptor, Descriptor, DescriptorKind, DescriptorRef,
    DictionaryDescriptor, EnumDescriptor, PolymorphicDescriptor, PrimitiveDescriptor,
    SequenceDescriptor, SequenceKind, AUTO_PRIORITY,
};
pub use error::{CodecError, Result};
pub use format::{BinaryReader, BinaryWriter, TapeReader, TapeWriter, Token};
pub use persist::Persist;
pub use protocol::{ReadContext, Reader, WriteContext, Writer};
pub use registry::{Registry, RegistryStats};
pub use types::{GenericKind, PrimitiveKind, TypeInfo, TypeRef, TypeShape};
pub use value::{ArrayValue, ObjectValue, Value};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
