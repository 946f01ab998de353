// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Concrete formats implementing the framing protocol.
//!
//! - [`tape`]: in-memory token stream with strict framing validation.
//! - [`binary`]: compact little-endian encoding of the same token stream.

pub mod binary;
pub(crate) mod cursor;
pub mod tape;

pub use binary::{BinaryReader, BinaryWriter};
pub use tape::{TapeReader, TapeWriter, Token};
