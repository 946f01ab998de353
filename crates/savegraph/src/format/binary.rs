// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Compact binary encoding of the token tape.
//!
//! # Layout
//!
//! One tag byte per token, followed by its payload:
//!
//! | Token | Payload |
//! |---|---|
//! | `Primitive` | kind code (`u8`), then the value (LE; strings and bytes as `u32` length + data) |
//! | `Property` | name (`u32` length + UTF-8) |
//! | `CollectionStart`, `DictionaryStart` | element count (`u32`) |
//! | `ItemStart`, `KeyStart` | index (`u32`) |
//! | everything else | none |

use super::cursor::{Cursor, Encoder};
use super::tape::{TapeReader, TapeWriter, Token};
use crate::error::{CodecError, Result};
use crate::protocol::{Reader, Writer};
use crate::types::PrimitiveKind;
use crate::value::Value;

const TAG_NULL: u8 = 0;
const TAG_PRIMITIVE: u8 = 1;
const TAG_OBJECT_START: u8 = 2;
const TAG_OBJECT_END: u8 = 3;
const TAG_PROPERTY: u8 = 4;
const TAG_COLLECTION_START: u8 = 5;
const TAG_COLLECTION_END: u8 = 6;
const TAG_ITEM_START: u8 = 7;
const TAG_ITEM_END: u8 = 8;
const TAG_DICTIONARY_START: u8 = 9;
const TAG_DICTIONARY_END: u8 = 10;
const TAG_KEY_START: u8 = 11;
const TAG_KEY_END: u8 = 12;
const TAG_VALUE_START: u8 = 13;
const TAG_VALUE_END: u8 = 14;

/// Encode a token stream.
pub fn encode_tokens(tokens: &[Token]) -> Result<Vec<u8>> {
    let mut enc = Encoder::new();
    for token in tokens {
        match token {
            Token::Null => enc.put_u8(TAG_NULL),
            Token::Primitive(value) => {
                enc.put_u8(TAG_PRIMITIVE);
                encode_primitive(&mut enc, value)?;
            }
            Token::ObjectStart => enc.put_u8(TAG_OBJECT_START),
            Token::ObjectEnd => enc.put_u8(TAG_OBJECT_END),
            Token::Property(name) => {
                enc.put_u8(TAG_PROPERTY);
                enc.put_str(name)?;
            }
            Token::CollectionStart(len) => {
                enc.put_u8(TAG_COLLECTION_START);
                enc.put_len(*len)?;
            }
            Token::CollectionEnd => enc.put_u8(TAG_COLLECTION_END),
            Token::ItemStart(index) => {
                enc.put_u8(TAG_ITEM_START);
                enc.put_len(*index)?;
            }
            Token::ItemEnd => enc.put_u8(TAG_ITEM_END),
            Token::DictionaryStart(len) => {
                enc.put_u8(TAG_DICTIONARY_START);
                enc.put_len(*len)?;
            }
            Token::DictionaryEnd => enc.put_u8(TAG_DICTIONARY_END),
            Token::KeyStart(index) => {
                enc.put_u8(TAG_KEY_START);
                enc.put_len(*index)?;
            }
            Token::KeyEnd => enc.put_u8(TAG_KEY_END),
            Token::ValueStart => enc.put_u8(TAG_VALUE_START),
            Token::ValueEnd => enc.put_u8(TAG_VALUE_END),
        }
    }
    Ok(enc.into_bytes())
}

fn encode_primitive(enc: &mut Encoder, value: &Value) -> Result<()> {
    let kind = value
        .primitive_kind()
        .ok_or_else(|| CodecError::mismatch("primitive", value.kind_name()))?;
    enc.put_u8(kind.code());
    match value {
        Value::Bool(v) => enc.put_u8(u8::from(*v)),
        Value::U8(v) => enc.put_u8(*v),
        Value::I8(v) => enc.put_i8(*v),
        Value::U16(v) => enc.put_u16(*v),
        Value::I16(v) => enc.put_i16(*v),
        Value::U32(v) => enc.put_u32(*v),
        Value::I32(v) => enc.put_i32(*v),
        Value::U64(v) => enc.put_u64(*v),
        Value::I64(v) => enc.put_i64(*v),
        Value::F32(v) => enc.put_f32(*v),
        Value::F64(v) => enc.put_f64(*v),
        Value::Char(v) => enc.put_u32(u32::from(*v)),
        Value::String(v) => enc.put_str(v)?,
        Value::Bytes(v) => enc.put_bytes(v)?,
        other => return Err(CodecError::mismatch("primitive", other.kind_name())),
    }
    Ok(())
}

/// Decode a token stream.
pub fn decode_tokens(bytes: &[u8]) -> Result<Vec<Token>> {
    let mut cursor = Cursor::new(bytes);
    let mut tokens = Vec::new();
    while cursor.remaining() > 0 {
        let offset = cursor.offset();
        let token = match cursor.read_u8()? {
            TAG_NULL => Token::Null,
            TAG_PRIMITIVE => Token::Primitive(decode_primitive(&mut cursor)?),
            TAG_OBJECT_START => Token::ObjectStart,
            TAG_OBJECT_END => Token::ObjectEnd,
            TAG_PROPERTY => Token::Property(cursor.read_string()?),
            TAG_COLLECTION_START => Token::CollectionStart(cursor.read_len()?),
            TAG_COLLECTION_END => Token::CollectionEnd,
            TAG_ITEM_START => Token::ItemStart(cursor.read_len()?),
            TAG_ITEM_END => Token::ItemEnd,
            TAG_DICTIONARY_START => Token::DictionaryStart(cursor.read_len()?),
            TAG_DICTIONARY_END => Token::DictionaryEnd,
            TAG_KEY_START => Token::KeyStart(cursor.read_len()?),
            TAG_KEY_END => Token::KeyEnd,
            TAG_VALUE_START => Token::ValueStart,
            TAG_VALUE_END => Token::ValueEnd,
            tag => {
                return Err(CodecError::malformed(format!(
                    "unknown token tag {} at offset {}",
                    tag, offset
                )));
            }
        };
        tokens.push(token);
    }
    Ok(tokens)
}

fn decode_primitive(cursor: &mut Cursor<'_>) -> Result<Value> {
    let code = cursor.read_u8()?;
    let kind = PrimitiveKind::from_code(code)
        .ok_or_else(|| CodecError::malformed(format!("unknown primitive kind code {}", code)))?;
    Ok(match kind {
        PrimitiveKind::Bool => match cursor.read_u8()? {
            0 => Value::Bool(false),
            1 => Value::Bool(true),
            other => {
                return Err(CodecError::malformed(format!("invalid bool byte {}", other)));
            }
        },
        PrimitiveKind::U8 => Value::U8(cursor.read_u8()?),
        PrimitiveKind::I8 => Value::I8(cursor.read_i8()?),
        PrimitiveKind::U16 => Value::U16(cursor.read_u16()?),
        PrimitiveKind::I16 => Value::I16(cursor.read_i16()?),
        PrimitiveKind::U32 => Value::U32(cursor.read_u32()?),
        PrimitiveKind::I32 => Value::I32(cursor.read_i32()?),
        PrimitiveKind::U64 => Value::U64(cursor.read_u64()?),
        PrimitiveKind::I64 => Value::I64(cursor.read_i64()?),
        PrimitiveKind::F32 => Value::F32(cursor.read_f32()?),
        PrimitiveKind::F64 => Value::F64(cursor.read_f64()?),
        PrimitiveKind::Char => {
            let raw = cursor.read_u32()?;
            Value::Char(
                char::from_u32(raw)
                    .ok_or_else(|| CodecError::malformed(format!("invalid char {:#x}", raw)))?,
            )
        }
        PrimitiveKind::String => Value::String(cursor.read_string()?),
        PrimitiveKind::Bytes => Value::Bytes(cursor.read_bytes()?.to_vec()),
    })
}

/// Binary writer: validates framing like [`TapeWriter`] and encodes on
/// [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct BinaryWriter {
    tape: TapeWriter,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoded bytes; fails if a frame is still open.
    pub fn finish(self) -> Result<Vec<u8>> {
        if !self.tape.is_balanced() {
            return Err(CodecError::malformed("unclosed frame at end of write"));
        }
        encode_tokens(self.tape.tokens())
    }
}

impl Writer for BinaryWriter {
    fn write_null(&mut self) -> Result<()> {
        self.tape.write_null()
    }

    fn write_primitive(&mut self, value: &Value) -> Result<()> {
        self.tape.write_primitive(value)
    }

    fn start_write_object(&mut self) -> Result<()> {
        self.tape.start_write_object()
    }

    fn end_write_object(&mut self) -> Result<()> {
        self.tape.end_write_object()
    }

    fn start_write_property(&mut self, name: &str) -> Result<()> {
        self.tape.start_write_property(name)
    }

    fn end_write_property(&mut self, name: &str) -> Result<()> {
        self.tape.end_write_property(name)
    }

    fn start_write_collection(&mut self, len: usize) -> Result<()> {
        self.tape.start_write_collection(len)
    }

    fn end_write_collection(&mut self) -> Result<()> {
        self.tape.end_write_collection()
    }

    fn start_write_collection_item(&mut self, index: usize) -> Result<()> {
        self.tape.start_write_collection_item(index)
    }

    fn end_write_collection_item(&mut self, index: usize) -> Result<()> {
        self.tape.end_write_collection_item(index)
    }

    fn start_write_dictionary(&mut self, len: usize) -> Result<()> {
        self.tape.start_write_dictionary(len)
    }

    fn end_write_dictionary(&mut self) -> Result<()> {
        self.tape.end_write_dictionary()
    }

    fn start_write_dictionary_key(&mut self, index: usize) -> Result<()> {
        self.tape.start_write_dictionary_key(index)
    }

    fn end_write_dictionary_key(&mut self, index: usize) -> Result<()> {
        self.tape.end_write_dictionary_key(index)
    }

    fn start_write_dictionary_value(&mut self, index: usize) -> Result<()> {
        self.tape.start_write_dictionary_value(index)
    }

    fn end_write_dictionary_value(&mut self, index: usize) -> Result<()> {
        self.tape.end_write_dictionary_value(index)
    }
}

/// Binary reader: decodes the whole buffer up front, then replays it.
#[derive(Debug)]
pub struct BinaryReader {
    tape: TapeReader,
}

impl BinaryReader {
    pub fn new(bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            tape: TapeReader::new(decode_tokens(bytes)?),
        })
    }

    /// Fail unless the whole buffer was consumed.
    pub fn finish(&self) -> Result<()> {
        self.tape.finish()
    }
}

impl Reader for BinaryReader {
    fn read_property_name(&mut self) -> Result<Option<String>> {
        self.tape.read_property_name()
    }

    fn read_primitive(&mut self, kind: PrimitiveKind) -> Result<Value> {
        self.tape.read_primitive(kind)
    }

    fn start_read_object(&mut self) -> Result<bool> {
        self.tape.start_read_object()
    }

    fn end_read_object(&mut self) -> Result<()> {
        self.tape.end_read_object()
    }

    fn start_read_collection(&mut self) -> Result<bool> {
        self.tape.start_read_collection()
    }

    fn end_read_collection(&mut self) -> Result<()> {
        self.tape.end_read_collection()
    }

    fn start_read_collection_item(&mut self) -> Result<bool> {
        self.tape.start_read_collection_item()
    }

    fn end_read_collection_item(&mut self) -> Result<bool> {
        self.tape.end_read_collection_item()
    }

    fn start_read_dictionary(&mut self) -> Result<bool> {
        self.tape.start_read_dictionary()
    }

    fn end_read_dictionary(&mut self) -> Result<()> {
        self.tape.end_read_dictionary()
    }

    fn start_read_dictionary_key(&mut self) -> Result<bool> {
        self.tape.start_read_dictionary_key()
    }

    fn end_read_dictionary_key(&mut self) -> Result<()> {
        self.tape.end_read_dictionary_key()
    }

    fn start_read_dictionary_value(&mut self) -> Result<()> {
        self.tape.start_read_dictionary_value()
    }

    fn end_read_dictionary_value(&mut self) -> Result<bool> {
        self.tape.end_read_dictionary_value()
    }

    fn skip(&mut self) -> Result<()> {
        self.tape.skip()
    }
}
