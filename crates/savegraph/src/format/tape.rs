// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-memory token tape.
//!
//! Every framing call maps to one [`Token`]. Both halves keep a frame stack
//! and reject calls made out of start/end order with
//! [`CodecError::MalformedStream`].

use crate::error::{CodecError, Result};
use crate::protocol::{Reader, Writer};
use crate::types::PrimitiveKind;
use crate::value::Value;

/// One framing event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Null,
    Primitive(Value),
    ObjectStart,
    ObjectEnd,
    Property(String),
    CollectionStart(usize),
    CollectionEnd,
    ItemStart(usize),
    ItemEnd,
    DictionaryStart(usize),
    DictionaryEnd,
    KeyStart(usize),
    KeyEnd,
    ValueStart,
    ValueEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Object,
    Property,
    Collection,
    Item,
    Dictionary,
    Key,
    Value,
}

impl Frame {
    /// Frames whose body is exactly one value.
    fn holds_value(self) -> bool {
        matches!(self, Self::Property | Self::Item | Self::Key | Self::Value)
    }
}

// ============================================================================
// Writer
// ============================================================================

/// Records framing calls as tokens.
#[derive(Debug, Default)]
pub struct TapeWriter {
    tokens: Vec<Token>,
    frames: Vec<Frame>,
}

impl TapeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    /// Whether every opened frame was closed.
    pub fn is_balanced(&self) -> bool {
        self.frames.is_empty()
    }

    fn expect_value_slot(&self, what: &str) -> Result<()> {
        match self.frames.last() {
            None => Ok(()),
            Some(frame) if frame.holds_value() => Ok(()),
            Some(frame) => Err(CodecError::malformed(format!(
                "{} written directly inside {:?} frame",
                what, frame
            ))),
        }
    }

    fn open(&mut self, parent: Option<Frame>, frame: Frame, token: Token) -> Result<()> {
        match parent {
            Some(expected) if self.frames.last() != Some(&expected) => {
                return Err(CodecError::malformed(format!(
                    "{:?} frame opened outside {:?}",
                    frame, expected
                )));
            }
            None => self.expect_value_slot(&format!("{:?}", frame))?,
            _ => {}
        }
        self.frames.push(frame);
        self.tokens.push(token);
        Ok(())
    }

    fn close(&mut self, frame: Frame, token: Option<Token>) -> Result<()> {
        match self.frames.pop() {
            Some(open) if open == frame => {
                self.tokens.extend(token);
                Ok(())
            }
            other => Err(CodecError::malformed(format!(
                "closing {:?} frame while {:?} is open",
                frame, other
            ))),
        }
    }
}

impl Writer for TapeWriter {
    fn write_null(&mut self) -> Result<()> {
        self.expect_value_slot("null")?;
        self.tokens.push(Token::Null);
        Ok(())
    }

    fn write_primitive(&mut self, value: &Value) -> Result<()> {
        if value.primitive_kind().is_none() {
            return Err(CodecError::mismatch("primitive", value.kind_name()));
        }
        self.expect_value_slot("primitive")?;
        self.tokens.push(Token::Primitive(value.clone()));
        Ok(())
    }

    fn start_write_object(&mut self) -> Result<()> {
        self.open(None, Frame::Object, Token::ObjectStart)
    }

    fn end_write_object(&mut self) -> Result<()> {
        self.close(Frame::Object, Some(Token::ObjectEnd))
    }

    fn start_write_property(&mut self, name: &str) -> Result<()> {
        self.open(
            Some(Frame::Object),
            Frame::Property,
            Token::Property(name.to_string()),
        )
    }

    fn end_write_property(&mut self, _name: &str) -> Result<()> {
        self.close(Frame::Property, None)
    }

    fn start_write_collection(&mut self, len: usize) -> Result<()> {
        self.open(None, Frame::Collection, Token::CollectionStart(len))
    }

    fn end_write_collection(&mut self) -> Result<()> {
        self.close(Frame::Collection, Some(Token::CollectionEnd))
    }

    fn start_write_collection_item(&mut self, index: usize) -> Result<()> {
        self.open(Some(Frame::Collection), Frame::Item, Token::ItemStart(index))
    }

    fn end_write_collection_item(&mut self, _index: usize) -> Result<()> {
        self.close(Frame::Item, Some(Token::ItemEnd))
    }

    fn start_write_dictionary(&mut self, len: usize) -> Result<()> {
        self.open(None, Frame::Dictionary, Token::DictionaryStart(len))
    }

    fn end_write_dictionary(&mut self) -> Result<()> {
        self.close(Frame::Dictionary, Some(Token::DictionaryEnd))
    }

    fn start_write_dictionary_key(&mut self, index: usize) -> Result<()> {
        self.open(Some(Frame::Dictionary), Frame::Key, Token::KeyStart(index))
    }

    fn end_write_dictionary_key(&mut self, _index: usize) -> Result<()> {
        self.close(Frame::Key, Some(Token::KeyEnd))
    }

    fn start_write_dictionary_value(&mut self, _index: usize) -> Result<()> {
        self.open(Some(Frame::Dictionary), Frame::Value, Token::ValueStart)
    }

    fn end_write_dictionary_value(&mut self, _index: usize) -> Result<()> {
        self.close(Frame::Value, Some(Token::ValueEnd))
    }
}

// ============================================================================
// Reader
// ============================================================================

/// Replays a token tape through the [`Reader`] calls.
#[derive(Debug, Default)]
pub struct TapeReader {
    tokens: Vec<Token>,
    pos: usize,
    frames: Vec<Frame>,
}

impl TapeReader {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            frames: Vec::new(),
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_finished(&self) -> bool {
        self.pos == self.tokens.len() && self.frames.is_empty()
    }

    /// Fail unless the whole tape was consumed.
    pub fn finish(&self) -> Result<()> {
        if self.is_finished() {
            return Ok(());
        }
        Err(CodecError::malformed(format!(
            "{} trailing tokens after the value",
            self.tokens.len().saturating_sub(self.pos)
        )))
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next_token(&mut self) -> Result<Token> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| CodecError::malformed("unexpected end of stream"))?;
        self.pos += 1;
        Ok(token)
    }

    fn unexpected(&self, expected: &str, found: &Token) -> CodecError {
        CodecError::malformed(format!(
            "expected {} at token {}, found {:?}",
            expected,
            self.pos.saturating_sub(1),
            found
        ))
    }

    fn require_frame(&self, frame: Frame) -> Result<()> {
        match self.frames.last() {
            Some(open) if *open == frame => Ok(()),
            other => Err(CodecError::malformed(format!(
                "{:?} call while {:?} is open",
                frame, other
            ))),
        }
    }

    /// Pop `frame` after consuming its closing token (if any).
    fn close(&mut self, frame: Frame, token: Option<Token>) -> Result<()> {
        self.require_frame(frame)?;
        if let Some(expected) = token {
            let found = self.next_token()?;
            if found != expected {
                return Err(self.unexpected(&format!("{:?}", expected), &found));
            }
        }
        self.frames.pop();
        Ok(())
    }

    /// Consume the pending property frame once its value has been read.
    fn settle_property(&mut self) {
        if self.frames.last() == Some(&Frame::Property) {
            self.frames.pop();
        }
    }

    fn open_container(&mut self, frame: Frame) -> Result<bool> {
        let found = self.next_token()?;
        let opened = match (&found, frame) {
            (Token::Null, _) => {
                self.settle_property();
                return Ok(true);
            }
            (Token::ObjectStart, Frame::Object)
            | (Token::CollectionStart(_), Frame::Collection)
            | (Token::DictionaryStart(_), Frame::Dictionary) => true,
            _ => false,
        };
        if !opened {
            return Err(self.unexpected(&format!("{:?} start", frame), &found));
        }
        self.frames.push(frame);
        Ok(false)
    }

    fn close_container(&mut self, frame: Frame, token: Token) -> Result<()> {
        self.close(frame, Some(token))?;
        self.settle_property();
        Ok(())
    }

    fn open_entry(&mut self, parent: Frame, frame: Frame) -> Result<bool> {
        self.require_frame(parent)?;
        let starts = match (self.peek(), frame) {
            (Some(Token::ItemStart(_)), Frame::Item) | (Some(Token::KeyStart(_)), Frame::Key) => {
                true
            }
            (Some(Token::CollectionEnd), Frame::Item)
            | (Some(Token::DictionaryEnd), Frame::Key) => false,
            (Some(found), _) => {
                let found = found.clone();
                return Err(CodecError::malformed(format!(
                    "expected {:?} or container end, found {:?}",
                    frame, found
                )));
            }
            (None, _) => return Err(CodecError::malformed("unexpected end of stream")),
        };
        if starts {
            self.pos += 1;
            self.frames.push(frame);
        }
        Ok(starts)
    }
}

impl Reader for TapeReader {
    fn read_property_name(&mut self) -> Result<Option<String>> {
        self.require_frame(Frame::Object)?;
        match self.peek() {
            Some(Token::Property(name)) => {
                let name = name.clone();
                self.pos += 1;
                self.frames.push(Frame::Property);
                Ok(Some(name))
            }
            Some(Token::ObjectEnd) => Ok(None),
            Some(found) => Err(CodecError::malformed(format!(
                "expected property or object end, found {:?}",
                found
            ))),
            None => Err(CodecError::malformed("unexpected end of stream")),
        }
    }

    fn read_primitive(&mut self, kind: PrimitiveKind) -> Result<Value> {
        let found = self.next_token()?;
        let value = match found {
            Token::Null => Value::Null,
            Token::Primitive(value) if value.primitive_kind() == Some(kind) => value,
            Token::Primitive(value) => {
                return Err(CodecError::mismatch(kind.name(), value.kind_name()));
            }
            other => return Err(self.unexpected(kind.name(), &other)),
        };
        self.settle_property();
        Ok(value)
    }

    fn start_read_object(&mut self) -> Result<bool> {
        self.open_container(Frame::Object)
    }

    fn end_read_object(&mut self) -> Result<()> {
        self.close_container(Frame::Object, Token::ObjectEnd)
    }

    fn start_read_collection(&mut self) -> Result<bool> {
        self.open_container(Frame::Collection)
    }

    fn end_read_collection(&mut self) -> Result<()> {
        self.close_container(Frame::Collection, Token::CollectionEnd)
    }

    fn start_read_collection_item(&mut self) -> Result<bool> {
        self.open_entry(Frame::Collection, Frame::Item)
    }

    fn end_read_collection_item(&mut self) -> Result<bool> {
        self.close(Frame::Item, Some(Token::ItemEnd))?;
        Ok(self.peek() == Some(&Token::CollectionEnd))
    }

    fn start_read_dictionary(&mut self) -> Result<bool> {
        self.open_container(Frame::Dictionary)
    }

    fn end_read_dictionary(&mut self) -> Result<()> {
        self.close_container(Frame::Dictionary, Token::DictionaryEnd)
    }

    fn start_read_dictionary_key(&mut self) -> Result<bool> {
        self.open_entry(Frame::Dictionary, Frame::Key)
    }

    fn end_read_dictionary_key(&mut self) -> Result<()> {
        self.close(Frame::Key, Some(Token::KeyEnd))
    }

    fn start_read_dictionary_value(&mut self) -> Result<()> {
        self.require_frame(Frame::Dictionary)?;
        let found = self.next_token()?;
        if found != Token::ValueStart {
            return Err(self.unexpected("dictionary value", &found));
        }
        self.frames.push(Frame::Value);
        Ok(())
    }

    fn end_read_dictionary_value(&mut self) -> Result<bool> {
        self.close(Frame::Value, Some(Token::ValueEnd))?;
        Ok(self.peek() == Some(&Token::DictionaryEnd))
    }

    fn skip(&mut self) -> Result<()> {
        let mut depth = 0usize;
        loop {
            let token = self.next_token()?;
            match token {
                Token::ObjectStart | Token::CollectionStart(_) | Token::DictionaryStart(_) => {
                    depth += 1;
                }
                Token::ObjectEnd | Token::CollectionEnd | Token::DictionaryEnd => {
                    if depth == 0 {
                        return Err(self.unexpected("value", &token));
                    }
                    depth -= 1;
                }
                Token::Null | Token::Primitive(_) => {}
                Token::Property(_)
                | Token::ItemStart(_)
                | Token::ItemEnd
                | Token::KeyStart(_)
                | Token::KeyEnd
                | Token::ValueStart
                | Token::ValueEnd => {
                    if depth == 0 {
                        return Err(self.unexpected("value", &token));
                    }
                }
            }
            if depth == 0 {
                self.settle_property();
                return Ok(());
            }
        }
    }
}
