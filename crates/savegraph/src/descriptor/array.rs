// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fixed-rank arrays (rank 1, 2 and 3).
//!
//! A rank-2 array is a collection of rows, each row a nested collection
//! frame; rank 3 adds one more level. Rows must all have the same length.

use super::{read_exact_items, read_items, Descriptor, DescriptorKind, DescriptorRef};
use crate::error::{CodecError, Result};
use crate::protocol::{ReadContext, WriteContext};
use crate::registry::Registry;
use crate::types::{PrimitiveKind, TypeRef};
use crate::value::{ArrayValue, Value};

/// Highest supported rank.
pub const MAX_ARRAY_RANK: usize = 3;

#[derive(Debug)]
pub struct ArrayDescriptor {
    ty: TypeRef,
    element: DescriptorRef,
    rank: usize,
}

impl ArrayDescriptor {
    pub fn new(ty: TypeRef, element: DescriptorRef, rank: usize) -> Result<Self> {
        if rank == 0 || rank > MAX_ARRAY_RANK {
            return Err(CodecError::unsupported(
                ty.name(),
                "only up to 3 dimensions are supported",
            ));
        }
        Ok(Self { ty, element, rank })
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn element(&self) -> &DescriptorRef {
        &self.element
    }

    fn expect_array<'v>(&self, value: &'v Value) -> Result<&'v ArrayValue> {
        match value {
            Value::Array(arr) if arr.rank() == self.rank => Ok(arr),
            Value::Array(arr) => Err(CodecError::mismatch(
                self.ty.name(),
                format!("array of rank {}", arr.rank()),
            )),
            other => Err(CodecError::mismatch(self.ty.name(), other.kind_name())),
        }
    }

    /// Write one dimension level; `dims[0]` is the current level's length.
    fn write_block(&self, ctx: &mut WriteContext<'_>, dims: &[usize], items: &[Value]) -> Result<()> {
        let len = dims[0];
        ctx.writer().start_write_collection(len)?;
        if dims.len() == 1 {
            for (i, item) in items.iter().enumerate() {
                ctx.writer().start_write_collection_item(i)?;
                ctx.write_value(item, &self.element)?;
                ctx.writer().end_write_collection_item(i)?;
            }
        } else {
            let stride: usize = dims[1..].iter().product();
            for i in 0..len {
                ctx.writer().start_write_collection_item(i)?;
                self.write_block(ctx, &dims[1..], &items[i * stride..(i + 1) * stride])?;
                ctx.writer().end_write_collection_item(i)?;
            }
        }
        ctx.writer().end_write_collection()
    }

    /// Bounds record of an empty multi-rank array: a null marker row
    /// followed by one `ulong` item per dimension. Empty rows cannot carry
    /// the inner bounds, and a real row is never null.
    fn write_bounds(&self, ctx: &mut WriteContext<'_>, dims: &[usize]) -> Result<()> {
        ctx.writer().start_write_collection(dims.len() + 1)?;
        ctx.writer().start_write_collection_item(0)?;
        ctx.writer().write_null()?;
        ctx.writer().end_write_collection_item(0)?;
        for (i, &bound) in dims.iter().enumerate() {
            ctx.writer().start_write_collection_item(i + 1)?;
            ctx.writer().write_primitive(&Value::U64(bound as u64))?;
            ctx.writer().end_write_collection_item(i + 1)?;
        }
        ctx.writer().end_write_collection()
    }

    fn read_bound(&self, ctx: &mut ReadContext<'_>) -> Result<usize> {
        match ctx.reader().read_primitive(PrimitiveKind::U64)? {
            Value::U64(bound) => usize::try_from(bound).map_err(|_| {
                CodecError::malformed(format!("bound {} of {} overflows", bound, self.ty.name()))
            }),
            other => Err(CodecError::malformed(format!(
                "expected a bound of {}, found {}",
                self.ty.name(),
                other.kind_name()
            ))),
        }
    }

    /// Fresh read of the outer level, whose collection frame is already
    /// open. Returns the observed bounds and the row-major elements.
    fn read_shape(&self, ctx: &mut ReadContext<'_>) -> Result<(Vec<usize>, Vec<Value>)> {
        let mut dims = vec![None; self.rank];
        let mut items = Vec::new();
        let mut record: Option<Vec<usize>> = None;
        let mut index = 0usize;
        let count = read_items(ctx, |ctx| {
            let first = index == 0;
            index += 1;
            if let Some(bounds) = record.as_mut() {
                bounds.push(self.read_bound(ctx)?);
                return Ok(());
            }
            if self.rank == 1 {
                items.push(ctx.read_value(&self.element)?);
                return Ok(());
            }
            if ctx.reader().start_read_collection()? {
                if first {
                    record = Some(Vec::with_capacity(self.rank));
                    return Ok(());
                }
                return Err(self.null_row());
            }
            self.read_block(ctx, 1, &mut dims, &mut items)
        })?;

        if let Some(bounds) = record {
            if bounds.len() != self.rank || bounds.iter().product::<usize>() != 0 {
                return Err(CodecError::malformed(format!(
                    "bounds record {:?} does not describe an empty {}",
                    bounds,
                    self.ty.name()
                )));
            }
            return Ok((bounds, items));
        }

        dims[0] = Some(count);
        // Only a hand-written payload with no rows leaves inner bounds unobserved.
        let dims = dims.into_iter().map(|d| d.unwrap_or(0)).collect();
        Ok((dims, items))
    }

    /// Fresh read of an inner level whose collection frame is already open.
    /// Records the level's length in `dims`, rejecting jagged rows.
    fn read_block(
        &self,
        ctx: &mut ReadContext<'_>,
        level: usize,
        dims: &mut [Option<usize>],
        items: &mut Vec<Value>,
    ) -> Result<()> {
        let inner = level + 1 < self.rank;
        let count = read_items(ctx, |ctx| {
            if inner {
                self.open_row(ctx)?;
                self.read_block(ctx, level + 1, dims, items)
            } else {
                items.push(ctx.read_value(&self.element)?);
                Ok(())
            }
        })?;
        match dims[level] {
            None => dims[level] = Some(count),
            Some(expected) if expected != count => {
                return Err(CodecError::malformed(format!(
                    "jagged rows in {}: dimension {} has lengths {} and {}",
                    self.ty.name(),
                    level,
                    expected,
                    count
                )));
            }
            Some(_) => {}
        }
        Ok(())
    }

    /// Compare payload bounds against the target's, outermost first.
    fn check_bounds(target: &[usize], found: &[usize]) -> Result<()> {
        for (&expected, &found) in target.iter().zip(found) {
            if found < expected {
                return Err(CodecError::TooFewElements { expected, found });
            }
            if found > expected {
                return Err(CodecError::TooManyElements { expected });
            }
        }
        Ok(())
    }

    fn open_row(&self, ctx: &mut ReadContext<'_>) -> Result<()> {
        if ctx.reader().start_read_collection()? {
            return Err(self.null_row());
        }
        Ok(())
    }

    fn null_row(&self) -> CodecError {
        CodecError::malformed(format!("null row inside {}", self.ty.name()))
    }
}

impl Descriptor for ArrayDescriptor {
    fn type_ref(&self) -> &TypeRef {
        &self.ty
    }

    fn kind(&self) -> DescriptorKind {
        DescriptorKind::Array
    }

    fn write(&self, value: &Value, ctx: &mut WriteContext<'_>) -> Result<()> {
        if value.is_null() {
            return ctx.writer().write_null();
        }
        let arr = self.expect_array(value)?;
        if self.rank > 1 && arr.is_empty() {
            return self.write_bounds(ctx, arr.dims());
        }
        self.write_block(ctx, arr.dims(), arr.items())
    }

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<Value> {
        if ctx.reader().start_read_collection()? {
            return Ok(Value::Null);
        }
        let (dims, items) = self.read_shape(ctx)?;
        ArrayValue::new(dims, items).map(Value::Array)
    }

    fn read_into(&self, ctx: &mut ReadContext<'_>, target: &mut Value) -> Result<()> {
        let arr = match target {
            Value::Array(arr) if arr.rank() == self.rank => arr,
            other => {
                return Err(CodecError::mismatch(self.ty.name(), other.kind_name()));
            }
        };
        if ctx.reader().start_read_collection()? {
            return Err(CodecError::NullPayload {
                type_name: self.ty.name().to_string(),
            });
        }

        // Rank 1 streams against the target length. Higher ranks stage the
        // whole payload so every bound is checked before anything is written.
        let staged = if self.rank == 1 {
            let mut staged = Vec::with_capacity(arr.len());
            read_exact_items(ctx, arr.len(), |ctx, _| {
                staged.push(ctx.read_value(&self.element)?);
                Ok(())
            })?;
            staged
        } else {
            let (dims, items) = self.read_shape(ctx)?;
            Self::check_bounds(arr.dims(), &dims)?;
            items
        };
        for (slot, value) in arr.items_mut().iter_mut().zip(staged) {
            *slot = value;
        }
        Ok(())
    }

    fn children(&self, _registry: &Registry) -> Result<Vec<DescriptorRef>> {
        Ok(vec![self.element.clone()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::format::tape::{TapeReader, TapeWriter, Token};
    use crate::types::TypeInfo;
    use std::sync::Arc;

    fn int_array(registry: &Registry, rank: usize) -> DescriptorRef {
        let int = TypeInfo::primitive(PrimitiveKind::I32);
        let element = registry.get_or_create(&int).expect("int");
        Arc::new(ArrayDescriptor::new(TypeInfo::array(int, rank), element, rank).expect("rank"))
    }

    fn grid(rows: usize, cols: usize) -> Value {
        let items = (0..(rows * cols) as i32).map(Value::I32).collect();
        Value::Array(ArrayValue::new(vec![rows, cols], items).expect("bounds"))
    }

    #[test]
    fn test_rank_four_unsupported() {
        let registry = Registry::new();
        let int = TypeInfo::primitive(PrimitiveKind::I32);
        let element = registry.get_or_create(&int).expect("int");
        let err = ArrayDescriptor::new(TypeInfo::array(int, 4), element, 4).expect_err("rank 4");
        assert!(err.to_string().contains("only up to 3 dimensions"));
    }

    #[test]
    fn test_two_dimensional_frames_rows() {
        let registry = Registry::new();
        let settings = Settings::default();
        let desc = int_array(&registry, 2);

        let mut tape = TapeWriter::new();
        WriteContext::new(&registry, &mut tape, &settings)
            .write_value(&grid(2, 2), &desc)
            .expect("write");
        let tokens = tape.into_tokens();
        assert_eq!(tokens[0], Token::CollectionStart(2));
        assert_eq!(tokens[1], Token::ItemStart(0));
        assert_eq!(tokens[2], Token::CollectionStart(2));

        let mut reader = TapeReader::new(tokens);
        let back = ReadContext::new(&registry, &mut reader, &settings)
            .read_value(&desc)
            .expect("read");
        assert_eq!(back, grid(2, 2));
    }

    #[test]
    fn test_jagged_rows_rejected() {
        let registry = Registry::new();
        let settings = Settings::default();
        let desc = int_array(&registry, 2);
        let row = |values: &[i32]| {
            let mut t = vec![Token::CollectionStart(values.len())];
            for (i, v) in values.iter().enumerate() {
                t.extend([Token::ItemStart(i), Token::Primitive(Value::I32(*v)), Token::ItemEnd]);
            }
            t.push(Token::CollectionEnd);
            t
        };
        let mut tokens = vec![Token::CollectionStart(2), Token::ItemStart(0)];
        tokens.extend(row(&[1, 2]));
        tokens.extend([Token::ItemEnd, Token::ItemStart(1)]);
        tokens.extend(row(&[3]));
        tokens.extend([Token::ItemEnd, Token::CollectionEnd]);

        let mut reader = TapeReader::new(tokens);
        let err = ReadContext::new(&registry, &mut reader, &settings)
            .read_value(&desc)
            .expect_err("jagged");
        assert!(matches!(err, CodecError::MalformedStream(_)));
    }

    #[test]
    fn test_read_into_checks_inner_bound_before_commit() {
        let registry = Registry::new();
        let settings = Settings::default();
        let desc = int_array(&registry, 2);

        let mut tape = TapeWriter::new();
        WriteContext::new(&registry, &mut tape, &settings)
            .write_value(&grid(2, 3), &desc)
            .expect("write");

        let mut target = Value::Array(ArrayValue::filled(vec![2, 2], Value::I32(-1)));
        let before = target.clone();
        let mut reader = TapeReader::new(tape.into_tokens());
        let err = ReadContext::new(&registry, &mut reader, &settings)
            .read_value_into(&desc, &mut target)
            .expect_err("inner bound");
        assert!(matches!(err, CodecError::TooManyElements { expected: 2 }));
        assert_eq!(target, before);
    }

    #[test]
    fn test_three_dimensional_read_into() {
        let registry = Registry::new();
        let settings = Settings::default();
        let desc = int_array(&registry, 3);
        let cube = Value::Array(
            ArrayValue::new(vec![2, 2, 2], (0..8).map(Value::I32).collect()).expect("bounds"),
        );

        let mut tape = TapeWriter::new();
        WriteContext::new(&registry, &mut tape, &settings)
            .write_value(&cube, &desc)
            .expect("write");

        let mut target = Value::Array(ArrayValue::filled(vec![2, 2, 2], Value::I32(0)));
        let mut reader = TapeReader::new(tape.into_tokens());
        ReadContext::new(&registry, &mut reader, &settings)
            .read_value_into(&desc, &mut target)
            .expect("read into");
        assert_eq!(target, cube);
        assert_eq!(
            target.as_array().and_then(|a| a.get(&[1, 0, 1])),
            Some(&Value::I32(5))
        );
    }

    #[test]
    fn test_empty_grid_keeps_inner_bound() {
        let registry = Registry::new();
        let settings = Settings::default();
        let desc = int_array(&registry, 2);
        let empty = Value::Array(ArrayValue::new(vec![0, 5], Vec::new()).expect("bounds"));

        let mut tape = TapeWriter::new();
        WriteContext::new(&registry, &mut tape, &settings)
            .write_value(&empty, &desc)
            .expect("write");
        let tokens = tape.into_tokens();
        assert_eq!(
            tokens,
            vec![
                Token::CollectionStart(3),
                Token::ItemStart(0),
                Token::Null,
                Token::ItemEnd,
                Token::ItemStart(1),
                Token::Primitive(Value::U64(0)),
                Token::ItemEnd,
                Token::ItemStart(2),
                Token::Primitive(Value::U64(5)),
                Token::ItemEnd,
                Token::CollectionEnd,
            ]
        );

        let mut reader = TapeReader::new(tokens.clone());
        let back = ReadContext::new(&registry, &mut reader, &settings)
            .read_value(&desc)
            .expect("read");
        assert_eq!(back, empty);

        let mut narrower = Value::Array(ArrayValue::filled(vec![0, 4], Value::I32(0)));
        let mut reader = TapeReader::new(tokens);
        let err = ReadContext::new(&registry, &mut reader, &settings)
            .read_value_into(&desc, &mut narrower)
            .expect_err("inner bound");
        assert!(matches!(err, CodecError::TooManyElements { expected: 4 }));
    }

    #[test]
    fn test_bounds_record_must_describe_empty_array() {
        let registry = Registry::new();
        let settings = Settings::default();
        let desc = int_array(&registry, 2);
        let mut tokens = vec![
            Token::CollectionStart(3),
            Token::ItemStart(0),
            Token::Null,
            Token::ItemEnd,
        ];
        for (i, bound) in [2u64, 2].into_iter().enumerate() {
            tokens.extend([
                Token::ItemStart(i + 1),
                Token::Primitive(Value::U64(bound)),
                Token::ItemEnd,
            ]);
        }
        tokens.push(Token::CollectionEnd);

        let mut reader = TapeReader::new(tokens);
        let err = ReadContext::new(&registry, &mut reader, &settings)
            .read_value(&desc)
            .expect_err("non-empty bounds");
        assert!(matches!(err, CodecError::MalformedStream(_)));
    }
}
