// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Little-endian byte cursors for the binary format.

use crate::error::{CodecError, Result};

/// Generate append methods for primitive types.
macro_rules! impl_put_le {
    ($name:ident, $type:ty) => {
        pub fn $name(&mut self, value: $type) {
            self.buffer.extend_from_slice(&value.to_le_bytes());
        }
    };
}

/// Generate read methods for primitive types.
///
/// Each generated method checks bounds (`MalformedStream` on overflow),
/// decodes via `from_le_bytes()` and advances the offset.
macro_rules! impl_read_le {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> Result<$type> {
            let bytes = self.take($size)?;
            let mut raw = [0u8; $size];
            raw.copy_from_slice(bytes);
            Ok(<$type>::from_le_bytes(raw))
        }
    };
}

/// Growable output buffer.
#[derive(Debug, Default)]
pub struct Encoder {
    buffer: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    impl_put_le!(put_u8, u8);
    impl_put_le!(put_i8, i8);
    impl_put_le!(put_u16, u16);
    impl_put_le!(put_i16, i16);
    impl_put_le!(put_u32, u32);
    impl_put_le!(put_i32, i32);
    impl_put_le!(put_u64, u64);
    impl_put_le!(put_i64, i64);

    pub fn put_f32(&mut self, value: f32) {
        self.put_u32(value.to_bits());
    }

    pub fn put_f64(&mut self, value: f64) {
        self.put_u64(value.to_bits());
    }

    /// Length (`u32`) followed by the raw bytes.
    pub fn put_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.put_len(data.len())?;
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    pub fn put_str(&mut self, s: &str) -> Result<()> {
        self.put_bytes(s.as_bytes())
    }

    pub fn put_len(&mut self, len: usize) -> Result<()> {
        let len = u32::try_from(len)
            .map_err(|_| CodecError::malformed(format!("length {} exceeds u32", len)))?;
        self.put_u32(len);
        Ok(())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

/// Read cursor over a byte slice (bounds-checked, zero-copy).
pub struct Cursor<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    impl_read_le!(read_u8, u8, 1);
    impl_read_le!(read_i8, i8, 1);
    impl_read_le!(read_u16, u16, 2);
    impl_read_le!(read_i16, i16, 2);
    impl_read_le!(read_u32, u32, 4);
    impl_read_le!(read_i32, i32, 4);
    impl_read_le!(read_u64, u64, 8);
    impl_read_le!(read_i64, i64, 8);

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    pub fn read_len(&mut self) -> Result<usize> {
        Ok(self.read_u32()? as usize)
    }

    pub fn read_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_len()?;
        self.take(len)
    }

    pub fn read_string(&mut self) -> Result<String> {
        let start = self.offset;
        let bytes = self.read_bytes()?;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|e| CodecError::malformed(format!("invalid UTF-8 at offset {}: {}", start, e)))
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(CodecError::malformed(format!(
                "unexpected end of buffer at offset {} (need {} bytes, {} left)",
                self.offset,
                len,
                self.remaining()
            )));
        }
        let bytes = &self.buffer[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_le_layout() {
        let mut enc = Encoder::new();
        enc.put_u32(0x0403_0201);
        enc.put_i16(-2);
        assert_eq!(enc.into_bytes(), vec![1, 2, 3, 4, 0xFE, 0xFF]);
    }

    #[test]
    fn test_read_bounds() {
        let data = [3u8, 0, 0, 0, b'a', b'b'];
        let mut cursor = Cursor::new(&data);
        assert!(matches!(
            cursor.read_string(),
            Err(CodecError::MalformedStream(_))
        ));

        let mut cursor = Cursor::new(&data[..2]);
        assert!(cursor.read_u32().is_err());
        assert_eq!(cursor.read_u16().expect("u16"), 3);
        assert_eq!(cursor.remaining(), 0);
    }
}
