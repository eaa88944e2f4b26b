// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Read cursor and growable writer for the graphser wire format.
//!
//! All integers are little-endian; strings and byte blobs are prefixed by a
//! `u32` length.

use super::{WireError, WireResult};

/// Generate read methods for little-endian primitives.
///
/// Each generated method checks bounds (returns `WireError::ReadFailed` with
/// the current offset on overflow), decodes `from_le_bytes` and advances.
macro_rules! impl_read_le {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> WireResult<$type> {
            let mut bytes = [0u8; $size];
            bytes.copy_from_slice(self.read_bytes($size)?);
            Ok(<$type>::from_le_bytes(bytes))
        }
    };
}

/// Generate write methods for little-endian primitives.
macro_rules! impl_write_le {
    ($name:ident, $type:ty) => {
        pub fn $name(&mut self, value: $type) {
            self.buffer.extend_from_slice(&value.to_le_bytes());
        }
    };
}

/// Immutable cursor for reading (bounds-checked, zero-copy).
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    impl_read_le!(read_u32_le, u32, 4);
    impl_read_le!(read_i32_le, i32, 4);
    impl_read_le!(read_i64_le, i64, 8);
    impl_read_le!(read_u64_le, u64, 8);

    pub fn read_u8(&mut self) -> WireResult<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_f64_le(&mut self) -> WireResult<f64> {
        Ok(f64::from_bits(self.read_u64_le()?))
    }

    pub fn read_bool(&mut self) -> WireResult<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(WireError::InvalidData {
                offset: self.offset - 1,
                reason: format!("invalid boolean byte {:#04x}", other),
            }),
        }
    }

    pub fn read_bytes(&mut self, len: usize) -> WireResult<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.buffer.len())
            .ok_or_else(|| WireError::ReadFailed {
                offset: self.offset,
                reason: "unexpected end of buffer".into(),
            })?;
        let slice = &self.buffer[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    /// Read a `u32` length prefix.
    ///
    /// The length is checked against the remaining bytes scaled by the
    /// smallest possible element size, so a forged prefix cannot drive a
    /// huge allocation.
    pub fn read_len(&mut self, min_element_size: usize) -> WireResult<usize> {
        let start = self.offset;
        let len = self.read_u32_le()? as usize;
        if len.saturating_mul(min_element_size.max(1)) > self.remaining() {
            return Err(WireError::InvalidData {
                offset: start,
                reason: format!(
                    "length {} exceeds remaining {} bytes",
                    len,
                    self.remaining()
                ),
            });
        }
        Ok(len)
    }

    pub fn read_blob(&mut self) -> WireResult<&'a [u8]> {
        let len = self.read_len(1)?;
        self.read_bytes(len)
    }

    pub fn read_str(&mut self) -> WireResult<&'a str> {
        let start = self.offset;
        let bytes = self.read_blob()?;
        std::str::from_utf8(bytes).map_err(|e| WireError::InvalidData {
            offset: start,
            reason: format!("invalid UTF-8: {}", e),
        })
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    pub fn is_eof(&self) -> bool {
        self.offset >= self.buffer.len()
    }
}

/// Growable writer; writes cannot fail except for length prefixes beyond `u32::MAX`.
#[derive(Debug, Default, Clone)]
pub struct Writer {
    buffer: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    impl_write_le!(write_u32_le, u32);
    impl_write_le!(write_i32_le, i32);
    impl_write_le!(write_i64_le, i64);
    impl_write_le!(write_u64_le, u64);

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buffer.push(u8::from(value));
    }

    pub fn write_f64_le(&mut self, value: f64) {
        self.write_u64_le(value.to_bits());
    }

    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    pub fn write_len(&mut self, len: usize) -> WireResult<()> {
        let len = u32::try_from(len).map_err(|_| WireError::LengthOverflow { len })?;
        self.write_u32_le(len);
        Ok(())
    }

    pub fn write_blob(&mut self, data: &[u8]) -> WireResult<()> {
        self.write_len(data.len())?;
        self.write_bytes(data);
        Ok(())
    }

    pub fn write_str(&mut self, value: &str) -> WireResult<()> {
        self.write_blob(value.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_U32: u32 = 0x1234_5678;
    const TEST_I64: i64 = -0x1122_3344_5566_7788;

    #[test]
    fn test_cursor_read_overflow_reports_offset() {
        let buffer = [0u8; 1];
        let mut cursor = Cursor::new(&buffer);
        assert_eq!(cursor.read_u8().expect("Read u8 should succeed"), 0);

        let err = cursor.read_u8().unwrap_err();
        match err {
            WireError::ReadFailed { offset, reason } => {
                assert_eq!(offset, 1);
                assert_eq!(reason, "unexpected end of buffer");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_roundtrip_across_numeric_types() {
        let mut writer = Writer::new();
        writer.write_u8(0xAB);
        writer.write_u32_le(TEST_U32);
        writer.write_i32_le(-42);
        writer.write_i64_le(TEST_I64);
        writer.write_f64_le(6.25);
        writer.write_bool(true);
        writer.write_str("graph").expect("write str");

        let bytes = writer.into_bytes();
        let mut reader = Cursor::new(&bytes);
        assert_eq!(reader.read_u8().unwrap(), 0xAB);
        assert_eq!(reader.read_u32_le().unwrap(), TEST_U32);
        assert_eq!(reader.read_i32_le().unwrap(), -42);
        assert_eq!(reader.read_i64_le().unwrap(), TEST_I64);
        assert!((reader.read_f64_le().unwrap() - 6.25).abs() < f64::EPSILON);
        assert!(reader.read_bool().unwrap());
        assert_eq!(reader.read_str().unwrap(), "graph");
        assert!(reader.is_eof());
    }

    #[test]
    fn test_forged_length_rejected_before_allocation() {
        let mut writer = Writer::new();
        writer.write_u32_le(u32::MAX);
        writer.write_bytes(b"abc");
        let bytes = writer.into_bytes();

        let mut reader = Cursor::new(&bytes);
        let err = reader.read_len(1).unwrap_err();
        assert!(matches!(err, WireError::InvalidData { offset: 0, .. }));
    }

    #[test]
    fn test_invalid_bool_and_utf8() {
        let mut reader = Cursor::new(&[2u8]);
        assert!(matches!(
            reader.read_bool(),
            Err(WireError::InvalidData { offset: 0, .. })
        ));

        let mut writer = Writer::new();
        writer.write_blob(&[0xff, 0xfe]).unwrap();
        let bytes = writer.into_bytes();
        let mut reader = Cursor::new(&bytes);
        assert!(reader.read_str().is_err());
    }
}
