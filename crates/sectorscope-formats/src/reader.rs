//! Cursor-based little-endian reader over a bounded window of a byte buffer.

use sectorscope_core::constants::NULL_STRING_LIMIT;

use crate::error::{DecodeError, DecodeResult};

/// Little-endian reader over `buffer[start..start + len]`.
///
/// Positions are relative to the window start. Every read either advances
/// the cursor by exactly the width of the value or fails with
/// [`DecodeError::OutOfRange`] without touching bytes outside the window.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buffer: &'a [u8],
    start: usize,
    len: usize,
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Reader over the whole buffer.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self::window(buffer, 0, buffer.len())
    }

    /// Reader over `len` bytes starting at `offset`. The window is clamped to
    /// the buffer's own bounds.
    pub fn window(buffer: &'a [u8], offset: usize, len: usize) -> Self {
        let start = offset.min(buffer.len());
        let len = len.min(buffer.len() - start);
        Self {
            buffer,
            start,
            len,
            pos: 0,
        }
    }

    /// Length of the window in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Cursor position relative to the window start.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move the cursor. Positions past the end of the window are rejected.
    pub fn set_position(&mut self, position: usize) -> DecodeResult<()> {
        if position > self.len {
            return Err(DecodeError::OutOfRange {
                position,
                needed: 0,
                len: self.len,
            });
        }
        self.pos = position;
        Ok(())
    }

    /// Advance the cursor by `count` bytes.
    pub fn skip(&mut self, count: usize) -> DecodeResult<()> {
        self.take(count).map(|_| ())
    }

    /// Bytes left between the cursor and the end of the window.
    pub fn remaining(&self) -> usize {
        self.len - self.pos
    }

    /// Whether the cursor reached the end of the window.
    pub fn is_eof(&self) -> bool {
        self.pos >= self.len
    }

    fn take(&mut self, count: usize) -> DecodeResult<&'a [u8]> {
        let end = self.pos.checked_add(count).filter(|&end| end <= self.len);
        let Some(end) = end else {
            return Err(DecodeError::OutOfRange {
                position: self.pos,
                needed: count,
                len: self.len,
            });
        };
        let bytes = &self.buffer[self.start + self.pos..self.start + end];
        self.pos = end;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> DecodeResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> DecodeResult<u8> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> DecodeResult<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> DecodeResult<u16> {
        Ok(u16::from_le_bytes(self.take_array()?))
    }

    pub fn read_i16(&mut self) -> DecodeResult<i16> {
        Ok(i16::from_le_bytes(self.take_array()?))
    }

    /// Three-byte little-endian unsigned integer.
    pub fn read_u24(&mut self) -> DecodeResult<u32> {
        let [b0, b1, b2] = self.take_array()?;
        Ok(u32::from_le_bytes([b0, b1, b2, 0]))
    }

    pub fn read_u32(&mut self) -> DecodeResult<u32> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    pub fn read_i32(&mut self) -> DecodeResult<i32> {
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    pub fn read_f32(&mut self) -> DecodeResult<f32> {
        Ok(f32::from_le_bytes(self.take_array()?))
    }

    /// Borrow the next `count` raw bytes.
    pub fn read_bytes(&mut self, count: usize) -> DecodeResult<&'a [u8]> {
        self.take(count)
    }

    /// Fixed-length string: always consumes `length` bytes, truncated at the
    /// first null byte.
    pub fn read_fixed_string(&mut self, length: usize) -> DecodeResult<String> {
        let bytes = self.take(length)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(bytes[..end].iter().map(|&b| b as char).collect())
    }

    /// Null-terminated string, scanning at most [`NULL_STRING_LIMIT`] bytes.
    pub fn read_null_string(&mut self) -> DecodeResult<String> {
        let mut out = String::new();
        for _ in 0..NULL_STRING_LIMIT {
            let byte = self.read_u8()?;
            if byte == 0 {
                break;
            }
            out.push(byte as char);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reads_little_endian() {
        let data = [
            0x01, 0x34, 0x12, 0xFE, 0xFF, 0x78, 0x56, 0x34, 0x12, 0x00, 0x00, 0x80, 0x3F,
        ];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.read_u8().unwrap(), 1);
        assert_eq!(r.read_u16().unwrap(), 0x1234);
        assert_eq!(r.read_i16().unwrap(), -2);
        assert_eq!(r.read_u32().unwrap(), 0x1234_5678);
        assert_eq!(r.read_f32().unwrap(), 1.0);
        assert!(r.is_eof());
    }

    #[test]
    fn test_window_is_relative_and_bounded() {
        let data = [9, 9, 1, 2, 3, 9];
        let mut r = ByteReader::window(&data, 2, 3);
        assert_eq!(r.len(), 3);
        assert_eq!(r.read_bytes(3).unwrap(), &[1, 2, 3]);
        assert!(matches!(
            r.read_u8(),
            Err(DecodeError::OutOfRange { position: 3, needed: 1, len: 3 })
        ));

        r.set_position(1).unwrap();
        assert_eq!(r.read_u8().unwrap(), 2);
        assert!(r.set_position(4).is_err());
    }

    #[test]
    fn test_window_clamped_to_buffer() {
        let data = [1, 2, 3];
        let r = ByteReader::window(&data, 1, 100);
        assert_eq!(r.len(), 2);
        let r = ByteReader::window(&data, 10, 5);
        assert!(r.is_empty());
    }

    #[test]
    fn test_failed_read_does_not_advance() {
        let data = [1, 2, 3];
        let mut r = ByteReader::new(&data);
        r.read_u8().unwrap();
        assert!(r.read_u32().is_err());
        assert_eq!(r.position(), 1);
        assert_eq!(r.read_u16().unwrap(), 0x0302);
    }

    #[test]
    fn test_fixed_string_truncates_at_null() {
        let data = b"TILES000.ART\0\0\0\0rest";
        let mut r = ByteReader::new(data);
        assert_eq!(r.read_fixed_string(16).unwrap(), "TILES000.ART");
        assert_eq!(r.position(), 16);
    }

    #[test]
    fn test_null_string() {
        let data = b"E1L1.MAP\0X";
        let mut r = ByteReader::new(data);
        assert_eq!(r.read_null_string().unwrap(), "E1L1.MAP");
        assert_eq!(r.read_u8().unwrap(), b'X');
    }

    #[test]
    fn test_null_string_limit() {
        let data = vec![b'a'; 2000];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.read_null_string().unwrap().len(), NULL_STRING_LIMIT);
        assert_eq!(r.position(), NULL_STRING_LIMIT);
    }

    #[test]
    fn test_read_u24() {
        let data = [0x01, 0x02, 0x03];
        assert_eq!(ByteReader::new(&data).read_u24().unwrap(), 0x030201);
    }

    proptest! {
        #[test]
        fn prop_reads_advance_by_width(data in proptest::collection::vec(any::<u8>(), 0..64), op in 0usize..7) {
            let mut r = ByteReader::new(&data);
            let width = [1, 1, 2, 2, 4, 4, 4][op];
            let result = match op {
                0 => r.read_u8().map(|_| ()),
                1 => r.read_i8().map(|_| ()),
                2 => r.read_u16().map(|_| ()),
                3 => r.read_i16().map(|_| ()),
                4 => r.read_u32().map(|_| ()),
                5 => r.read_i32().map(|_| ()),
                _ => r.read_f32().map(|_| ()),
            };
            if data.len() >= width {
                prop_assert!(result.is_ok());
                prop_assert_eq!(r.position(), width);
            } else {
                let is_out_of_range = matches!(result, Err(DecodeError::OutOfRange { .. }));
                prop_assert!(is_out_of_range);
                prop_assert_eq!(r.position(), 0);
            }
        }
    }
}
