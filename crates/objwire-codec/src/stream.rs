// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Byte-stream transport seam.
//!
//! The field codec never touches sockets or files. It talks to a
//! [`DataOutput`] / [`DataInput`] pair that can write and read raw bytes and
//! little-endian scalars, flush, and report end-of-stream. Framing beyond the
//! codec's own tag bytes and length prefixes is the transport's business.

use crate::CodecError;

/// Sink for raw bytes and little-endian scalars.
pub trait DataOutput {
    /// Write raw bytes.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), CodecError>;

    /// Push buffered bytes to the underlying transport.
    fn flush(&mut self) -> Result<(), CodecError> {
        Ok(())
    }

    /// Write a single byte.
    fn write_u8(&mut self, value: u8) -> Result<(), CodecError> {
        self.write_bytes(&[value])
    }

    /// Write a little-endian i16.
    fn write_i16_le(&mut self, value: i16) -> Result<(), CodecError> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Write a little-endian i32.
    fn write_i32_le(&mut self, value: i32) -> Result<(), CodecError> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Write a little-endian u32.
    fn write_u32_le(&mut self, value: u32) -> Result<(), CodecError> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Write a little-endian i64.
    fn write_i64_le(&mut self, value: i64) -> Result<(), CodecError> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Write a little-endian f32 (IEEE-754 bits).
    fn write_f32_le(&mut self, value: f32) -> Result<(), CodecError> {
        self.write_bytes(&value.to_bits().to_le_bytes())
    }

    /// Write a little-endian f64 (IEEE-754 bits).
    fn write_f64_le(&mut self, value: f64) -> Result<(), CodecError> {
        self.write_bytes(&value.to_bits().to_le_bytes())
    }
}

/// Source of raw bytes and little-endian scalars.
pub trait DataInput {
    /// Fill `buf` completely or fail with [`CodecError::OutOfBounds`].
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), CodecError>;

    /// Returns `true` once every byte has been consumed.
    fn is_at_end(&self) -> bool;

    /// Bytes left, when the transport knows. Used to reject absurd length
    /// prefixes before allocating.
    fn remaining(&self) -> Option<usize> {
        None
    }

    /// Read `len` raw bytes.
    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, CodecError> {
        if self.remaining().is_some_and(|left| left < len) {
            return Err(CodecError::OutOfBounds);
        }
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read a single byte.
    fn read_u8(&mut self) -> Result<u8, CodecError> {
        let mut raw = [0u8; 1];
        self.read_exact(&mut raw)?;
        Ok(raw[0])
    }

    /// Read a little-endian i16.
    fn read_i16_le(&mut self) -> Result<i16, CodecError> {
        let mut raw = [0u8; 2];
        self.read_exact(&mut raw)?;
        Ok(i16::from_le_bytes(raw))
    }

    /// Read a little-endian i32.
    fn read_i32_le(&mut self) -> Result<i32, CodecError> {
        let mut raw = [0u8; 4];
        self.read_exact(&mut raw)?;
        Ok(i32::from_le_bytes(raw))
    }

    /// Read a little-endian u32.
    fn read_u32_le(&mut self) -> Result<u32, CodecError> {
        let mut raw = [0u8; 4];
        self.read_exact(&mut raw)?;
        Ok(u32::from_le_bytes(raw))
    }

    /// Read a little-endian i64.
    fn read_i64_le(&mut self) -> Result<i64, CodecError> {
        let mut raw = [0u8; 8];
        self.read_exact(&mut raw)?;
        Ok(i64::from_le_bytes(raw))
    }

    /// Read a little-endian f32.
    fn read_f32_le(&mut self) -> Result<f32, CodecError> {
        let mut raw = [0u8; 4];
        self.read_exact(&mut raw)?;
        Ok(f32::from_bits(u32::from_le_bytes(raw)))
    }

    /// Read a little-endian f64.
    fn read_f64_le(&mut self) -> Result<f64, CodecError> {
        let mut raw = [0u8; 8];
        self.read_exact(&mut raw)?;
        Ok(f64::from_bits(u64::from_le_bytes(raw)))
    }
}

impl DataOutput for Vec<u8> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// In-memory [`DataInput`] over a borrowed byte slice.
#[derive(Debug)]
pub struct SliceInput<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> SliceInput<'a> {
    /// Create an input positioned at the first byte.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Current read offset.
    pub fn position(&self) -> usize {
        self.offset
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let end = self
            .offset
            .checked_add(len)
            .ok_or(CodecError::OutOfBounds)?;
        if end > self.bytes.len() {
            return Err(CodecError::OutOfBounds);
        }
        let out = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(out)
    }
}

impl DataInput for SliceInput<'_> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), CodecError> {
        let chunk = self.take(buf.len())?;
        buf.copy_from_slice(chunk);
        Ok(())
    }

    fn is_at_end(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    fn remaining(&self) -> Option<usize> {
        Some(self.bytes.len().saturating_sub(self.offset))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn scalars_round_trip_little_endian() {
        let mut out = Vec::new();
        out.write_i16_le(-2).unwrap();
        out.write_i32_le(42).unwrap();
        out.write_i64_le(-123).unwrap();
        out.write_f64_le(1.5).unwrap();
        assert_eq!(&out[0..2], &(-2i16).to_le_bytes());

        let mut input = SliceInput::new(&out);
        assert_eq!(input.read_i16_le().unwrap(), -2);
        assert_eq!(input.read_i32_le().unwrap(), 42);
        assert_eq!(input.read_i64_le().unwrap(), -123);
        assert!((input.read_f64_le().unwrap() - 1.5).abs() < f64::EPSILON);
        assert!(input.is_at_end());
    }

    #[test]
    fn short_input_reports_out_of_bounds() {
        let bytes = [1u8, 2];
        let mut input = SliceInput::new(&bytes);
        assert_eq!(input.read_i32_le(), Err(CodecError::OutOfBounds));
    }

    #[test]
    fn read_bytes_rejects_length_beyond_remaining() {
        let bytes = [0u8; 4];
        let mut input = SliceInput::new(&bytes);
        assert_eq!(input.read_bytes(1 << 30), Err(CodecError::OutOfBounds));
        assert_eq!(input.position(), 0);
    }
}
