// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Payload encodings for the self-describing primitive kinds.

use crate::kind::FieldKind;
use crate::stream::{DataInput, DataOutput};
use crate::CodecError;

/// A value with a fixed primitive wire form.
///
/// `put`/`get` handle the payload only; the tag byte is the writer's job.
pub trait Primitive: Sized {
    /// Kind written in the tag byte of a single value.
    const KIND: FieldKind;
    /// Kind written in the tag byte of an array of this primitive.
    const ARRAY_KIND: FieldKind;

    /// Write the payload.
    fn put(&self, out: &mut dyn DataOutput) -> Result<(), CodecError>;

    /// Read the payload. `max_len` bounds variable-length payloads.
    fn get(input: &mut dyn DataInput, max_len: usize) -> Result<Self, CodecError>;
}

/// Write a four-byte element count.
pub(crate) fn put_len(out: &mut dyn DataOutput, len: usize) -> Result<(), CodecError> {
    let len = i32::try_from(len).map_err(|_| CodecError::LengthTooLarge {
        len,
        max: i32::MAX as usize,
    })?;
    out.write_i32_le(len)
}

/// Read a four-byte element count and check it against `max_len`.
pub(crate) fn get_len(input: &mut dyn DataInput, max_len: usize) -> Result<usize, CodecError> {
    let raw = input.read_i32_le()?;
    let len = usize::try_from(raw).map_err(|_| CodecError::NegativeLength(raw))?;
    if len > max_len {
        return Err(CodecError::LengthTooLarge { len, max: max_len });
    }
    Ok(len)
}

/// Write a length-prefixed UTF-8 string without a tag byte.
pub(crate) fn put_str(out: &mut dyn DataOutput, value: &str) -> Result<(), CodecError> {
    put_len(out, value.len())?;
    out.write_bytes(value.as_bytes())
}

/// Read a length-prefixed UTF-8 string without a tag byte.
pub(crate) fn get_str(input: &mut dyn DataInput, max_len: usize) -> Result<String, CodecError> {
    let len = get_len(input, max_len)?;
    let bytes = input.read_bytes(len)?;
    String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)
}

impl Primitive for bool {
    const KIND: FieldKind = FieldKind::Boolean;
    const ARRAY_KIND: FieldKind = FieldKind::BooleanArray;

    fn put(&self, out: &mut dyn DataOutput) -> Result<(), CodecError> {
        out.write_u8(u8::from(*self))
    }

    fn get(input: &mut dyn DataInput, _max_len: usize) -> Result<Self, CodecError> {
        Ok(input.read_u8()? != 0)
    }
}

impl Primitive for i8 {
    const KIND: FieldKind = FieldKind::Byte;
    const ARRAY_KIND: FieldKind = FieldKind::ByteArray;

    fn put(&self, out: &mut dyn DataOutput) -> Result<(), CodecError> {
        out.write_bytes(&self.to_le_bytes())
    }

    fn get(input: &mut dyn DataInput, _max_len: usize) -> Result<Self, CodecError> {
        Ok(i8::from_le_bytes([input.read_u8()?]))
    }
}

impl Primitive for i16 {
    const KIND: FieldKind = FieldKind::Short;
    const ARRAY_KIND: FieldKind = FieldKind::ShortArray;

    fn put(&self, out: &mut dyn DataOutput) -> Result<(), CodecError> {
        out.write_i16_le(*self)
    }

    fn get(input: &mut dyn DataInput, _max_len: usize) -> Result<Self, CodecError> {
        input.read_i16_le()
    }
}

impl Primitive for i32 {
    const KIND: FieldKind = FieldKind::Int;
    const ARRAY_KIND: FieldKind = FieldKind::IntArray;

    fn put(&self, out: &mut dyn DataOutput) -> Result<(), CodecError> {
        out.write_i32_le(*self)
    }

    fn get(input: &mut dyn DataInput, _max_len: usize) -> Result<Self, CodecError> {
        input.read_i32_le()
    }
}

impl Primitive for i64 {
    const KIND: FieldKind = FieldKind::Long;
    const ARRAY_KIND: FieldKind = FieldKind::LongArray;

    fn put(&self, out: &mut dyn DataOutput) -> Result<(), CodecError> {
        out.write_i64_le(*self)
    }

    fn get(input: &mut dyn DataInput, _max_len: usize) -> Result<Self, CodecError> {
        input.read_i64_le()
    }
}

impl Primitive for char {
    const KIND: FieldKind = FieldKind::Char;
    const ARRAY_KIND: FieldKind = FieldKind::CharArray;

    fn put(&self, out: &mut dyn DataOutput) -> Result<(), CodecError> {
        out.write_u32_le(u32::from(*self))
    }

    fn get(input: &mut dyn DataInput, _max_len: usize) -> Result<Self, CodecError> {
        let raw = input.read_u32_le()?;
        char::from_u32(raw).ok_or(CodecError::InvalidChar(raw))
    }
}

impl Primitive for f32 {
    const KIND: FieldKind = FieldKind::Float;
    const ARRAY_KIND: FieldKind = FieldKind::FloatArray;

    fn put(&self, out: &mut dyn DataOutput) -> Result<(), CodecError> {
        out.write_f32_le(*self)
    }

    fn get(input: &mut dyn DataInput, _max_len: usize) -> Result<Self, CodecError> {
        input.read_f32_le()
    }
}

impl Primitive for f64 {
    const KIND: FieldKind = FieldKind::Double;
    const ARRAY_KIND: FieldKind = FieldKind::DoubleArray;

    fn put(&self, out: &mut dyn DataOutput) -> Result<(), CodecError> {
        out.write_f64_le(*self)
    }

    fn get(input: &mut dyn DataInput, _max_len: usize) -> Result<Self, CodecError> {
        input.read_f64_le()
    }
}

impl Primitive for String {
    const KIND: FieldKind = FieldKind::String;
    const ARRAY_KIND: FieldKind = FieldKind::StringArray;

    fn put(&self, out: &mut dyn DataOutput) -> Result<(), CodecError> {
        put_str(out, self)
    }

    fn get(input: &mut dyn DataInput, max_len: usize) -> Result<Self, CodecError> {
        get_str(input, max_len)
    }
}
