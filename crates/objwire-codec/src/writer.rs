// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tag-prefixed field writer.

use serde::Serialize;
use tracing::trace;

use crate::encodable::Encodable;
use crate::kind::FieldKind;
use crate::primitive::{put_len, put_str, Primitive};
use crate::stream::DataOutput;
use crate::{CodecError, FieldCodec};

/// Writes tagged fields to a [`DataOutput`].
///
/// Every call emits one tag byte. A `None` value emits the tag with the null
/// bit set and nothing else.
pub struct FieldWriter<'a> {
    codec: &'a FieldCodec,
    out: &'a mut dyn DataOutput,
}

impl<'a> FieldWriter<'a> {
    /// Writer over `out` using the tag table and registry of `codec`.
    pub fn new(codec: &'a FieldCodec, out: &'a mut dyn DataOutput) -> Self {
        Self { codec, out }
    }

    /// Codec this writer belongs to.
    pub fn codec(&self) -> &'a FieldCodec {
        self.codec
    }

    fn tag(&mut self, kind: FieldKind, is_null: bool) -> Result<(), CodecError> {
        let byte = self.codec.kinds().tag_byte(kind, is_null)?;
        trace!(?kind, is_null, byte, "write tag");
        self.out.write_u8(byte)
    }

    /// Write a nullable primitive.
    pub fn write_primitive<P: Primitive>(&mut self, value: Option<&P>) -> Result<(), CodecError> {
        match value {
            None => self.tag(P::KIND, true),
            Some(v) => {
                self.tag(P::KIND, false)?;
                v.put(self.out)
            }
        }
    }

    /// Write a nullable array; each element goes through the per-element
    /// primitive writer so null elements carry their own tag.
    pub fn write_array<P: Primitive>(
        &mut self,
        values: Option<&[Option<P>]>,
    ) -> Result<(), CodecError> {
        let Some(values) = values else {
            return self.tag(P::ARRAY_KIND, true);
        };
        self.tag(P::ARRAY_KIND, false)?;
        put_len(self.out, values.len())?;
        for value in values {
            self.write_primitive(value.as_ref())?;
        }
        Ok(())
    }

    /// Write an array whose elements are all present.
    pub fn write_dense_array<P: Primitive>(&mut self, values: &[P]) -> Result<(), CodecError> {
        self.tag(P::ARRAY_KIND, false)?;
        put_len(self.out, values.len())?;
        for value in values {
            self.write_primitive(Some(value))?;
        }
        Ok(())
    }

    /// Write a non-null `bool`.
    pub fn write_bool(&mut self, value: bool) -> Result<(), CodecError> {
        self.write_primitive(Some(&value))
    }

    /// Write a non-null `i8`.
    pub fn write_byte(&mut self, value: i8) -> Result<(), CodecError> {
        self.write_primitive(Some(&value))
    }

    /// Write a non-null `i16`.
    pub fn write_short(&mut self, value: i16) -> Result<(), CodecError> {
        self.write_primitive(Some(&value))
    }

    /// Write a non-null `i32`.
    pub fn write_int(&mut self, value: i32) -> Result<(), CodecError> {
        self.write_primitive(Some(&value))
    }

    /// Write a non-null `i64`.
    pub fn write_long(&mut self, value: i64) -> Result<(), CodecError> {
        self.write_primitive(Some(&value))
    }

    /// Write a non-null `char`.
    pub fn write_char(&mut self, value: char) -> Result<(), CodecError> {
        self.write_primitive(Some(&value))
    }

    /// Write a non-null `f32`.
    pub fn write_float(&mut self, value: f32) -> Result<(), CodecError> {
        self.write_primitive(Some(&value))
    }

    /// Write a non-null `f64`.
    pub fn write_double(&mut self, value: f64) -> Result<(), CodecError> {
        self.write_primitive(Some(&value))
    }

    /// Write a nullable string without requiring an owned `String`.
    pub fn write_string(&mut self, value: Option<&str>) -> Result<(), CodecError> {
        match value {
            None => self.tag(FieldKind::String, true),
            Some(s) => {
                self.tag(FieldKind::String, false)?;
                put_str(self.out, s)
            }
        }
    }

    /// Write a nullable nested encodable: tag, wire type name, payload.
    pub fn write_encodable(&mut self, value: Option<&dyn Encodable>) -> Result<(), CodecError> {
        let Some(value) = value else {
            return self.tag(FieldKind::Encodable, true);
        };
        self.tag(FieldKind::Encodable, false)?;
        put_str(self.out, value.type_name())?;
        value.encode(self)
    }

    /// Write a nullable array of nullable encodables.
    pub fn write_encodable_array<E: Encodable>(
        &mut self,
        values: Option<&[E]>,
    ) -> Result<(), CodecError> {
        let Some(values) = values else {
            return self.tag(FieldKind::EncodableArray, true);
        };
        self.tag(FieldKind::EncodableArray, false)?;
        put_len(self.out, values.len())?;
        for value in values {
            self.write_encodable(Some(value))?;
        }
        Ok(())
    }

    /// Write a nullable value with no custom wire form as a CBOR blob.
    pub fn write_blob<T: Serialize>(&mut self, value: Option<&T>) -> Result<(), CodecError> {
        let Some(value) = value else {
            return self.tag(FieldKind::Blob, true);
        };
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(value, &mut bytes)
            .map_err(|e| CodecError::Blob(e.to_string()))?;
        self.tag(FieldKind::Blob, false)?;
        put_len(self.out, bytes.len())?;
        self.out.write_bytes(&bytes)
    }

    /// Write raw bytes with no tag (for callers that frame their own data).
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.out.write_bytes(bytes)
    }

    /// Flush the underlying output.
    pub fn flush(&mut self) -> Result<(), CodecError> {
        self.out.flush()
    }
}
