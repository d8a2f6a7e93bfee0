// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tag-verifying field reader.

use std::any::type_name;

use serde::de::DeserializeOwned;
use tracing::trace;

use crate::encodable::Encodable;
use crate::kind::FieldKind;
use crate::primitive::{get_len, get_str, Primitive};
use crate::stream::DataInput;
use crate::{CodecError, FieldCodec};

/// Reads tagged fields from a [`DataInput`].
///
/// Self-describing kinds are checked against the kind the caller asks for;
/// a mismatch is [`CodecError::TagMismatch`]. Opaque kinds
/// ([`FieldKind::Encodable`], [`FieldKind::Blob`]) are verified by their own
/// header instead.
pub struct FieldReader<'a> {
    codec: &'a FieldCodec,
    input: &'a mut dyn DataInput,
    depth: usize,
}

impl<'a> FieldReader<'a> {
    /// Reader over `input` using the tag table and registry of `codec`.
    pub fn new(codec: &'a FieldCodec, input: &'a mut dyn DataInput) -> Self {
        Self {
            codec,
            input,
            depth: 0,
        }
    }

    /// Codec this reader belongs to.
    pub fn codec(&self) -> &'a FieldCodec {
        self.codec
    }

    /// Returns `true` once the input is exhausted.
    pub fn is_at_end(&self) -> bool {
        self.input.is_at_end()
    }

    /// Bytes left in the input, when known.
    pub fn remaining(&self) -> Option<usize> {
        self.input.remaining()
    }

    /// Read a tag byte and return `(kind, is_null)`.
    ///
    /// For a self-describing `expected` kind the tag must name exactly that
    /// kind. For an opaque `expected` kind any opaque tag is accepted and the
    /// caller dispatches on the kind returned.
    pub fn read_tag(&mut self, expected: FieldKind) -> Result<(FieldKind, bool), CodecError> {
        let byte = self.input.read_u8()?;
        let (found, is_null) = self.codec.kinds().split(byte)?;
        trace!(?expected, ?found, is_null, "read tag");
        let accepted = if expected.is_self_describing() {
            found == expected
        } else {
            !found.is_self_describing()
        };
        if !accepted {
            return Err(CodecError::TagMismatch { expected, found });
        }
        Ok((found, is_null))
    }

    /// Read a nullable primitive.
    pub fn read_primitive<P: Primitive>(&mut self) -> Result<Option<P>, CodecError> {
        let (_, is_null) = self.read_tag(P::KIND)?;
        if is_null {
            return Ok(None);
        }
        P::get(self.input, self.codec.max_length()).map(Some)
    }

    fn require<P: Primitive>(&mut self) -> Result<P, CodecError> {
        self.read_primitive::<P>()?
            .ok_or(CodecError::UnexpectedNull(P::KIND))
    }

    /// Read a nullable array of nullable elements.
    pub fn read_array<P: Primitive>(&mut self) -> Result<Option<Vec<Option<P>>>, CodecError> {
        let (_, is_null) = self.read_tag(P::ARRAY_KIND)?;
        if is_null {
            return Ok(None);
        }
        let len = get_len(self.input, self.codec.max_length())?;
        let mut out = Vec::with_capacity(len.min(self.remaining().unwrap_or(len)));
        for _ in 0..len {
            out.push(self.read_primitive::<P>()?);
        }
        Ok(Some(out))
    }

    /// Read a non-null array whose elements are all non-null.
    pub fn read_dense_array<P: Primitive>(&mut self) -> Result<Vec<P>, CodecError> {
        let values = self
            .read_array::<P>()?
            .ok_or(CodecError::UnexpectedNull(P::ARRAY_KIND))?;
        values
            .into_iter()
            .map(|v| v.ok_or(CodecError::UnexpectedNull(P::KIND)))
            .collect()
    }

    /// Read a non-null `bool`.
    pub fn read_bool(&mut self) -> Result<bool, CodecError> {
        self.require()
    }

    /// Read a non-null `i8`.
    pub fn read_byte(&mut self) -> Result<i8, CodecError> {
        self.require()
    }

    /// Read a non-null `i16`.
    pub fn read_short(&mut self) -> Result<i16, CodecError> {
        self.require()
    }

    /// Read a non-null `i32`.
    pub fn read_int(&mut self) -> Result<i32, CodecError> {
        self.require()
    }

    /// Read a non-null `i64`.
    pub fn read_long(&mut self) -> Result<i64, CodecError> {
        self.require()
    }

    /// Read a non-null `char`.
    pub fn read_char(&mut self) -> Result<char, CodecError> {
        self.require()
    }

    /// Read a non-null `f32`.
    pub fn read_float(&mut self) -> Result<f32, CodecError> {
        self.require()
    }

    /// Read a non-null `f64`.
    pub fn read_double(&mut self) -> Result<f64, CodecError> {
        self.require()
    }

    /// Read a nullable string.
    pub fn read_string(&mut self) -> Result<Option<String>, CodecError> {
        self.read_primitive::<String>()
    }

    /// Read a non-null string.
    pub fn read_required_string(&mut self) -> Result<String, CodecError> {
        self.require()
    }

    /// Read a nullable encodable of any registered type.
    pub fn read_dyn_encodable(&mut self) -> Result<Option<Box<dyn Encodable>>, CodecError> {
        let (found, is_null) = self.read_tag(FieldKind::Encodable)?;
        if found != FieldKind::Encodable {
            return Err(CodecError::TagMismatch {
                expected: FieldKind::Encodable,
                found,
            });
        }
        if is_null {
            return Ok(None);
        }
        self.read_encodable_body().map(Some)
    }

    fn read_encodable_body(&mut self) -> Result<Box<dyn Encodable>, CodecError> {
        let name = get_str(self.input, self.codec.max_length())?;
        trace!(%name, "read encodable");
        let factory = self
            .codec
            .encodables()
            .factory(&name)
            .ok_or(CodecError::UnknownEncodable(name))?;
        if self.depth >= self.codec.max_depth() {
            return Err(CodecError::NestingTooDeep(self.codec.max_depth()));
        }
        self.depth += 1;
        let decoded = factory(self);
        self.depth -= 1;
        decoded
    }

    /// Read a nullable encodable and downcast it to `T`.
    pub fn read_encodable<T: Encodable>(&mut self) -> Result<Option<T>, CodecError> {
        match self.read_dyn_encodable()? {
            None => Ok(None),
            Some(boxed) => downcast(boxed).map(Some),
        }
    }

    /// Read a non-null encodable of type `T`.
    pub fn read_required_encodable<T: Encodable>(&mut self) -> Result<T, CodecError> {
        self.read_encodable()?
            .ok_or(CodecError::UnexpectedNull(FieldKind::Encodable))
    }

    /// Read a nullable array of non-null encodables of type `T`.
    pub fn read_encodable_array<T: Encodable>(&mut self) -> Result<Option<Vec<T>>, CodecError> {
        let (_, is_null) = self.read_tag(FieldKind::EncodableArray)?;
        if is_null {
            return Ok(None);
        }
        let len = get_len(self.input, self.codec.max_length())?;
        let mut out = Vec::with_capacity(len.min(self.remaining().unwrap_or(len)));
        for _ in 0..len {
            out.push(self.read_required_encodable::<T>()?);
        }
        Ok(Some(out))
    }

    /// Read a nullable CBOR blob.
    pub fn read_blob<T: DeserializeOwned>(&mut self) -> Result<Option<T>, CodecError> {
        let (found, is_null) = self.read_tag(FieldKind::Blob)?;
        if found != FieldKind::Blob {
            return Err(CodecError::TagMismatch {
                expected: FieldKind::Blob,
                found,
            });
        }
        if is_null {
            return Ok(None);
        }
        self.read_blob_body().map(Some)
    }

    fn read_blob_body<T: DeserializeOwned>(&mut self) -> Result<T, CodecError> {
        let len = get_len(self.input, self.codec.max_length())?;
        let bytes = self.input.read_bytes(len)?;
        ciborium::de::from_reader(bytes.as_slice()).map_err(|e| CodecError::Blob(e.to_string()))
    }

    /// Read a nullable value written either as an encodable or as a blob.
    ///
    /// The tag decides which path runs; both carry their own verification.
    pub fn read_opaque<T>(&mut self) -> Result<Option<T>, CodecError>
    where
        T: Encodable + DeserializeOwned,
    {
        let (found, is_null) = self.read_tag(FieldKind::Encodable)?;
        if is_null {
            return Ok(None);
        }
        match found {
            FieldKind::Blob => self.read_blob_body().map(Some),
            _ => downcast(self.read_encodable_body()?).map(Some),
        }
    }

    /// Read `len` raw bytes with no tag.
    pub fn read_raw(&mut self, len: usize) -> Result<Vec<u8>, CodecError> {
        self.input.read_bytes(len)
    }
}

fn downcast<T: Encodable>(boxed: Box<dyn Encodable>) -> Result<T, CodecError> {
    let found = boxed.type_name();
    boxed
        .into_any()
        .downcast::<T>()
        .map(|b| *b)
        .map_err(|_| CodecError::EncodableMismatch {
            expected: type_name::<T>(),
            found: found.to_string(),
        })
}
