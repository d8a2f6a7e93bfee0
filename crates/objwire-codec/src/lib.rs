// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Self-describing binary field codec for objwire.
//!
//! Each value is written as one tag byte followed by its payload:
//!
//! ```text
//! TAG(1) || PAYLOAD
//! TAG = NULL_BIT(64)? | tag id
//! ```
//!
//! * Primitives use fixed little-endian payloads; strings and arrays carry a
//!   four-byte count. Array elements are written through the per-element
//!   writer, so each element has its own tag and may be null.
//! * Encodables write their wire type name and then delegate to their own
//!   [`Encodable::encode`]. Readers resolve the name through an
//!   [`EncodableRegistry`] filled at start-up.
//! * Types without a custom wire form fall back to a CBOR blob.
//!
//! The tag table and the encodable registry live in a [`FieldCodec`] value
//! that is built once and passed by reference to every writer and reader.
#![forbid(unsafe_code)]

mod encodable;
mod error;
mod kind;
mod primitive;
mod reader;
mod stream;
mod writer;

pub use encodable::{AsAny, Decodable, Encodable, EncodableFactory, EncodableRegistry};
pub use error::CodecError;
pub use kind::{FieldKind, FieldKindTable, NULL_BIT, TAG_MASK};
pub use primitive::Primitive;
pub use reader::FieldReader;
pub use stream::{DataInput, DataOutput, SliceInput};
pub use writer::FieldWriter;

/// Default upper bound for string, blob and array length prefixes (16 MiB).
pub const DEFAULT_MAX_LENGTH: usize = 16 * 1024 * 1024;

/// Default upper bound on encodables nested inside one another.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Process-wide codec configuration: tag table, encodable registry, limits.
#[derive(Debug, Clone)]
pub struct FieldCodec {
    kinds: FieldKindTable,
    encodables: EncodableRegistry,
    max_length: usize,
    max_depth: usize,
}

impl FieldCodec {
    /// Codec with the standard tag table and the given registry.
    pub fn new(encodables: EncodableRegistry) -> Self {
        Self {
            kinds: FieldKindTable::standard(),
            encodables,
            max_length: DEFAULT_MAX_LENGTH,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Override the length-prefix bound.
    #[must_use]
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Override the nesting bound for encodables.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Tag table.
    pub fn kinds(&self) -> &FieldKindTable {
        &self.kinds
    }

    /// Encodable registry.
    pub fn encodables(&self) -> &EncodableRegistry {
        &self.encodables
    }

    /// Length-prefix bound.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Nesting bound for encodables.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Writer over `out`.
    pub fn writer<'a>(&'a self, out: &'a mut dyn DataOutput) -> FieldWriter<'a> {
        FieldWriter::new(self, out)
    }

    /// Reader over `input`.
    pub fn reader<'a>(&'a self, input: &'a mut dyn DataInput) -> FieldReader<'a> {
        FieldReader::new(self, input)
    }

    /// Encode one top-level encodable into a fresh buffer.
    pub fn encode_to_vec(&self, value: &dyn Encodable) -> Result<Vec<u8>, CodecError> {
        let mut bytes = Vec::new();
        let mut writer = self.writer(&mut bytes);
        writer.write_encodable(Some(value))?;
        writer.flush()?;
        Ok(bytes)
    }

    /// Decode one top-level encodable, rejecting null and trailing bytes.
    pub fn decode_from_bytes<T: Encodable>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        let mut input = SliceInput::new(bytes);
        let value = self.reader(&mut input).read_required_encodable::<T>()?;
        let left = input.remaining().unwrap_or(0);
        if left != 0 {
            return Err(CodecError::TrailingBytes(left));
        }
        Ok(value)
    }
}

impl Default for FieldCodec {
    fn default() -> Self {
        Self::new(EncodableRegistry::new())
    }
}
