// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Field kinds and the tag-byte table.
//!
//! Tag byte layout:
//!
//! ```text
//! bit 7  bit 6   bits 0..=5
//!   0    NULL    tag id (1..=63)
//! ```
//!
//! Tag ids are handed out sequentially, starting at 1, in the order kinds are
//! registered with [`FieldKindTable::standard`]. The order is fixed in code, so
//! every process that builds the standard table agrees on the wire layout.

use crate::CodecError;

/// Bit set on a tag byte when the value is null (no payload follows).
pub const NULL_BIT: u8 = 64;

/// Mask selecting the tag id from a tag byte.
pub const TAG_MASK: u8 = NULL_BIT - 1;

/// Every kind of value the codec can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// `bool`, one byte.
    Boolean,
    /// `i8`, one byte.
    Byte,
    /// `i16`, two bytes.
    Short,
    /// `i32`, four bytes.
    Int,
    /// `i64`, eight bytes.
    Long,
    /// `char`, four-byte Unicode scalar.
    Char,
    /// `f32`, four bytes.
    Float,
    /// `f64`, eight bytes.
    Double,
    /// UTF-8 string with a four-byte length prefix.
    String,
    /// Array of [`FieldKind::Boolean`].
    BooleanArray,
    /// Array of [`FieldKind::Byte`].
    ByteArray,
    /// Array of [`FieldKind::Short`].
    ShortArray,
    /// Array of [`FieldKind::Int`].
    IntArray,
    /// Array of [`FieldKind::Long`].
    LongArray,
    /// Array of [`FieldKind::Char`].
    CharArray,
    /// Array of [`FieldKind::Float`].
    FloatArray,
    /// Array of [`FieldKind::Double`].
    DoubleArray,
    /// Array of [`FieldKind::String`].
    StringArray,
    /// Nested self-encoding value: type name, then the type's own payload.
    Encodable,
    /// Array of nested encodables.
    EncodableArray,
    /// Fallback for types without a custom wire form: a CBOR byte blob.
    Blob,
}

impl FieldKind {
    /// Registration order of the standard table. Appending is wire-compatible;
    /// reordering is not.
    pub const ALL: [FieldKind; 21] = [
        FieldKind::Boolean,
        FieldKind::Byte,
        FieldKind::Short,
        FieldKind::Int,
        FieldKind::Long,
        FieldKind::Char,
        FieldKind::Float,
        FieldKind::Double,
        FieldKind::String,
        FieldKind::BooleanArray,
        FieldKind::ByteArray,
        FieldKind::ShortArray,
        FieldKind::IntArray,
        FieldKind::LongArray,
        FieldKind::CharArray,
        FieldKind::FloatArray,
        FieldKind::DoubleArray,
        FieldKind::StringArray,
        FieldKind::Encodable,
        FieldKind::EncodableArray,
        FieldKind::Blob,
    ];

    /// Self-describing kinds are checked against the expected kind on read.
    /// Opaque kinds carry their own header (a type name or a CBOR item) and
    /// verify themselves.
    pub fn is_self_describing(self) -> bool {
        !matches!(self, FieldKind::Encodable | FieldKind::Blob)
    }
}

/// Bidirectional map between [`FieldKind`]s and tag ids.
///
/// Built once at start-up and shared by reference through
/// [`FieldCodec`](crate::FieldCodec); there is no global table.
#[derive(Debug, Clone)]
pub struct FieldKindTable {
    by_tag: Vec<FieldKind>,
}

impl FieldKindTable {
    /// Empty table; kinds get ids in the order they are registered.
    pub fn new() -> Self {
        Self { by_tag: Vec::new() }
    }

    /// Table with every [`FieldKind`] registered in [`FieldKind::ALL`] order.
    pub fn standard() -> Self {
        Self {
            by_tag: FieldKind::ALL.to_vec(),
        }
    }

    /// Register `kind` and return its tag id. Registering a kind twice
    /// returns the existing id.
    pub fn register(&mut self, kind: FieldKind) -> Option<u8> {
        if let Some(tag) = self.tag_of(kind) {
            return Some(tag);
        }
        let next = u8::try_from(self.by_tag.len() + 1).ok()?;
        if next > TAG_MASK {
            return None;
        }
        self.by_tag.push(kind);
        Some(next)
    }

    /// Tag id assigned to `kind`, if registered.
    pub fn tag_of(&self, kind: FieldKind) -> Option<u8> {
        self.by_tag
            .iter()
            .position(|k| *k == kind)
            .and_then(|idx| u8::try_from(idx + 1).ok())
    }

    /// Kind registered under tag id `tag` (null bit already stripped).
    pub fn kind_of(&self, tag: u8) -> Option<FieldKind> {
        let idx = usize::from(tag).checked_sub(1)?;
        self.by_tag.get(idx).copied()
    }

    /// Build the tag byte for `kind`, setting [`NULL_BIT`] when `is_null`.
    pub fn tag_byte(&self, kind: FieldKind, is_null: bool) -> Result<u8, CodecError> {
        let tag = self
            .tag_of(kind)
            .ok_or(CodecError::UnregisteredKind(kind))?;
        Ok(if is_null { tag | NULL_BIT } else { tag })
    }

    /// Split a tag byte into its kind and null flag.
    pub fn split(&self, byte: u8) -> Result<(FieldKind, bool), CodecError> {
        if byte & !(NULL_BIT | TAG_MASK) != 0 {
            return Err(CodecError::UnknownTag(byte));
        }
        let kind = self
            .kind_of(byte & TAG_MASK)
            .ok_or(CodecError::UnknownTag(byte))?;
        Ok((kind, byte & NULL_BIT != 0))
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    /// Returns `true` when nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }
}

impl Default for FieldKindTable {
    fn default() -> Self {
        Self::standard()
    }
}
