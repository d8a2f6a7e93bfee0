// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Errors produced by the field codec.

use thiserror::Error;

use crate::kind::FieldKind;

/// Errors produced by field writers and readers.
///
/// Layout failures (`UnknownTag`, `TagMismatch`, `UnknownVariant`) mean
/// sender and receiver disagree about the stream layout; the current call
/// must be abandoned. [`CodecError::is_desync`] groups them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Attempted to read beyond the end of the input.
    #[error("buffer too short")]
    OutOfBounds,
    /// Tag byte does not name any registered field kind.
    #[error("unknown field tag {0:#04x}")]
    UnknownTag(u8),
    /// Tag byte names a different kind than the one the reader expected.
    #[error("stream out of sync: expected {expected:?}, found {found:?}")]
    TagMismatch {
        /// Kind the reader asked for.
        expected: FieldKind,
        /// Kind carried by the tag byte.
        found: FieldKind,
    },
    /// Kind has no tag id in the writer's table.
    #[error("field kind {0:?} is not registered")]
    UnregisteredKind(FieldKind),
    /// Variant discriminant inside an encodable's payload is not one the
    /// reader knows.
    #[error("stream out of sync: {type_name} has no variant {variant}")]
    UnknownVariant {
        /// Wire type name of the encodable being read.
        type_name: &'static str,
        /// Discriminant found on the stream.
        variant: i8,
    },
    /// Encodables nested deeper than the configured bound.
    #[error("encodables nested deeper than {0} levels")]
    NestingTooDeep(usize),
    /// A non-null value was required but the tag carried the null bit.
    #[error("unexpected null for {0:?}")]
    UnexpectedNull(FieldKind),
    /// Encodable type name has no registered factory.
    #[error("no factory registered for encodable type `{0}`")]
    UnknownEncodable(String),
    /// Factory produced a value of a different concrete type than requested.
    #[error("encodable `{found}` is not the requested type `{expected}`")]
    EncodableMismatch {
        /// Rust type the caller asked for.
        expected: &'static str,
        /// Wire type name that was decoded.
        found: String,
    },
    /// UTF-8 decoding failed.
    #[error("invalid utf-8")]
    InvalidUtf8,
    /// Decoded `char` scalar is not a valid Unicode scalar value.
    #[error("invalid char scalar {0:#x}")]
    InvalidChar(u32),
    /// Array or string length prefix was negative.
    #[error("negative length {0}")]
    NegativeLength(i32),
    /// Length prefix exceeded the configured bound.
    #[error("length {len} exceeds limit {max}")]
    LengthTooLarge {
        /// Length announced by the stream.
        len: usize,
        /// Configured upper bound.
        max: usize,
    },
    /// CBOR blob fallback failed to encode or decode.
    #[error("blob codec: {0}")]
    Blob(String),
    /// Input still had bytes after a complete top-level value.
    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),
    /// Registering a second factory under an existing encodable name.
    #[error("encodable type `{0}` registered twice")]
    DuplicateEncodable(String),
}

impl CodecError {
    /// Returns `true` when the error means both ends disagree about the
    /// stream layout.
    pub fn is_desync(&self) -> bool {
        matches!(
            self,
            CodecError::UnknownTag(_)
                | CodecError::TagMismatch { .. }
                | CodecError::UnknownVariant { .. }
        )
    }
}
