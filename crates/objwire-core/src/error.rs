// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error taxonomy for graph encoding and decoding.
//!
//! Every variant here is fatal to the current call. Skipped state
//! transitions and stale versions are not errors; see
//! [`Reconcile`](crate::Reconcile) and [`StaleObject`](crate::StaleObject).

use objwire_codec::CodecError;
use objwire_model::Oid;
use thiserror::Error;

use crate::AdapterRef;

/// Errors raised by the encoder, decoder and query strategies.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WireError {
    /// Sender and receiver disagree about a type's field layout.
    #[error(
        "protocol desync: data received for different number of fields in {type_name} (expected {expected}, received {received})"
    )]
    ProtocolDesync {
        /// Type (or collection) whose layout disagreed.
        type_name: String,
        /// Arity known locally.
        expected: usize,
        /// Arity found on the wire.
        received: usize,
    },
    /// A field slot holds a node kind its member cannot take.
    #[error("protocol desync: {member} expects {expected} content, received {found}")]
    UnexpectedNode {
        /// `Type.member` the slot belongs to.
        member: String,
        /// Node kind the member takes.
        expected: &'static str,
        /// Node kind received.
        found: &'static str,
    },
    /// Type name with no specification, or a member kind the walk cannot handle.
    #[error("unknown type: {0}")]
    UnknownType(String),
    /// Identity-only encoding of an object that has no identity.
    #[error("object {0:?} has no identity")]
    MissingIdentity(AdapterRef),
    /// No strategy registered for a query criteria kind.
    #[error("no query strategy registered for kind {0}")]
    MissingQueryStrategy(String),
    /// Query parameters do not have the shape the strategy expects.
    #[error("malformed {kind} query: {reason}")]
    MalformedQuery {
        /// Criteria kind.
        kind: String,
        /// What was wrong.
        reason: String,
    },
    /// Handle the object space does not know about.
    #[error("object space has no adapter {0:?}")]
    UnknownAdapter(AdapterRef),
    /// Identity the object space cannot place (e.g. an aggregated oid whose
    /// owner is not loaded).
    #[error("object space cannot resolve {0}")]
    UnresolvedOid(Oid),
    /// A value codec rejected an encoded string or value.
    #[error("invalid {type_name} value: {reason}")]
    InvalidValue {
        /// Value type name.
        type_name: String,
        /// What was wrong.
        reason: String,
    },
    /// Low-level field codec failure.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl WireError {
    /// Returns `true` for schema disagreement between the two ends, whether
    /// caught at the field-array level or at the tag-byte level.
    pub fn is_protocol_desync(&self) -> bool {
        match self {
            WireError::ProtocolDesync { .. } | WireError::UnexpectedNode { .. } => true,
            WireError::Codec(err) => err.is_desync(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use objwire_codec::FieldKind;

    #[test]
    fn tag_mismatch_counts_as_desync_but_unknown_type_does_not() {
        let tag = WireError::from(CodecError::TagMismatch {
            expected: FieldKind::Int,
            found: FieldKind::String,
        });
        assert!(tag.is_protocol_desync());
        let variant = WireError::from(CodecError::UnknownVariant {
            type_name: "objwire.Oid",
            variant: 9,
        });
        assert!(variant.is_protocol_desync());
        assert!(!WireError::UnknownType("x".into()).is_protocol_desync());
        assert!(!WireError::from(CodecError::NestingTooDeep(4)).is_protocol_desync());
    }

    #[test]
    fn desync_message_names_the_arity() {
        let err = WireError::ProtocolDesync {
            type_name: "shop.Order".into(),
            expected: 3,
            received: 2,
        };
        assert!(err.to_string().contains("different number of fields"));
        assert!(err.to_string().contains("expected 3"));
    }
}
