// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wire data model for objwire.
//!
//! Identities ([`Oid`]) and version stamps ([`Version`]) are created by the
//! persistence layer and only compared here. [`WireNode`]s are immutable
//! value objects built by the encoder and consumed once by the decoder; they
//! travel either through the tagged field codec (every type here is an
//! [`Encodable`](objwire_codec::Encodable)) or through serde.
#![forbid(unsafe_code)]

mod node;
mod oid;
mod query;
mod version;

pub use node::{
    CollectionNode, EncodedValueNode, NullNode, ObjectNode, ReferenceNode, WireNode,
    COLLECTION_NODE, ENCODED_VALUE_NODE, NULL_NODE, OBJECT_NODE, REFERENCE_NODE,
};
pub use oid::{AggregatedOid, Oid, RootOid};
pub use query::{QueryNode, QueryParam};
pub use version::{versions_differ, Version};

use objwire_codec::{CodecError, EncodableRegistry, FieldCodec};

/// Register every wire type of this crate with `registry`.
pub fn register_wire_types(registry: &mut EncodableRegistry) -> Result<(), CodecError> {
    registry.register::<Oid>()?;
    registry.register::<Version>()?;
    registry.register::<QueryNode>()?;
    registry.register_factory(NULL_NODE, node::decode_null)?;
    registry.register_factory(REFERENCE_NODE, node::decode_reference)?;
    registry.register_factory(OBJECT_NODE, node::decode_object)?;
    registry.register_factory(COLLECTION_NODE, node::decode_collection)?;
    registry.register_factory(ENCODED_VALUE_NODE, node::decode_encoded_value)?;
    Ok(())
}

/// Field codec that knows every wire type of this crate.
pub fn wire_codec() -> Result<FieldCodec, CodecError> {
    let mut registry = EncodableRegistry::new();
    register_wire_types(&mut registry)?;
    Ok(FieldCodec::new(registry))
}
