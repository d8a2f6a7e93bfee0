// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wire nodes: the value-object form of object state in transit.
//!
//! A [`WireNode`] is one of five kinds. Field-content arrays inside
//! [`ObjectNode`]s are positional: slot `i` holds member `i` of the type's
//! field order, so member names never travel.
//!
//! `fields: None` means "no data requested" and is distinct from
//! `Some(vec![Null, Null, ..])`, which says every field is explicitly empty.

use objwire_codec::{CodecError, Encodable, FieldReader, FieldWriter};
use serde::{Deserialize, Serialize};

use crate::{Oid, Version};

/// Absent value, carrying the declared type for client reconstruction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NullNode {
    /// Declared type of the empty slot.
    pub type_name: String,
}

/// "This object exists / is this one": identity without body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceNode {
    /// Identity of the referenced object.
    pub oid: Oid,
    /// Concrete type of the referenced object.
    pub type_name: String,
    /// Version of the sender's copy, if persistent.
    pub version: Option<Version>,
}

/// Object identity plus (optionally) positional field contents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectNode {
    /// Identity of the object.
    pub oid: Oid,
    /// Concrete type of the object.
    pub type_name: String,
    /// Version of the sender's copy, if persistent.
    pub version: Option<Version>,
    /// Field contents aligned to the type's field order, or `None` when no
    /// data was requested.
    pub fields: Option<Vec<WireNode>>,
    /// `true` when every field was walked to completion; `false` when some
    /// fields were truncated to references.
    pub has_all_fields: bool,
}

/// Collection identity plus (optionally) its elements.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionNode {
    /// Identity of the collection (aggregated under its owner).
    pub oid: Oid,
    /// Declared element type.
    pub element_type: String,
    /// Element nodes, in collection iteration order.
    pub elements: Option<Vec<WireNode>>,
    /// `true` when `elements` is the complete contents; `false` marks a
    /// placeholder whose current contents must not be replaced.
    pub has_all_elements: bool,
}

/// Identity-free value encoded by its value type's own string codec.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedValueNode {
    /// Value type name.
    pub type_name: String,
    /// Encoded form, `None` for an absent value.
    pub encoded: Option<String>,
}

/// Closed set of node kinds that cross the process boundary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireNode {
    /// See [`NullNode`].
    Null(NullNode),
    /// See [`ReferenceNode`].
    Reference(ReferenceNode),
    /// See [`ObjectNode`].
    Object(ObjectNode),
    /// See [`CollectionNode`].
    Collection(CollectionNode),
    /// See [`EncodedValueNode`].
    EncodedValue(EncodedValueNode),
}

/// Wire name of [`WireNode::Null`].
pub const NULL_NODE: &str = "objwire.NullNode";
/// Wire name of [`WireNode::Reference`].
pub const REFERENCE_NODE: &str = "objwire.ReferenceNode";
/// Wire name of [`WireNode::Object`].
pub const OBJECT_NODE: &str = "objwire.ObjectNode";
/// Wire name of [`WireNode::Collection`].
pub const COLLECTION_NODE: &str = "objwire.CollectionNode";
/// Wire name of [`WireNode::EncodedValue`].
pub const ENCODED_VALUE_NODE: &str = "objwire.EncodedValueNode";

impl WireNode {
    /// Null node for a slot of declared type `type_name`.
    pub fn null(type_name: impl Into<String>) -> Self {
        WireNode::Null(NullNode {
            type_name: type_name.into(),
        })
    }

    /// Identity of the node, when it has one.
    pub fn oid(&self) -> Option<&Oid> {
        match self {
            WireNode::Reference(n) => Some(&n.oid),
            WireNode::Object(n) => Some(&n.oid),
            WireNode::Collection(n) => Some(&n.oid),
            WireNode::Null(_) | WireNode::EncodedValue(_) => None,
        }
    }

    /// Declared (or element) type name.
    pub fn type_name(&self) -> &str {
        match self {
            WireNode::Null(n) => &n.type_name,
            WireNode::Reference(n) => &n.type_name,
            WireNode::Object(n) => &n.type_name,
            WireNode::Collection(n) => &n.element_type,
            WireNode::EncodedValue(n) => &n.type_name,
        }
    }

    /// Returns `true` for [`WireNode::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, WireNode::Null(_))
    }

    /// Borrow as an object node.
    pub fn as_object(&self) -> Option<&ObjectNode> {
        match self {
            WireNode::Object(n) => Some(n),
            _ => None,
        }
    }

    /// Borrow as a collection node.
    pub fn as_collection(&self) -> Option<&CollectionNode> {
        match self {
            WireNode::Collection(n) => Some(n),
            _ => None,
        }
    }

    /// Borrow as a reference node.
    pub fn as_reference(&self) -> Option<&ReferenceNode> {
        match self {
            WireNode::Reference(n) => Some(n),
            _ => None,
        }
    }

    /// Short kind label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            WireNode::Null(_) => "null",
            WireNode::Reference(_) => "reference",
            WireNode::Object(_) => "object",
            WireNode::Collection(_) => "collection",
            WireNode::EncodedValue(_) => "value",
        }
    }
}

impl From<ReferenceNode> for WireNode {
    fn from(node: ReferenceNode) -> Self {
        WireNode::Reference(node)
    }
}

impl From<ObjectNode> for WireNode {
    fn from(node: ObjectNode) -> Self {
        WireNode::Object(node)
    }
}

impl From<CollectionNode> for WireNode {
    fn from(node: CollectionNode) -> Self {
        WireNode::Collection(node)
    }
}

impl From<EncodedValueNode> for WireNode {
    fn from(node: EncodedValueNode) -> Self {
        WireNode::EncodedValue(node)
    }
}

impl Encodable for WireNode {
    fn type_name(&self) -> &'static str {
        match self {
            WireNode::Null(_) => NULL_NODE,
            WireNode::Reference(_) => REFERENCE_NODE,
            WireNode::Object(_) => OBJECT_NODE,
            WireNode::Collection(_) => COLLECTION_NODE,
            WireNode::EncodedValue(_) => ENCODED_VALUE_NODE,
        }
    }

    fn encode(&self, out: &mut FieldWriter<'_>) -> Result<(), CodecError> {
        match self {
            WireNode::Null(n) => out.write_string(Some(n.type_name.as_str())),
            WireNode::Reference(n) => {
                out.write_encodable(Some(&n.oid))?;
                out.write_string(Some(n.type_name.as_str()))?;
                write_version(out, n.version.as_ref())
            }
            WireNode::Object(n) => {
                out.write_encodable(Some(&n.oid))?;
                out.write_string(Some(n.type_name.as_str()))?;
                write_version(out, n.version.as_ref())?;
                out.write_bool(n.has_all_fields)?;
                out.write_encodable_array(n.fields.as_deref())
            }
            WireNode::Collection(n) => {
                out.write_encodable(Some(&n.oid))?;
                out.write_string(Some(n.element_type.as_str()))?;
                out.write_bool(n.has_all_elements)?;
                out.write_encodable_array(n.elements.as_deref())
            }
            WireNode::EncodedValue(n) => {
                out.write_string(Some(n.type_name.as_str()))?;
                out.write_string(n.encoded.as_deref())
            }
        }
    }
}

fn write_version(out: &mut FieldWriter<'_>, version: Option<&Version>) -> Result<(), CodecError> {
    out.write_encodable(version.map(|v| v as &dyn Encodable))
}

pub(crate) fn decode_null(input: &mut FieldReader<'_>) -> Result<Box<dyn Encodable>, CodecError> {
    Ok(Box::new(WireNode::Null(NullNode {
        type_name: input.read_required_string()?,
    })))
}

pub(crate) fn decode_reference(
    input: &mut FieldReader<'_>,
) -> Result<Box<dyn Encodable>, CodecError> {
    Ok(Box::new(WireNode::Reference(ReferenceNode {
        oid: input.read_required_encodable()?,
        type_name: input.read_required_string()?,
        version: input.read_encodable()?,
    })))
}

pub(crate) fn decode_object(input: &mut FieldReader<'_>) -> Result<Box<dyn Encodable>, CodecError> {
    Ok(Box::new(WireNode::Object(ObjectNode {
        oid: input.read_required_encodable()?,
        type_name: input.read_required_string()?,
        version: input.read_encodable()?,
        has_all_fields: input.read_bool()?,
        fields: input.read_encodable_array()?,
    })))
}

pub(crate) fn decode_collection(
    input: &mut FieldReader<'_>,
) -> Result<Box<dyn Encodable>, CodecError> {
    Ok(Box::new(WireNode::Collection(CollectionNode {
        oid: input.read_required_encodable()?,
        element_type: input.read_required_string()?,
        has_all_elements: input.read_bool()?,
        elements: input.read_encodable_array()?,
    })))
}

pub(crate) fn decode_encoded_value(
    input: &mut FieldReader<'_>,
) -> Result<Box<dyn Encodable>, CodecError> {
    Ok(Box::new(WireNode::EncodedValue(EncodedValueNode {
        type_name: input.read_required_string()?,
        encoded: input.read_string()?,
    })))
}
