// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Type descriptors supplied by the hosting metamodel.

use std::fmt;
use std::sync::Arc;

use crate::{ValueCodec, WireError};

/// How a member is carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Atomic value written through its type's [`ValueCodec`].
    Value,
    /// One-to-one association with another object.
    Reference,
    /// One-to-many association held in an owned collection.
    Collection,
    /// Invokable action; never serialized.
    Action,
}

/// One declared member of a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSpec {
    /// Member name, unique within its type.
    pub name: String,
    /// Wire category.
    pub kind: MemberKind,
    /// Declared type (element type for collections).
    pub type_name: String,
    /// `false` for derived members that have no stored state.
    pub persisted: bool,
}

impl MemberSpec {
    fn new(name: impl Into<String>, kind: MemberKind, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            type_name: type_name.into(),
            persisted: true,
        }
    }

    /// Value member.
    pub fn value(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(name, MemberKind::Value, type_name)
    }

    /// Reference member.
    pub fn reference(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(name, MemberKind::Reference, type_name)
    }

    /// Collection member with elements of `element_type`.
    pub fn collection(name: impl Into<String>, element_type: impl Into<String>) -> Self {
        Self::new(name, MemberKind::Collection, element_type)
    }

    /// Action member.
    pub fn action(name: impl Into<String>) -> Self {
        Self::new(name, MemberKind::Action, "")
    }

    /// Mark the member as derived (not persisted).
    #[must_use]
    pub fn derived(mut self) -> Self {
        self.persisted = false;
        self
    }

    /// Returns `true` if the member occupies a slot in field-content arrays.
    pub fn is_serializable(&self) -> bool {
        self.persisted && self.kind != MemberKind::Action
    }
}

/// Descriptor for one type: either an object type with members, or a value
/// type with a codec.
#[derive(Clone)]
pub struct TypeSpec {
    /// Fully qualified type name.
    pub name: String,
    /// Members in declaration order.
    pub members: Vec<MemberSpec>,
    /// `true` if transient instances may be made persistent.
    pub persistable: bool,
    /// Present for value types only.
    pub value_codec: Option<Arc<dyn ValueCodec>>,
}

impl TypeSpec {
    /// Persistable object type with no members yet.
    pub fn object(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            persistable: true,
            value_codec: None,
        }
    }

    /// Value type encoded by `codec`.
    pub fn value(name: impl Into<String>, codec: Arc<dyn ValueCodec>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            persistable: false,
            value_codec: Some(codec),
        }
    }

    /// Append a member.
    #[must_use]
    pub fn with_member(mut self, member: MemberSpec) -> Self {
        self.members.push(member);
        self
    }

    /// Mark instances as never persistable.
    #[must_use]
    pub fn transient_only(mut self) -> Self {
        self.persistable = false;
        self
    }

    /// Member by name.
    pub fn member(&self, name: &str) -> Option<&MemberSpec> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Returns `true` for value types.
    pub fn is_value(&self) -> bool {
        self.value_codec.is_some()
    }
}

impl fmt::Debug for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeSpec")
            .field("name", &self.name)
            .field("members", &self.members)
            .field("persistable", &self.persistable)
            .field("is_value", &self.is_value())
            .finish()
    }
}

/// Type-specification provider.
///
/// Implementations must return the same member order for a type on every
/// call and in every process; field-content arrays are positional.
pub trait Metamodel: Send + Sync {
    /// Descriptor for `type_name`, or `None` if the type is unknown.
    fn specification(&self, type_name: &str) -> Option<Arc<TypeSpec>>;

    /// Descriptor for `type_name`, failing with [`WireError::UnknownType`].
    fn require(&self, type_name: &str) -> Result<Arc<TypeSpec>, WireError> {
        self.specification(type_name)
            .ok_or_else(|| WireError::UnknownType(type_name.to_owned()))
    }

    /// Codec for value type `type_name`.
    fn value_codec(&self, type_name: &str) -> Result<Arc<dyn ValueCodec>, WireError> {
        self.require(type_name)?
            .value_codec
            .clone()
            .ok_or_else(|| WireError::UnknownType(format!("{type_name} is not a value type")))
    }
}
