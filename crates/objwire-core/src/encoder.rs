// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Read-only walk from live objects to wire nodes.
//!
//! The walk is bounded by a depth (objects fully encoded along any path,
//! root included) and by a per-call [`KnownObjects`] registry: an identity
//! is encoded in full at most once per call, later visits emit a reference.
//!
//! Object data is *complete* when the sender holds it fully resolved and every
//! collection field lists its contents. Referenced objects truncated to
//! reference nodes do not make the referring object incomplete, since the
//! association itself is fully described by the target's identity.

use objwire_model::{CollectionNode, EncodedValueNode, ObjectNode, Oid, ReferenceNode, WireNode};
use tracing::{debug_span, instrument, trace};

use crate::{
    AdapterRef, EncodingPolicy, FieldOrderCache, KnownObjects, MemberKind, MemberSpec, Metamodel,
    ObjectSpace, ResolveState, Scalar, WireError,
};

/// Registry the encoder threads through one call tree.
pub type EncodeKnown = KnownObjects<ReferenceNode>;

/// One action argument as seen by the encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionArgument {
    /// Object-typed parameter.
    Object {
        /// Declared parameter type.
        type_name: String,
        /// Argument, `None` when not supplied.
        adapter: Option<AdapterRef>,
    },
    /// Value-typed parameter.
    Value {
        /// Declared value type.
        type_name: String,
        /// Argument, `None` when not supplied.
        value: Option<Scalar>,
    },
}

/// Graph encoder. Holds only shared, read-only state; every call takes its
/// own [`EncodeKnown`] or builds one.
#[derive(Clone, Copy)]
pub struct ObjectEncoder<'m> {
    metamodel: &'m dyn Metamodel,
    layouts: &'m FieldOrderCache,
    policy: EncodingPolicy,
}

impl<'m> ObjectEncoder<'m> {
    /// Encoder over `metamodel`, sharing the process-wide `layouts`.
    pub fn new(
        metamodel: &'m dyn Metamodel,
        layouts: &'m FieldOrderCache,
        policy: EncodingPolicy,
    ) -> Self {
        Self {
            metamodel,
            layouts,
            policy,
        }
    }

    /// Depth policy in force.
    pub fn policy(&self) -> &EncodingPolicy {
        &self.policy
    }

    /// Identity, type and version of `adapter`, without a body.
    pub fn encode_identity(
        &self,
        space: &dyn ObjectSpace,
        adapter: AdapterRef,
    ) -> Result<ReferenceNode, WireError> {
        let oid = space.oid(adapter).ok_or(WireError::MissingIdentity(adapter))?;
        let type_name = space
            .type_name(adapter)
            .ok_or(WireError::UnknownAdapter(adapter))?;
        Ok(ReferenceNode {
            oid,
            type_name,
            version: space.version(adapter),
        })
    }

    /// Walk `adapter` and what it references down to `max_depth`.
    pub fn encode_graph(
        &self,
        space: &dyn ObjectSpace,
        adapter: AdapterRef,
        max_depth: u32,
        known: &mut EncodeKnown,
    ) -> Result<WireNode, WireError> {
        let reference = self.encode_identity(space, adapter)?;
        if max_depth == 0 {
            trace!(oid = %reference.oid, "depth exhausted");
            return Ok(reference.into());
        }
        if known.contains(&reference.oid) {
            trace!(oid = %reference.oid, "already encoded");
            return Ok(reference.into());
        }
        let state = space.resolve_state(adapter);
        if state == Some(ResolveState::Ghost) {
            trace!(oid = %reference.oid, "ghost has no data to send");
            return Ok(reference.into());
        }
        known.put(reference.oid.clone(), reference.clone());

        let spec = self.metamodel.require(&reference.type_name)?;
        let span = debug_span!(
            "encode_object",
            oid = %reference.oid,
            type_name = %spec.name,
            depth = max_depth
        );
        let _guard = span.enter();

        let layout = self.layouts.fields(&spec);
        let mut fields = Vec::with_capacity(layout.len());
        let mut complete = state != Some(ResolveState::PartResolved);
        for member in layout.iter() {
            let node = match member.kind {
                MemberKind::Value => {
                    self.encode_value(&member.type_name, space.value(adapter, member).as_ref())?
                }
                MemberKind::Reference => match space.reference(adapter, member) {
                    Some(target) => self.encode_graph(space, target, max_depth - 1, known)?,
                    None => WireNode::null(member.type_name.as_str()),
                },
                MemberKind::Collection => {
                    let collection = space
                        .collection(adapter, member)
                        .ok_or(WireError::UnknownAdapter(adapter))?;
                    let node = self.encode_collection(
                        space,
                        collection,
                        &reference.oid,
                        member,
                        max_depth - 1,
                        known,
                    )?;
                    complete &= node.has_all_elements;
                    node.into()
                }
                MemberKind::Action => {
                    return Err(WireError::UnknownType(format!(
                        "{}.{} is an action, not a field",
                        spec.name, member.name
                    )))
                }
            };
            trace!(member = %member.name, kind = node.kind(), "field");
            fields.push(node);
        }

        Ok(ObjectNode {
            oid: reference.oid,
            type_name: reference.type_name,
            version: reference.version,
            fields: Some(fields),
            has_all_fields: complete,
        }
        .into())
    }

    fn encode_collection(
        &self,
        space: &dyn ObjectSpace,
        collection: AdapterRef,
        owner: &Oid,
        member: &MemberSpec,
        element_depth: u32,
        known: &mut EncodeKnown,
    ) -> Result<CollectionNode, WireError> {
        let oid = space
            .oid(collection)
            .unwrap_or_else(|| Oid::for_field(owner, &member.name));
        if space.resolve_state(collection) == Some(ResolveState::Ghost) {
            return Ok(CollectionNode {
                oid,
                element_type: member.type_name.clone(),
                elements: None,
                has_all_elements: false,
            });
        }
        let elements = space
            .elements(collection)
            .into_iter()
            .map(|element| self.encode_graph(space, element, element_depth, known))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CollectionNode {
            oid,
            element_type: member.type_name.clone(),
            elements: Some(elements),
            has_all_elements: true,
        })
    }

    /// Value through its type's own string codec.
    pub fn encode_value(
        &self,
        type_name: &str,
        value: Option<&Scalar>,
    ) -> Result<WireNode, WireError> {
        let codec = self.metamodel.value_codec(type_name)?;
        let encoded = value.map(|v| codec.encode(v)).transpose()?;
        Ok(EncodedValueNode {
            type_name: type_name.to_owned(),
            encoded,
        }
        .into())
    }

    fn object_depth(&self, space: &dyn ObjectSpace, adapter: AdapterRef, persistent: u32) -> u32 {
        match space.oid(adapter) {
            Some(oid) if oid.is_transient() => self.policy.transient_graph_depth,
            _ => persistent,
        }
    }

    /// Target of an action: identity only when persistent, the whole
    /// transient graph otherwise.
    #[instrument(skip_all, fields(adapter = %adapter))]
    pub fn encode_action_target(
        &self,
        space: &dyn ObjectSpace,
        adapter: AdapterRef,
        known: &mut EncodeKnown,
    ) -> Result<WireNode, WireError> {
        let depth = self.object_depth(space, adapter, self.policy.action_target_depth);
        self.encode_graph(space, adapter, depth, known)
    }

    /// Action arguments, positionally.
    #[instrument(skip_all, fields(count = arguments.len()))]
    pub fn encode_action_parameters(
        &self,
        space: &dyn ObjectSpace,
        arguments: &[ActionArgument],
        known: &mut EncodeKnown,
    ) -> Result<Vec<WireNode>, WireError> {
        arguments
            .iter()
            .map(|argument| match argument {
                ActionArgument::Object {
                    type_name,
                    adapter: None,
                } => Ok(WireNode::null(type_name.as_str())),
                ActionArgument::Object {
                    adapter: Some(adapter),
                    ..
                } => {
                    let depth =
                        self.object_depth(space, *adapter, self.policy.action_parameter_depth);
                    self.encode_graph(space, *adapter, depth, known)
                }
                ActionArgument::Value { type_name, value } => {
                    self.encode_value(type_name, value.as_ref())
                }
            })
            .collect()
    }

    /// Object returned by an action, or a null of the declared return type.
    pub fn encode_action_result(
        &self,
        space: &dyn ObjectSpace,
        result: Option<AdapterRef>,
        return_type: &str,
        known: &mut EncodeKnown,
    ) -> Result<WireNode, WireError> {
        match result {
            Some(adapter) => {
                self.encode_graph(space, adapter, self.policy.action_result_depth, known)
            }
            None => Ok(WireNode::null(return_type)),
        }
    }

    /// Example object embedded in query criteria.
    pub fn encode_for_query_criteria(
        &self,
        space: &dyn ObjectSpace,
        adapter: AdapterRef,
        known: &mut EncodeKnown,
    ) -> Result<WireNode, WireError> {
        self.encode_graph(space, adapter, self.policy.query_criteria_depth, known)
    }

    /// Object being added to a collection on the client.
    pub fn encode_for_add(
        &self,
        space: &dyn ObjectSpace,
        adapter: AdapterRef,
    ) -> Result<WireNode, WireError> {
        self.encode_graph(
            space,
            adapter,
            self.policy.client_add_depth,
            &mut EncodeKnown::new(),
        )
    }

    /// Client-side changes to `adapter`, always marked partial so the
    /// receiver applies them as an update.
    #[instrument(skip_all, fields(adapter = %adapter))]
    pub fn encode_minimal_update(
        &self,
        space: &dyn ObjectSpace,
        adapter: AdapterRef,
    ) -> Result<WireNode, WireError> {
        let node = self.encode_graph(
            space,
            adapter,
            self.policy.client_update_depth,
            &mut EncodeKnown::new(),
        )?;
        Ok(as_update(node))
    }

    /// Server answer to a retrieve: everything reachable, cycle-safe.
    #[instrument(skip_all, fields(adapter = %adapter))]
    pub fn encode_complete_graph(
        &self,
        space: &dyn ObjectSpace,
        adapter: AdapterRef,
        known: &mut EncodeKnown,
    ) -> Result<WireNode, WireError> {
        self.encode_graph(space, adapter, self.policy.server_retrieve_depth, known)
    }

    /// Server notification that `adapter` changed; marked partial like
    /// [`encode_minimal_update`](Self::encode_minimal_update).
    pub fn encode_changed_object(
        &self,
        space: &dyn ObjectSpace,
        adapter: AdapterRef,
        known: &mut EncodeKnown,
    ) -> Result<WireNode, WireError> {
        let node = self.encode_graph(space, adapter, self.policy.changed_object_depth, known)?;
        Ok(as_update(node))
    }

    /// Transient graph handed over to be made persistent.
    pub fn encode_make_persistent_graph(
        &self,
        space: &dyn ObjectSpace,
        adapter: AdapterRef,
        known: &mut EncodeKnown,
    ) -> Result<WireNode, WireError> {
        self.encode_graph(space, adapter, self.policy.transient_graph_depth, known)
    }

    /// Contents of one field of `adapter`, for resolving that field lazily.
    pub fn encode_for_resolve_field(
        &self,
        space: &dyn ObjectSpace,
        adapter: AdapterRef,
        member_name: &str,
    ) -> Result<WireNode, WireError> {
        let owner = self.encode_identity(space, adapter)?;
        let spec = self.metamodel.require(&owner.type_name)?;
        let member = spec
            .member(member_name)
            .ok_or_else(|| WireError::UnknownType(format!("{}.{member_name}", spec.name)))?;
        let mut known = EncodeKnown::new();
        match member.kind {
            MemberKind::Value => {
                self.encode_value(&member.type_name, space.value(adapter, member).as_ref())
            }
            MemberKind::Reference => match space.reference(adapter, member) {
                Some(target) => self.encode_graph(space, target, 1, &mut known),
                None => Ok(WireNode::null(member.type_name.as_str())),
            },
            MemberKind::Collection => {
                let collection = space
                    .collection(adapter, member)
                    .ok_or(WireError::UnknownAdapter(adapter))?;
                let node =
                    self.encode_collection(space, collection, &owner.oid, member, 1, &mut known)?;
                Ok(node.into())
            }
            MemberKind::Action => Err(WireError::UnknownType(format!(
                "{}.{member_name} is an action, not a field",
                spec.name
            ))),
        }
    }
}

fn as_update(node: WireNode) -> WireNode {
    match node {
        WireNode::Object(object) => WireNode::Object(ObjectNode {
            has_all_fields: false,
            ..object
        }),
        other => other,
    }
}
