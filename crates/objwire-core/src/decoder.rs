// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reconciliation of wire nodes into live objects.
//!
//! Each identity is decoded at most once per [`DecodeContext`]. Field data is
//! applied inside a resolve-state bracket chosen by [`ResolveState::next`];
//! when no transition exists the data is skipped and the object keeps what it
//! holds. Version disagreements on nodes without data are recorded as
//! [`StaleObject`]s, not acted upon.

use std::sync::Arc;

use objwire_model::{
    versions_differ, CollectionNode, EncodedValueNode, ObjectNode, Oid, ReferenceNode, Version,
    WireNode,
};
use tracing::{debug, debug_span, instrument, trace, warn};

use crate::{
    resolve, AdapterRef, ChangeSink, FieldOrderCache, KnownObjects, MemberKind, MemberSpec,
    Metamodel, ObjectSpace, Reconcile, ResolveState, Scalar, TypeSpec, WireError,
};

/// Registry the decoder threads through one call tree.
pub type DecodeKnown = KnownObjects<AdapterRef>;

/// Result of decoding one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// Null node, or a value node without an encoded string.
    Null,
    /// Object adapter.
    Object(AdapterRef),
    /// Collection adapter.
    Collection(AdapterRef),
    /// Atomic value.
    Value(Scalar),
}

impl Decoded {
    /// Object adapter, if this is one.
    pub fn as_object(&self) -> Option<AdapterRef> {
        match self {
            Decoded::Object(adapter) => Some(*adapter),
            _ => None,
        }
    }

    /// Returns `true` for [`Decoded::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Decoded::Null)
    }
}

/// Live object whose version disagrees with a node that carried no data to
/// refresh it. Reloading is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleObject {
    /// Live adapter.
    pub adapter: AdapterRef,
    /// Its identity.
    pub oid: Oid,
    /// Version held locally.
    pub held: Option<Version>,
    /// Version announced by the sender.
    pub received: Version,
}

/// State of one top-level decode call: the object space being reconciled,
/// the change sink, the known-objects registry and stale-object records.
pub struct DecodeContext<'a> {
    space: &'a mut dyn ObjectSpace,
    changes: &'a mut dyn ChangeSink,
    known: DecodeKnown,
    stale: Vec<StaleObject>,
}

impl<'a> DecodeContext<'a> {
    /// Fresh context over `space`, reporting updates to `changes`.
    pub fn new(space: &'a mut dyn ObjectSpace, changes: &'a mut dyn ChangeSink) -> Self {
        Self {
            space,
            changes,
            known: DecodeKnown::new(),
            stale: Vec::new(),
        }
    }

    /// Object space being reconciled.
    pub fn space(&self) -> &dyn ObjectSpace {
        &*self.space
    }

    /// Identities decoded so far in this call.
    pub fn known(&self) -> &DecodeKnown {
        &self.known
    }

    /// Objects found stale so far.
    pub fn stale_objects(&self) -> &[StaleObject] {
        &self.stale
    }

    /// Take the stale-object records, leaving none behind.
    pub fn take_stale_objects(&mut self) -> Vec<StaleObject> {
        std::mem::take(&mut self.stale)
    }
}

/// Graph decoder. Holds only shared, read-only state.
#[derive(Clone, Copy)]
pub struct ObjectDecoder<'m> {
    metamodel: &'m dyn Metamodel,
    layouts: &'m FieldOrderCache,
}

fn member_path(spec: &TypeSpec, member: &MemberSpec) -> String {
    format!("{}.{}", spec.name, member.name)
}

impl<'m> ObjectDecoder<'m> {
    /// Decoder over `metamodel`, sharing the process-wide `layouts`.
    pub fn new(metamodel: &'m dyn Metamodel, layouts: &'m FieldOrderCache) -> Self {
        Self { metamodel, layouts }
    }

    /// Decode any node.
    pub fn decode(
        &self,
        ctx: &mut DecodeContext<'_>,
        node: &WireNode,
    ) -> Result<Decoded, WireError> {
        match node {
            WireNode::Null(_) => Ok(Decoded::Null),
            WireNode::Reference(reference) => {
                self.decode_reference(ctx, reference).map(Decoded::Object)
            }
            WireNode::Object(object) => self.decode_object(ctx, object).map(Decoded::Object),
            WireNode::Collection(collection) => self
                .decode_collection(ctx, collection)
                .map(Decoded::Collection),
            WireNode::EncodedValue(value) => Ok(self
                .decode_value(value)?
                .map_or(Decoded::Null, Decoded::Value)),
        }
    }

    /// Live adapter for a bare reference, or a new ghost placeholder.
    pub fn decode_reference(
        &self,
        ctx: &mut DecodeContext<'_>,
        node: &ReferenceNode,
    ) -> Result<AdapterRef, WireError> {
        if let Some(adapter) = ctx.space.adapter_for(&node.oid) {
            return Ok(adapter);
        }
        let spec = self.metamodel.require(&node.type_name)?;
        trace!(oid = %node.oid, "ghost for reference");
        Ok(ctx.space.recreate_placeholder(&node.oid, &spec))
    }

    /// Value through its type's own string codec; `None` for a missing
    /// encoded string.
    pub fn decode_value(&self, node: &EncodedValueNode) -> Result<Option<Scalar>, WireError> {
        let codec = self.metamodel.value_codec(&node.type_name)?;
        node.encoded.as_deref().map(|s| codec.decode(s)).transpose()
    }

    /// Reconcile an object node with the live object of the same identity.
    ///
    /// The field array is checked against the local layout before the live
    /// object is touched, so a desync leaves it as it was.
    pub fn decode_object(
        &self,
        ctx: &mut DecodeContext<'_>,
        node: &ObjectNode,
    ) -> Result<AdapterRef, WireError> {
        if let Some(&adapter) = ctx.known.get(&node.oid) {
            return Ok(adapter);
        }
        let span = debug_span!("decode_object", oid = %node.oid, type_name = %node.type_name);
        let _guard = span.enter();

        let layout = match &node.fields {
            Some(fields) => Some(self.checked_layout(&node.type_name, fields)?),
            None => None,
        };

        if let Some(adapter) = ctx.space.adapter_for(&node.oid) {
            ctx.known.put(node.oid.clone(), adapter);
            if let Some(layout) = &layout {
                if self.reconcile(ctx, adapter, node, layout)? == Reconcile::Skipped {
                    return Ok(adapter);
                }
                ctx.changes.object_changed(adapter);
            } else if let Some(received) = &node.version {
                let held = ctx.space.version(adapter);
                if versions_differ(held.as_ref(), Some(received)) {
                    warn!(
                        oid = %node.oid,
                        held = ?held,
                        received = %received,
                        "version differs but no data was sent; object not reloaded"
                    );
                    ctx.stale.push(StaleObject {
                        adapter,
                        oid: node.oid.clone(),
                        held,
                        received: received.clone(),
                    });
                }
            }
            return Ok(adapter);
        }

        let spec = self.metamodel.require(&node.type_name)?;
        let adapter = if node.oid.is_transient() {
            ctx.space.create_transient(&node.oid, &spec)
        } else {
            ctx.space.recreate_placeholder(&node.oid, &spec)
        };
        ctx.known.put(node.oid.clone(), adapter);
        if let Some(layout) = &layout {
            self.reconcile(ctx, adapter, node, layout)?;
        }
        Ok(adapter)
    }

    /// Layout for `type_name`, once `fields` is known to match it slot by
    /// slot.
    fn checked_layout(
        &self,
        type_name: &str,
        fields: &[WireNode],
    ) -> Result<Arc<[MemberSpec]>, WireError> {
        let spec = self.metamodel.require(type_name)?;
        let layout = self.layouts.fields(&spec);
        if fields.len() != layout.len() {
            return Err(WireError::ProtocolDesync {
                type_name: spec.name.clone(),
                expected: layout.len(),
                received: fields.len(),
            });
        }
        for (member, field) in layout.iter().zip(fields) {
            let fits = matches!(
                (member.kind, field),
                (
                    MemberKind::Collection,
                    WireNode::Collection(_) | WireNode::Null(_)
                ) | (
                    MemberKind::Value,
                    WireNode::EncodedValue(_) | WireNode::Null(_)
                ) | (
                    MemberKind::Reference,
                    WireNode::Reference(_) | WireNode::Object(_) | WireNode::Null(_)
                )
            );
            if !fits {
                return Err(WireError::UnexpectedNode {
                    member: member_path(&spec, member),
                    expected: match member.kind {
                        MemberKind::Collection => "collection",
                        MemberKind::Value => "value",
                        MemberKind::Reference | MemberKind::Action => "object",
                    },
                    found: field.kind(),
                });
            }
        }
        Ok(layout)
    }

    fn reconcile(
        &self,
        ctx: &mut DecodeContext<'_>,
        adapter: AdapterRef,
        node: &ObjectNode,
        layout: &[MemberSpec],
    ) -> Result<Reconcile, WireError> {
        let state = ctx
            .space
            .resolve_state(adapter)
            .ok_or(WireError::UnknownAdapter(adapter))?;
        let outcome = state.next(node.has_all_fields);
        match outcome {
            Reconcile::Skipped => {
                debug!(
                    ?state,
                    complete = node.has_all_fields,
                    "no state transition; field data skipped"
                );
            }
            Reconcile::Transition(next) => {
                let held = ctx.space.version(adapter);
                ctx.space.set_version(adapter, node.version.clone());
                resolve::begin(&mut *ctx.space, adapter, next);
                if let Err(err) = self.apply_fields(ctx, adapter, node, layout) {
                    warn!(oid = %node.oid, %err, "field data rejected; state restored");
                    resolve::abort(&mut *ctx.space, adapter, state);
                    ctx.space.set_version(adapter, held);
                    return Err(err);
                }
                resolve::end(&mut *ctx.space, adapter);
            }
        }
        Ok(outcome)
    }

    fn apply_fields(
        &self,
        ctx: &mut DecodeContext<'_>,
        adapter: AdapterRef,
        node: &ObjectNode,
        layout: &[MemberSpec],
    ) -> Result<(), WireError> {
        let Some(fields) = &node.fields else {
            return Ok(());
        };
        for (member, field) in layout.iter().zip(fields) {
            trace!(member = %member.name, kind = field.kind(), "apply");
            match (member.kind, field) {
                (MemberKind::Collection, WireNode::Collection(collection)) => {
                    self.apply_collection_field(
                        ctx,
                        adapter,
                        node.version.as_ref(),
                        member,
                        collection,
                    )?;
                }
                (MemberKind::Value, WireNode::EncodedValue(value)) => {
                    let value = self.decode_value(value)?;
                    ctx.space.set_value(adapter, member, value);
                }
                (MemberKind::Value, WireNode::Null(_)) => {
                    ctx.space.set_value(adapter, member, None);
                }
                (MemberKind::Reference, _) => {
                    let target = self.decode(ctx, field)?.as_object();
                    ctx.space.set_reference(adapter, member, target);
                }
                // null collections keep their contents
                _ => {}
            }
        }
        Ok(())
    }

    fn apply_collection_field(
        &self,
        ctx: &mut DecodeContext<'_>,
        owner: AdapterRef,
        owner_version: Option<&Version>,
        member: &MemberSpec,
        node: &CollectionNode,
    ) -> Result<(), WireError> {
        let collection = ctx
            .space
            .collection(owner, member)
            .ok_or(WireError::UnknownAdapter(owner))?;
        self.apply_collection(ctx, collection, node, owner_version)
    }

    fn apply_collection(
        &self,
        ctx: &mut DecodeContext<'_>,
        collection: AdapterRef,
        node: &CollectionNode,
        owner_version: Option<&Version>,
    ) -> Result<(), WireError> {
        let state = ctx
            .space
            .resolve_state(collection)
            .ok_or(WireError::UnknownAdapter(collection))?;

        if !node.has_all_elements {
            if state == ResolveState::Ghost {
                return Ok(());
            }
            if versions_differ(ctx.space.version(collection).as_ref(), owner_version) {
                debug!(oid = %node.oid, "owner version moved; collection invalidated");
                ctx.space.replace_elements(collection, Vec::new());
                ctx.space.set_resolve_state(collection, ResolveState::Ghost);
            }
            return Ok(());
        }

        let wire = node.elements.as_deref().unwrap_or(&[]);
        let mut elements = Vec::with_capacity(wire.len());
        for element in wire {
            match self.decode(ctx, element)? {
                Decoded::Object(adapter) => elements.push(adapter),
                Decoded::Null => {}
                _ => {
                    return Err(WireError::UnexpectedNode {
                        member: node.oid.to_string(),
                        expected: "object",
                        found: element.kind(),
                    })
                }
            }
        }

        match state.next(node.has_all_elements) {
            Reconcile::Skipped => {
                debug!(oid = %node.oid, ?state, "no state transition; collection contents kept");
            }
            Reconcile::Transition(next) => {
                resolve::begin(&mut *ctx.space, collection, next);
                ctx.space.replace_elements(collection, elements);
                if owner_version.is_some() {
                    ctx.space.set_version(collection, owner_version.cloned());
                }
                resolve::end(&mut *ctx.space, collection);
            }
        }
        Ok(())
    }

    /// Reconcile a collection node that arrives on its own (e.g. an action
    /// result or a lazily resolved field).
    pub fn decode_collection(
        &self,
        ctx: &mut DecodeContext<'_>,
        node: &CollectionNode,
    ) -> Result<AdapterRef, WireError> {
        let collection = match ctx.space.adapter_for(&node.oid) {
            Some(collection) => collection,
            None => self.locate_collection(ctx, &node.oid)?,
        };
        self.apply_collection(ctx, collection, node, None)?;
        Ok(collection)
    }

    fn locate_collection(
        &self,
        ctx: &DecodeContext<'_>,
        oid: &Oid,
    ) -> Result<AdapterRef, WireError> {
        let unresolved = || WireError::UnresolvedOid(oid.clone());
        let Oid::Aggregated(aggregated) = oid else {
            return Err(unresolved());
        };
        let owner = ctx
            .space
            .adapter_for(&aggregated.parent)
            .ok_or_else(unresolved)?;
        let type_name = ctx
            .space
            .type_name(owner)
            .ok_or(WireError::UnknownAdapter(owner))?;
        let spec = self.metamodel.require(&type_name)?;
        let member = spec
            .member(&aggregated.local_id)
            .filter(|m| m.kind == MemberKind::Collection)
            .ok_or_else(unresolved)?;
        ctx.space.collection(owner, member).ok_or_else(unresolved)
    }

    /// Object or null returned by an action.
    #[instrument(skip_all, fields(kind = node.kind()))]
    pub fn decode_action_result(
        &self,
        ctx: &mut DecodeContext<'_>,
        node: &WireNode,
    ) -> Result<Decoded, WireError> {
        self.decode(ctx, node)
    }

    /// Batch of server-side change notifications, in order. Null entries are
    /// ignored.
    #[instrument(skip_all, fields(count = nodes.len()))]
    pub fn decode_changed_objects(
        &self,
        ctx: &mut DecodeContext<'_>,
        nodes: &[WireNode],
    ) -> Result<Vec<AdapterRef>, WireError> {
        let mut updated = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                WireNode::Object(object) => updated.push(self.decode_object(ctx, object)?),
                WireNode::Reference(reference) => {
                    updated.push(self.decode_reference(ctx, reference)?);
                }
                WireNode::Null(_) => {}
                other => {
                    return Err(WireError::UnexpectedNode {
                        member: "changed objects".into(),
                        expected: "object",
                        found: other.kind(),
                    })
                }
            }
        }
        Ok(updated)
    }

    /// Adopt the persistent identities the receiver assigned to a transient
    /// graph. `node` is the receiver's image of the graph rooted at
    /// `adapter`; collection elements are matched by position.
    #[instrument(skip_all, fields(oid = %node.oid))]
    pub fn made_persistent(
        &self,
        ctx: &mut DecodeContext<'_>,
        adapter: AdapterRef,
        node: &ObjectNode,
    ) -> Result<(), WireError> {
        let mut visited = DecodeKnown::new();
        self.persist_walk(ctx, adapter, node, &mut visited)
    }

    fn persist_walk(
        &self,
        ctx: &mut DecodeContext<'_>,
        adapter: AdapterRef,
        node: &ObjectNode,
        visited: &mut DecodeKnown,
    ) -> Result<(), WireError> {
        if visited.put(node.oid.clone(), adapter).is_some() {
            return Ok(());
        }
        let spec = self.metamodel.require(&node.type_name)?;
        let live = ctx
            .space
            .oid(adapter)
            .ok_or(WireError::UnknownAdapter(adapter))?;
        if live.is_transient() && spec.persistable {
            debug!(from = %live, to = %node.oid, "made persistent");
            ctx.space.remap_as_persistent(adapter, node.oid.clone());
            ctx.space.set_version(adapter, node.version.clone());
            ctx.space.set_resolve_state(adapter, ResolveState::Resolved);
        }

        let Some(fields) = &node.fields else {
            return Ok(());
        };
        let layout = self.layouts.fields(&spec);
        if fields.len() != layout.len() {
            return Err(WireError::ProtocolDesync {
                type_name: spec.name.clone(),
                expected: layout.len(),
                received: fields.len(),
            });
        }
        for (member, field) in layout.iter().zip(fields) {
            match (member.kind, field) {
                (MemberKind::Reference, WireNode::Object(child)) => {
                    if let Some(target) = ctx.space.reference(adapter, member) {
                        self.persist_walk(ctx, target, child, visited)?;
                    }
                }
                (MemberKind::Collection, WireNode::Collection(wire)) => {
                    let Some(collection) = ctx.space.collection(adapter, member) else {
                        continue;
                    };
                    if ctx.space.oid(collection).is_some_and(|oid| oid.is_transient()) {
                        ctx.space.remap_as_persistent(collection, wire.oid.clone());
                        ctx.space.set_version(collection, node.version.clone());
                        ctx.space.set_resolve_state(collection, ResolveState::Resolved);
                    }
                    let Some(wire_elements) = &wire.elements else {
                        continue;
                    };
                    let live_elements = ctx.space.elements(collection);
                    if live_elements.len() != wire_elements.len() {
                        return Err(WireError::ProtocolDesync {
                            type_name: member_path(&spec, member),
                            expected: live_elements.len(),
                            received: wire_elements.len(),
                        });
                    }
                    for (element, wire_element) in live_elements.into_iter().zip(wire_elements) {
                        if let WireNode::Object(child) = wire_element {
                            self.persist_walk(ctx, element, child, visited)?;
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}
