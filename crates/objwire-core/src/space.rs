// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Ports onto the live object world the encoder reads and the decoder
//! mutates.

use std::fmt;

use objwire_model::{Oid, Version};

use crate::{MemberSpec, ResolveState, Scalar, TypeSpec};

/// Opaque handle to an adapter (an object or an owned collection) in an
/// [`ObjectSpace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AdapterRef(pub u64);

impl fmt::Display for AdapterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Live-object registry and adapter manager.
///
/// Object adapters carry identity, version, resolve state and member
/// contents. Each collection member of an object is backed by its own
/// collection adapter, created together with the owning object and
/// identified by [`Oid::for_field`].
///
/// Accessors return `None` for handles the space does not know; setters on
/// unknown handles are ignored.
pub trait ObjectSpace {
    /// Live adapter with identity `oid`.
    fn adapter_for(&self, oid: &Oid) -> Option<AdapterRef>;

    /// Register a ghost placeholder for `oid`, including ghost collection
    /// adapters for every collection member of `spec`.
    fn recreate_placeholder(&mut self, oid: &Oid, spec: &TypeSpec) -> AdapterRef;

    /// Construct a new transient object for `oid`.
    fn create_transient(&mut self, oid: &Oid, spec: &TypeSpec) -> AdapterRef;

    /// Identity of `adapter`.
    fn oid(&self, adapter: AdapterRef) -> Option<Oid>;

    /// Concrete type name of an object adapter.
    fn type_name(&self, adapter: AdapterRef) -> Option<String>;

    /// Version of `adapter`'s data.
    fn version(&self, adapter: AdapterRef) -> Option<Version>;

    /// Replace `adapter`'s version.
    fn set_version(&mut self, adapter: AdapterRef, version: Option<Version>);

    /// Current lifecycle state.
    fn resolve_state(&self, adapter: AdapterRef) -> Option<ResolveState>;

    /// Replace the lifecycle state.
    fn set_resolve_state(&mut self, adapter: AdapterRef, state: ResolveState);

    /// Target of reference member `member`.
    fn reference(&self, adapter: AdapterRef, member: &MemberSpec) -> Option<AdapterRef>;

    /// Point reference member `member` at `target`.
    fn set_reference(
        &mut self,
        adapter: AdapterRef,
        member: &MemberSpec,
        target: Option<AdapterRef>,
    );

    /// Value of value member `member`.
    fn value(&self, adapter: AdapterRef, member: &MemberSpec) -> Option<Scalar>;

    /// Replace value member `member`.
    fn set_value(&mut self, adapter: AdapterRef, member: &MemberSpec, value: Option<Scalar>);

    /// Collection adapter backing collection member `member`.
    fn collection(&self, adapter: AdapterRef, member: &MemberSpec) -> Option<AdapterRef>;

    /// Elements of a collection adapter.
    ///
    /// Iteration order must be stable (insertion order): persistence
    /// reconciliation matches live elements to wire elements by position.
    fn elements(&self, collection: AdapterRef) -> Vec<AdapterRef>;

    /// Replace the whole contents of a collection adapter.
    fn replace_elements(&mut self, collection: AdapterRef, elements: Vec<AdapterRef>);

    /// Re-key a transient adapter under its new persistent identity.
    fn remap_as_persistent(&mut self, adapter: AdapterRef, oid: Oid);
}

/// Update-tracking collaborator notified once per object actually updated.
pub trait ChangeSink {
    /// `adapter`'s data was changed by a decode.
    fn object_changed(&mut self, adapter: AdapterRef);
}

/// Sink that drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoChanges;

impl ChangeSink for NoChanges {
    fn object_changed(&mut self, _adapter: AdapterRef) {}
}
