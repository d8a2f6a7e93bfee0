// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory object space.

use std::collections::{BTreeMap, HashMap};

use objwire_core::{
    AdapterRef, MemberKind, MemberSpec, ObjectSpace, ResolveState, Scalar, TypeSpec,
};
use objwire_model::{Oid, Version};

#[derive(Debug, Clone)]
struct Slot {
    oid: Oid,
    type_name: String,
    version: Option<Version>,
    state: ResolveState,
    values: BTreeMap<String, Scalar>,
    references: BTreeMap<String, AdapterRef>,
    collections: BTreeMap<String, AdapterRef>,
    elements: Vec<AdapterRef>,
}

impl Slot {
    fn new(oid: Oid, type_name: &str, state: ResolveState) -> Self {
        Self {
            oid,
            type_name: type_name.to_owned(),
            version: None,
            state,
            values: BTreeMap::new(),
            references: BTreeMap::new(),
            collections: BTreeMap::new(),
            elements: Vec::new(),
        }
    }
}

/// [`ObjectSpace`] backed by plain maps.
///
/// Collections keep insertion order. Every object gets one collection
/// adapter per collection member of its type, identified by
/// [`Oid::for_field`] and starting in the owner's state.
///
/// Test-side helpers look members up by name and ignore unknown handles.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectSpace {
    slots: Vec<Slot>,
    by_oid: HashMap<Oid, AdapterRef>,
    next_serial: u64,
    state_log: Vec<(AdapterRef, ResolveState)>,
}

impl MemoryObjectSpace {
    /// Create an empty space.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, adapter: AdapterRef) -> Option<&Slot> {
        usize::try_from(adapter.0)
            .ok()
            .and_then(|idx| self.slots.get(idx))
    }

    fn slot_mut(&mut self, adapter: AdapterRef) -> Option<&mut Slot> {
        usize::try_from(adapter.0)
            .ok()
            .and_then(|idx| self.slots.get_mut(idx))
    }

    fn push(&mut self, slot: Slot) -> AdapterRef {
        let adapter = AdapterRef(u64::try_from(self.slots.len()).unwrap_or(u64::MAX));
        self.by_oid.insert(slot.oid.clone(), adapter);
        self.slots.push(slot);
        adapter
    }

    fn create(&mut self, oid: &Oid, spec: &TypeSpec, state: ResolveState) -> AdapterRef {
        let adapter = self.push(Slot::new(oid.clone(), &spec.name, state));
        for member in spec
            .members
            .iter()
            .filter(|m| m.kind == MemberKind::Collection)
        {
            let collection = self.push(Slot::new(
                Oid::for_field(oid, &member.name),
                &member.type_name,
                state,
            ));
            if let Some(slot) = self.slot_mut(adapter) {
                slot.collections.insert(member.name.clone(), collection);
            }
        }
        adapter
    }

    /// New transient object with a fresh transient identity.
    pub fn new_transient(&mut self, spec: &TypeSpec) -> AdapterRef {
        self.next_serial += 1;
        let oid = Oid::transient(self.next_serial);
        self.create(&oid, spec, ResolveState::Transient)
    }

    /// Resolved persistent object with identity `serial` at `version`.
    /// Its collections start resolved and empty.
    pub fn insert_persistent(
        &mut self,
        spec: &TypeSpec,
        serial: u64,
        version: Option<Version>,
    ) -> AdapterRef {
        let adapter = self.create(&Oid::persistent(serial), spec, ResolveState::Resolved);
        let collections: Vec<_> = self
            .slot(adapter)
            .map(|s| s.collections.values().copied().collect())
            .unwrap_or_default();
        for collection in std::iter::once(adapter).chain(collections) {
            if let Some(slot) = self.slot_mut(collection) {
                slot.version.clone_from(&version);
            }
        }
        adapter
    }

    /// Number of adapters (objects and collections).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the space holds no adapters.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Set value member `name`.
    pub fn set(&mut self, adapter: AdapterRef, name: &str, value: Scalar) {
        if let Some(slot) = self.slot_mut(adapter) {
            slot.values.insert(name.to_owned(), value);
        }
    }

    /// Value member `name`.
    pub fn get(&self, adapter: AdapterRef, name: &str) -> Option<Scalar> {
        self.slot(adapter).and_then(|s| s.values.get(name).cloned())
    }

    /// Point reference member `name` at `target`.
    pub fn link(&mut self, adapter: AdapterRef, name: &str, target: AdapterRef) {
        if let Some(slot) = self.slot_mut(adapter) {
            slot.references.insert(name.to_owned(), target);
        }
    }

    /// Target of reference member `name`.
    pub fn linked(&self, adapter: AdapterRef, name: &str) -> Option<AdapterRef> {
        self.slot(adapter)
            .and_then(|s| s.references.get(name).copied())
    }

    /// Collection adapter behind collection member `name`.
    pub fn collection_of(&self, adapter: AdapterRef, name: &str) -> Option<AdapterRef> {
        self.slot(adapter)
            .and_then(|s| s.collections.get(name).copied())
    }

    /// Append `element` to collection member `name`.
    pub fn push_element(&mut self, adapter: AdapterRef, name: &str, element: AdapterRef) {
        if let Some(collection) = self.collection_of(adapter, name) {
            if let Some(slot) = self.slot_mut(collection) {
                slot.elements.push(element);
            }
        }
    }

    /// Every state `adapter` was put in through
    /// [`ObjectSpace::set_resolve_state`], oldest first.
    pub fn state_history(&self, adapter: AdapterRef) -> Vec<ResolveState> {
        self.state_log
            .iter()
            .filter(|(a, _)| *a == adapter)
            .map(|(_, s)| *s)
            .collect()
    }

    /// Elements of collection member `name`.
    pub fn elements_of(&self, adapter: AdapterRef, name: &str) -> Vec<AdapterRef> {
        self.collection_of(adapter, name)
            .map(|c| self.elements(c))
            .unwrap_or_default()
    }
}

impl ObjectSpace for MemoryObjectSpace {
    fn adapter_for(&self, oid: &Oid) -> Option<AdapterRef> {
        self.by_oid.get(oid).copied()
    }

    fn recreate_placeholder(&mut self, oid: &Oid, spec: &TypeSpec) -> AdapterRef {
        self.create(oid, spec, ResolveState::Ghost)
    }

    fn create_transient(&mut self, oid: &Oid, spec: &TypeSpec) -> AdapterRef {
        self.next_serial = self.next_serial.max(oid.root().serial);
        self.create(oid, spec, ResolveState::Transient)
    }

    fn oid(&self, adapter: AdapterRef) -> Option<Oid> {
        self.slot(adapter).map(|s| s.oid.clone())
    }

    fn type_name(&self, adapter: AdapterRef) -> Option<String> {
        self.slot(adapter).map(|s| s.type_name.clone())
    }

    fn version(&self, adapter: AdapterRef) -> Option<Version> {
        self.slot(adapter).and_then(|s| s.version.clone())
    }

    fn set_version(&mut self, adapter: AdapterRef, version: Option<Version>) {
        if let Some(slot) = self.slot_mut(adapter) {
            slot.version = version;
        }
    }

    fn resolve_state(&self, adapter: AdapterRef) -> Option<ResolveState> {
        self.slot(adapter).map(|s| s.state)
    }

    fn set_resolve_state(&mut self, adapter: AdapterRef, state: ResolveState) {
        let Some(slot) = self.slot_mut(adapter) else {
            return;
        };
        slot.state = state;
        self.state_log.push((adapter, state));
    }

    fn reference(&self, adapter: AdapterRef, member: &MemberSpec) -> Option<AdapterRef> {
        self.linked(adapter, &member.name)
    }

    fn set_reference(
        &mut self,
        adapter: AdapterRef,
        member: &MemberSpec,
        target: Option<AdapterRef>,
    ) {
        if let Some(slot) = self.slot_mut(adapter) {
            match target {
                Some(target) => slot.references.insert(member.name.clone(), target),
                None => slot.references.remove(&member.name),
            };
        }
    }

    fn value(&self, adapter: AdapterRef, member: &MemberSpec) -> Option<Scalar> {
        self.get(adapter, &member.name)
    }

    fn set_value(&mut self, adapter: AdapterRef, member: &MemberSpec, value: Option<Scalar>) {
        if let Some(slot) = self.slot_mut(adapter) {
            match value {
                Some(value) => slot.values.insert(member.name.clone(), value),
                None => slot.values.remove(&member.name),
            };
        }
    }

    fn collection(&self, adapter: AdapterRef, member: &MemberSpec) -> Option<AdapterRef> {
        self.collection_of(adapter, &member.name)
    }

    fn elements(&self, collection: AdapterRef) -> Vec<AdapterRef> {
        self.slot(collection)
            .map(|s| s.elements.clone())
            .unwrap_or_default()
    }

    fn replace_elements(&mut self, collection: AdapterRef, elements: Vec<AdapterRef>) {
        if let Some(slot) = self.slot_mut(collection) {
            slot.elements = elements;
        }
    }

    fn remap_as_persistent(&mut self, adapter: AdapterRef, oid: Oid) {
        let Some(slot) = self.slot_mut(adapter) else {
            return;
        };
        let old = std::mem::replace(&mut slot.oid, oid.clone());
        self.by_oid.remove(&old);
        self.by_oid.insert(oid, adapter);
    }
}
