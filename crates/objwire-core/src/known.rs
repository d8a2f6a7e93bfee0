// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-call identity registry.

use objwire_model::Oid;
use rustc_hash::FxHashMap;

/// Identities already visited in one top-level encode or decode call.
///
/// Build a fresh registry per call; never share one between concurrent
/// calls. The encoder stores the reference node it emitted, the decoder the
/// adapter it produced.
#[derive(Debug, Clone)]
pub struct KnownObjects<T> {
    entries: FxHashMap<Oid, T>,
}

impl<T> Default for KnownObjects<T> {
    fn default() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }
}

impl<T> KnownObjects<T> {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` for `oid`, returning any previous entry.
    pub fn put(&mut self, oid: Oid, value: T) -> Option<T> {
        self.entries.insert(oid, value)
    }

    /// Entry for `oid`.
    pub fn get(&self, oid: &Oid) -> Option<&T> {
        self.entries.get(oid)
    }

    /// Returns `true` if `oid` was visited.
    pub fn contains(&self, oid: &Oid) -> bool {
        self.entries.contains_key(oid)
    }

    /// Number of distinct identities visited.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was visited.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every entry, keeping the allocation for the next call.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
