// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Process-wide cache of each type's positional field layout.

use std::sync::{Arc, PoisonError, RwLock};

use rustc_hash::FxHashMap;

use crate::{MemberSpec, TypeSpec};

/// Positional field layout shared by both ends of the wire.
///
/// The layout of a type is its serializable members (values, references and
/// collections that are persisted) in declaration order. It is computed once
/// per type and shared read-only afterwards. Concurrent first lookups may
/// compute the layout twice; the first insert wins and both callers observe
/// the same slice.
#[derive(Debug, Default)]
pub struct FieldOrderCache {
    layouts: RwLock<FxHashMap<String, Arc<[MemberSpec]>>>,
}

impl FieldOrderCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Layout for `spec`.
    pub fn fields(&self, spec: &TypeSpec) -> Arc<[MemberSpec]> {
        {
            let layouts = self.layouts.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(layout) = layouts.get(&spec.name) {
                return Arc::clone(layout);
            }
        }
        let computed: Arc<[MemberSpec]> = spec
            .members
            .iter()
            .filter(|m| m.is_serializable())
            .cloned()
            .collect();
        let mut layouts = self.layouts.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(layouts.entry(spec.name.clone()).or_insert(computed))
    }

    /// Number of cached layouts.
    pub fn len(&self) -> usize {
        self.layouts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no layout has been computed yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn order() -> TypeSpec {
        TypeSpec::object("shop.Order")
            .with_member(MemberSpec::value("number", "text"))
            .with_member(MemberSpec::action("cancel"))
            .with_member(MemberSpec::reference("customer", "shop.Customer"))
            .with_member(MemberSpec::value("total", "money").derived())
            .with_member(MemberSpec::collection("lines", "shop.Line"))
    }

    #[test]
    fn layout_keeps_declaration_order_and_drops_unserializable() {
        let cache = FieldOrderCache::new();
        let names: Vec<_> = cache
            .fields(&order())
            .iter()
            .map(|m| m.name.clone())
            .collect();
        assert_eq!(names, ["number", "customer", "lines"]);
    }

    #[test]
    fn layout_is_computed_once() {
        let cache = FieldOrderCache::new();
        let first = cache.fields(&order());
        let second = cache.fields(&order());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn racing_first_lookups_agree() {
        let cache = Arc::new(FieldOrderCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.fields(&order()))
            })
            .collect();
        let layouts: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for layout in &layouts {
            assert!(Arc::ptr_eq(layout, &layouts[0]));
        }
    }
}
