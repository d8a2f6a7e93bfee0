// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! A small shop metamodel.
//!
//! | type | members |
//! |---|---|
//! | `shop.Customer` | name, since, address → Address, orders → [Order], vip, referred_by → Customer, *archive*, *display* |
//! | `shop.Order` | number, total, customer → Customer, products → [Product], *cancel* |
//! | `shop.Address` | street, city |
//! | `shop.Product` | code, price, stock |
//! | `shop.Quote` | note, product → Product (never persistable) |
//!
//! *Italic* members are actions or derived and take no field slot.

use std::collections::HashMap;
use std::sync::Arc;

use objwire_core::{
    BooleanCodec, DateCodec, IntegerCodec, MemberSpec, Metamodel, MoneyCodec, TextCodec, TypeSpec,
};

/// Customer type name.
pub const CUSTOMER: &str = "shop.Customer";
/// Order type name.
pub const ORDER: &str = "shop.Order";
/// Address type name.
pub const ADDRESS: &str = "shop.Address";
/// Product type name.
pub const PRODUCT: &str = "shop.Product";
/// Transient-only quote type name.
pub const QUOTE: &str = "shop.Quote";

/// In-memory [`Metamodel`] preloaded with the shop types and the built-in
/// value types (`text`, `integer`, `boolean`, `money`, `date`).
#[derive(Debug, Clone)]
pub struct SampleMetamodel {
    types: HashMap<String, Arc<TypeSpec>>,
}

impl Default for SampleMetamodel {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleMetamodel {
    /// Shop model plus value types.
    pub fn new() -> Self {
        let mut model = Self::values_only();
        model.insert(
            TypeSpec::object(CUSTOMER)
                .with_member(MemberSpec::value("name", "text"))
                .with_member(MemberSpec::value("since", "date"))
                .with_member(MemberSpec::reference("address", ADDRESS))
                .with_member(MemberSpec::collection("orders", ORDER))
                .with_member(MemberSpec::value("vip", "boolean"))
                .with_member(MemberSpec::reference("referred_by", CUSTOMER))
                .with_member(MemberSpec::action("archive"))
                .with_member(MemberSpec::value("display", "text").derived()),
        );
        model.insert(
            TypeSpec::object(ORDER)
                .with_member(MemberSpec::value("number", "text"))
                .with_member(MemberSpec::value("total", "money"))
                .with_member(MemberSpec::reference("customer", CUSTOMER))
                .with_member(MemberSpec::collection("products", PRODUCT))
                .with_member(MemberSpec::action("cancel")),
        );
        model.insert(
            TypeSpec::object(ADDRESS)
                .with_member(MemberSpec::value("street", "text"))
                .with_member(MemberSpec::value("city", "text")),
        );
        model.insert(
            TypeSpec::object(PRODUCT)
                .with_member(MemberSpec::value("code", "text"))
                .with_member(MemberSpec::value("price", "money"))
                .with_member(MemberSpec::value("stock", "integer")),
        );
        model.insert(
            TypeSpec::object(QUOTE)
                .with_member(MemberSpec::value("note", "text"))
                .with_member(MemberSpec::reference("product", PRODUCT))
                .transient_only(),
        );
        model
    }

    /// Only the built-in value types.
    pub fn values_only() -> Self {
        let mut model = Self {
            types: HashMap::new(),
        };
        model.insert(TypeSpec::value("text", Arc::new(TextCodec)));
        model.insert(TypeSpec::value("integer", Arc::new(IntegerCodec)));
        model.insert(TypeSpec::value("boolean", Arc::new(BooleanCodec)));
        model.insert(TypeSpec::value("money", Arc::new(MoneyCodec)));
        model.insert(TypeSpec::value("date", Arc::new(DateCodec)));
        model
    }

    /// Add or replace a type.
    pub fn insert(&mut self, spec: TypeSpec) {
        self.types.insert(spec.name.clone(), Arc::new(spec));
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with_type(mut self, spec: TypeSpec) -> Self {
        self.insert(spec);
        self
    }
}

impl Metamodel for SampleMetamodel {
    fn specification(&self, type_name: &str) -> Option<Arc<TypeSpec>> {
        self.types.get(type_name).cloned()
    }
}
