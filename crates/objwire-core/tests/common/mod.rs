// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::Arc;

use objwire_core::{
    AdapterRef, DecodeContext, EncodeKnown, EncodingPolicy, FieldOrderCache, Metamodel,
    NoChanges, ObjectDecoder, ObjectEncoder, Scalar, TypeSpec,
};
use objwire_dry_tests::{MemoryObjectSpace, SampleMetamodel, ADDRESS, CUSTOMER, ORDER, PRODUCT};
use objwire_model::{wire_codec, ObjectNode, Oid, Version, WireNode};

/// Field slots of `shop.Customer`.
pub const CUSTOMER_FIELDS: usize = 6;
/// Slot of `shop.Customer.address`.
pub const ADDRESS_SLOT: usize = 2;
/// Slot of `shop.Customer.orders`.
pub const ORDERS_SLOT: usize = 3;

/// Process-wide collaborators shared by both ends in a test.
pub struct Shop {
    pub model: SampleMetamodel,
    pub layouts: FieldOrderCache,
}

impl Shop {
    pub fn new() -> Self {
        Self {
            model: SampleMetamodel::new(),
            layouts: FieldOrderCache::new(),
        }
    }

    pub fn encoder(&self) -> ObjectEncoder<'_> {
        self.encoder_with(EncodingPolicy::default())
    }

    pub fn encoder_with(&self, policy: EncodingPolicy) -> ObjectEncoder<'_> {
        ObjectEncoder::new(&self.model, &self.layouts, policy)
    }

    pub fn decoder(&self) -> ObjectDecoder<'_> {
        ObjectDecoder::new(&self.model, &self.layouts)
    }

    pub fn spec(&self, name: &str) -> Arc<TypeSpec> {
        self.model.require(name).unwrap()
    }
}

pub fn version(sequence: u32) -> Version {
    Version::new(
        u64::from(sequence),
        "server",
        1_700_000_000_000 + i64::from(sequence),
    )
}

pub fn text(s: &str) -> Scalar {
    Scalar::Text(s.into())
}

pub fn money(minor_units: i64) -> Scalar {
    Scalar::Money {
        minor_units,
        currency: "EUR".into(),
    }
}

/// Handles into the server-side sample graph.
pub struct ServerGraph {
    pub customer: AdapterRef,
    pub address: AdapterRef,
    pub order_a: AdapterRef,
    pub order_b: AdapterRef,
    pub product: AdapterRef,
}

/// Customer P:1 at v1 with address P:2, orders P:10 and P:11 (each pointing
/// back at the customer) and product P:20 on the first order.
pub fn server_graph(shop: &Shop, space: &mut MemoryObjectSpace) -> ServerGraph {
    let customer = space.insert_persistent(&shop.spec(CUSTOMER), 1, Some(version(1)));
    let address = space.insert_persistent(&shop.spec(ADDRESS), 2, Some(version(1)));
    let order_a = space.insert_persistent(&shop.spec(ORDER), 10, Some(version(1)));
    let order_b = space.insert_persistent(&shop.spec(ORDER), 11, Some(version(1)));
    let product = space.insert_persistent(&shop.spec(PRODUCT), 20, Some(version(1)));

    space.set(customer, "name", text("Ada"));
    space.set(
        customer,
        "since",
        Scalar::Date {
            year: 2020,
            month: 1,
            day: 2,
        },
    );
    space.set(customer, "vip", Scalar::Boolean(true));
    space.link(customer, "address", address);
    space.push_element(customer, "orders", order_a);
    space.push_element(customer, "orders", order_b);

    space.set(address, "street", text("1 Analytical Way"));
    space.set(address, "city", text("London"));

    space.set(order_a, "number", text("A-10"));
    space.set(order_a, "total", money(1250));
    space.link(order_a, "customer", customer);
    space.push_element(order_a, "products", product);

    space.set(order_b, "number", text("A-11"));
    space.link(order_b, "customer", customer);

    space.set(product, "code", text("X-1"));
    space.set(product, "price", money(300));
    space.set(product, "stock", Scalar::Integer(4));

    ServerGraph {
        customer,
        address,
        order_a,
        order_b,
        product,
    }
}

/// Send `node` through the field codec, as a transport would.
pub fn transport(node: &WireNode) -> WireNode {
    let codec = wire_codec().unwrap();
    let bytes = codec.encode_to_vec(node).unwrap();
    codec.decode_from_bytes(&bytes).unwrap()
}

/// Tally full object nodes per identity.
pub fn count_objects(node: &WireNode, counts: &mut HashMap<Oid, usize>) {
    match node {
        WireNode::Object(object) => {
            *counts.entry(object.oid.clone()).or_default() += 1;
            for field in object.fields.iter().flatten() {
                count_objects(field, counts);
            }
        }
        WireNode::Collection(collection) => {
            for element in collection.elements.iter().flatten() {
                count_objects(element, counts);
            }
        }
        _ => {}
    }
}

fn persist_oid(oid: &Oid) -> Oid {
    match oid {
        Oid::Root(root) if root.transient => Oid::persistent(root.serial + 100),
        Oid::Root(_) => oid.clone(),
        Oid::Aggregated(agg) => Oid::aggregated(persist_oid(&agg.parent), agg.local_id.clone()),
    }
}

/// What a server answers after saving a transient graph: every transient
/// identity T:n becomes P:(n + 100) at `version`.
pub fn persisted_image(node: &WireNode, at: &Version) -> WireNode {
    match node {
        WireNode::Object(object) => WireNode::Object(ObjectNode {
            oid: persist_oid(&object.oid),
            version: Some(at.clone()),
            fields: object
                .fields
                .as_ref()
                .map(|fields| fields.iter().map(|f| persisted_image(f, at)).collect()),
            ..object.clone()
        }),
        WireNode::Collection(collection) => {
            let mut collection = collection.clone();
            collection.oid = persist_oid(&collection.oid);
            collection.elements = collection
                .elements
                .map(|elements| elements.iter().map(|e| persisted_image(e, at)).collect());
            WireNode::Collection(collection)
        }
        WireNode::Reference(reference) => {
            let mut reference = reference.clone();
            reference.oid = persist_oid(&reference.oid);
            reference.version = Some(at.clone());
            WireNode::Reference(reference)
        }
        other => other.clone(),
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

pub fn fields(node: &WireNode) -> &[WireNode] {
    node.as_object().unwrap().fields.as_deref().unwrap()
}

/// Decode `node` into `space` with a fresh context and no change sink.
pub fn receive(shop: &Shop, space: &mut MemoryObjectSpace, node: &WireNode) -> AdapterRef {
    let mut changes = NoChanges;
    let mut ctx = DecodeContext::new(space, &mut changes);
    shop.decoder()
        .decode(&mut ctx, node)
        .unwrap()
        .as_object()
        .unwrap()
}

/// Client copy of the sample graph, fully resolved.
pub fn client_copy(
    shop: &Shop,
    server: &MemoryObjectSpace,
    root: AdapterRef,
) -> (MemoryObjectSpace, AdapterRef) {
    let node = shop
        .encoder()
        .encode_complete_graph(server, root, &mut EncodeKnown::new())
        .unwrap();
    let mut client = MemoryObjectSpace::new();
    let adapter = receive(shop, &mut client, &transport(&node));
    (client, adapter)
}
