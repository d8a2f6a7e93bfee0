// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Server graph out through the encoder, across the field codec and back in
//! through the decoder.

mod common;

use std::collections::HashMap;

use common::{
    client_copy, count_objects, fields, init_tracing, receive, server_graph, text, transport,
    version, Shop, ADDRESS_SLOT, CUSTOMER_FIELDS, ORDERS_SLOT,
};
use objwire_core::{DecodeContext, EncodeKnown, NoChanges, ObjectSpace, ResolveState, Scalar};
use objwire_dry_tests::{MemoryObjectSpace, ADDRESS, CUSTOMER};
use objwire_model::{Oid, WireNode};

#[test]
fn complete_graph_rebuilds_on_the_client() {
    init_tracing();
    let shop = Shop::new();
    let mut server = MemoryObjectSpace::new();
    let graph = server_graph(&shop, &mut server);

    let (client, customer) = client_copy(&shop, &server, graph.customer);

    assert_eq!(client.oid(customer), Some(Oid::persistent(1)));
    assert_eq!(client.version(customer), Some(version(1)));
    assert_eq!(client.get(customer, "name"), Some(text("Ada")));
    assert_eq!(client.get(customer, "vip"), Some(Scalar::Boolean(true)));
    assert_eq!(
        client.get(customer, "since"),
        Some(Scalar::Date {
            year: 2020,
            month: 1,
            day: 2
        })
    );

    let address = client.linked(customer, "address").unwrap();
    assert_eq!(client.get(address, "city"), Some(text("London")));

    let orders = client.elements_of(customer, "orders");
    let oids: Vec<_> = orders.iter().map(|o| client.oid(*o).unwrap()).collect();
    assert_eq!(oids, vec![Oid::persistent(10), Oid::persistent(11)]);

    // the back reference lands on the same live object
    for order in &orders {
        assert_eq!(client.linked(*order, "customer"), Some(customer));
    }
    let products = client.elements_of(orders[0], "products");
    assert_eq!(products.len(), 1);
    assert_eq!(client.get(products[0], "stock"), Some(Scalar::Integer(4)));

    for adapter in [customer, address, orders[0], orders[1], products[0]] {
        assert_eq!(client.resolve_state(adapter), Some(ResolveState::Resolved));
    }
    let collection = client.collection_of(customer, "orders").unwrap();
    assert_eq!(client.resolve_state(collection), Some(ResolveState::Resolved));
    assert_eq!(client.version(collection), Some(version(1)));
}

#[test]
fn every_identity_is_encoded_in_full_once() {
    let shop = Shop::new();
    let mut server = MemoryObjectSpace::new();
    let graph = server_graph(&shop, &mut server);

    let node = shop
        .encoder()
        .encode_complete_graph(&server, graph.customer, &mut EncodeKnown::new())
        .unwrap();

    let mut counts = HashMap::new();
    count_objects(&node, &mut counts);
    assert_eq!(counts.len(), 5);
    assert!(counts.values().all(|n| *n == 1), "{counts:?}");

    let orders = fields(&node)[ORDERS_SLOT].as_collection().unwrap();
    let first = &orders.elements.as_ref().unwrap()[0];
    let back = &fields(first)[2];
    assert!(back.as_reference().is_some());
    assert_eq!(back.oid(), Some(&Oid::persistent(1)));
}

#[test]
fn depth_one_sends_identities_of_neighbours() {
    let shop = Shop::new();
    let mut server = MemoryObjectSpace::new();
    let graph = server_graph(&shop, &mut server);

    let node = shop
        .encoder()
        .encode_graph(&server, graph.customer, 1, &mut EncodeKnown::new())
        .unwrap();
    let root = node.as_object().unwrap();
    assert!(root.has_all_fields);

    let slots = fields(&node);
    assert_eq!(slots.len(), CUSTOMER_FIELDS);
    assert!(slots[ADDRESS_SLOT].as_reference().is_some());
    let orders = slots[ORDERS_SLOT].as_collection().unwrap();
    assert!(orders.has_all_elements);
    assert_eq!(orders.oid, Oid::for_field(&Oid::persistent(1), "orders"));
    let elements = orders.elements.as_ref().unwrap();
    assert_eq!(elements.len(), 2);
    assert!(elements.iter().all(|e| e.as_reference().is_some()));
    assert!(slots[5].is_null());
}

#[test]
fn depth_two_stops_below_the_orders() {
    let shop = Shop::new();
    let mut server = MemoryObjectSpace::new();
    let graph = server_graph(&shop, &mut server);

    let node = shop
        .encoder()
        .encode_graph(&server, graph.customer, 2, &mut EncodeKnown::new())
        .unwrap();

    let mut counts = HashMap::new();
    count_objects(&node, &mut counts);
    let mut full: Vec<_> = counts.keys().cloned().collect();
    full.sort();
    let mut expected = vec![
        Oid::persistent(1),
        Oid::persistent(2),
        Oid::persistent(10),
        Oid::persistent(11),
    ];
    expected.sort();
    assert_eq!(full, expected);
}

#[test]
fn zero_depth_is_identity_only() {
    let shop = Shop::new();
    let mut server = MemoryObjectSpace::new();
    let graph = server_graph(&shop, &mut server);

    let node = shop
        .encoder()
        .encode_graph(&server, graph.customer, 0, &mut EncodeKnown::new())
        .unwrap();
    let reference = node.as_reference().unwrap();
    assert_eq!(reference.oid, Oid::persistent(1));
    assert_eq!(reference.version, Some(version(1)));
}

#[test]
fn cleared_reference_travels_as_null() {
    let shop = Shop::new();
    let mut server = MemoryObjectSpace::new();
    let graph = server_graph(&shop, &mut server);
    let (mut client, customer) = client_copy(&shop, &server, graph.customer);
    assert!(client.linked(customer, "address").is_some());

    let spec = shop.spec(CUSTOMER);
    let address = spec.member("address").unwrap();
    server.set_reference(graph.customer, address, None);
    server.set_version(graph.customer, Some(version(2)));

    let node = shop
        .encoder()
        .encode_changed_object(&server, graph.customer, &mut EncodeKnown::new())
        .unwrap();
    assert!(fields(&node)[ADDRESS_SLOT].is_null());

    receive(&shop, &mut client, &transport(&node));
    assert_eq!(client.linked(customer, "address"), None);
    assert_eq!(client.version(customer), Some(version(2)));
}

#[test]
fn transient_cycle_arrives_as_one_object() {
    init_tracing();
    let shop = Shop::new();
    let mut client = MemoryObjectSpace::new();
    let customer = client.new_transient(&shop.spec(CUSTOMER));
    let address = client.new_transient(&shop.spec(ADDRESS));
    client.set(customer, "name", text("Grace"));
    client.link(customer, "address", address);
    client.link(customer, "referred_by", customer);
    client.set(address, "city", text("Arlington"));

    let node = shop
        .encoder()
        .encode_make_persistent_graph(&client, customer, &mut EncodeKnown::new())
        .unwrap();
    let slots = fields(&node);
    assert!(slots[5].as_reference().is_some());
    assert!(slots[ADDRESS_SLOT].as_object().is_some());

    let mut server = MemoryObjectSpace::new();
    let received = {
        let mut changes = NoChanges;
        let mut ctx = DecodeContext::new(&mut server, &mut changes);
        let decoded = shop.decoder().decode(&mut ctx, &transport(&node)).unwrap();
        assert_eq!(ctx.known().len(), 2);
        decoded.as_object().unwrap()
    };

    assert_eq!(server.oid(received), Some(Oid::transient(1)));
    assert_eq!(server.linked(received, "referred_by"), Some(received));
    assert_eq!(server.get(received, "name"), Some(text("Grace")));
    assert_eq!(server.resolve_state(received), Some(ResolveState::Transient));
    assert_eq!(
        server.state_history(received),
        vec![ResolveState::SerializingTransient, ResolveState::Transient]
    );
    let server_address = server.linked(received, "address").unwrap();
    assert_eq!(server.oid(server_address), Some(Oid::transient(2)));
    assert_eq!(server.get(server_address, "city"), Some(text("Arlington")));
}

#[test]
fn reference_to_unknown_identity_becomes_a_ghost() {
    let shop = Shop::new();
    let mut server = MemoryObjectSpace::new();
    let graph = server_graph(&shop, &mut server);
    let node = shop
        .encoder()
        .encode_graph(&server, graph.customer, 1, &mut EncodeKnown::new())
        .unwrap();

    let mut client = MemoryObjectSpace::new();
    let customer = receive(&shop, &mut client, &node);
    let address = client.linked(customer, "address").unwrap();
    assert_eq!(client.resolve_state(address), Some(ResolveState::Ghost));
    assert_eq!(client.oid(address), Some(Oid::persistent(2)));
    assert_eq!(client.get(address, "city"), None);

    // ghosts have no data to send back
    let echoed = shop
        .encoder()
        .encode_graph(&client, address, 5, &mut EncodeKnown::new())
        .unwrap();
    assert!(echoed.as_reference().is_some());
}

#[test]
fn ghost_collection_is_sent_without_contents() {
    let shop = Shop::new();
    let mut server = MemoryObjectSpace::new();
    let graph = server_graph(&shop, &mut server);
    let orders = server.collection_of(graph.customer, "orders").unwrap();
    server.set_resolve_state(orders, ResolveState::Ghost);

    let node = shop
        .encoder()
        .encode_complete_graph(&server, graph.customer, &mut EncodeKnown::new())
        .unwrap();
    assert!(!node.as_object().unwrap().has_all_fields);
    let collection = fields(&node)[ORDERS_SLOT].as_collection().unwrap();
    assert_eq!(collection.elements, None);
    assert!(!collection.has_all_elements);
    assert!(matches!(fields(&node)[ADDRESS_SLOT], WireNode::Object(_)));
}
