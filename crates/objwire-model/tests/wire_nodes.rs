// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Wire node transport through the field codec and through CBOR.

use objwire_codec::{CodecError, FieldCodec, SliceInput, DEFAULT_MAX_DEPTH};
use objwire_model::{
    wire_codec, CollectionNode, EncodedValueNode, ObjectNode, Oid, QueryNode, QueryParam,
    ReferenceNode, Version, WireNode,
};

fn order_graph() -> WireNode {
    let order = Oid::persistent(10);
    WireNode::Object(ObjectNode {
        oid: order.clone(),
        type_name: "shop.Order".into(),
        version: Some(Version::new(2, "sam", 1_700_000_000_000)),
        has_all_fields: false,
        fields: Some(vec![
            WireNode::EncodedValue(EncodedValueNode {
                type_name: "text".into(),
                encoded: Some("ORD-1".into()),
            }),
            WireNode::Reference(ReferenceNode {
                oid: Oid::persistent(3),
                type_name: "shop.Customer".into(),
                version: None,
            }),
            WireNode::Collection(CollectionNode {
                oid: Oid::for_field(&order, "lines"),
                element_type: "shop.Line".into(),
                elements: Some(vec![WireNode::null("shop.Line")]),
                has_all_elements: true,
            }),
            WireNode::EncodedValue(EncodedValueNode {
                type_name: "date".into(),
                encoded: None,
            }),
        ]),
    })
}

#[test]
fn nested_graph_survives_field_codec() {
    let codec = wire_codec().unwrap();
    let node = order_graph();
    let bytes = codec.encode_to_vec(&node).unwrap();
    let back: WireNode = codec.decode_from_bytes(&bytes).unwrap();
    assert_eq!(back, node);
}

#[test]
fn absent_fields_stay_distinct_from_all_null_fields() {
    let codec = wire_codec().unwrap();
    let base = ObjectNode {
        oid: Oid::transient(1),
        type_name: "shop.Customer".into(),
        version: None,
        fields: None,
        has_all_fields: false,
    };
    let all_null = ObjectNode {
        fields: Some(vec![WireNode::null("text"), WireNode::null("text")]),
        ..base.clone()
    };

    let none_back: WireNode = codec
        .decode_from_bytes(&codec.encode_to_vec(&WireNode::Object(base)).unwrap())
        .unwrap();
    let null_back: WireNode = codec
        .decode_from_bytes(&codec.encode_to_vec(&WireNode::Object(all_null)).unwrap())
        .unwrap();

    assert_eq!(none_back.as_object().unwrap().fields, None);
    assert_eq!(
        null_back.as_object().unwrap().fields.as_ref().map(Vec::len),
        Some(2)
    );
}

#[test]
fn receiver_without_wire_types_fails_loudly() {
    let bytes = wire_codec()
        .unwrap()
        .encode_to_vec(&WireNode::null("text"))
        .unwrap();
    let err = FieldCodec::default()
        .decode_from_bytes::<WireNode>(&bytes)
        .unwrap_err();
    assert_eq!(err, CodecError::UnknownEncodable("objwire.NullNode".into()));
}

#[test]
fn aggregated_identity_nests_through_codec() {
    let codec = wire_codec().unwrap();
    let oid = Oid::aggregated(Oid::aggregated(Oid::transient(4), "address"), "lines");
    let bytes = codec.encode_to_vec(&oid).unwrap();
    let back: Oid = codec.decode_from_bytes(&bytes).unwrap();
    assert_eq!(back, oid);
    assert!(back.is_transient());
}

// tag, type name and variant tag of an encoded Oid, up to the variant value
fn oid_header(codec: &FieldCodec) -> Vec<u8> {
    let bytes = codec.encode_to_vec(&Oid::persistent(1)).unwrap();
    let name = b"objwire.Oid";
    let end = bytes.windows(name.len()).position(|w| w == name).unwrap() + name.len() + 1;
    bytes[..end].to_vec()
}

#[test]
fn unknown_identity_variant_is_a_desync() {
    let codec = wire_codec().unwrap();
    let mut bytes = oid_header(&codec);
    bytes.push(7);
    let err = codec.decode_from_bytes::<Oid>(&bytes).unwrap_err();
    assert_eq!(
        err,
        CodecError::UnknownVariant {
            type_name: "objwire.Oid",
            variant: 7,
        }
    );
    assert!(err.is_desync());
}

#[test]
fn nesting_depth_is_bounded() {
    let oid = Oid::aggregated(Oid::aggregated(Oid::transient(4), "address"), "lines");
    let bytes = wire_codec().unwrap().encode_to_vec(&oid).unwrap();

    let tight = wire_codec().unwrap().with_max_depth(2);
    assert_eq!(
        tight.decode_from_bytes::<Oid>(&bytes),
        Err(CodecError::NestingTooDeep(2))
    );
    let roomy = wire_codec().unwrap().with_max_depth(3);
    assert_eq!(roomy.decode_from_bytes::<Oid>(&bytes).unwrap(), oid);
}

#[test]
fn endless_parent_chain_stops_at_the_default_depth() {
    let codec = wire_codec().unwrap();
    let header = oid_header(&codec);
    let mut bytes = Vec::with_capacity(10_000 * (header.len() + 1));
    for _ in 0..10_000 {
        bytes.extend_from_slice(&header);
        bytes.push(1);
    }
    assert_eq!(
        codec.decode_from_bytes::<Oid>(&bytes),
        Err(CodecError::NestingTooDeep(DEFAULT_MAX_DEPTH))
    );
}

#[test]
fn query_node_carries_every_param_kind() {
    let codec = wire_codec().unwrap();
    let query = QueryNode {
        kind: "find-using-service".into(),
        type_name: "shop.Customer".into(),
        params: vec![
            QueryParam::Text(Some("byCity".into())),
            QueryParam::Text(None),
            QueryParam::Flag(true),
            QueryParam::Texts(vec!["Leeds".into(), "York".into()]),
            QueryParam::Object(WireNode::null("shop.Customer")),
        ],
    };
    let bytes = codec.encode_to_vec(&query).unwrap();
    let back: QueryNode = codec.decode_from_bytes(&bytes).unwrap();
    assert_eq!(back, query);
}

#[test]
fn node_streams_can_be_concatenated() {
    let codec = wire_codec().unwrap();
    let mut bytes = Vec::new();
    {
        let mut w = codec.writer(&mut bytes);
        w.write_encodable(Some(&order_graph())).unwrap();
        w.write_encodable(None).unwrap();
        w.write_encodable(Some(&WireNode::null("x"))).unwrap();
    }
    let mut input = SliceInput::new(&bytes);
    let mut r = codec.reader(&mut input);
    assert_eq!(r.read_encodable::<WireNode>().unwrap(), Some(order_graph()));
    assert_eq!(r.read_encodable::<WireNode>().unwrap(), None);
    assert!(r.read_encodable::<WireNode>().unwrap().unwrap().is_null());
    assert!(r.is_at_end());
}

#[test]
fn serde_cbor_carriage_matches_field_codec_model() {
    let node = order_graph();
    let mut bytes = Vec::new();
    ciborium::ser::into_writer(&node, &mut bytes).unwrap();
    let back: WireNode = ciborium::de::from_reader(bytes.as_slice()).unwrap();
    assert_eq!(back, node);
}

proptest::proptest! {
    #[test]
    fn nested_identities_keep_their_root(
        serial in 0u64..u64::MAX,
        transient in proptest::bool::ANY,
        path in proptest::collection::vec("[a-z_]{1,12}", 0..6),
    ) {
        let root = if transient { Oid::transient(serial) } else { Oid::persistent(serial) };
        let oid = path.iter().fold(root, |parent, field| Oid::for_field(&parent, field));

        let codec = wire_codec().unwrap();
        let back: Oid = codec.decode_from_bytes(&codec.encode_to_vec(&oid).unwrap()).unwrap();
        proptest::prop_assert_eq!(&back, &oid);
        proptest::prop_assert_eq!(back.root().serial, serial);
        proptest::prop_assert_eq!(back.is_transient(), transient);
        proptest::prop_assert_eq!(back.is_aggregated(), !path.is_empty());
    }
}
