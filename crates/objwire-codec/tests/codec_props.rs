// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Property tests for primitive and array fields.

use objwire_codec::{CodecError, FieldCodec, FieldKind, SliceInput, NULL_BIT};
use proptest::prelude::*;

proptest! {
    #[test]
    fn primitives_survive_write_then_read(
        b in any::<bool>(),
        i in any::<i32>(),
        l in any::<i64>(),
        c in any::<char>(),
        s in ".{0,64}",
        d in any::<f64>().prop_filter("nan never compares equal", |v| !v.is_nan()),
    ) {
        let codec = FieldCodec::default();
        let mut bytes = Vec::new();
        {
            let mut w = codec.writer(&mut bytes);
            w.write_bool(b).unwrap();
            w.write_int(i).unwrap();
            w.write_long(l).unwrap();
            w.write_char(c).unwrap();
            w.write_string(Some(s.as_str())).unwrap();
            w.write_double(d).unwrap();
        }
        let mut input = SliceInput::new(&bytes);
        let mut r = codec.reader(&mut input);
        prop_assert_eq!(r.read_bool().unwrap(), b);
        prop_assert_eq!(r.read_int().unwrap(), i);
        prop_assert_eq!(r.read_long().unwrap(), l);
        prop_assert_eq!(r.read_char().unwrap(), c);
        prop_assert_eq!(r.read_string().unwrap(), Some(s));
        prop_assert_eq!(r.read_double().unwrap(), d);
        prop_assert!(r.is_at_end());
    }

    #[test]
    fn sparse_arrays_keep_null_elements(values in prop::collection::vec(any::<Option<i16>>(), 0..32)) {
        let codec = FieldCodec::default();
        let mut bytes = Vec::new();
        codec.writer(&mut bytes).write_array(Some(values.as_slice())).unwrap();
        let mut input = SliceInput::new(&bytes);
        let back = codec.reader(&mut input).read_array::<i16>().unwrap();
        prop_assert_eq!(back, Some(values));
    }

    #[test]
    fn arbitrary_bytes_never_panic_the_reader(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let codec = FieldCodec::default();
        let mut input = SliceInput::new(&bytes);
        let mut r = codec.reader(&mut input);
        let _ = r.read_array::<String>();
        let _ = r.read_dyn_encodable();
    }
}

#[test]
fn array_layout_is_tag_count_then_tagged_elements() {
    let codec = FieldCodec::default();
    let mut bytes = Vec::new();
    codec
        .writer(&mut bytes)
        .write_array(Some(&[Some(true), None][..]))
        .unwrap();
    let array_tag = codec.kinds().tag_of(FieldKind::BooleanArray).unwrap();
    let bool_tag = codec.kinds().tag_of(FieldKind::Boolean).unwrap();
    assert_eq!(
        bytes,
        vec![array_tag, 2, 0, 0, 0, bool_tag, 1, bool_tag | NULL_BIT]
    );
}

#[test]
fn negative_array_count_is_rejected() {
    let codec = FieldCodec::default();
    let array_tag = codec.kinds().tag_of(FieldKind::IntArray).unwrap();
    let mut bytes = vec![array_tag];
    bytes.extend_from_slice(&(-1i32).to_le_bytes());
    let mut input = SliceInput::new(&bytes);
    assert_eq!(
        codec.reader(&mut input).read_array::<i32>(),
        Err(CodecError::NegativeLength(-1))
    );
}

#[test]
fn dense_array_rejects_null_element() {
    let codec = FieldCodec::default();
    let mut bytes = Vec::new();
    codec
        .writer(&mut bytes)
        .write_array(Some(&[Some(1.5f32), None][..]))
        .unwrap();
    let mut input = SliceInput::new(&bytes);
    assert_eq!(
        codec.reader(&mut input).read_dense_array::<f32>(),
        Err(CodecError::UnexpectedNull(FieldKind::Float))
    );
}
