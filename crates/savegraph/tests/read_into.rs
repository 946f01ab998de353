// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Read-into contracts: the target's length is the authority, dictionaries
//! only update keys they already hold, and a failed pass leaves the target
//! untouched.

use savegraph::codec;
use savegraph::{
    ArrayValue, CodecError, CompositeBuilder, ObjectValue, PrimitiveKind, Registry, TypeInfo,
    TypeRef, Value,
};
use std::collections::BTreeMap;

fn int() -> TypeRef {
    TypeInfo::primitive(PrimitiveKind::I32)
}

fn int_array(items: &[i32]) -> Value {
    Value::Array(ArrayValue::vector(items.iter().copied().map(Value::I32).collect()))
}

fn int_list(items: &[i32]) -> Value {
    Value::List(items.iter().copied().map(Value::I32).collect())
}

fn grid(rows: usize, cols: usize, start: i32) -> Value {
    let items = (0..rows * cols).map(|i| Value::I32(start + i as i32)).collect();
    Value::Array(ArrayValue::new(vec![rows, cols], items).expect("dims"))
}

fn dict(entries: &[(&str, i32)]) -> Value {
    Value::Dict(
        entries
            .iter()
            .map(|(k, v)| (Value::from(*k), Value::I32(*v)))
            .collect::<BTreeMap<_, _>>(),
    )
}

#[test]
fn test_array_capacity_contract() {
    let registry = Registry::new();
    let ty = TypeInfo::array(int(), 1);

    let five = codec::serialize(&registry, &ty, &int_array(&[1, 2, 3, 4, 5])).expect("five");
    let four = codec::serialize(&registry, &ty, &int_array(&[1, 2, 3, 4])).expect("four");
    let six = codec::serialize(&registry, &ty, &int_array(&[1, 2, 3, 4, 5, 6])).expect("six");

    let mut target = int_array(&[0; 5]);
    codec::deserialize_into(&registry, &ty, &five, &mut target).expect("exact fit");
    assert_eq!(target, int_array(&[1, 2, 3, 4, 5]));

    let mut target = int_array(&[0; 5]);
    let err = codec::deserialize_into(&registry, &ty, &four, &mut target).expect_err("short");
    assert!(matches!(
        err,
        CodecError::TooFewElements {
            expected: 5,
            found: 4
        }
    ));
    assert_eq!(target, int_array(&[0; 5]));

    let err = codec::deserialize_into(&registry, &ty, &six, &mut target).expect_err("long");
    assert!(matches!(err, CodecError::TooManyElements { expected: 5 }));
    assert_eq!(target, int_array(&[0; 5]));
}

#[test]
fn test_list_capacity_contract() {
    let registry = Registry::new();
    let ty = TypeInfo::list(int());
    let payload = codec::serialize(&registry, &ty, &int_list(&[9, 8, 7])).expect("payload");

    let mut three = int_list(&[0, 0, 0]);
    codec::deserialize_into(&registry, &ty, &payload, &mut three).expect("fit");
    assert_eq!(three, int_list(&[9, 8, 7]));

    let mut two = int_list(&[1, 1]);
    assert!(matches!(
        codec::deserialize_into(&registry, &ty, &payload, &mut two),
        Err(CodecError::TooManyElements { expected: 2 })
    ));

    let mut empty = int_list(&[]);
    assert!(matches!(
        codec::deserialize_into(&registry, &ty, &payload, &mut empty),
        Err(CodecError::TooManyElements { expected: 0 })
    ));
}

#[test]
fn test_two_dimensional_bounds_checked_per_dimension() {
    let registry = Registry::new();
    let ty = TypeInfo::array(int(), 2);
    let payload = codec::serialize(&registry, &ty, &grid(2, 2, 10)).expect("2x2");

    let mut fits = grid(2, 2, 0);
    codec::deserialize_into(&registry, &ty, &payload, &mut fits).expect("2x2 into 2x2");
    assert_eq!(fits, grid(2, 2, 10));

    // Rows too short for the target: nothing is written.
    let mut wide = grid(2, 3, 0);
    let err = codec::deserialize_into(&registry, &ty, &payload, &mut wide).expect_err("narrow");
    assert!(matches!(
        err,
        CodecError::TooFewElements {
            expected: 3,
            found: 2
        }
    ));
    assert_eq!(wide, grid(2, 3, 0));

    let mut short = grid(1, 2, 0);
    assert!(matches!(
        codec::deserialize_into(&registry, &ty, &payload, &mut short),
        Err(CodecError::TooManyElements { expected: 1 })
    ));
    assert_eq!(short, grid(1, 2, 0));
}

#[test]
fn test_dictionary_key_discipline() {
    let registry = Registry::new();
    let ty = TypeInfo::dictionary(TypeInfo::primitive(PrimitiveKind::String), int());

    let mut target = dict(&[("gold", 1), ("wood", 2), ("iron", 3)]);
    let update = codec::serialize(&registry, &ty, &dict(&[("wood", 20)])).expect("update");
    codec::deserialize_into(&registry, &ty, &update, &mut target).expect("known key");
    assert_eq!(target, dict(&[("gold", 1), ("wood", 20), ("iron", 3)]));

    let foreign = codec::serialize(&registry, &ty, &dict(&[("iron", 30), ("stone", 4)]))
        .expect("foreign");
    let err = codec::deserialize_into(&registry, &ty, &foreign, &mut target).expect_err("stone");
    match err {
        CodecError::KeyNotFound(key) => assert_eq!(key, "stone"),
        other => panic!("expected KeyNotFound, got {:?}", other),
    }
    // The earlier `iron` update in the same payload was not committed.
    assert_eq!(target, dict(&[("gold", 1), ("wood", 20), ("iron", 3)]));
}

#[test]
fn test_null_payload_rejected() {
    let registry = Registry::new();
    let int_list_ty = TypeInfo::list(int());
    let null = codec::serialize(&registry, &int_list_ty, &Value::Null).expect("null");
    assert_eq!(
        codec::deserialize(&registry, &int_list_ty, &null).expect("fresh read"),
        Value::Null
    );

    let mut target = int_list(&[1]);
    assert!(matches!(
        codec::deserialize_into(&registry, &int_list_ty, &null, &mut target),
        Err(CodecError::NullPayload { .. })
    ));
}

#[test]
fn test_leaf_read_into_not_implemented() {
    let registry = Registry::new();
    let bytes = codec::serialize(&registry, &int(), &Value::I32(3)).expect("leaf");
    let mut target = Value::I32(0);
    assert!(matches!(
        codec::deserialize_into(&registry, &int(), &bytes, &mut target),
        Err(CodecError::NotImplemented(_))
    ));
}

#[test]
fn test_composite_read_into_updates_present_members() {
    let registry = Registry::new();
    let ty = CompositeBuilder::class("Game.Settings")
        .field("volume", PrimitiveKind::F32)
        .field("nickname", PrimitiveKind::String)
        .member("keys", TypeInfo::array(int(), 1))
        .build();
    let saved = Value::Object(
        ObjectValue::new("Game.Settings")
            .with("volume", 0.25f32)
            .with("nickname", "ann")
            .with("keys", int_array(&[4, 5])),
    );
    let bytes = codec::serialize(&registry, &ty, &saved).expect("save");

    let mut live = Value::Object(
        ObjectValue::new("Game.Settings")
            .with("volume", 1.0f32)
            .with("nickname", Value::Null)
            .with("keys", int_array(&[0, 0])),
    );
    codec::deserialize_into(&registry, &ty, &bytes, &mut live).expect("populate");
    assert_eq!(live, saved);

    let mut wrong = Value::Object(ObjectValue::new("Game.Other"));
    assert!(matches!(
        codec::deserialize_into(&registry, &ty, &bytes, &mut wrong),
        Err(CodecError::TypeMismatch { .. })
    ));
}
