// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Interface, abstract and `object` slots: tagged envelopes, tag resolution
//! and unknown-tag handling.

use savegraph::codec;
use savegraph::protocol::{TYPE_FIELD, VALUE_FIELD};
use savegraph::{
    CodecError, CompositeBuilder, DescriptorKind, ObjectValue, PrimitiveKind, Registry, Settings,
    Token, TypeInfo, TypeRef, Value,
};

struct Armory {
    registry: Registry,
    hero: TypeRef,
    weapon: TypeRef,
}

fn armory() -> Armory {
    let registry = Registry::new();
    let weapon = CompositeBuilder::interface("Game.IWeapon").build();
    let sword = CompositeBuilder::class("Game.Sword")
        .field("damage", PrimitiveKind::I32)
        .build();
    let bow = CompositeBuilder::class("Game.Bow")
        .field("range", PrimitiveKind::F32)
        .field("arrows", PrimitiveKind::U16)
        .build();
    let staff = CompositeBuilder::class("Game.Staff")
        .field("element", PrimitiveKind::String)
        .member("charges", TypeInfo::list(TypeInfo::primitive(PrimitiveKind::U8)))
        .build();
    for ty in [&sword, &bow, &staff] {
        registry.declare(ty);
    }
    let hero = CompositeBuilder::class("Game.Hero")
        .field("name", PrimitiveKind::String)
        .member("weapon", weapon.clone())
        .build();
    Armory {
        registry,
        hero,
        weapon,
    }
}

fn hero_with(weapon: Value) -> Value {
    Value::Object(
        ObjectValue::new("Game.Hero")
            .with("name", "ann")
            .with("weapon", weapon),
    )
}

fn weapons() -> Vec<Value> {
    vec![
        Value::Object(ObjectValue::new("Game.Sword").with("damage", 12)),
        Value::Object(
            ObjectValue::new("Game.Bow")
                .with("range", 40.5f32)
                .with("arrows", 20u16),
        ),
        Value::Object(
            ObjectValue::new("Game.Staff")
                .with("element", "frost")
                .with("charges", Value::List(vec![Value::U8(3), Value::U8(1)])),
        ),
    ]
}

#[test]
fn test_interface_slot_restores_concrete_type() {
    let armory = armory();
    assert_eq!(
        armory.registry.get_or_create(&armory.weapon).expect("iface").kind(),
        DescriptorKind::Polymorphic
    );

    for weapon in weapons() {
        let hero = hero_with(weapon.clone());
        let bytes = codec::serialize(&armory.registry, &armory.hero, &hero).expect("save");
        let back = codec::deserialize(&armory.registry, &armory.hero, &bytes).expect("load");
        assert_eq!(back, hero);
        assert_eq!(
            back.get_field("weapon").and_then(Value::runtime_type_name),
            weapon.runtime_type_name()
        );
    }
}

#[test]
fn test_envelope_layout() {
    let armory = armory();
    let sword = weapons().remove(0);
    let tokens =
        codec::write_tape(&armory.registry, &Settings::default(), &armory.weapon, &sword)
            .expect("write");
    assert_eq!(
        tokens,
        vec![
            Token::ObjectStart,
            Token::Property(TYPE_FIELD.into()),
            Token::Primitive(Value::from("Game.Sword")),
            Token::Property(VALUE_FIELD.into()),
            Token::ObjectStart,
            Token::Property("damage".into()),
            Token::Primitive(Value::I32(12)),
            Token::ObjectEnd,
            Token::ObjectEnd,
        ]
    );
}

#[test]
fn test_read_into_through_interface_slot() {
    let armory = armory();
    let bow = weapons().remove(1);
    let bytes = codec::serialize(&armory.registry, &armory.weapon, &bow).expect("save");

    let mut live = Value::Object(
        ObjectValue::new("Game.Bow")
            .with("range", 1.0f32)
            .with("arrows", 1u16),
    );
    codec::deserialize_into(&armory.registry, &armory.weapon, &bytes, &mut live).expect("into");
    assert_eq!(live, bow);

    let mut null = Value::Null;
    let null_bytes = codec::serialize(&armory.registry, &armory.weapon, &Value::Null).expect("null");
    assert!(matches!(
        codec::deserialize_into(&armory.registry, &armory.weapon, &null_bytes, &mut null),
        Err(CodecError::NullPayload { .. })
    ));
}

fn hero_tokens_with_tag(tag: &str) -> Vec<Token> {
    vec![
        Token::ObjectStart,
        Token::Property("name".into()),
        Token::Primitive(Value::from("ann")),
        Token::Property("weapon".into()),
        Token::ObjectStart,
        Token::Property(TYPE_FIELD.into()),
        Token::Primitive(Value::from(tag)),
        Token::Property(VALUE_FIELD.into()),
        Token::ObjectStart,
        Token::Property("weight".into()),
        Token::Primitive(Value::I32(7)),
        Token::ObjectEnd,
        Token::ObjectEnd,
        Token::ObjectEnd,
    ]
}

#[test]
fn test_unknown_tag_is_fatal_by_default() {
    let armory = armory();
    let err = codec::read_tape(
        &armory.registry,
        &Settings::default(),
        &armory.hero,
        hero_tokens_with_tag("Game.Axe"),
    )
    .expect_err("unknown tag");
    match err {
        CodecError::UnknownTypeTag(tag) => assert_eq!(tag, "Game.Axe"),
        other => panic!("expected UnknownTypeTag, got {:?}", other),
    }
}

#[test]
fn test_unknown_tag_skipped_when_enabled() {
    let armory = armory();
    let settings = Settings::default().with_skip_unknown_type_tags(true);
    let hero = codec::read_tape(
        &armory.registry,
        &settings,
        &armory.hero,
        hero_tokens_with_tag("Game.Axe"),
    )
    .expect("skipped");
    assert_eq!(hero.get_field("name"), Some(&Value::from("ann")));
    assert_eq!(hero.get_field("weapon"), Some(&Value::Null));
}

#[test]
fn test_untagged_interface_payload_is_malformed() {
    let armory = armory();
    let tokens = vec![
        Token::ObjectStart,
        Token::Property("damage".into()),
        Token::Primitive(Value::I32(1)),
        Token::ObjectEnd,
    ];
    assert!(matches!(
        codec::read_tape(&armory.registry, &Settings::default(), &armory.weapon, tokens),
        Err(CodecError::MalformedStream(_))
    ));
}

#[test]
fn test_interface_value_must_be_declared() {
    let armory = armory();
    let mace = hero_with(Value::Object(ObjectValue::new("Game.Mace")));
    assert!(matches!(
        codec::serialize(&armory.registry, &armory.hero, &mace),
        Err(CodecError::UnsupportedType { .. })
    ));
}

#[test]
fn test_object_slots_hold_any_tagged_value() {
    let armory = armory();
    let bag = TypeInfo::list(TypeInfo::any());
    let value = Value::List(vec![
        Value::I32(5),
        Value::from("rope"),
        Value::Null,
        weapons().remove(2),
        Value::F64(0.5),
    ]);
    let bytes = codec::serialize(&armory.registry, &bag, &value).expect("save");
    assert_eq!(
        codec::deserialize(&armory.registry, &bag, &bytes).expect("load"),
        value
    );

    // Containers carry no runtime tag of their own.
    let nested = Value::List(vec![Value::List(Vec::new())]);
    assert!(matches!(
        codec::serialize(&armory.registry, &bag, &nested),
        Err(CodecError::UnsupportedType { .. })
    ));
}

#[test]
fn test_derived_value_in_concrete_slot_is_tagged() {
    let registry = Registry::new();
    let base = CompositeBuilder::class("Game.Npc")
        .field("name", PrimitiveKind::String)
        .build();
    let merchant = CompositeBuilder::class("Game.Merchant")
        .field("name", PrimitiveKind::String)
        .field("gold", PrimitiveKind::U32)
        .build();
    registry.declare(&merchant);

    let value = Value::Object(
        ObjectValue::new("Game.Merchant")
            .with("name", "zed")
            .with("gold", 250u32),
    );
    let tokens = codec::write_tape(&registry, &Settings::default(), &base, &value).expect("write");
    assert_eq!(tokens[1], Token::Property(TYPE_FIELD.into()));
    let back = codec::read_tape(&registry, &Settings::default(), &base, tokens).expect("read");
    assert_eq!(back, value);
}
