// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec Benchmark
//!
//! Measures the hot paths of a save/load pass:
//! - registry lookups (single-slot hit vs. alternating types)
//! - tape and binary encoding of a homogeneous list of composites
//! - binary decoding, fresh and in place

#![allow(clippy::cast_possible_truncation)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use savegraph::codec;
use savegraph::{
    CompositeBuilder, ObjectValue, PrimitiveKind, Registry, Settings, TypeInfo, TypeRef, Value,
};

fn unit_type() -> TypeRef {
    CompositeBuilder::class("Bench.Unit")
        .field("id", PrimitiveKind::U32)
        .field("name", PrimitiveKind::String)
        .field("x", PrimitiveKind::F32)
        .field("y", PrimitiveKind::F32)
        .member(
            "tags",
            TypeInfo::list(TypeInfo::primitive(PrimitiveKind::String)),
        )
        .build()
}

fn units(count: usize) -> Value {
    Value::List(
        (0..count)
            .map(|i| {
                Value::Object(
                    ObjectValue::new("Bench.Unit")
                        .with("id", i as u32)
                        .with("name", format!("unit-{}", i))
                        .with("x", i as f32 * 0.5)
                        .with("y", i as f32 * -0.25)
                        .with("tags", Value::List(vec![Value::from("infantry")])),
                )
            })
            .collect(),
    )
}

/// Benchmark: repeated lookup of one type (slot cache) vs. two alternating types.
fn bench_registry_lookup(c: &mut Criterion) {
    let registry = Registry::new();
    let unit = unit_type();
    let list = TypeInfo::list(unit.clone());
    registry.get_or_create(&list).expect("classify");

    c.bench_function("registry_lookup_same_type", |b| {
        b.iter(|| registry.get_or_create(black_box(&unit)).expect("lookup"));
    });

    c.bench_function("registry_lookup_alternating", |b| {
        b.iter(|| {
            registry.get_or_create(black_box(&unit)).expect("unit");
            registry.get_or_create(black_box(&list)).expect("list");
        });
    });
}

/// Benchmark: encode lists of composites to tape and binary.
fn bench_encode(c: &mut Criterion) {
    let registry = Registry::new();
    let settings = Settings::default();
    let ty = TypeInfo::list(unit_type());
    let mut group = c.benchmark_group("encode");

    for count in [16usize, 256, 4096] {
        let value = units(count);
        group.bench_with_input(BenchmarkId::new("tape", count), &value, |b, v| {
            b.iter(|| codec::write_tape(&registry, &settings, &ty, black_box(v)).expect("tape"));
        });
        group.bench_with_input(BenchmarkId::new("binary", count), &value, |b, v| {
            b.iter(|| codec::serialize(&registry, &ty, black_box(v)).expect("binary"));
        });
    }
    group.finish();
}

/// Benchmark: decode the binary form, fresh and into a pre-sized target.
fn bench_decode(c: &mut Criterion) {
    let registry = Registry::new();
    let ty = TypeInfo::list(unit_type());
    let mut group = c.benchmark_group("decode");

    for count in [16usize, 256, 4096] {
        let value = units(count);
        let bytes = codec::serialize(&registry, &ty, &value).expect("serialize");
        group.bench_with_input(BenchmarkId::new("fresh", count), &bytes, |b, bytes| {
            b.iter(|| codec::deserialize(&registry, &ty, black_box(bytes)).expect("fresh"));
        });
        group.bench_with_input(BenchmarkId::new("into", count), &bytes, |b, bytes| {
            let mut target = value.clone();
            b.iter(|| {
                codec::deserialize_into(&registry, &ty, black_box(bytes), &mut target)
                    .expect("into");
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_registry_lookup, bench_encode, bench_decode);
criterion_main!(benches);
