//! # Vivarium Benchmarks
//!
//! | Path | Operation |
//! |------|-----------|
//! | vv-03 Migration Wire | encode and guarded decode of a migration message |
//! | vv-03 Migration Wire | rejection of a frame naming a disallowed type |
//! | vv-01 Peer Registry | admission check and random peer pick |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use shared_types::{Channel, EntitySnapshot, PackageName, Point, SpeciesKind, SpeciesRef};
use std::net::{IpAddr, Ipv4Addr};
use uuid::Uuid;
use vv_01_peer_registry::{PeerLease, PeerRegistry, RegistryConfig, SystemTimeSource, TimeSource};
use vv_03_migration_wire::{Locale, MigrationMessage, WireCodec, WrapperState, WrapperValue};

fn make_message(codec: &WireCodec, wrapper_entries: usize) -> MigrationMessage {
    let species = SpeciesRef {
        name: "Grazer".into(),
        package: PackageName::new("Grazer, Version=2.1.0.0").unwrap(),
        kind: SpeciesKind::Animal,
    };
    let snapshot = EntitySnapshot::new(Uuid::new_v4(), species, Point::new(40, 80)).sealed();
    let mut wrapper = WrapperState::new();
    for i in 0..wrapper_entries {
        wrapper.set(format!("slot{i}"), WrapperValue::Integer(i as i64));
    }
    let wrapper = codec.encode_wrapper(&wrapper).unwrap();
    MigrationMessage::new(
        Uuid::new_v4(),
        snapshot,
        wrapper,
        Channel::default(),
        false,
        Locale::default(),
    )
    .unwrap()
}

fn bench_message_codec(c: &mut Criterion) {
    let codec = WireCodec::default();
    let mut group = c.benchmark_group("vv-03-migration-wire");

    for entries in [0usize, 16, 128] {
        let message = make_message(&codec, entries);
        let bytes = codec.encode_message(&message).unwrap();

        group.bench_with_input(BenchmarkId::new("encode", entries), &message, |b, m| {
            b.iter(|| black_box(codec.encode_message(m).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("decode", entries), &bytes, |b, bytes| {
            b.iter(|| black_box(codec.decode_message(bytes).unwrap()))
        });
    }

    let garbage: Vec<u8> = (0..512u32).map(|i| (i * 31 % 251) as u8).collect();
    group.bench_function("reject_garbage", |b| {
        b.iter(|| black_box(codec.decode_message(&garbage).is_err()))
    });

    group.finish();
}

fn bench_registry(c: &mut Criterion) {
    let time = SystemTimeSource::new();
    let registry = PeerRegistry::new(RegistryConfig::default(), Box::new(time));
    let lease = time.now() + chrono::Duration::days(5);
    registry.replace_known_good((0..200u8).map(|i| {
        PeerLease::new(IpAddr::V4(Ipv4Addr::new(10, 0, 1, i)), lease)
    }));

    let mut group = c.benchmark_group("vv-01-peer-registry");
    let known = IpAddr::V4(Ipv4Addr::new(10, 0, 1, 7));
    let stranger = IpAddr::V4(Ipv4Addr::new(192, 168, 9, 9));

    group.bench_function("check_admission_known", |b| {
        b.iter(|| black_box(registry.check_admission(&known).is_ok()))
    });
    group.bench_function("check_admission_unknown", |b| {
        b.iter(|| black_box(registry.check_admission(&stranger).is_err()))
    });
    group.bench_function("pick_random", |b| {
        b.iter(|| black_box(registry.pick_random().unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_message_codec, bench_registry);
criterion_main!(benches);
