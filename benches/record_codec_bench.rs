//! Benchmarks for the security record codec and store.
//!
//! Run with:
//! ```sh
//! cargo bench --bench record_codec_bench
//! ```

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use doorlock_core::LockState;
use doorlock_storage::{MemoryStorage, PersistedSecurityState, RecordLimits, SecurityStateStore};
use std::hint::black_box;

fn sample_state() -> PersistedSecurityState {
    PersistedSecurityState {
        lock_state: LockState::Locked,
        wrong_attempts: 2,
        lockout_seconds_remaining: 17,
    }
}

/// Benchmark encoding and decoding one record.
fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_codec");
    group.throughput(Throughput::Elements(1));

    let state = sample_state();
    let encoded = state.encode();

    group.bench_function("encode", |b| {
        b.iter(|| black_box(black_box(&state).encode()));
    });

    group.bench_function("decode", |b| {
        b.iter(|| {
            black_box(PersistedSecurityState::decode(
                black_box(&encoded),
                RecordLimits::default(),
            ))
        });
    });

    group.finish();
}

/// Benchmark the per-second save and the boot-time load.
fn bench_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("security_store");
    group.throughput(Throughput::Elements(1));

    let mut store = SecurityStateStore::new(MemoryStorage::new());
    let state = sample_state();

    group.bench_function("save", |b| {
        b.iter(|| store.save(black_box(&state)).unwrap());
    });

    group.bench_function("load", |b| {
        b.iter(|| black_box(store.load().unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_codec, bench_store);
criterion_main!(benches);
