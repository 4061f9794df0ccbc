//! Benchmarks for producer broadcast and connection churn.
//!
//! Run with: cargo bench -p tributary-core --bench broadcast_bench
//!
//! Sinks are trivial counters so the numbers isolate the cost of locking,
//! snapshotting the registry, and per-connection status checks.

use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use tributary_core::sink::from_fn;
use tributary_core::{Connection, Producer};

type P = Producer<u64, ()>;

/// Producer with `n` counting connections attached.
fn producer_with(n: usize) -> (P, Arc<AtomicU64>, Vec<Connection<u64, ()>>) {
    let producer = P::new();
    let total = Arc::new(AtomicU64::new(0));
    let connections = (0..n)
        .map(|_| {
            let total = Arc::clone(&total);
            producer.connect(from_fn(move |v: &u64| {
                total.fetch_add(*v, Ordering::Relaxed);
            }))
        })
        .collect();
    (producer, total, connections)
}

fn bench_produce(c: &mut Criterion) {
    let mut group = c.benchmark_group("produce/fan_out");

    for n in [1usize, 8, 64, 512] {
        let (producer, total, _connections) = producer_with(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| producer.produce(black_box(1)));
        });
        black_box(total.load(Ordering::Relaxed));
    }

    group.finish();
}

fn bench_connect_detach(c: &mut Criterion) {
    let mut group = c.benchmark_group("connect_detach");

    for n in [0usize, 64, 512] {
        let (producer, _total, _connections) = producer_with(n);
        producer.produce(7);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let conn = producer.connect(from_fn(|v: &u64| {
                    black_box(*v);
                }));
                conn.detach();
            });
        });
    }

    group.finish();
}

fn bench_last_value(c: &mut Criterion) {
    let (producer, _total, _connections) = producer_with(8);
    producer.produce(42);
    c.bench_function("last_value", |b| b.iter(|| black_box(producer.last_value())));
}

criterion_group!(benches, bench_produce, bench_connect_detach, bench_last_value);
criterion_main!(benches);
