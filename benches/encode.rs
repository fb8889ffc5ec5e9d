//! Benchmarks for chunk encoding.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use logship::{Level, LogRecord, encode_chunk};

fn records(count: usize) -> Vec<LogRecord> {
    (0..count)
        .map(|i| {
            LogRecord::builder()
                .message(format!("request {i} served in {}ms", i % 250))
                .source("bench")
                .level(Level::Info)
                .label("route", "/api/orders")
                .label("status", "200")
                .build()
        })
        .collect()
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_chunk");
    for size in [1, 50, 500] {
        let batch = records(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("plain", size), &batch, |b, batch| {
            b.iter(|| encode_chunk(black_box(batch), None))
        });
        group.bench_with_input(BenchmarkId::new("auth", size), &batch, |b, batch| {
            b.iter(|| encode_chunk(black_box(batch), Some("shared-secret")))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode);
criterion_main!(benches);
