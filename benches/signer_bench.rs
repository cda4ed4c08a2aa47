//! Performance benchmarks for batch signing.
//!
//! Backlog flushes sign every stored scan in one batch, so signing cost
//! grows with backlog size.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench signer_bench
//! ```

use cardrelay_core::{ScanEvent, StationId};
use cardrelay_network::Signer;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

fn backlog(size: usize) -> Vec<ScanEvent> {
    let station = StationId::new("bench");
    (0..size)
        .map(|i| ScanEvent::new(format!("{:010}", i), station.clone()))
        .collect()
}

/// Benchmark HMAC over a pre-serialized body.
fn bench_sign_bytes(c: &mut Criterion) {
    let signer = Signer::from_base64("c2VjcmV0LWtleS1mb3ItYmVuY2g=").unwrap();
    let body = serde_json::to_vec(&backlog(1)).unwrap();

    let mut group = c.benchmark_group("sign_bytes");
    group.throughput(Throughput::Bytes(body.len() as u64));
    group.bench_function("single_scan_body", |b| {
        b.iter(|| black_box(signer.sign(black_box(&body))));
    });
    group.finish();
}

/// Benchmark serialization plus signing for growing backlogs.
fn bench_sign_batch(c: &mut Criterion) {
    let signer = Signer::from_base64("c2VjcmV0LWtleS1mb3ItYmVuY2g=").unwrap();
    let mut group = c.benchmark_group("sign_batch");

    for size in [1usize, 100, 1_000] {
        let scans = backlog(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &scans, |b, scans| {
            b.iter(|| black_box(signer.sign_batch(black_box(scans)).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sign_bytes, bench_sign_batch);
criterion_main!(benches);
