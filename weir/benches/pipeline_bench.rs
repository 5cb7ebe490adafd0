//! Benchmarks for pipeline throughput.
//!
//! The heartbeat comparison backs the liveness guarantee: pulses are
//! dropped, never awaited, so wrapping a stage should not change the
//! primary data path's throughput.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use weir::prelude::*;

const ITEMS: i32 = 1_000;

async fn drain_sum(mut seq: Sequence<i32>) -> i64 {
    let mut sum = 0i64;
    while let Some(v) = seq.recv().await {
        sum += i64::from(v);
    }
    sum
}

fn pipeline_benchmark(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("runtime");

    c.bench_function("map_1k", |b| {
        b.iter(|| {
            rt.block_on(async {
                let pipeline = Pipeline::new();
                let source = from_iter(&pipeline, 0..ITEMS);
                let output = map(&pipeline, source, |v| v + 1);
                black_box(drain_sum(output).await)
            })
        })
    });

    c.bench_function("heartbeat_map_1k", |b| {
        b.iter(|| {
            rt.block_on(async {
                let pipeline = Pipeline::new();
                let source = from_iter(&pipeline, 0..ITEMS);
                let transform = Arc::new(FnTransform::new(|v: i32| v + 1));
                let (output, pulses) =
                    heartbeat(&pipeline, source, transform, HeartbeatMode::PerItem);
                drop(pulses);
                black_box(drain_sum(output).await)
            })
        })
    });
}

criterion_group!(benches, pipeline_benchmark);
criterion_main!(benches);
