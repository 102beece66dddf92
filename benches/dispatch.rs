//! Benchmarks for task dispatch throughput.

use conveyor::TaskQueue;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn bench_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("throughput");

    for workers in [1usize, 2, 4].iter() {
        group.bench_with_input(
            BenchmarkId::new("noop_tasks", workers),
            workers,
            |b, &workers| {
                let queue = TaskQueue::with_concurrency(workers).unwrap();
                b.iter(|| {
                    let counter = Arc::new(AtomicUsize::new(0));
                    for _ in 0..1_000 {
                        let counter = counter.clone();
                        queue.enqueue_fn(move || {
                            counter.fetch_add(1, Ordering::Relaxed);
                        });
                    }
                    queue.wait();
                    black_box(counter.load(Ordering::Relaxed))
                });
            },
        );
    }

    group.finish();
}

fn bench_enqueue(c: &mut Criterion) {
    let queue = TaskQueue::with_concurrency(4).unwrap();

    c.bench_function("enqueue_cost", |b| {
        b.iter(|| {
            let id = queue.enqueue_fn(|| {});
            black_box(id)
        });
        queue.wait();
    });
}

criterion_group!(benches, bench_throughput, bench_enqueue);
criterion_main!(benches);
