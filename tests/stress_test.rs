//! Stress tests for the task queue.

use conveyor::TaskQueue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
#[ignore] // Run with --ignored flag
fn stress_many_small_tasks() {
    let queue = TaskQueue::new().unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..100 {
        for _ in 0..1_000 {
            let counter = counter.clone();
            queue.enqueue_fn(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            });
        }
        queue.wait();
    }

    assert_eq!(counter.load(Ordering::Relaxed), 100_000);
}

#[test]
#[ignore]
fn stress_concurrent_producers() {
    let queue = Arc::new(TaskQueue::with_concurrency(8).unwrap());
    let counter = Arc::new(AtomicUsize::new(0));

    let producers: Vec<_> = (0..16)
        .map(|_| {
            let queue = queue.clone();
            let counter = counter.clone();
            thread::spawn(move || {
                for _ in 0..5_000 {
                    let counter = counter.clone();
                    queue.enqueue_fn(move || {
                        counter.fetch_add(1, Ordering::Relaxed);
                    });
                }
            })
        })
        .collect();

    for producer in producers {
        producer.join().unwrap();
    }

    queue.wait();
    assert_eq!(counter.load(Ordering::Relaxed), 80_000);
}

#[test]
#[ignore]
fn stress_construct_and_drop_cycles() {
    for _ in 0..200 {
        let queue = TaskQueue::with_concurrency(2).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..10 {
            let counter = counter.clone();
            queue.enqueue_fn(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            });
        }
        queue.wait();
        assert_eq!(counter.load(Ordering::Relaxed), 10);
    }
}

#[test]
#[ignore]
fn stress_removal_under_load() {
    let queue = Arc::new(TaskQueue::with_concurrency(4).unwrap());
    let ran = Arc::new(AtomicUsize::new(0));
    let removed = Arc::new(AtomicUsize::new(0));

    for _ in 0..50 {
        let mut ids = Vec::with_capacity(200);
        for _ in 0..200 {
            let ran = ran.clone();
            ids.push(queue.enqueue_fn(move || {
                ran.fetch_add(1, Ordering::Relaxed);
            }));
        }
        for id in ids {
            if queue.try_remove(id) {
                removed.fetch_add(1, Ordering::Relaxed);
            }
        }
        queue.wait();
    }

    // every task either ran or was removed, never both, never neither
    assert_eq!(
        ran.load(Ordering::Relaxed) + removed.load(Ordering::Relaxed),
        10_000
    );
}
