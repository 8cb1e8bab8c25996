//! Performance benchmarks for the subscription core.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pubsub_client::{Connection, Message, MsgList, Result, SubOptions, Subscription};
use std::sync::Arc;
use std::time::Duration;

struct BenchConn;

impl Connection for BenchConn {
    fn register(&self, _sub: &Subscription) -> Result<()> {
        Ok(())
    }

    fn unsubscribe(&self, _sub: &Subscription, _max: u64) -> Result<()> {
        Ok(())
    }

    fn remove_subscription(&self, _sub: &Subscription, _drain: bool) {}
}

/// Benchmark raw list operations with varying batch sizes
fn bench_msg_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("msg_list");

    for batch in [16, 256, 4096] {
        group.bench_with_input(BenchmarkId::new("enqueue_dequeue", batch), &batch, |b, &n| {
            b.iter(|| {
                let mut list = MsgList::new();
                for i in 0..n {
                    list.enqueue(Message::new("bench", vec![i as u8; 32]));
                }
                while let Some(msg) = list.dequeue() {
                    black_box(msg);
                }
            });
        });
    }

    group.finish();
}

/// Benchmark the push/pull round trip through a synchronous subscription
fn bench_sync_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("sync_round_trip");

    for batch in [1, 64, 1024] {
        group.bench_with_input(BenchmarkId::new("batch", batch), &batch, |b, &n| {
            let sub = Subscription::subscribe_with(
                Arc::new(BenchConn),
                "bench",
                None,
                None,
                SubOptions {
                    pending_max: 8192,
                    ..Default::default()
                },
            )
            .unwrap();

            b.iter(|| {
                for _ in 0..n {
                    sub.push(Message::new("bench", b"payload".to_vec()));
                }
                for _ in 0..n {
                    black_box(sub.next_msg(Duration::from_millis(100)).unwrap());
                }
            });

            sub.close(false);
        });
    }

    group.finish();
}

/// Benchmark async delivery throughput against a counting callback
fn bench_async_delivery(c: &mut Criterion) {
    use crossbeam_channel::bounded;

    let mut group = c.benchmark_group("async_delivery");
    group.bench_function("deliver_1k", |b| {
        b.iter(|| {
            let (tx, rx) = bounded(1024);
            let sub = Subscription::subscribe(Arc::new(BenchConn), "bench", move |_sub, msg| {
                tx.send(msg.payload.len()).unwrap();
            })
            .unwrap();

            for _ in 0..1024 {
                sub.push(Message::new("bench", b"payload".to_vec()));
            }
            for _ in 0..1024 {
                black_box(rx.recv().unwrap());
            }

            sub.close(false);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_msg_list,
    bench_sync_round_trip,
    bench_async_delivery
);
criterion_main!(benches);
