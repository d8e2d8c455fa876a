//! Wait/notify path benchmarks: wake latency and publish-with-waiters cost

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tribuf::{RegionConfig, TripleBuffer, WaitOutcome};

#[derive(Clone, Copy)]
struct Sample {
    value: u64,
}

fn config(timeout: Duration) -> RegionConfig {
    RegionConfig {
        wait_timeout: timeout,
        ..RegionConfig::default()
    }
}

/// Publish then immediately collect it through the blocking-wait path. The
/// wait returns without sleeping because the counter already advanced.
fn bench_wait_already_published(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench_region");

    let mut writer =
        TripleBuffer::<Sample>::create(&path, config(Duration::from_secs(1))).unwrap();
    writer.wait_mapped(Duration::from_secs(2)).unwrap();
    let mut reader = TripleBuffer::<Sample>::attach(&path, config(Duration::from_secs(1))).unwrap();

    let mut out = Sample { value: 0 };
    let mut next = 0u64;

    c.bench_function("publish_then_wait", |b| {
        b.iter(|| {
            next += 1;
            writer.publish(&Sample { value: next });
            let outcome = reader.wait_for_update(black_box(&mut out));
            assert_ne!(outcome, WaitOutcome::TimedOut);
        });
    });
}

/// Publish cost while a reader is parked in the kernel on the futex word.
fn bench_publish_with_blocked_waiter(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench_region");

    let mut writer =
        TripleBuffer::<Sample>::create(&path, config(Duration::from_millis(10))).unwrap();
    writer.wait_mapped(Duration::from_secs(2)).unwrap();

    let stop = Arc::new(AtomicBool::new(false));
    let waiter_stop = Arc::clone(&stop);
    let waiter_path = path.clone();
    let waiter = std::thread::spawn(move || {
        let mut reader =
            TripleBuffer::<Sample>::attach(&waiter_path, config(Duration::from_millis(10)))
                .unwrap();
        let mut out = Sample { value: 0 };
        while !waiter_stop.load(Ordering::Acquire) {
            black_box(reader.wait_for_update(&mut out));
        }
    });

    let payload = Sample { value: 1 };
    c.bench_function("publish_with_waiter", |b| {
        b.iter(|| {
            writer.publish(black_box(&payload));
        });
    });

    stop.store(true, Ordering::Release);
    waiter.join().unwrap();
}

criterion_group!(
    benches,
    bench_wait_already_published,
    bench_publish_with_blocked_waiter
);
criterion_main!(benches);
