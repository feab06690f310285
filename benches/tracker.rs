//! Tracker benchmarks using Criterion.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use platetrack::{BoundingBox, Detection, ObjectClass, Tracker, TrackerConfig};

/// Create a grid of well-separated detections for benchmarking.
fn create_test_detections(n: usize, frame_index: u64) -> Vec<Detection> {
    (0..n)
        .map(|i| {
            let x = (i * 100) as f32;
            let y = (i * 50) as f32;
            Detection::new(
                None,
                BoundingBox::new(x, y, x + 50.0, y + 50.0),
                0.9,
                ObjectClass::Vehicle,
                frame_index,
            )
        })
        .collect()
}

/// Runs ten frames of identical, well-separated objects on a fresh
/// tracker, covering track birth, confirmation and steady-state updates.
fn benchmark_tracker_step(c: &mut Criterion, n: usize) {
    c.bench_function(&format!("tracker_step_{n}_objects"), |b| {
        b.iter_batched(
            || Tracker::new(TrackerConfig::default()).expect("valid tracker"),
            |mut tracker| {
                for frame in 0..10 {
                    tracker.step(black_box(create_test_detections(n, frame)));
                }
            },
            BatchSize::SmallInput,
        )
    });
}

fn benchmark_tracker_step_10_objects(c: &mut Criterion) {
    benchmark_tracker_step(c, 10);
}

fn benchmark_tracker_step_50_objects(c: &mut Criterion) {
    benchmark_tracker_step(c, 50);
}

fn benchmark_tracker_step_100_objects(c: &mut Criterion) {
    benchmark_tracker_step(c, 100);
}

criterion_group!(
    benches,
    benchmark_tracker_step_10_objects,
    benchmark_tracker_step_50_objects,
    benchmark_tracker_step_100_objects,
);
criterion_main!(benches);
