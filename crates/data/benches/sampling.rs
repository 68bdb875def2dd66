//! Benchmarks for ground-truth sampling and window generation

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use hyperspec_data::sample::{SamplingMode, sample_gt};
use hyperspec_data::window::count_sliding_window;
use ndarray::Array2;

fn create_gt(size: usize, classes: u8) -> Array2<u8> {
    let mut gt = Array2::zeros((size, size));
    for ((r, c), v) in gt.indexed_iter_mut() {
        // Leave a sparse background, spread the rest over the classes.
        if (r * 31 + c * 17) % 5 != 0 {
            *v = ((r / 8 + c / 8) % classes as usize) as u8 + 1;
        }
    }
    gt
}

fn bench_sample_gt(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample/sample_gt");
    for size in [128, 256, 512] {
        let gt = create_gt(size, 8);
        for mode in [SamplingMode::Random, SamplingMode::Fixed, SamplingMode::Disjoint] {
            group.bench_with_input(
                BenchmarkId::new(mode.to_string(), size),
                &size,
                |b, _| b.iter(|| sample_gt(black_box(&gt), 0.7, mode).unwrap()),
            );
        }
    }
    group.finish();
}

fn bench_window_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("window/count");
    for size in [512, 1024, 2048] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &s| {
            b.iter(|| count_sliding_window(black_box((s, s)), 3, (7, 7)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_sample_gt, bench_window_count);
criterion_main!(benches);
