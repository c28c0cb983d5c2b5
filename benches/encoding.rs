//! Focused encoding benchmarks
//!
//! Benchmarks for the CPU-heavy stages of the pipeline:
//! - Posterior inference and sufficient-statistics extraction
//! - Feature expansion from stored statistics
//! - Per-pair kernel accumulation and finalization
//!
//! Run with: `cargo bench`
//! View HTML reports in: `target/criterion/`

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use std::time::Duration;

use drishti_fv::{
    DenseMatrix, DescriptorSet, DiagonalGmm, KernelAccumulator, KernelConfig, Location,
    compute_spatial_sstats, expand_spatial_features, spatial_sstats_len,
};

// ============================================================================
// Test Fixtures
// ============================================================================

/// Mixture with component means spread deterministically over the space.
fn create_benchmark_gmm(k: usize, dim: usize) -> DiagonalGmm {
    let weights = vec![1.0 / k as f32; k];
    let means: Vec<f32> = (0..k * dim)
        .map(|i| (i as f32 * 0.73).sin() * 4.0)
        .collect();
    let variances: Vec<f32> = (0..k * dim)
        .map(|i| 0.5 + (i as f32 * 0.41).cos().abs())
        .collect();
    DiagonalGmm::new(weights, means, variances, dim).unwrap()
}

/// Descriptor batch with locations sweeping the unit volume.
fn create_benchmark_batch(n: usize, dim: usize) -> (DescriptorSet, Vec<Location>) {
    let mut descs = DescriptorSet::with_capacity(dim, n);
    let mut locs = Vec::with_capacity(n);
    for i in 0..n {
        let row: Vec<f32> = (0..dim)
            .map(|d| ((i * dim + d) as f32 * 0.19).sin() * 3.0)
            .collect();
        descs.push(&row).expect("fixture rows share one dimension");
        let s = i as f32 * 0.37;
        locs.push(Location::new(
            s.sin() * 0.5 + 0.5,
            (s * 1.7).cos() * 0.5 + 0.5,
            (s * 0.9).sin() * 0.5 + 0.5,
        ));
    }
    (descs, locs)
}

/// A stack of statistics slices, one per sample.
fn create_benchmark_sstats(samples: usize, k: usize) -> Vec<f32> {
    let unit = spatial_sstats_len(k);
    (0..samples * unit)
        .map(|i| (i as f32 * 0.29).sin() * 0.5)
        .collect()
}

/// Feature batch with the width of a k-component expansion.
fn create_benchmark_features(rows: usize, k: usize) -> DenseMatrix {
    let width = 6 * k;
    let data: Vec<f64> = (0..rows * width)
        .map(|i| ((i as f64) * 0.13).sin() * 2.0)
        .collect();
    DenseMatrix::from_flat(data, width).expect("fixture length is rows * width")
}

// ============================================================================
// Sufficient Statistics Benchmarks
// ============================================================================

fn bench_sufficient_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("sufficient_stats");
    group.sample_size(30);
    group.measurement_time(Duration::from_secs(3));
    group.warm_up_time(Duration::from_secs(1));

    let gmm = create_benchmark_gmm(32, 64);
    let (descs, locs) = create_benchmark_batch(1000, 64);

    // Posterior inference alone (the dominant cost)
    group.bench_function("posteriors/1000x64/k32", |b| {
        b.iter(|| black_box(&gmm).posteriors(black_box(&descs)))
    });

    // Full extraction: posteriors + moment accumulation
    group.bench_function("compute/1000x64/k32", |b| {
        b.iter(|| {
            compute_spatial_sstats(black_box(&descs), black_box(&locs), black_box(&gmm))
        })
    });

    // Larger vocabulary
    let gmm_large = create_benchmark_gmm(128, 64);
    group.bench_function("compute/1000x64/k128", |b| {
        b.iter(|| {
            compute_spatial_sstats(black_box(&descs), black_box(&locs), black_box(&gmm_large))
        })
    });

    group.finish();
}

// ============================================================================
// Feature Expansion Benchmarks
// ============================================================================

fn bench_feature_expansion(c: &mut Criterion) {
    let mut group = c.benchmark_group("feature_expansion");
    group.sample_size(50);
    group.measurement_time(Duration::from_secs(2));
    group.warm_up_time(Duration::from_secs(1));

    let sstats_small = create_benchmark_sstats(128, 64);
    group.bench_function("expand/128/k64", |b| {
        b.iter(|| expand_spatial_features(black_box(&sstats_small), 64))
    });

    let sstats_large = create_benchmark_sstats(1024, 64);
    group.bench_function("expand/1024/k64", |b| {
        b.iter(|| expand_spatial_features(black_box(&sstats_large), 64))
    });

    group.finish();
}

// ============================================================================
// Kernel Pipeline Benchmarks
// ============================================================================

fn bench_kernel_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("kernel_pipeline");
    group.sample_size(30);
    group.measurement_time(Duration::from_secs(3));
    group.warm_up_time(Duration::from_secs(1));

    let train = create_benchmark_features(64, 64);
    let test = create_benchmark_features(32, 64);
    let config = KernelConfig::default();

    // One channel: standardize, power, norms, two Gram updates
    group.bench_function("process_pair/64x32/k64", |b| {
        b.iter_batched(
            || (train.clone(), test.clone(), KernelAccumulator::new(64, 32)),
            |(xx, yy, mut acc)| acc.process_pair(black_box(xx), black_box(yy), &config),
            criterion::BatchSize::SmallInput,
        )
    });

    // Finalization over an already-filled accumulator
    group.bench_function("finalize/64x32", |b| {
        let mut acc = KernelAccumulator::new(64, 32);
        acc.process_pair(train.clone(), test.clone(), &config)
            .expect("benchmark pair is well-formed");
        b.iter(|| black_box(&acc).finalize())
    });

    group.finish();
}

// ============================================================================
// Main
// ============================================================================

criterion_group!(
    benches,
    bench_sufficient_stats,
    bench_feature_expansion,
    bench_kernel_pipeline,
);

criterion_main!(benches);
