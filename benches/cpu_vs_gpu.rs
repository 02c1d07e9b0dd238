//! CPU vs GPU Benchmark: Crossover Point Analysis
//!
//! Compares the serial and threaded envelope transforms with the GPU
//! bounded-search kernels to find the grid size where each path wins.
//!
//! # Expected Results
//! - Small grids (< 128^2): serial CPU wins (thread/dispatch overhead)
//! - Medium grids: threaded CPU wins
//! - Large grids (512^2+): GPU competitive despite O(n) per-point search
//!
//! Author: Moroya Sakamoto

use alice_edt::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Deterministic sparse mask (~5% foreground)
fn generate_mask(len: usize) -> Vec<bool> {
    (0..len)
        .map(|i| ((i as f32) * 12.9898).sin().abs() < 0.05)
        .collect()
}

fn bench_2d(c: &mut Criterion) {
    let mut group = c.benchmark_group("edt_2d");

    #[cfg(feature = "gpu")]
    let gpu = GpuEdt::new().expect("Failed to create GPU transformer");

    for side in [64usize, 256, 512] {
        let shape = [side, side];
        let mask = generate_mask(side * side);
        let f = boolean_indicator(&mask);
        #[cfg(feature = "gpu")]
        let grid: Vec<f32> = mask.iter().map(|&fg| if fg { 1.0 } else { 0.0 }).collect();

        group.throughput(Throughput::Elements((side * side) as u64));

        group.bench_with_input(BenchmarkId::new("cpu_serial", side), &f, |b, f| {
            b.iter(|| edt_2d(black_box(f), shape, false))
        });

        group.bench_with_input(BenchmarkId::new("cpu_threaded", side), &f, |b, f| {
            b.iter(|| edt_2d(black_box(f), shape, true))
        });

        #[cfg(feature = "gpu")]
        group.bench_with_input(BenchmarkId::new("gpu_compute", side), &grid, |b, grid| {
            b.iter(|| gpu.transform_2d(black_box(grid), shape).unwrap())
        });
    }

    group.finish();
}

fn bench_3d(c: &mut Criterion) {
    let mut group = c.benchmark_group("edt_3d");

    #[cfg(feature = "gpu")]
    let gpu = GpuEdt::new().expect("Failed to create GPU transformer");

    for side in [16usize, 48, 96] {
        let shape = [side, side, side];
        let total = side * side * side;
        let mask = generate_mask(total);
        let f = boolean_indicator(&mask);
        #[cfg(feature = "gpu")]
        let grid: Vec<f32> = mask.iter().map(|&fg| if fg { 1.0 } else { 0.0 }).collect();

        group.throughput(Throughput::Elements(total as u64));

        group.bench_with_input(BenchmarkId::new("cpu_serial", side), &f, |b, f| {
            b.iter(|| edt_3d(black_box(f), shape, false))
        });

        group.bench_with_input(BenchmarkId::new("cpu_threaded", side), &f, |b, f| {
            b.iter(|| edt_3d(black_box(f), shape, true))
        });

        #[cfg(feature = "gpu")]
        group.bench_with_input(BenchmarkId::new("gpu_compute", side), &grid, |b, grid| {
            b.iter(|| gpu.transform_3d(black_box(grid), shape).unwrap())
        });
    }

    group.finish();
}

/// In-place path: scratch reuse across calls, no allocation per transform.
fn bench_in_place(c: &mut Criterion) {
    let mut group = c.benchmark_group("edt_2d_in_place");

    let side = 256usize;
    let shape = [side, side];
    let mask = generate_mask(side * side);
    let f = boolean_indicator(&mask);
    let mut work = f.clone();
    let mut output = vec![0.0f32; f.len()];
    let mut scratch = EdtScratch::new_2d(shape);

    group.throughput(Throughput::Elements((side * side) as u64));
    group.bench_function("reused_scratch", |b| {
        b.iter(|| {
            work.copy_from_slice(&f);
            edt_2d_into(
                black_box(&mut work),
                black_box(&mut output),
                shape,
                &mut scratch,
                true,
            );
        })
    });

    group.finish();
}

criterion_group!(benches, bench_2d, bench_3d, bench_in_place);
criterion_main!(benches);
