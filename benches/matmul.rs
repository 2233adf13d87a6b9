//! Strategy comparison benchmark.
//!
//! # Usage:
//! ```bash
//! # All groups
//! cargo bench --bench matmul
//!
//! # One size
//! cargo bench --bench matmul -- matmul_256
//!
//! # Bandwidth or pool-backed groups only
//! cargo bench --bench matmul -- bandwidth
//! cargo bench --bench matmul -- huge_page
//! ```

use std::hint::black_box;
use std::mem;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::prelude::*;

use squaremat::{HugePagePool, PoolConfig, SquareMatrix, Strategy};

const SEED: u64 = 42;

/// NAIVE is too slow to sample from this size on.
const NAIVE_LIMIT: usize = 1024;

fn strategies(n: usize) -> impl Iterator<Item = Strategy> {
    Strategy::ALL
        .into_iter()
        .filter(move |&strategy| strategy != Strategy::Naive || n < NAIVE_LIMIT)
}

/// One group per size, throughput in multiply-add operations.
fn bench_size<const N: usize>(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(SEED);
    let a = SquareMatrix::<i32, N>::make_random_with(&mut rng, -100, 100).unwrap();
    let b = SquareMatrix::<i32, N>::make_random_with(&mut rng, -100, 100).unwrap();
    let mut out = SquareMatrix::<i32, N>::new();

    let mut group = c.benchmark_group(format!("matmul_{N}"));
    if N >= 256 {
        group.sample_size(20);
    }
    group.throughput(Throughput::Elements(2 * (N as u64).pow(3)));

    for strategy in strategies(N) {
        group.bench_with_input(
            BenchmarkId::from_parameter(strategy),
            &strategy,
            |bench, &strategy| {
                bench.iter(|| {
                    a.multiply(black_box(&b), &mut out, strategy).unwrap();
                    black_box(&out);
                })
            },
        );
    }
    group.finish();
}

/// Bytes touched per call: two operands read, one output written.
fn bench_bandwidth<const N: usize>(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(SEED);
    let a = SquareMatrix::<i32, N>::make_random_with(&mut rng, 0, 9).unwrap();
    let b = SquareMatrix::<i32, N>::make_random_with(&mut rng, 0, 9).unwrap();
    let mut out = SquareMatrix::<i32, N>::new();

    let mut group = c.benchmark_group("bandwidth");
    group.throughput(Throughput::Bytes((3 * N * N * mem::size_of::<i32>()) as u64));

    for strategy in strategies(N) {
        group.bench_with_input(
            BenchmarkId::new(strategy.name(), N),
            &strategy,
            |bench, &strategy| {
                bench.iter(|| {
                    a.multiply(black_box(&b), &mut out, strategy).unwrap();
                    black_box(&out);
                })
            },
        );
    }
    group.finish();
}

/// Same product with all three matrices carved from one huge-page arena.
fn bench_huge_page<const N: usize>(c: &mut Criterion) {
    let pool = HugePagePool::new(PoolConfig::with_pages(64));
    let mut rng = StdRng::seed_from_u64(SEED);

    // Declared in allocation order so they drop in reverse.
    let a = SquareMatrix::<i32, N, _>::make_random_with_in(&pool, &mut rng, -100, 100).unwrap();
    let b = SquareMatrix::<i32, N, _>::make_random_with_in(&pool, &mut rng, -100, 100).unwrap();
    let mut out = SquareMatrix::<i32, N, _>::new_in(&pool).unwrap();

    let mut group = c.benchmark_group("huge_page");
    group.throughput(Throughput::Elements(2 * (N as u64).pow(3)));

    for strategy in [Strategy::TiledPrefetch, Strategy::TiledRegisterBlocked] {
        group.bench_with_input(
            BenchmarkId::new(strategy.name(), N),
            &strategy,
            |bench, &strategy| {
                bench.iter(|| {
                    a.multiply(black_box(&b), &mut out, strategy).unwrap();
                    black_box(&out);
                })
            },
        );
    }
    group.finish();
}

fn bench_sizes(c: &mut Criterion) {
    bench_size::<64>(c);
    bench_size::<256>(c);
    bench_size::<1024>(c);
}

fn bench_bandwidths(c: &mut Criterion) {
    bench_bandwidth::<128>(c);
    bench_bandwidth::<512>(c);
}

fn bench_huge_pages(c: &mut Criterion) {
    bench_huge_page::<512>(c);
}

criterion_group!(benches, bench_sizes, bench_bandwidths, bench_huge_pages);
criterion_main!(benches);
