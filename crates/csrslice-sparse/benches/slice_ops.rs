//! Benchmarks for row slicing and the binary codec
//!
//! Slices random row subsets out of seeded random matrices and measures
//! decode throughput of the pinned binary layout.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use csrslice_sparse::constructors::random;
use csrslice_sparse::io::{decode, encode, LoadOptions};
use csrslice_sparse::{slice_rows, slice_rows_into, CsrStore};
use std::hint::black_box;

/// Generate `count` pseudo-random row indices in `[0, nrows)`
fn random_indices(count: usize, nrows: usize) -> Vec<i32> {
    let mut seed = 12345u64;
    (0..count)
        .map(|_| {
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            ((seed >> 16) % nrows as u64) as i32
        })
        .collect()
}

fn random_store(nrows: usize, ncols: usize, density: f64) -> CsrStore {
    random(nrows, ncols, density, 42).expect("Failed to build random CSR")
}

/// Benchmark slicing random row subsets into a fresh dense matrix
fn bench_slice_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("slice_rows");

    for size in [1000, 4000].iter() {
        for density in [0.01, 0.1, 0.3].iter() {
            let csr = random_store(*size, *size, *density);
            for batch in [32, 512].iter() {
                let indices = random_indices(*batch, *size);
                group.throughput(Throughput::Elements((*batch * *size) as u64));

                group.bench_with_input(
                    BenchmarkId::from_parameter(format!(
                        "{}x{}_d{}_b{}",
                        size, size, density, batch
                    )),
                    &(&csr, indices),
                    |b, (csr, indices)| {
                        b.iter(|| {
                            let dense = slice_rows(csr, black_box(indices)).expect("slice failed");
                            black_box(dense);
                        });
                    },
                );
            }
        }
    }

    group.finish();
}

/// Benchmark slicing into a reused caller buffer
fn bench_slice_rows_into(c: &mut Criterion) {
    let mut group = c.benchmark_group("slice_rows_into");

    let size = 4000;
    let csr = random_store(size, size, 0.1);
    for batch in [32, 512].iter() {
        let indices = random_indices(*batch, size);
        let mut out = vec![0.0f32; *batch * size];
        group.throughput(Throughput::Elements((*batch * size) as u64));

        group.bench_function(BenchmarkId::from_parameter(batch), |b| {
            b.iter(|| {
                slice_rows_into(&csr, black_box(&indices), &mut out).expect("slice failed");
                black_box(&out);
            });
        });
    }

    group.finish();
}

/// Benchmark decoding an in-memory file image
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for density in [0.01, 0.1].iter() {
        let csr = random_store(2000, 2000, *density);
        let mut bytes = Vec::new();
        encode(&csr, &mut bytes).expect("encode failed");
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("2000x2000_d{}", density)),
            &bytes,
            |b, bytes| {
                b.iter(|| {
                    let store =
                        decode(black_box(bytes), &LoadOptions::default()).expect("decode failed");
                    black_box(store);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_slice_rows, bench_slice_rows_into, bench_decode);
criterion_main!(benches);
