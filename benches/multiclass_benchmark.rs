//! One-vs-one vs one-vs-rest benchmarks.
//!
//! Fit and predict on a synthetic 4-class dataset with linear and rbf
//! binary classifiers, plus thread scaling of the one-vs-one fit.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use multisvm::{KernelParams, LinearParams, MultiKernelSvc, MultiLinearSvc, SparseVector};

const N_CLASSES: usize = 4;

/// `per_class` noisy points around each of four centers in `dim` dimensions
fn synthetic_dataset(per_class: usize, dim: usize) -> (Vec<SparseVector>, Vec<i64>) {
    let mut x = Vec::with_capacity(per_class * N_CLASSES);
    let mut y = Vec::with_capacity(per_class * N_CLASSES);

    for class in 0..N_CLASSES {
        for i in 0..per_class {
            let row: Vec<f64> = (0..dim)
                .map(|d| {
                    let center = if d % N_CLASSES == class { 3.0 } else { 0.0 };
                    let noise = ((i * 31 + d * 17 + class * 7) as f64).sin();
                    center + noise
                })
                .collect();
            x.push(SparseVector::from_dense(&row));
            y.push(class as i64);
        }
    }
    (x, y)
}

fn bench_fit(c: &mut Criterion) {
    let (x, y) = synthetic_dataset(50, 8);
    let mut group = c.benchmark_group("multiclass/fit");
    group.sample_size(20);

    for method in ["ovo", "ovr"] {
        group.bench_with_input(BenchmarkId::new("linear", method), &method, |b, &method| {
            b.iter(|| {
                let mut svc = MultiLinearSvc::<i64>::new(LinearParams::default()).with_method(method);
                svc.fit(black_box(&x), black_box(&y)).unwrap();
                black_box(svc.n_estimators())
            });
        });

        group.bench_with_input(BenchmarkId::new("rbf", method), &method, |b, &method| {
            b.iter(|| {
                let mut svc = MultiKernelSvc::<i64>::new(KernelParams::default()).with_method(method);
                svc.fit(black_box(&x), black_box(&y)).unwrap();
                black_box(svc.n_estimators())
            });
        });
    }

    group.finish();
}

fn bench_predict(c: &mut Criterion) {
    let (x, y) = synthetic_dataset(50, 8);
    let (queries, _) = synthetic_dataset(250, 8);
    let mut group = c.benchmark_group("multiclass/predict");
    group.throughput(Throughput::Elements(queries.len() as u64));

    for method in ["ovo", "ovr"] {
        let mut linear = MultiLinearSvc::<i64>::new(LinearParams::default()).with_method(method);
        linear.fit(&x, &y).unwrap();
        group.bench_with_input(BenchmarkId::new("linear", method), &queries, |b, q| {
            b.iter(|| black_box(linear.predict(black_box(q)).unwrap()));
        });

        let mut rbf = MultiKernelSvc::<i64>::new(KernelParams::default()).with_method(method);
        rbf.fit(&x, &y).unwrap();
        group.bench_with_input(BenchmarkId::new("rbf", method), &queries, |b, q| {
            b.iter(|| black_box(rbf.predict(black_box(q)).unwrap()));
        });
    }

    group.finish();
}

fn bench_thread_scaling(c: &mut Criterion) {
    let (x, y) = synthetic_dataset(80, 8);
    let mut group = c.benchmark_group("multiclass/fit_threads");
    group.sample_size(10);

    for n_jobs in [1, 2, 4] {
        group.bench_with_input(BenchmarkId::new("rbf_ovo", n_jobs), &n_jobs, |b, &n_jobs| {
            b.iter(|| {
                let mut svc = MultiKernelSvc::<i64>::new(KernelParams::default()).with_n_jobs(n_jobs);
                svc.fit(black_box(&x), black_box(&y)).unwrap();
                black_box(svc.n_estimators())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fit, bench_predict, bench_thread_scaling);
criterion_main!(benches);
