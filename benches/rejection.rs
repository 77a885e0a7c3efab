use abstain::{Accuracy, RocAuc, performance_over_uncertainty_tol, sample_rejection};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn synthetic(n: usize) -> (Array1<f64>, Array1<u8>, Array1<f64>) {
    let mut rng = StdRng::seed_from_u64(0x5EED + n as u64);
    let uncertainty = Array1::from_shape_fn(n, |_| rng.r#gen::<f64>() * 0.5);
    let y = Array1::from_shape_fn(n, |_| u8::from(rng.r#gen::<f64>() < 0.3));
    let scores = Array1::from_shape_fn(n, |i| {
        if y[i] == 1 {
            0.5 + 0.5 * rng.r#gen::<f64>()
        } else {
            0.5 * rng.r#gen::<f64>()
        }
    });
    (uncertainty, y, scores)
}

fn benchmark_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample_rejection");
    for &n in &[1_000_usize, 10_000] {
        let (uncertainty, _, _) = synthetic(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &uncertainty, |b, u| {
            b.iter(|| {
                let grid = sample_rejection(black_box(u.view()), 50.0, None).unwrap();
                black_box(grid.frac_retain);
            });
        });
    }
    group.finish();
}

fn benchmark_curves(c: &mut Criterion) {
    let (uncertainty, y, scores) = synthetic(2_000);
    let mut group = c.benchmark_group("performance_over_uncertainty_tol");
    group.sample_size(10);

    group.bench_function("accuracy_200_resamples", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(1);
            let curves = performance_over_uncertainty_tol(
                uncertainty.view(),
                y.view(),
                scores.view(),
                &Accuracy,
                50.0,
                200,
                &mut rng,
            )
            .unwrap();
            black_box(curves);
        });
    });

    group.bench_function("roc_auc_200_resamples", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(1);
            let curves = performance_over_uncertainty_tol(
                uncertainty.view(),
                y.view(),
                scores.view(),
                &RocAuc,
                50.0,
                200,
                &mut rng,
            )
            .unwrap();
            black_box(curves);
        });
    });
    group.finish();
}

criterion_group!(benches, benchmark_grid, benchmark_curves);
criterion_main!(benches);
