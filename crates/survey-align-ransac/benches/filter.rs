use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::Vector2;
use survey_align_core::{CorrespondencePair, Point2D, RigidTransform};
use survey_align_ransac::{filter_outliers, OutlierFilterParams};

fn synthetic_pairs(n: usize, outlier_every: usize) -> Vec<CorrespondencePair> {
    let truth = RigidTransform::from_angle(0.1, Vector2::new(500.0, -120.0));
    (0..n)
        .map(|k| {
            let real = Point2D::new((k % 17) as f64 * 4.5, (k / 17) as f64 * 3.25);
            let mut ideal = truth.apply(&real);
            if outlier_every > 0 && k % outlier_every == 0 {
                ideal.x += 40.0;
            }
            CorrespondencePair::new(k as u32, format!("V1-{}", k + 1), real, ideal)
        })
        .collect()
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_outliers");
    for &n in &[10usize, 100, 1000] {
        let pairs = synthetic_pairs(n, 5);
        let params = OutlierFilterParams {
            stop_probability: 1.0,
            seed: Some(11),
            ..OutlierFilterParams::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(n), &pairs, |b, pairs| {
            b.iter(|| filter_outliers(black_box(pairs), &params))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_filter);
criterion_main!(benches);
