use criterion::{black_box, criterion_group, criterion_main, Criterion};
use solidkit_math::{Point3, Vec3};
use solidkit_shapes::{factory, MonteCarloSettings, Shape, Track};

fn bench_is_valid(c: &mut Criterion) {
    let cylinder = factory::make_cylinder(Point3::origin(), Vec3::z(), 1.0, 2.0).unwrap();
    let cone = factory::make_cone(Point3::origin(), Vec3::z(), 1.0, 2.0).unwrap();
    let p = Point3::new(0.3, 0.2, 1.1);

    c.bench_function("is_valid_cylinder", |b| {
        b.iter(|| cylinder.is_valid(black_box(&p)))
    });
    c.bench_function("is_valid_cone", |b| b.iter(|| cone.is_valid(black_box(&p))));
}

fn bench_intercept(c: &mut Criterion) {
    let pipe = factory::make_hollow_cylinder(Point3::origin(), Vec3::z(), 0.5, 1.0, 2.0).unwrap();
    let start = Point3::new(-5.0, 0.1, 1.0);

    c.bench_function("intercept_hollow_cylinder", |b| {
        b.iter(|| {
            let mut track = Track::new(black_box(start), Vec3::x()).unwrap();
            pipe.intercept_surface(&mut track)
        })
    });
}

fn bench_monte_carlo_volume(c: &mut Criterion) {
    let cone = factory::make_cone(Point3::origin(), Vec3::z(), 1.0, 2.0).unwrap();
    let settings = MonteCarloSettings {
        relative_tolerance: 0.0,
        batch_size: 10_000,
        min_batches: 4,
        max_batches: 4,
        ..MonteCarloSettings::default()
    };

    let mut group = c.benchmark_group("monte_carlo");
    group.sample_size(10);
    group.bench_function("cone_40k_samples", |b| {
        b.iter(|| cone.monte_carlo_volume(black_box(&settings)).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_is_valid, bench_intercept, bench_monte_carlo_volume);
criterion_main!(benches);
