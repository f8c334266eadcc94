use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sekai_mapgen::map::RawGrid;
use sekai_mapgen::{generate, DelaunatorProvider, MapOptions, MapRng};

fn bench_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("Grid");

    for &cells in &[1_000usize, 10_000, 50_000] {
        group.bench_function(format!("build_{cells}"), |b| {
            b.iter(|| {
                let mut rng = MapRng::new("bench");
                black_box(
                    RawGrid::build(1920.0, 1080.0, cells, &mut rng, &DelaunatorProvider).ok(),
                );
            });
        });
    }

    group.finish();
}

fn bench_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Generation");
    group.sample_size(10);

    for &points in &[1u8, 4] {
        let options = MapOptions {
            points_number: points,
            ..Default::default()
        };
        group.bench_function(format!("full_map_{}", options.cells_desired()), |b| {
            b.iter(|| black_box(generate(&options, &DelaunatorProvider).ok()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_grid, bench_generation);
criterion_main!(benches);
