use criterion::{Criterion, black_box, criterion_group, criterion_main};
use mosa::commands::PopulationSplitter;
use ndarray::Array2;

/// Deterministic pseudo-random objective matrix.
fn matrix(rows: usize, cols: usize) -> Array2<f64> {
    Array2::from_shape_fn((rows, cols), |(i, j)| {
        ((i * 31 + j * 17) as f64).sin().abs()
    })
}

fn bench_front_splitting(c: &mut Criterion) {
    let mut group = c.benchmark_group("fast_non_dominated_sort");
    for &size in &[100usize, 400, 1000] {
        let fitness = matrix(size, 3);
        group.bench_function(format!("n{size}_m3"), |b| {
            b.iter(|| {
                let mut splitter =
                    PopulationSplitter::new(black_box(fitness.clone()), &[false, false, false]);
                splitter.execute().unwrap();
                black_box(splitter.fronts().len())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_front_splitting);
criterion_main!(benches);
