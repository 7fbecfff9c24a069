use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use fastrand::Rng;
use swarmopt::prelude::*;
use swarmopt::test_functions::{Rastrigin, Sphere};

fn sphere_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("pso: sphere");
    for n in [2, 5, 10, 20, 30] {
        group.bench_with_input(BenchmarkId::new("Star", n), &n, |b, ndim| {
            b.iter(|| {
                let config = PSOConfig::new(30, *ndim)
                    .with_options(SwarmOptions::new(0.5, 0.3, 0.9))
                    .with_bounds(vec![(-10.0, 10.0); *ndim]);
                PSO::new(Rng::with_seed(0))
                    .optimize(&Sphere, &(), config, 200)
                    .unwrap();
            });
        });
        group.bench_with_input(BenchmarkId::new("Ring", n), &n, |b, ndim| {
            b.iter(|| {
                let config = PSOConfig::new(30, *ndim)
                    .with_options(SwarmOptions::new(0.5, 0.3, 0.9).with_neighbors(3, 2))
                    .with_topology(Topology::Ring {
                        rewire: Rewire::Static,
                    })
                    .with_bounds(vec![(-10.0, 10.0); *ndim]);
                PSO::new(Rng::with_seed(0))
                    .optimize(&Sphere, &(), config, 200)
                    .unwrap();
            });
        });
    }
    group.finish();
}

fn parallel_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("pso: rastrigin evaluation");
    for threads in [1, 2, 4] {
        group.bench_with_input(BenchmarkId::new("Threads", threads), &threads, |b, t| {
            b.iter(|| {
                let config = PSOConfig::new(100, 10)
                    .with_options(SwarmOptions::new(0.5, 0.3, 0.9))
                    .with_bounds(vec![(-5.12, 5.12); 10])
                    .with_n_processes(*t);
                PSO::new(Rng::with_seed(0))
                    .optimize(&Rastrigin, &(), config, 50)
                    .unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, sphere_benchmark, parallel_benchmark);
criterion_main!(benches);
