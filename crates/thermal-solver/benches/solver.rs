//! Benchmarks for the steady-state back-ends.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use thermal_network::{MNABuilder, MnaOptions, ThermalNetwork};
use thermal_solver::{CgConfig, SteadyBackend, SteadyStateSolver};

fn chain_network(size: usize) -> ThermalNetwork {
    let mut net = ThermalNetwork::new(size);
    net.set_hf(0, 10.0);
    for i in 0..size - 1 {
        net.set_r(i, i + 1, 1.0).unwrap();
    }
    net.set_htc(size - 1, 0.5);
    net
}

fn bench_cg(c: &mut Criterion) {
    let mut group = c.benchmark_group("steady_cg");
    for size in [10, 50, 100, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |bencher, &size| {
            let mut net = chain_network(size);
            let mna = MNABuilder::build(&net, &MnaOptions::default()).unwrap();
            let backend = SteadyBackend::Iterative(CgConfig::default());
            bencher.iter(|| {
                SteadyStateSolver::solve(black_box(&mut net), black_box(&mna), 300.0, &backend)
                    .unwrap()
            });
        });
    }
    group.finish();
}

fn bench_direct(c: &mut Criterion) {
    let mut group = c.benchmark_group("steady_direct");
    for size in [10, 50, 100, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |bencher, &size| {
            let mut net = chain_network(size);
            let mna = MNABuilder::build(&net, &MnaOptions::default()).unwrap();
            bencher.iter(|| {
                SteadyStateSolver::solve(
                    black_box(&mut net),
                    black_box(&mna),
                    300.0,
                    &SteadyBackend::Direct,
                )
                .unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_cg, bench_direct);
criterion_main!(benches);
