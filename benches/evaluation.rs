//! Benchmarks for parallel evaluation and the generation loop.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use grid_evolve::{
    compute::{
        PathSimulator,
        evolution::{EvaluationCoordinator, EvolutionEngine, GenomeRng},
    },
    schema::{Creature, Environment, RunConfig},
};

fn population(size: usize, moves: usize) -> Vec<Creature> {
    let mut rng = GenomeRng::new(7);
    (0..size as u64)
        .map(|id| Creature::new(id, rng.random_moves(moves), 0))
        .collect()
}

fn bench_evaluation_workers(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluation_workers");
    let env = Environment::open(10, 5).unwrap();
    let creatures = population(1000, 20);

    for workers in [1, 2, 4, 8, 10] {
        let coordinator = EvaluationCoordinator::new(workers).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, _| {
            b.iter(|| {
                coordinator
                    .evaluate(&env, &PathSimulator, black_box(&creatures))
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generation");

    for nb_creatures in [100, 500, 1000] {
        let config = RunConfig {
            nb_creatures,
            nb_moves: 20,
            random_seed: Some(1),
            ..RunConfig::default()
        };
        let env = Environment::open(config.width, config.height).unwrap();
        let mut engine = EvolutionEngine::new(config, env).unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(nb_creatures),
            &nb_creatures,
            |b, _| {
                b.iter(|| engine.advance_one_generation().unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_evaluation_workers, bench_generation);
criterion_main!(benches);
