use std::sync::{Arc, Mutex};

use mosa::{
    EngineState, FitnessEvaluatorBuilder, GenerationalEngineBuilder, SearchError,
    evaluator::AcceptancePredicate,
    fitness::Fitness,
    operators::VariationOperator,
    random::RandomGenerator,
    solution::Solution,
    species::RealSpecies,
    strategy::Nsga2Strategy,
};
use ndarray::Array1;

fn objective_one(genome: &Array1<f64>) -> f64 {
    genome.iter().map(|&x| x * x).sum()
}

fn objective_two(genome: &Array1<f64>) -> f64 {
    genome.iter().map(|&x| (x - 1.0) * (x - 1.0)).sum()
}

struct BlendVariation;

impl VariationOperator<Array1<f64>> for BlendVariation {
    fn variate(
        &self,
        parents: &[Solution<Array1<f64>>],
        rng: &mut impl RandomGenerator,
    ) -> Vec<Array1<f64>> {
        parents
            .chunks_exact(2)
            .map(|pair| {
                let mix = rng.gen_unit();
                let mut child: Array1<f64> =
                    &pair[0].genome * mix + &pair[1].genome * (1.0 - mix);
                for value in child.iter_mut() {
                    *value = value.clamp(-1.0, 2.0);
                }
                child
            })
            .collect()
    }
}

fn evaluator() -> mosa::FitnessEvaluator<Array1<f64>> {
    FitnessEvaluatorBuilder::default()
        .objective(Box::new(objective_one))
        .objective(Box::new(objective_two))
        .build()
        .expect("two plain objectives")
}

#[test]
fn evaluation_counter_is_monotonic_across_generations() {
    let _ = env_logger::builder().is_test(true).try_init();
    let seen = Arc::new(Mutex::new(Vec::<usize>::new()));
    let sink = Arc::clone(&seen);

    let mut engine = GenerationalEngineBuilder::default()
        .species(RealSpecies::uniform(2, -1.0, 2.0).unwrap())
        .strategy(Nsga2Strategy::new())
        .variation(BlendVariation)
        .evaluator(evaluator())
        .population_size(10)
        .max_generations(8)
        .seed(Some(5))
        .on_generation(Box::new(move |event: &mosa::engine::GenerationEvent| {
            sink.lock().unwrap().push(event.evaluations);
        }) as mosa::engine::GenerationCallback)
        .build()
        .expect("complete configuration");

    let report = engine.run().expect("run succeeds");
    let counts = seen.lock().unwrap();
    assert_eq!(counts.len(), 8, "one event per generation");
    for window in counts.windows(2) {
        assert!(window[0] <= window[1], "counter must never decrease");
    }
    assert_eq!(report.evaluations, *counts.last().unwrap());
    // 10 initial evaluations + 10 offspring per generation.
    assert_eq!(report.evaluations, 10 + 8 * 10);
}

#[test]
fn finishing_transition_fires_exactly_once() {
    let mut engine = GenerationalEngineBuilder::default()
        .species(RealSpecies::uniform(2, -1.0, 2.0).unwrap())
        .strategy(Nsga2Strategy::new())
        .variation(BlendVariation)
        .evaluator(evaluator())
        .population_size(6)
        .max_generations(3)
        .seed(Some(5))
        .build()
        .expect("complete configuration");

    assert_eq!(engine.state(), EngineState::Init);
    engine.run().expect("first run succeeds");
    assert_eq!(engine.state(), EngineState::Finished);

    // The driver is single-shot: a second run is a configuration error.
    let err = engine.run().unwrap_err();
    assert!(matches!(err, SearchError::Configuration(_)));
    assert_eq!(engine.state(), EngineState::Finished);
}

#[test]
fn acceptable_fitness_stops_the_run_early() {
    let evaluator = FitnessEvaluatorBuilder::default()
        .objective(Box::new(objective_one))
        .objective(Box::new(objective_two))
        .acceptance(Box::new(|fitness: &Fitness| {
            // Everything is acceptable: the run must stop after the very
            // first control check.
            fitness.objective_value(0).is_finite()
        }) as AcceptancePredicate)
        .build()
        .expect("builder succeeds");

    let mut engine = GenerationalEngineBuilder::default()
        .species(RealSpecies::uniform(2, -1.0, 2.0).unwrap())
        .strategy(Nsga2Strategy::new())
        .variation(BlendVariation)
        .evaluator(evaluator)
        .population_size(6)
        .max_generations(100)
        .seed(Some(5))
        .build()
        .expect("complete configuration");

    let report = engine.run().expect("run succeeds");
    assert_eq!(report.generations, 0, "no generation ran");
    assert_eq!(report.evaluations, 6, "only the initial evaluation happened");
}

#[test]
fn max_evaluations_bounds_the_run() {
    let mut engine = GenerationalEngineBuilder::default()
        .species(RealSpecies::uniform(2, -1.0, 2.0).unwrap())
        .strategy(Nsga2Strategy::new())
        .variation(BlendVariation)
        .evaluator(evaluator())
        .population_size(10)
        .max_generations(1000)
        .max_evaluations(35)
        .seed(Some(5))
        .build()
        .expect("complete configuration");

    let report = engine.run().expect("run succeeds");
    // 10 + 10·k first exceeds 35 at k = 3.
    assert_eq!(report.evaluations, 40);
    assert_eq!(report.generations, 3);
}

#[test]
fn configuration_errors_surface_before_the_first_generation() {
    let single_objective = FitnessEvaluatorBuilder::default()
        .objective(Box::new(objective_one))
        .build()
        .expect("builder succeeds");

    let mut engine = GenerationalEngineBuilder::default()
        .species(RealSpecies::uniform(2, -1.0, 2.0).unwrap())
        .strategy(Nsga2Strategy::new())
        .variation(BlendVariation)
        .evaluator(single_objective)
        .population_size(6)
        .max_generations(3)
        .seed(Some(5))
        .build()
        .expect("builder itself accepts the parts");

    let err = engine.run().unwrap_err();
    assert!(matches!(err, SearchError::Configuration(_)));
}

#[test]
fn evaluator_failure_carries_the_offending_objective() {
    struct FailsOnNegative;
    impl mosa::Objective<Array1<f64>> for FailsOnNegative {
        fn evaluate(
            &self,
            genome: &Array1<f64>,
        ) -> Result<f64, mosa::error::ObjectiveFailure> {
            if genome[0] < 0.0 {
                return Err("negative coordinate".into());
            }
            Ok(genome[0])
        }
    }

    let evaluator = FitnessEvaluatorBuilder::default()
        .objective(Box::new(objective_one))
        .objective(Box::new(FailsOnNegative))
        .build()
        .expect("builder succeeds");

    // The sampling box guarantees negative coordinates, so the first
    // evaluation batch fails and the run aborts.
    let mut engine = GenerationalEngineBuilder::default()
        .species(RealSpecies::uniform(2, -2.0, -1.0).unwrap())
        .strategy(Nsga2Strategy::new())
        .variation(BlendVariation)
        .evaluator(evaluator)
        .population_size(4)
        .max_generations(3)
        .seed(Some(5))
        .build()
        .expect("complete configuration");

    match engine.run().unwrap_err() {
        SearchError::Evaluator { objective, .. } => assert_eq!(objective, 1),
        other => panic!("unexpected error: {other}"),
    }
}
