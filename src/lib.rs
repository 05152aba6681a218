//! # `mosa` – Multi- and Many-Objective Metaheuristic Search
//!
//! A generic search core for multi-objective optimization: an experiment
//! defines a problem whose candidate solutions are scored by two or more
//! objectives, and the engines look for a well-spread approximation of the
//! Pareto-optimal set. Genomes are opaque — the core never inspects them;
//! species providers and variation operators own the encoding.
//!
//! The crate is organised around three layers:
//!
//! * **Algebra** – [`fitness`] (objective vectors plus strategy-specific
//!   extensions), [`comparator`] (Pareto, lexicographic, scalar and
//!   ε-dominance, with feasibility-aware wrappers) and the numeric
//!   [`commands`] (non-dominated extraction, front splitting, crowding,
//!   scaling, reference vectors, hypercube grids).
//! * **Strategies** – [`strategy`] hosts the pluggable selection policies
//!   (NSGA-II, NSGA-III, SPEA2, MOEA/D, RVEA, ε-MOEA, GrEA, PAES) and
//!   [`swarm`] the particle-swarm family with its leader policies.
//! * **Drivers** – [`engine`] runs the generational and swarm loops,
//!   owns the shared context record and enforces the stopping predicates.
//!
//! ## Quick example: NSGA-II on a two-objective problem
//!
//! ```rust,no_run
//! use mosa::{
//!     engine::GenerationalEngineBuilder,
//!     evaluator::FitnessEvaluatorBuilder,
//!     operators::VariationOperator,
//!     random::RandomGenerator,
//!     solution::Solution,
//!     species::RealSpecies,
//!     strategy::Nsga2Strategy,
//! };
//! use ndarray::Array1;
//!
//! struct BlendVariation;
//!
//! impl VariationOperator<Array1<f64>> for BlendVariation {
//!     fn variate(
//!         &self,
//!         parents: &[Solution<Array1<f64>>],
//!         rng: &mut impl RandomGenerator,
//!     ) -> Vec<Array1<f64>> {
//!         parents
//!             .chunks_exact(2)
//!             .map(|pair| {
//!                 let mix = rng.gen_unit();
//!                 &pair[0].genome * mix + &pair[1].genome * (1.0 - mix)
//!             })
//!             .collect()
//!     }
//! }
//!
//! fn main() -> Result<(), mosa::error::SearchError> {
//!     let evaluator = FitnessEvaluatorBuilder::default()
//!         .objective(Box::new(|genome: &Array1<f64>| genome[0]))
//!         .objective(Box::new(|genome: &Array1<f64>| 1.0 - genome[0]))
//!         .build()
//!         .expect("two plain objectives");
//!
//!     let mut engine = GenerationalEngineBuilder::default()
//!         .species(RealSpecies::uniform(3, 0.0, 1.0)?)
//!         .strategy(Nsga2Strategy::new())
//!         .variation(BlendVariation)
//!         .evaluator(evaluator)
//!         .population_size(40)
//!         .max_generations(50)
//!         .seed(Some(42))
//!         .build()
//!         .expect("complete engine configuration");
//!
//!     let report = engine.run()?;
//!     println!("front of {}", report.non_dominated_front.len());
//!     Ok(())
//! }
//! ```

pub mod commands;
pub mod comparator;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod fitness;
pub mod linalg;
pub mod operators;
pub mod random;
pub mod solution;
pub mod species;
pub mod strategy;
pub mod swarm;

pub use comparator::{FitnessComparator, ObjectiveComparator, SolutionComparator};
pub use engine::{
    EngineState, GenerationEvent, GenerationalEngine, GenerationalEngineBuilder, RunReport,
    SwarmEngine, SwarmEngineBuilder,
};
pub use error::SearchError;
pub use evaluator::{
    EvaluationMode, FitnessEvaluator, FitnessEvaluatorBuilder, Objective, ObjectiveFunction,
};
pub use fitness::{Extension, Fitness};
pub use operators::{ExactDuplicatesCleaner, NoCleaner, PopulationCleaner, VariationOperator};
pub use random::{NoopRandomGenerator, RandomGenerator, SearchRandomGenerator};
pub use solution::Solution;
pub use species::{RealSpecies, SpeciesProvider};
pub use strategy::{
    EpsilonMoeaStrategy, EpsilonSpec, GreaStrategy, MoeadStrategy, Nsga2Strategy, Nsga3Strategy,
    PaesStrategy, RveaStrategy, Scalarization, Spea2Strategy, Strategy, StrategyContext,
};
pub use swarm::{LeaderPolicy, MultiObjectivePso, Particle, RealGenome, SwarmStrategy};
