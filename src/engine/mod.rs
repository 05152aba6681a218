//! # `engine` – Generic Search Drivers
//!
//! The drivers compose the generic algorithm phases with a pluggable
//! strategy. [`GenerationalEngine`] runs the evolutionary cycle:
//!
//! 1. **INIT** – sample the species, evaluate, let the strategy build its
//!    initial archive, check the stopping predicates.
//! 2. **RUNNING** – each generation: mating selection → variation →
//!    evaluation → environmental selection → archive update → strategy
//!    bookkeeping → control.
//! 3. **FINISHED** – expose the final population, the archive, the
//!    non-dominated front and the elapsed time.
//!
//! The driver owns the context record and rewrites it between phases; the
//! strategy only ever reads it. Archive updates always run *after*
//! environmental selection, against the previous inhabitants plus the
//! offspring — one consistent order for every strategy.
//!
//! [`SwarmEngine`](crate::engine::SwarmEngine) is the swarm variant:
//! velocity and position updates replace variation, turbulence optionally
//! disturbs the moved swarm, and leader/memory refreshes replace the
//! archive update.

mod swarm;

pub use swarm::{SwarmEngine, SwarmEngineBuilder};

use std::time::{Duration, Instant};

use derive_builder::Builder;

use crate::comparator::SolutionComparator;
use crate::error::SearchError;
use crate::evaluator::FitnessEvaluator;
use crate::operators::{PopulationCleaner, VariationOperator};
use crate::random::SearchRandomGenerator;
use crate::solution::Solution;
use crate::species::SpeciesProvider;
use crate::strategy::{Strategy, StrategyContext};

/// Driver state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    Init,
    Running,
    Finished,
}

/// Per-generation callback payload.
#[derive(Debug, Clone)]
pub struct GenerationEvent {
    pub generation: usize,
    pub front_size: usize,
    pub archive_size: usize,
    pub evaluations: usize,
}

pub type GenerationCallback = Box<dyn FnMut(&GenerationEvent)>;

/// Outcome of a finished run.
#[derive(Debug, Clone)]
pub struct RunReport<G> {
    pub final_population: Vec<Solution<G>>,
    pub final_archive: Vec<Solution<G>>,
    pub non_dominated_front: Vec<Solution<G>>,
    pub elapsed: Duration,
    pub evaluations: usize,
    pub generations: usize,
}

/// Generational driver over an opaque genome type.
#[derive(Builder)]
#[builder(pattern = "owned")]
pub struct GenerationalEngine<G, S, V, P>
where
    G: Clone + Send + Sync,
    S: Strategy<G>,
    V: VariationOperator<G>,
    P: SpeciesProvider<G>,
{
    species: P,
    strategy: S,
    variation: V,
    evaluator: FitnessEvaluator<G>,
    population_size: usize,
    max_generations: usize,
    #[builder(default = "usize::MAX")]
    max_evaluations: usize,
    #[builder(default)]
    seed: Option<u64>,
    #[builder(default, setter(strip_option))]
    cleaner: Option<Box<dyn PopulationCleaner<G>>>,
    #[builder(default, setter(strip_option))]
    on_generation: Option<GenerationCallback>,
    #[builder(setter(skip), default)]
    state: EngineState,
    #[builder(setter(skip), default)]
    population: Vec<Solution<G>>,
    #[builder(setter(skip), default)]
    archive: Vec<Solution<G>>,
}

impl<G, S, V, P> GenerationalEngine<G, S, V, P>
where
    G: Clone + Send + Sync,
    S: Strategy<G>,
    V: VariationOperator<G>,
    P: SpeciesProvider<G>,
{
    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn population(&self) -> &[Solution<G>] {
        &self.population
    }

    /// The strategy-owned archive, read-only from the outside.
    pub fn archive(&self) -> &[Solution<G>] {
        &self.archive
    }

    fn validate(&self) -> Result<(), SearchError> {
        if self.population_size == 0 {
            return Err(SearchError::Configuration(
                "population size must be positive".into(),
            ));
        }
        if self.max_generations == 0 {
            return Err(SearchError::Configuration(
                "the number of generations must be positive".into(),
            ));
        }
        if self.evaluator.num_objectives() < 2 {
            return Err(SearchError::Configuration(format!(
                "multi-objective search needs at least two objectives, got {}",
                self.evaluator.num_objectives()
            )));
        }
        Ok(())
    }

    /// The stopping predicate of the control phase.
    fn should_finish(&self, ctx: &StrategyContext) -> bool {
        ctx.generation >= ctx.max_generations
            || ctx.evaluations > ctx.max_evaluations
            || self
                .population
                .iter()
                .chain(self.archive.iter())
                .any(|s| s.fitness.is_acceptable())
    }

    /// Runs the search to completion and hands back the report. A second
    /// call is a configuration error: the driver is single-shot and the
    /// finishing transition fires exactly once.
    pub fn run(&mut self) -> Result<RunReport<G>, SearchError> {
        if self.state != EngineState::Init {
            return Err(SearchError::Configuration(
                "the engine has already run; build a fresh one for a new search".into(),
            ));
        }
        self.validate()?;

        let start = Instant::now();
        let mut rng = SearchRandomGenerator::new_from_seed(self.seed);
        let mut ctx = StrategyContext::new(
            self.evaluator.num_objectives(),
            self.evaluator.senses(),
            self.evaluator.objective_bounds(),
            self.population_size,
            self.max_generations,
            self.max_evaluations,
        );
        self.evaluator
            .set_prototype(self.strategy.fitness_prototype(ctx.num_objectives));
        // The active solution comparator of this run.
        let comparator = self.strategy.solution_comparator(&ctx.senses);

        log::info!(
            "starting run: {} objectives, population {}, {} generations",
            ctx.num_objectives,
            self.population_size,
            self.max_generations
        );

        // INIT: sample, evaluate, build the initial archive.
        let genomes = self.species.sample(self.population_size, &mut rng);
        let mut population = self.evaluator.evaluate_all(genomes)?;
        if population.is_empty() {
            return Err(SearchError::invalid_population("initialisation"));
        }
        self.archive = self.strategy.initialize(&ctx, &mut population, &mut rng);
        self.population = population;
        ctx.evaluations = self.evaluator.evaluations();
        self.state = EngineState::Running;

        while !self.should_finish(&ctx) {
            ctx.generation += 1;

            // Mating.
            let parents =
                self.strategy
                    .mating_selection(&ctx, &self.population, &self.archive, &mut rng);
            if parents.is_empty() {
                return Err(SearchError::invalid_population("mating selection"));
            }

            // Variation and evaluation.
            let mut genomes = self.variation.variate(&parents, &mut rng);
            if let Some(cleaner) = &self.cleaner {
                genomes = cleaner.clean(genomes, &self.population);
            }
            let offspring = self.evaluator.evaluate_all(genomes)?;
            ctx.evaluations = self.evaluator.evaluations();

            // Replacement, then archive refresh against the previous
            // inhabitants.
            let survivors = self.strategy.environmental_selection(
                &ctx,
                &self.population,
                &offspring,
                &self.archive,
                &mut rng,
            );
            let previous_archive = std::mem::take(&mut self.archive);
            self.archive = self.strategy.update_archive(
                &ctx,
                &self.population,
                &offspring,
                previous_archive,
                &mut rng,
            );
            self.population = survivors;
            self.strategy.update(&ctx, &self.population, &self.archive);

            log::debug!(
                "generation {}: {} inhabitants, {} archived, {} evaluations",
                ctx.generation,
                self.population.len(),
                self.archive.len(),
                ctx.evaluations
            );
            if let Some(callback) = self.on_generation.as_mut() {
                let front_size = comparator_front(&self.population, &comparator).len();
                callback(&GenerationEvent {
                    generation: ctx.generation,
                    front_size,
                    archive_size: self.archive.len(),
                    evaluations: ctx.evaluations,
                });
            }
        }

        self.state = EngineState::Finished;
        let front = comparator_front(&self.population, &comparator);
        log::info!(
            "finished after {} generations and {} evaluations; front of {}",
            ctx.generation,
            ctx.evaluations,
            front.len()
        );
        Ok(RunReport {
            final_population: self.population.clone(),
            final_archive: self.archive.clone(),
            non_dominated_front: front,
            elapsed: start.elapsed(),
            evaluations: ctx.evaluations,
            generations: ctx.generation,
        })
    }
}

/// Copies of the members no other member strictly beats under the active
/// solution comparator.
pub(crate) fn comparator_front<G: Clone>(
    solutions: &[Solution<G>],
    comparator: &SolutionComparator,
) -> Vec<Solution<G>> {
    solutions
        .iter()
        .filter(|member| {
            !solutions
                .iter()
                .any(|other| comparator.compare(&other.fitness, &member.fitness) == 1)
        })
        .cloned()
        .collect()
}
