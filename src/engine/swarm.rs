//! Swarm driver: the particle-swarm variant of the generational engine.

use std::time::Instant;

use derive_builder::Builder;
use ndarray::Array1;

use crate::engine::{EngineState, GenerationCallback, GenerationEvent, RunReport, comparator_front};
use crate::error::SearchError;
use crate::evaluator::FitnessEvaluator;
use crate::random::SearchRandomGenerator;
use crate::solution::Solution;
use crate::species::{RealSpecies, SpeciesProvider};
use crate::strategy::StrategyContext;
use crate::swarm::{Particle, RealGenome, SwarmStrategy};

/// Swarm driver. Replaces the variation/replacement phases of the
/// generational loop with: velocity + position update and evaluation
/// (move), optional turbulence on a disturbed subset, then leader and
/// personal-best refreshes. The leader set plays the archive's role.
#[derive(Builder)]
#[builder(pattern = "owned")]
pub struct SwarmEngine<S>
where
    S: SwarmStrategy,
{
    species: RealSpecies,
    strategy: S,
    evaluator: FitnessEvaluator<RealGenome>,
    swarm_size: usize,
    max_generations: usize,
    #[builder(default = "usize::MAX")]
    max_evaluations: usize,
    #[builder(default)]
    seed: Option<u64>,
    #[builder(default, setter(strip_option))]
    on_generation: Option<GenerationCallback>,
    #[builder(setter(skip), default)]
    state: EngineState,
    #[builder(setter(skip), default)]
    swarm: Vec<Particle>,
    #[builder(setter(skip), default)]
    leaders: Vec<Solution<RealGenome>>,
}

impl<S> SwarmEngine<S>
where
    S: SwarmStrategy,
{
    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn swarm(&self) -> &[Particle] {
        &self.swarm
    }

    pub fn leaders(&self) -> &[Solution<RealGenome>] {
        &self.leaders
    }

    fn validate(&self) -> Result<(), SearchError> {
        if self.swarm_size == 0 {
            return Err(SearchError::Configuration(
                "swarm size must be positive".into(),
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

    fn should_finish(&self, ctx: &StrategyContext) -> bool {
        ctx.generation >= ctx.max_generations
            || ctx.evaluations > ctx.max_evaluations
            || self
                .swarm
                .iter()
                .map(|p| &p.solution)
                .chain(self.leaders.iter())
                .any(|s| s.fitness.is_acceptable())
    }

    pub fn run(&mut self) -> Result<RunReport<RealGenome>, SearchError> {
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
            self.swarm_size,
            self.max_generations,
            self.max_evaluations,
        );
        self.evaluator
            .set_prototype(self.strategy.fitness_prototype(ctx.num_objectives));
        let comparator = self.strategy.solution_comparator(&ctx.senses);

        log::info!(
            "starting swarm run: {} objectives, {} particles, {} generations",
            ctx.num_objectives,
            self.swarm_size,
            self.max_generations
        );

        // INIT: sample positions, evaluate, seed memories and leaders.
        let genomes = self.species.sample(self.swarm_size, &mut rng);
        let solutions = self.evaluator.evaluate_all(genomes)?;
        if solutions.is_empty() {
            return Err(SearchError::invalid_population("swarm initialisation"));
        }
        self.swarm = solutions.into_iter().map(Particle::new).collect();
        self.leaders = self.strategy.initialize(&ctx, &self.swarm, &mut rng);
        ctx.evaluations = self.evaluator.evaluations();
        self.state = EngineState::Running;

        while !self.should_finish(&ctx) {
            ctx.generation += 1;

            // Move: velocities, positions, evaluation.
            let mut velocities = Vec::with_capacity(self.swarm.len());
            let mut positions = Vec::with_capacity(self.swarm.len());
            for particle in &self.swarm {
                let velocity = self.strategy.velocity_update(
                    &ctx,
                    particle,
                    &self.leaders,
                    &self.species,
                    &mut rng,
                );
                let mut position: Array1<f64> = &particle.solution.genome + &velocity;
                self.species.clamp(&mut position);
                velocities.push(velocity);
                positions.push(position);
            }
            let moved = self.evaluator.evaluate_all(positions)?;
            for ((particle, velocity), solution) in self
                .swarm
                .iter_mut()
                .zip(velocities.into_iter())
                .zip(moved.into_iter())
            {
                particle.velocity = velocity;
                particle.solution = solution;
            }

            // Turbulence: re-seed a disturbed subset of the swarm.
            let disturbed = self
                .strategy
                .turbulence(&ctx, &self.swarm, &self.species, &mut rng);
            if !disturbed.is_empty() {
                let (indices, genomes): (Vec<usize>, Vec<RealGenome>) =
                    disturbed.into_iter().unzip();
                let evaluated = self.evaluator.evaluate_all(genomes)?;
                for (index, solution) in indices.into_iter().zip(evaluated.into_iter()) {
                    self.swarm[index].solution = solution;
                }
            }
            ctx.evaluations = self.evaluator.evaluations();

            // Memories: a particle adopts its new position unless the old
            // best strictly beats it.
            for particle in &mut self.swarm {
                if comparator.compare(&particle.solution.fitness, &particle.best.fitness) >= 0 {
                    particle.best = particle.solution.clone();
                }
            }

            // Leaders play the archive's role.
            let previous = std::mem::take(&mut self.leaders);
            self.leaders = self
                .strategy
                .update_leaders(&ctx, &self.swarm, previous, &mut rng);

            log::debug!(
                "generation {}: {} particles, {} leaders, {} evaluations",
                ctx.generation,
                self.swarm.len(),
                self.leaders.len(),
                ctx.evaluations
            );
            if let Some(callback) = self.on_generation.as_mut() {
                let positions: Vec<Solution<RealGenome>> =
                    self.swarm.iter().map(|p| p.solution.clone()).collect();
                let front_size = comparator_front(&positions, &comparator).len();
                callback(&GenerationEvent {
                    generation: ctx.generation,
                    front_size,
                    archive_size: self.leaders.len(),
                    evaluations: ctx.evaluations,
                });
            }
        }

        self.state = EngineState::Finished;
        let final_population: Vec<Solution<RealGenome>> =
            self.swarm.iter().map(|p| p.solution.clone()).collect();
        let front = comparator_front(&final_population, &comparator);
        log::info!(
            "swarm finished after {} generations and {} evaluations; {} leaders",
            ctx.generation,
            ctx.evaluations,
            self.leaders.len()
        );
        Ok(RunReport {
            final_population,
            final_archive: self.leaders.clone(),
            non_dominated_front: front,
            elapsed: start.elapsed(),
            evaluations: ctx.evaluations,
            generations: ctx.generation,
        })
    }
}
