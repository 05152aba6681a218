//! NSGA-II: fast non-dominated sorting plus crowding-distance preservation.
//!
//! Follows K. Deb, A. Pratap, S. Agarwal & T. Meyarivan, "A Fast and
//! Elitist Multi-objective Genetic Algorithm: NSGA-II", IEEE TEC 6(2),
//! 2002. Mating is a binary tournament under the crowded comparison
//! (feasibility, then lower rank, then larger crowding); environmental
//! selection fills survivors front by front and splits the overflowing
//! front by descending crowding distance. O(M·N²) per generation.

use ordered_float::OrderedFloat;

use crate::comparator::{FitnessComparator, SolutionComparator};
use crate::commands::PopulationSplitter;
use crate::fitness::{Extension, Fitness, RankedFields};
use crate::random::RandomGenerator;
use crate::solution::{Solution, fitness_matrix, merged};
use crate::strategy::{
    StrategyContext, Strategy, binary_tournament, cap_by_crowding, front_crowding,
};

#[derive(Debug, Clone, Default)]
pub struct Nsga2Strategy {
    archive_cap: Option<usize>,
}

impl Nsga2Strategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds the external archive; unbounded by default.
    pub fn with_archive_cap(mut self, cap: usize) -> Self {
        self.archive_cap = Some(cap);
        self
    }

    /// Crowded comparison: feasibility first, then rank, then crowding.
    fn crowded_duel<G>(a: &Solution<G>, b: &Solution<G>) -> i32 {
        match (a.fitness.is_feasible(), b.fitness.is_feasible()) {
            (true, false) => return 1,
            (false, true) => return -1,
            (false, false) => {
                let va = a.fitness.violation().unwrap_or(0.0);
                let vb = b.fitness.violation().unwrap_or(0.0);
                if va < vb {
                    return 1;
                }
                if vb < va {
                    return -1;
                }
            }
            (true, true) => {}
        }
        let ra = a.fitness.ranked();
        let rb = b.fitness.ranked();
        if ra.rank != rb.rank {
            return if ra.rank < rb.rank { 1 } else { -1 };
        }
        match ra.crowding.partial_cmp(&rb.crowding) {
            Some(std::cmp::Ordering::Greater) => 1,
            Some(std::cmp::Ordering::Less) => -1,
            _ => 0,
        }
    }
}

/// Stamps front rank and per-front crowding distance onto every member.
/// Returns the fronts as index lists into `solutions`.
pub(crate) fn rank_and_crowd<G: Clone>(
    solutions: &mut [Solution<G>],
    ctx: &StrategyContext,
) -> Vec<Vec<usize>> {
    let mut splitter = PopulationSplitter::new(fitness_matrix(solutions), &ctx.senses);
    splitter
        .execute()
        .expect("non-empty population cannot fail front splitting");
    let fronts: Vec<Vec<usize>> = splitter.fronts().to_vec();

    for (rank, front) in fronts.iter().enumerate() {
        let members: Vec<Solution<G>> = front.iter().map(|&i| solutions[i].clone()).collect();
        let crowding = front_crowding(&members, ctx);
        for (position, &index) in front.iter().enumerate() {
            let fields = solutions[index].fitness.ranked_mut();
            fields.rank = rank;
            fields.crowding = crowding[position];
        }
    }
    fronts
}

impl<G: Clone> Strategy<G> for Nsga2Strategy {
    fn fitness_prototype(&self, num_objectives: usize) -> Fitness {
        Fitness::objectives(num_objectives)
            .with_extension(Extension::Ranked(RankedFields::default()))
    }

    fn solution_comparator(&self, senses: &[bool]) -> SolutionComparator {
        SolutionComparator::ConstrainedByViolation(FitnessComparator::pareto(senses))
    }

    fn initialize(
        &mut self,
        ctx: &StrategyContext,
        population: &mut Vec<Solution<G>>,
        _rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>> {
        let fronts = rank_and_crowd(population, ctx);
        fronts[0].iter().map(|&i| population[i].clone()).collect()
    }

    fn mating_selection(
        &mut self,
        ctx: &StrategyContext,
        population: &[Solution<G>],
        _archive: &[Solution<G>],
        rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>> {
        (0..2 * ctx.target_size)
            .map(|_| binary_tournament(population, rng, Self::crowded_duel).clone())
            .collect()
    }

    fn environmental_selection(
        &mut self,
        ctx: &StrategyContext,
        population: &[Solution<G>],
        offspring: &[Solution<G>],
        _archive: &[Solution<G>],
        _rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>> {
        let mut pool = merged(population, offspring);
        let fronts = rank_and_crowd(&mut pool, ctx);

        let mut survivors: Vec<Solution<G>> = Vec::with_capacity(ctx.target_size);
        for front in fronts {
            let remaining = ctx.target_size - survivors.len();
            if remaining == 0 {
                break;
            }
            if front.len() <= remaining {
                survivors.extend(front.iter().map(|&i| pool[i].clone()));
                continue;
            }
            // Overflowing front: keep the least crowded out, largest first.
            let mut by_crowding = front.clone();
            by_crowding.sort_by_key(|&i| {
                std::cmp::Reverse(OrderedFloat(pool[i].fitness.ranked().crowding))
            });
            survivors.extend(by_crowding.into_iter().take(remaining).map(|i| pool[i].clone()));
            break;
        }
        survivors
    }

    fn update_archive(
        &mut self,
        ctx: &StrategyContext,
        population: &[Solution<G>],
        offspring: &[Solution<G>],
        _archive: Vec<Solution<G>>,
        _rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>> {
        let front = crate::strategy::non_dominated_subset(ctx, population, offspring);
        match self.archive_cap {
            Some(cap) => cap_by_crowding(front, cap, ctx),
            None => front,
        }
    }
}
