//! # `strategy` – Pluggable Multi-Objective Selection Policies
//!
//! A [`Strategy`] bundles everything that distinguishes one multi-objective
//! algorithm from another once the generational driver is fixed: the
//! extended fitness it needs stamped on every solution, its preferred
//! solution comparator, mating selection, environmental selection, archive
//! maintenance and the per-generation bookkeeping (ideal points, grids,
//! reference associations, strengths).
//!
//! The [`StrategyContext`] is the shared mutable record the driver rewrites
//! between phases — generation index, evaluation count, sizes, objective
//! orientation and declared bounds. Strategies read it on every call and
//! own only their internal state (neighbourhoods, grids, reference sets).
//!
//! | Strategy | Family | Selection backbone |
//! |----------|--------|--------------------|
//! | [`Nsga2Strategy`] | dominance | fronts + crowding |
//! | [`Nsga3Strategy`] | dominance | fronts + reference-point niching |
//! | [`Spea2Strategy`] | dominance | strength + k-NN density |
//! | [`MoeadStrategy`] | decomposition | weight neighbourhoods + scalarisation |
//! | [`RveaStrategy`] | decomposition | angle partitions + APD |
//! | [`EpsilonMoeaStrategy`] | grid/ε | hypercube archive, steady state |
//! | [`GreaStrategy`] | grid/ε | grid ranking + penalty |
//! | [`PaesStrategy`] | grid/ε | (1+1) adaptive-grid archive |

mod emoea;
mod grea;
mod moead;
mod nsga2;
mod nsga3;
mod paes;
mod rvea;
mod spea2;

pub use emoea::{EpsilonMoeaStrategy, EpsilonSpec};
pub use grea::GreaStrategy;
pub use moead::{MoeadStrategy, Scalarization};
pub use nsga2::Nsga2Strategy;
pub use nsga3::Nsga3Strategy;
pub use paes::PaesStrategy;
pub use rvea::RveaStrategy;
pub use spea2::Spea2Strategy;

use ndarray::Array1;

use crate::comparator::{FitnessComparator, SolutionComparator};
use crate::commands::{CrowdingDistanceCalculator, NonDominatedExtractor};
use crate::fitness::Fitness;
use crate::random::RandomGenerator;
use crate::solution::{Solution, fitness_matrix, violation_vector};

/// Shared mutable record the driver publishes to every strategy call.
#[derive(Debug, Clone)]
pub struct StrategyContext {
    pub num_objectives: usize,
    /// Maximization flag per declared objective position.
    pub senses: Vec<bool>,
    /// Declared per-objective bounds, when the problem states them.
    pub bounds: Vec<Option<(f64, f64)>>,
    /// Size environmental selection must return.
    pub target_size: usize,
    pub max_generations: usize,
    pub max_evaluations: usize,
    pub generation: usize,
    /// Evaluation counter snapshot, exact between phases.
    pub evaluations: usize,
}

impl StrategyContext {
    pub fn new(
        num_objectives: usize,
        senses: Vec<bool>,
        bounds: Vec<Option<(f64, f64)>>,
        target_size: usize,
        max_generations: usize,
        max_evaluations: usize,
    ) -> Self {
        Self {
            num_objectives,
            senses,
            bounds,
            target_size,
            max_generations,
            max_evaluations,
            generation: 0,
            evaluations: 0,
        }
    }
}

/// Capability set of one multi-objective algorithm.
pub trait Strategy<G: Clone> {
    /// The extended fitness the evaluator must stamp on every solution.
    fn fitness_prototype(&self, num_objectives: usize) -> Fitness {
        Fitness::objectives(num_objectives)
    }

    /// The strategy's preferred solution comparator over the declared
    /// component comparators.
    fn solution_comparator(&self, senses: &[bool]) -> SolutionComparator {
        SolutionComparator::Plain(FitnessComparator::pareto(senses))
    }

    /// Prepares internal state from the evaluated initial population and
    /// returns the initial archive.
    fn initialize(
        &mut self,
        ctx: &StrategyContext,
        population: &mut Vec<Solution<G>>,
        rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>>;

    /// Parents for the variation operator; order matters for recombination.
    fn mating_selection(
        &mut self,
        ctx: &StrategyContext,
        population: &[Solution<G>],
        archive: &[Solution<G>],
        rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>>;

    /// Survivors of exactly `ctx.target_size` from parents and offspring.
    fn environmental_selection(
        &mut self,
        ctx: &StrategyContext,
        population: &[Solution<G>],
        offspring: &[Solution<G>],
        archive: &[Solution<G>],
        rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>>;

    /// Refreshes the external archive. The driver calls this after
    /// environmental selection with the *previous* inhabitants; the default
    /// keeps the non-dominated set of inhabitants and offspring.
    fn update_archive(
        &mut self,
        ctx: &StrategyContext,
        population: &[Solution<G>],
        offspring: &[Solution<G>],
        archive: Vec<Solution<G>>,
        _rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>> {
        let _ = archive;
        non_dominated_subset(ctx, population, offspring)
    }

    /// Internal bookkeeping between generations (ideal point, grid bounds,
    /// reference associations, strengths).
    fn update(
        &mut self,
        _ctx: &StrategyContext,
        _population: &[Solution<G>],
        _archive: &[Solution<G>],
    ) {
    }
}

/// Non-dominated copies of two merged lists, infeasible members filtered
/// out first when violations are present.
pub(crate) fn non_dominated_subset<G: Clone>(
    ctx: &StrategyContext,
    population: &[Solution<G>],
    offspring: &[Solution<G>],
) -> Vec<Solution<G>> {
    let pool = crate::solution::merged(population, offspring);
    if pool.is_empty() {
        return Vec::new();
    }
    let mut extractor = NonDominatedExtractor::new(fitness_matrix(&pool), &ctx.senses);
    extractor.set_violations(violation_vector(&pool));
    extractor
        .execute()
        .expect("non-empty pool cannot fail extraction");
    extractor
        .front()
        .iter()
        .map(|&index| pool[index].clone())
        .collect()
}

/// Objective matrix with every maximised column negated, so downstream
/// numeric kernels can assume minimisation throughout.
pub(crate) fn oriented_matrix<G>(
    solutions: &[Solution<G>],
    senses: &[bool],
) -> ndarray::Array2<f64> {
    let mut matrix = fitness_matrix(solutions);
    for (objective, &maximize) in senses.iter().enumerate() {
        if maximize {
            matrix.column_mut(objective).mapv_inplace(|v| -v);
        }
    }
    matrix
}

/// Crowding distances of one front, normalised by the declared objective
/// bounds when present and by the front's own extrema otherwise.
pub(crate) fn front_crowding<G>(front: &[Solution<G>], ctx: &StrategyContext) -> Array1<f64> {
    let matrix = fitness_matrix(front);
    let m = ctx.num_objectives;
    let mut min = Array1::zeros(m);
    let mut max = Array1::zeros(m);
    for objective in 0..m {
        match ctx.bounds.get(objective).copied().flatten() {
            Some((lo, up)) => {
                min[objective] = lo;
                max[objective] = up;
            }
            None => {
                let column = matrix.column(objective);
                min[objective] = column.iter().cloned().fold(f64::INFINITY, f64::min);
                max[objective] = column.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            }
        }
    }
    let mut calculator = CrowdingDistanceCalculator::new(matrix, min, max);
    calculator
        .execute()
        .expect("non-empty front cannot fail crowding");
    calculator.distances().clone()
}

/// Binary tournament: draws two inhabitants and keeps the winner under
/// `duel`; incomparable duels fall to a coin flip.
pub(crate) fn binary_tournament<'a, G>(
    population: &'a [Solution<G>],
    rng: &mut impl RandomGenerator,
    duel: impl Fn(&Solution<G>, &Solution<G>) -> i32,
) -> &'a Solution<G> {
    let first = &population[rng.gen_range_usize(0, population.len())];
    let second = &population[rng.gen_range_usize(0, population.len())];
    match duel(first, second) {
        1 => first,
        -1 => second,
        _ => {
            if rng.gen_bool(0.5) {
                first
            } else {
                second
            }
        }
    }
}

/// Truncates to `cap` members, preferring larger crowding distance. Used to
/// bound dominance-family archives.
pub(crate) fn cap_by_crowding<G: Clone>(
    solutions: Vec<Solution<G>>,
    cap: usize,
    ctx: &StrategyContext,
) -> Vec<Solution<G>> {
    if solutions.len() <= cap {
        return solutions;
    }
    let crowding = front_crowding(&solutions, ctx);
    let mut order: Vec<usize> = (0..solutions.len()).collect();
    order.sort_by(|&a, &b| {
        ordered_float::OrderedFloat(crowding[b]).cmp(&ordered_float::OrderedFloat(crowding[a]))
    });
    order.truncate(cap);
    order.sort_unstable();
    order.into_iter().map(|i| solutions[i].clone()).collect()
}
