//! SPEA2: strength-based fitness with k-nearest-neighbour density.
//!
//! Follows E. Zitzler, M. Laumanns & L. Thiele, "SPEA2: Improving the
//! Strength Pareto Evolutionary Algorithm", TIK report 103, 2001. The
//! scored pool is the inhabitants plus the archive: strength
//! S(x) = |{y ∈ P∪A : x dominates y}|, raw fitness R(x) sums the
//! strengths of x's dominators, density D(x) = 1/(σ_k + 2) with σ_k the
//! distance to the k-th nearest neighbour in objective space and
//! k = ⌊√(|P|+|A|)⌋. Selection over that pool keeps every F < 1 member,
//! fills shortfalls by ascending F and resolves overflows with the
//! iterative nearest-neighbour truncation. Offspring enter the cycle
//! through the archive update, so the next generation's P∪A pool carries
//! them.

use ordered_float::OrderedFloat;

use crate::comparator::{FitnessComparator, SolutionComparator, component_comparators};
use crate::commands::{NonDominatedExtractor, dominance_sign};
use crate::fitness::{Extension, Fitness, StrengthFields};
use crate::linalg::pairwise_distances;
use crate::random::RandomGenerator;
use crate::solution::{Solution, fitness_matrix, merged, violation_vector};
use crate::strategy::{StrategyContext, Strategy, binary_tournament};

#[derive(Debug, Clone, Default)]
pub struct Spea2Strategy;

impl Spea2Strategy {
    pub fn new() -> Self {
        Self
    }
}

/// Euclidean distance matrix of a pool's objective vectors.
fn distance_matrix<G>(pool: &[Solution<G>]) -> ndarray::Array2<f64> {
    let matrix = fitness_matrix(pool);
    pairwise_distances(&matrix, &matrix)
}

/// Stamps strength, raw fitness, density and the final score on every
/// member of the P∪A pool, with k = ⌊√(|P|+|A|)⌋. Returns the distance
/// matrix for reuse by truncation.
fn assign_strength_fields<G: Clone>(
    pool: &mut [Solution<G>],
    ctx: &StrategyContext,
) -> ndarray::Array2<f64> {
    let n = pool.len();
    let matrix = fitness_matrix(pool);
    let components = component_comparators(&ctx.senses);

    let mut dominates: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    for i in 0..n {
        for j in (i + 1)..n {
            match dominance_sign(&matrix.row(i), &matrix.row(j), &components) {
                1 => {
                    dominates[i].push(j);
                    dominated_by[j].push(i);
                }
                -1 => {
                    dominates[j].push(i);
                    dominated_by[i].push(j);
                }
                _ => {}
            }
        }
    }

    let distances = distance_matrix(pool);
    let k = n.isqrt();
    for i in 0..n {
        let strength = dominates[i].len();
        let raw: f64 = dominated_by[i]
            .iter()
            .map(|&dominator| dominates[dominator].len() as f64)
            .sum();

        let mut row: Vec<f64> = distances.row(i).to_vec();
        row.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        // row[0] is the self-distance, so the k-th neighbour sits at index k.
        let sigma_k = row[k.min(n - 1)];
        let density = 1.0 / (sigma_k + 2.0);

        let fields = pool[i].fitness.strength_mut();
        fields.strength = strength;
        fields.raw = raw;
        fields.density = density;
        fields.score = raw + density;
    }
    distances
}

/// Iteratively removes the member whose nearest-neighbour distance is
/// smallest, ties broken by the next-nearest distance, until `target`
/// members remain. Returns the kept indices in input order.
fn truncate_by_nearest_neighbour(
    mut kept: Vec<usize>,
    distances: &ndarray::Array2<f64>,
    target: usize,
) -> Vec<usize> {
    while kept.len() > target {
        let mut worst_position = 0;
        let mut worst_profile: Option<Vec<f64>> = None;
        for (position, &index) in kept.iter().enumerate() {
            let mut profile: Vec<f64> = kept
                .iter()
                .filter(|&&other| other != index)
                .map(|&other| distances[[index, other]])
                .collect();
            profile.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let is_worse = match &worst_profile {
                None => true,
                Some(current) => {
                    // Lexicographic comparison over sorted neighbour
                    // distances: smaller means more crowded.
                    profile
                        .iter()
                        .zip(current.iter())
                        .find_map(|(a, b)| match a.partial_cmp(b) {
                            Some(std::cmp::Ordering::Less) => Some(true),
                            Some(std::cmp::Ordering::Greater) => Some(false),
                            _ => None,
                        })
                        .unwrap_or(false)
                }
            };
            if is_worse {
                worst_position = position;
                worst_profile = Some(profile);
            }
        }
        kept.remove(worst_position);
    }
    kept
}

impl<G: Clone> Strategy<G> for Spea2Strategy {
    fn fitness_prototype(&self, num_objectives: usize) -> Fitness {
        Fitness::objectives(num_objectives)
            .with_extension(Extension::Strength(StrengthFields::default()))
    }

    fn solution_comparator(&self, senses: &[bool]) -> SolutionComparator {
        SolutionComparator::Constrained(FitnessComparator::pareto(senses))
    }

    fn initialize(
        &mut self,
        ctx: &StrategyContext,
        population: &mut Vec<Solution<G>>,
        _rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>> {
        let distances = assign_strength_fields(population, ctx);
        let non_dominated: Vec<usize> = (0..population.len())
            .filter(|&i| population[i].fitness.strength().score < 1.0)
            .collect();
        let kept = if non_dominated.len() > ctx.target_size {
            truncate_by_nearest_neighbour(non_dominated, &distances, ctx.target_size)
        } else {
            non_dominated
        };
        kept.into_iter().map(|i| population[i].clone()).collect()
    }

    fn mating_selection(
        &mut self,
        ctx: &StrategyContext,
        population: &[Solution<G>],
        archive: &[Solution<G>],
        rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>> {
        // Mate from the archive when it carries anything, as the original
        // algorithm does; the tournament key is the scored fitness.
        let pool = if archive.is_empty() { population } else { archive };
        (0..2 * ctx.target_size)
            .map(|_| {
                binary_tournament(pool, rng, |a, b| {
                    let sa = a.fitness.strength().score;
                    let sb = b.fitness.strength().score;
                    match sa.partial_cmp(&sb) {
                        Some(std::cmp::Ordering::Less) => 1,
                        Some(std::cmp::Ordering::Greater) => -1,
                        _ => 0,
                    }
                })
                .clone()
            })
            .collect()
    }

    fn environmental_selection(
        &mut self,
        ctx: &StrategyContext,
        population: &[Solution<G>],
        _offspring: &[Solution<G>],
        archive: &[Solution<G>],
        _rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>> {
        // The scored pool is P∪A; offspring reach the next generation's
        // pool through the archive update.
        let mut pool = merged(population, archive);
        let distances = assign_strength_fields(&mut pool, ctx);

        let non_dominated: Vec<usize> = (0..pool.len())
            .filter(|&i| pool[i].fitness.strength().score < 1.0)
            .collect();

        let survivors: Vec<usize> = match non_dominated.len().cmp(&ctx.target_size) {
            std::cmp::Ordering::Equal => non_dominated,
            std::cmp::Ordering::Less => {
                // Fill with the best dominated members by ascending score.
                let mut dominated: Vec<usize> = (0..pool.len())
                    .filter(|&i| pool[i].fitness.strength().score >= 1.0)
                    .collect();
                dominated.sort_by_key(|&i| OrderedFloat(pool[i].fitness.strength().score));
                let mut filled = non_dominated;
                filled.extend(
                    dominated
                        .into_iter()
                        .take(ctx.target_size - filled.len()),
                );
                filled
            }
            std::cmp::Ordering::Greater => {
                truncate_by_nearest_neighbour(non_dominated, &distances, ctx.target_size)
            }
        };

        survivors.into_iter().map(|i| pool[i].clone()).collect()
    }

    fn update_archive(
        &mut self,
        ctx: &StrategyContext,
        _population: &[Solution<G>],
        offspring: &[Solution<G>],
        archive: Vec<Solution<G>>,
        _rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>> {
        // Offspring enter here: the refreshed archive is the non-dominated
        // set of C∪A, truncated by the same nearest-neighbour rule.
        let mut pool: Vec<Solution<G>> = offspring.to_vec();
        pool.extend(archive);
        if pool.is_empty() {
            return Vec::new();
        }
        let mut extractor = NonDominatedExtractor::new(fitness_matrix(&pool), &ctx.senses);
        extractor.set_violations(violation_vector(&pool));
        extractor
            .execute()
            .expect("non-empty pool cannot fail extraction");
        let front: Vec<usize> = extractor.front().to_vec();
        if front.len() <= ctx.target_size {
            return front.into_iter().map(|i| pool[i].clone()).collect();
        }
        let distances = distance_matrix(&pool);
        truncate_by_nearest_neighbour(front, &distances, ctx.target_size)
            .into_iter()
            .map(|i| pool[i].clone())
            .collect()
    }
}
