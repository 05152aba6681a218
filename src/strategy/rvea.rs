//! RVEA: reference-vector guided selection with angle-penalised distance.
//!
//! Follows R. Cheng, Y. Jin, M. Olhofer & B. Sendhoff, "A Reference Vector
//! Guided Evolutionary Algorithm for Many-Objective Optimization", IEEE
//! TEC 20(5), 2016. Candidates are translated by the ideal point and
//! partitioned by the reference vector of minimum acute angle; each
//! partition contributes its candidate of minimum APD. The vector set is
//! re-scaled onto the current objective ranges every ⌊fr·G⌋ generations.

use ndarray::{Array1, Array2};
use ordered_float::OrderedFloat;

use crate::commands::DasDennisVectorGenerator;
use crate::error::SearchError;
use crate::linalg::cross_acute_angles;
use crate::random::RandomGenerator;
use crate::solution::Solution;
use crate::strategy::{StrategyContext, Strategy, cap_by_crowding, non_dominated_subset, oriented_matrix};

#[derive(Debug, Clone)]
pub struct RveaStrategy {
    outer_divisions: usize,
    inner_divisions: Option<usize>,
    /// APD penalty exponent α.
    alpha: f64,
    /// Vector adaptation frequency fr ∈ (0, 1].
    frequency: f64,
    initial_vectors: Array2<f64>,
    vectors: Array2<f64>,
    gammas: Vec<f64>,
}

impl RveaStrategy {
    pub fn new(
        outer_divisions: usize,
        alpha: f64,
        frequency: f64,
    ) -> Result<Self, SearchError> {
        if !(0.0..=1.0).contains(&frequency) || frequency == 0.0 {
            return Err(SearchError::Configuration(format!(
                "adaptation frequency must be in (0, 1], got {frequency}"
            )));
        }
        if alpha <= 0.0 {
            return Err(SearchError::Configuration(format!(
                "penalty exponent must be positive, got {alpha}"
            )));
        }
        Ok(Self {
            outer_divisions,
            inner_divisions: None,
            alpha,
            frequency,
            initial_vectors: Array2::zeros((0, 0)),
            vectors: Array2::zeros((0, 0)),
            gammas: Vec::new(),
        })
    }

    pub fn with_inner_divisions(mut self, inner_divisions: usize) -> Self {
        self.inner_divisions = Some(inner_divisions);
        self
    }

    pub fn vectors(&self) -> &Array2<f64> {
        &self.vectors
    }

    fn unit_rows(mut vectors: Array2<f64>) -> Array2<f64> {
        for mut row in vectors.rows_mut() {
            let norm: f64 = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                row.mapv_inplace(|v| v / norm);
            }
        }
        vectors
    }

    /// Smallest angle from each vector to any other vector.
    fn vector_gammas(vectors: &Array2<f64>) -> Vec<f64> {
        let count = vectors.nrows();
        if count < 2 {
            return vec![std::f64::consts::FRAC_PI_2; count];
        }
        let angles = cross_acute_angles(vectors, vectors);
        (0..count)
            .map(|v| {
                (0..count)
                    .filter(|&u| u != v)
                    .map(|u| angles[[v, u]])
                    .fold(f64::INFINITY, f64::min)
                    .max(1e-12)
            })
            .collect()
    }

    fn ensure_vectors(&mut self, num_objectives: usize) {
        if self.vectors.nrows() > 0 {
            return;
        }
        let mut generator = DasDennisVectorGenerator::new(num_objectives, self.outer_divisions);
        if let Some(inner) = self.inner_divisions {
            generator = generator.with_inner_divisions(inner);
        }
        generator
            .execute()
            .expect("validated divisions cannot fail generation");
        let vectors = Self::unit_rows(generator.vectors().clone());
        self.gammas = Self::vector_gammas(&vectors);
        self.initial_vectors = vectors.clone();
        self.vectors = vectors;
    }

    fn ranges(oriented: &Array2<f64>) -> (Array1<f64>, Array1<f64>) {
        let m = oriented.ncols();
        let mut min = Array1::from_elem(m, f64::INFINITY);
        let mut max = Array1::from_elem(m, f64::NEG_INFINITY);
        for row in oriented.rows() {
            for (objective, &value) in row.iter().enumerate() {
                min[objective] = min[objective].min(value);
                max[objective] = max[objective].max(value);
            }
        }
        (min, max)
    }
}

impl<G: Clone> Strategy<G> for RveaStrategy {
    fn initialize(
        &mut self,
        ctx: &StrategyContext,
        population: &mut Vec<Solution<G>>,
        _rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>> {
        self.ensure_vectors(ctx.num_objectives);
        non_dominated_subset(ctx, population, &[])
    }

    fn mating_selection(
        &mut self,
        ctx: &StrategyContext,
        population: &[Solution<G>],
        _archive: &[Solution<G>],
        rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>> {
        (0..2 * ctx.target_size)
            .map(|_| population[rng.gen_range_usize(0, population.len())].clone())
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
        let pool = crate::solution::merged(population, offspring);
        let oriented = oriented_matrix(&pool, &ctx.senses);
        let (ideal, _) = Self::ranges(&oriented);

        let mut translated = oriented;
        for mut row in translated.rows_mut() {
            for (objective, value) in row.iter_mut().enumerate() {
                *value -= ideal[objective];
            }
        }

        let angles = cross_acute_angles(&translated, &self.vectors);
        let vector_count = self.vectors.nrows();
        let mut partitions: Vec<Vec<usize>> = vec![Vec::new(); vector_count];
        for candidate in 0..pool.len() {
            let row = angles.row(candidate);
            let mut best = 0;
            for vector in 1..vector_count {
                if row[vector] < row[best] {
                    best = vector;
                }
            }
            partitions[best].push(candidate);
        }

        // Angle-penalised distance, with the generation ratio sharpening the
        // penalty as the run progresses.
        let ratio = ctx.generation as f64 / ctx.max_generations.max(1) as f64;
        let apd = |candidate: usize, vector: usize| -> f64 {
            let norm: f64 = translated
                .row(candidate)
                .iter()
                .map(|v| v * v)
                .sum::<f64>()
                .sqrt();
            let penalty = self.alpha
                * ratio.powf(self.alpha)
                * (angles[[candidate, vector]] / self.gammas[vector]);
            (1.0 + penalty) * norm
        };

        let mut survivors: Vec<usize> = Vec::new();
        let mut leftover: Vec<(usize, f64)> = Vec::new();
        for (vector, partition) in partitions.iter().enumerate() {
            if partition.is_empty() {
                continue;
            }
            let mut scored: Vec<(usize, f64)> = partition
                .iter()
                .map(|&candidate| (candidate, apd(candidate, vector)))
                .collect();
            scored.sort_by_key(|&(_, score)| OrderedFloat(score));
            let (winner, _) = scored.remove(0);
            survivors.push(winner);
            leftover.extend(scored);
        }

        // Empty partitions can leave slots unused; fill with the best
        // remaining candidates by APD, then trim to the exact size.
        if survivors.len() > ctx.target_size {
            let mut scored: Vec<(usize, f64)> = survivors
                .iter()
                .map(|&candidate| {
                    let row = angles.row(candidate);
                    let vector = (0..vector_count)
                        .min_by_key(|&v| OrderedFloat(row[v]))
                        .unwrap_or(0);
                    (candidate, apd(candidate, vector))
                })
                .collect();
            scored.sort_by_key(|&(_, score)| OrderedFloat(score));
            survivors = scored
                .into_iter()
                .take(ctx.target_size)
                .map(|(candidate, _)| candidate)
                .collect();
        } else if survivors.len() < ctx.target_size {
            leftover.sort_by_key(|&(_, score)| OrderedFloat(score));
            for (candidate, _) in leftover {
                if survivors.len() == ctx.target_size {
                    break;
                }
                if !survivors.contains(&candidate) {
                    survivors.push(candidate);
                }
            }
        }

        survivors.into_iter().map(|i| pool[i].clone()).collect()
    }

    fn update_archive(
        &mut self,
        ctx: &StrategyContext,
        population: &[Solution<G>],
        offspring: &[Solution<G>],
        _archive: Vec<Solution<G>>,
        _rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>> {
        let front = non_dominated_subset(ctx, population, offspring);
        cap_by_crowding(front, ctx.target_size, ctx)
    }

    /// Re-scales the initial vector set onto the current objective ranges
    /// every ⌊fr·G⌋ generations.
    fn update(
        &mut self,
        ctx: &StrategyContext,
        population: &[Solution<G>],
        _archive: &[Solution<G>],
    ) {
        if population.is_empty() || self.initial_vectors.nrows() == 0 {
            return;
        }
        let interval = ((self.frequency * ctx.max_generations as f64).floor() as usize).max(1);
        if ctx.generation == 0 || ctx.generation % interval != 0 {
            return;
        }
        let oriented = oriented_matrix(population, &ctx.senses);
        let (min, max) = Self::ranges(&oriented);
        let mut adapted = self.initial_vectors.clone();
        for mut row in adapted.rows_mut() {
            for (objective, value) in row.iter_mut().enumerate() {
                let span = (max[objective] - min[objective]).max(1e-12);
                *value *= span;
            }
        }
        self.vectors = Self::unit_rows(adapted);
        self.gammas = Self::vector_gammas(&self.vectors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::Fitness;
    use crate::random::SearchRandomGenerator;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn solution(values: &[f64]) -> Solution<u32> {
        let mut fitness = Fitness::objectives(values.len());
        fitness.set_objective_values(Array1::from(values.to_vec()));
        Solution::new(0, fitness)
    }

    fn context(target: usize, generation: usize) -> StrategyContext {
        let mut ctx =
            StrategyContext::new(2, vec![false, false], vec![None, None], target, 10, usize::MAX);
        ctx.generation = generation;
        ctx
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(RveaStrategy::new(4, 2.0, 0.0).is_err());
        assert!(RveaStrategy::new(4, 2.0, 1.5).is_err());
        assert!(RveaStrategy::new(4, -1.0, 0.5).is_err());
        assert!(RveaStrategy::new(4, 2.0, 0.2).is_ok());
    }

    #[test]
    fn vectors_are_unit_normalised() {
        let mut strategy = RveaStrategy::new(4, 2.0, 0.5).unwrap();
        let ctx = context(5, 0);
        let mut rng = SearchRandomGenerator::new_from_seed(Some(6));
        let mut population = vec![solution(&[1.0, 0.0]), solution(&[0.0, 1.0])];
        strategy.initialize(&ctx, &mut population, &mut rng);
        for row in strategy.vectors().rows() {
            let norm: f64 = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            assert_abs_diff_eq!(norm, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn selection_returns_exactly_the_target_size() {
        let mut strategy = RveaStrategy::new(3, 2.0, 0.5).unwrap();
        let ctx = context(4, 1);
        let mut rng = SearchRandomGenerator::new_from_seed(Some(6));
        let mut population: Vec<Solution<u32>> = (0..6)
            .map(|i| {
                let t = i as f64 / 5.0;
                solution(&[t, 1.0 - t])
            })
            .collect();
        strategy.initialize(&ctx, &mut population, &mut rng);
        let offspring = vec![solution(&[0.2, 0.9]), solution(&[0.9, 0.2])];
        let survivors =
            strategy.environmental_selection(&ctx, &population, &offspring, &[], &mut rng);
        assert_eq!(survivors.len(), 4);
    }

    #[test]
    fn early_generations_prefer_convergence() {
        // At generation 0 the APD penalty vanishes, so the candidate closest
        // to the ideal point wins its partition regardless of angle.
        let mut strategy = RveaStrategy::new(1, 2.0, 1.0).unwrap();
        let ctx = context(1, 0);
        let mut rng = SearchRandomGenerator::new_from_seed(Some(6));
        let mut population = vec![solution(&[5.0, 5.0]), solution(&[1.0, 1.0])];
        strategy.initialize(&ctx, &mut population, &mut rng);
        let survivors = strategy.environmental_selection(&ctx, &population, &[], &[], &mut rng);
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].fitness.objective_values(), &array![1.0, 1.0]);
    }

    #[test]
    fn adaptation_runs_on_schedule_only() {
        let mut strategy = RveaStrategy::new(4, 2.0, 0.5).unwrap();
        let mut rng = SearchRandomGenerator::new_from_seed(Some(6));
        let mut population = vec![solution(&[1.0, 0.0]), solution(&[0.0, 10.0])];
        let ctx0 = context(5, 0);
        strategy.initialize(&ctx0, &mut population, &mut rng);
        let before = strategy.vectors().clone();

        // interval = floor(0.5 * 10) = 5: generation 3 must not adapt.
        let ctx3 = context(5, 3);
        Strategy::<u32>::update(&mut strategy, &ctx3, &population, &[]);
        assert_eq!(strategy.vectors(), &before);

        // Generation 5 adapts towards the skewed objective ranges.
        let ctx5 = context(5, 5);
        Strategy::<u32>::update(&mut strategy, &ctx5, &population, &[]);
        assert_ne!(strategy.vectors(), &before);
    }
}
