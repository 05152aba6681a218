//! NSGA-III: non-dominated sorting with reference-point niching.
//!
//! Follows K. Deb & H. Jain, "An Evolutionary Many-Objective Optimization
//! Algorithm Using Reference-Point-Based Nondominated Sorting Approach",
//! IEEE TEC 18(4), 2014. Complete fronts are taken as in NSGA-II; the
//! overflowing front is resolved by normalising objectives against the
//! ideal point and the intercepts of the extreme-point hyperplane,
//! associating every candidate with its closest Das–Dennis reference
//! direction, and repeatedly feeding the least-crowded direction.

use ndarray::{Array1, Array2};

use crate::commands::{DasDennisVectorGenerator, PopulationSplitter};
use crate::fitness::{Extension, Fitness, ReferenceFields};
use crate::linalg::{perpendicular_distances, solve_linear_system};
use crate::random::RandomGenerator;
use crate::solution::{Solution, merged};
use crate::strategy::{StrategyContext, Strategy, oriented_matrix};

#[derive(Debug, Clone)]
pub struct Nsga3Strategy {
    outer_divisions: usize,
    inner_divisions: Option<usize>,
    reference_directions: Array2<f64>,
    ideal: Option<Array1<f64>>,
}

impl Nsga3Strategy {
    pub fn new(outer_divisions: usize) -> Self {
        Self {
            outer_divisions,
            inner_divisions: None,
            reference_directions: Array2::zeros((0, 0)),
            ideal: None,
        }
    }

    /// Two-layer Das–Dennis directions for many-objective runs.
    pub fn with_inner_divisions(mut self, inner_divisions: usize) -> Self {
        self.inner_divisions = Some(inner_divisions);
        self
    }

    pub fn reference_directions(&self) -> &Array2<f64> {
        &self.reference_directions
    }

    fn ensure_directions(&mut self, num_objectives: usize) {
        if self.reference_directions.nrows() > 0 {
            return;
        }
        let mut generator = DasDennisVectorGenerator::new(num_objectives, self.outer_divisions);
        if let Some(inner) = self.inner_divisions {
            generator = generator.with_inner_divisions(inner);
        }
        generator
            .execute()
            .expect("validated divisions cannot fail generation");
        self.reference_directions = generator.vectors().clone();
    }

    fn update_ideal(&mut self, oriented: &Array2<f64>) {
        let m = oriented.ncols();
        let mut ideal = self
            .ideal
            .clone()
            .unwrap_or_else(|| Array1::from_elem(m, f64::INFINITY));
        for row in oriented.rows() {
            for (objective, &value) in row.iter().enumerate() {
                ideal[objective] = ideal[objective].min(value);
            }
        }
        self.ideal = Some(ideal);
    }

    /// Intercepts of the hyperplane through the per-axis extreme points of
    /// the translated matrix; falls back to the per-axis maxima when the
    /// system is singular or produces non-positive intercepts.
    fn intercepts(translated: &Array2<f64>) -> Array1<f64> {
        let m = translated.ncols();
        let mut extremes = Array2::zeros((m, m));
        for axis in 0..m {
            // Achievement scalarising function with a weight vector that is
            // (almost) the axis unit vector.
            let mut best_row = 0;
            let mut best_value = f64::INFINITY;
            for (row, values) in translated.rows().into_iter().enumerate() {
                let asf = values
                    .iter()
                    .enumerate()
                    .map(|(objective, &value)| {
                        let weight = if objective == axis { 1.0 } else { 1e-6 };
                        value / weight
                    })
                    .fold(f64::NEG_INFINITY, f64::max);
                if asf < best_value {
                    best_value = asf;
                    best_row = row;
                }
            }
            for objective in 0..m {
                extremes[[axis, objective]] = translated[[best_row, objective]];
            }
        }

        let fallback = || {
            Array1::from_iter((0..m).map(|objective| {
                translated
                    .column(objective)
                    .iter()
                    .cloned()
                    .fold(f64::NEG_INFINITY, f64::max)
                    .max(1e-12)
            }))
        };

        match solve_linear_system(&extremes, &Array1::ones(m)) {
            Some(plane) => {
                let intercepts: Array1<f64> = plane.mapv(|v| 1.0 / v);
                if intercepts.iter().all(|&a| a.is_finite() && a > 1e-12) {
                    intercepts
                } else {
                    fallback()
                }
            }
            None => fallback(),
        }
    }

    /// Normalises, associates and stamps the reference fields of `pool`.
    fn associate<G: Clone>(&self, pool: &mut [Solution<G>], oriented: &Array2<f64>) {
        let ideal = self.ideal.as_ref().expect("ideal point set before association");
        let mut translated = oriented.clone();
        for mut row in translated.rows_mut() {
            for (objective, value) in row.iter_mut().enumerate() {
                *value -= ideal[objective];
            }
        }
        let intercepts = Self::intercepts(&translated);
        for mut row in translated.rows_mut() {
            for (objective, value) in row.iter_mut().enumerate() {
                *value /= intercepts[objective];
            }
        }

        let distances = perpendicular_distances(&translated, &self.reference_directions);
        for (index, solution) in pool.iter_mut().enumerate() {
            let row = distances.row(index);
            let mut closest = 0;
            for (direction, &distance) in row.iter().enumerate() {
                if distance < row[closest] {
                    closest = direction;
                }
            }
            let fields = solution.fitness.reference_mut();
            fields.normalized = translated.row(index).to_owned();
            fields.reference_index = closest;
            fields.perpendicular = row[closest];
        }
    }

    /// Niching: feed the least-crowded reference direction with its closest
    /// pending candidate until `needed` are picked.
    fn niche<G: Clone>(
        &self,
        selected: &[Solution<G>],
        pending: &mut Vec<Solution<G>>,
        needed: usize,
        rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>> {
        let directions = self.reference_directions.nrows();
        let mut niche_counts = vec![0usize; directions];
        for solution in selected {
            niche_counts[solution.fitness.reference().reference_index] += 1;
        }

        let mut picked: Vec<Solution<G>> = Vec::with_capacity(needed);
        let mut active: Vec<bool> = vec![true; directions];
        while picked.len() < needed {
            // Least-crowded active direction, ties resolved at random.
            let mut best: Vec<usize> = Vec::new();
            let mut best_count = usize::MAX;
            for direction in 0..directions {
                if !active[direction] {
                    continue;
                }
                match niche_counts[direction].cmp(&best_count) {
                    std::cmp::Ordering::Less => {
                        best_count = niche_counts[direction];
                        best = vec![direction];
                    }
                    std::cmp::Ordering::Equal => best.push(direction),
                    std::cmp::Ordering::Greater => {}
                }
            }
            let direction = *rng.choose(&best).expect("at least one active direction");

            let mut candidate: Option<usize> = None;
            for (index, solution) in pending.iter().enumerate() {
                let fields = solution.fitness.reference();
                if fields.reference_index != direction {
                    continue;
                }
                match candidate {
                    None => candidate = Some(index),
                    Some(current) => {
                        let current_distance = pending[current].fitness.reference().perpendicular;
                        if fields.perpendicular < current_distance {
                            candidate = Some(index);
                        }
                    }
                }
            }

            match candidate {
                Some(index) => {
                    picked.push(pending.remove(index));
                    niche_counts[direction] += 1;
                }
                None => active[direction] = false,
            }
        }
        picked
    }
}

impl<G: Clone> Strategy<G> for Nsga3Strategy {
    fn fitness_prototype(&self, num_objectives: usize) -> Fitness {
        Fitness::objectives(num_objectives)
            .with_extension(Extension::Reference(ReferenceFields::default()))
    }

    fn initialize(
        &mut self,
        ctx: &StrategyContext,
        population: &mut Vec<Solution<G>>,
        _rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>> {
        self.ensure_directions(ctx.num_objectives);
        let oriented = oriented_matrix(population, &ctx.senses);
        self.update_ideal(&oriented);

        // The oriented matrix is already minimised on every axis.
        let minimised = vec![false; ctx.num_objectives];
        let mut splitter = PopulationSplitter::new(oriented, &minimised);
        splitter
            .execute()
            .expect("non-empty population cannot fail front splitting");
        for (rank, front) in splitter.fronts().iter().enumerate() {
            for &index in front {
                population[index].fitness.reference_mut().rank = rank;
            }
        }
        splitter.fronts()[0]
            .iter()
            .map(|&index| population[index].clone())
            .collect()
    }

    fn mating_selection(
        &mut self,
        ctx: &StrategyContext,
        population: &[Solution<G>],
        _archive: &[Solution<G>],
        rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>> {
        // Random parent selection, as the original algorithm prescribes.
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
        rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>> {
        let mut pool = merged(population, offspring);
        let oriented = oriented_matrix(&pool, &ctx.senses);
        self.update_ideal(&oriented);
        self.associate(&mut pool, &oriented);

        let minimised: Vec<bool> = vec![false; ctx.num_objectives];
        let mut splitter = PopulationSplitter::new(oriented, &minimised);
        splitter
            .execute()
            .expect("non-empty pool cannot fail front splitting");
        for (rank, front) in splitter.fronts().iter().enumerate() {
            for &index in front {
                pool[index].fitness.reference_mut().rank = rank;
            }
        }

        let mut survivors: Vec<Solution<G>> = Vec::with_capacity(ctx.target_size);
        for front in splitter.fronts() {
            let remaining = ctx.target_size - survivors.len();
            if remaining == 0 {
                break;
            }
            if front.len() <= remaining {
                survivors.extend(front.iter().map(|&index| pool[index].clone()));
                continue;
            }
            let mut pending: Vec<Solution<G>> =
                front.iter().map(|&index| pool[index].clone()).collect();
            let picked = self.niche(&survivors, &mut pending, remaining, rng);
            survivors.extend(picked);
            break;
        }
        survivors
    }

    fn update(
        &mut self,
        ctx: &StrategyContext,
        population: &[Solution<G>],
        _archive: &[Solution<G>],
    ) {
        if !population.is_empty() {
            let oriented = oriented_matrix(population, &ctx.senses);
            self.update_ideal(&oriented);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SearchRandomGenerator;
    use ndarray::array;

    fn solution(values: &[f64]) -> Solution<u32> {
        let mut fitness = Fitness::objectives(values.len())
            .with_extension(Extension::Reference(ReferenceFields::default()));
        fitness.set_objective_values(Array1::from(values.to_vec()));
        Solution::new(0, fitness)
    }

    fn context(target: usize) -> StrategyContext {
        StrategyContext::new(2, vec![false, false], vec![None, None], target, 50, usize::MAX)
    }

    #[test]
    fn intercepts_of_a_clean_simplex() {
        // Extreme points (2,0) and (0,4) give intercepts (2, 4).
        let translated = array![[2.0, 0.0], [0.0, 4.0], [1.0, 1.0]];
        let intercepts = Nsga3Strategy::intercepts(&translated);
        assert!((intercepts[0] - 2.0).abs() < 1e-9);
        assert!((intercepts[1] - 4.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_extremes_fall_back_to_maxima() {
        // All candidates identical: the plane solve cannot succeed.
        let translated = array![[1.0, 1.0], [1.0, 1.0]];
        let intercepts = Nsga3Strategy::intercepts(&translated);
        assert!(intercepts.iter().all(|&a| a > 0.0));
    }

    #[test]
    fn association_picks_the_closest_direction() {
        let mut strategy = Nsga3Strategy::new(2);
        let ctx = context(3);
        let mut rng = SearchRandomGenerator::new_from_seed(Some(9));
        let mut population = vec![
            solution(&[1.0, 0.0]),
            solution(&[0.0, 1.0]),
            solution(&[0.5, 0.5]),
        ];
        strategy.initialize(&ctx, &mut population, &mut rng);
        let survivors =
            strategy.environmental_selection(&ctx, &population, &[], &[], &mut rng);
        assert_eq!(survivors.len(), 3);
        // (1,0) lies on the axis direction (1,0); its perpendicular distance
        // must be (near) zero.
        let axis_point = survivors
            .iter()
            .find(|s| s.fitness.objective_values() == &array![1.0, 0.0])
            .expect("axis point survives");
        assert!(axis_point.fitness.reference().perpendicular < 1e-9);
    }

    #[test]
    fn environmental_selection_returns_target_size() {
        let mut strategy = Nsga3Strategy::new(4);
        let ctx = context(4);
        let mut rng = SearchRandomGenerator::new_from_seed(Some(4));
        let mut population: Vec<Solution<u32>> = (0..8)
            .map(|i| {
                let t = i as f64 / 7.0;
                solution(&[t, 1.0 - t])
            })
            .collect();
        strategy.initialize(&ctx, &mut population, &mut rng);
        let offspring = vec![solution(&[0.45, 0.52]), solution(&[2.0, 2.0])];
        let survivors =
            strategy.environmental_selection(&ctx, &population, &offspring, &[], &mut rng);
        assert_eq!(survivors.len(), 4);
        // The dominated point never survives while the first front overflows.
        assert!(
            survivors
                .iter()
                .all(|s| s.fitness.objective_values() != &array![2.0, 2.0])
        );
    }
}
