//! MOEA/D: decomposition into scalar subproblems with weight-vector
//! neighbourhoods.
//!
//! Follows Q. Zhang & H. Li, "MOEA/D: A Multiobjective Evolutionary
//! Algorithm Based on Decomposition", IEEE TEC 11(6), 2007. Each uniform
//! weight vector owns one population slot; parents come from the slot's
//! neighbourhood; an offspring may replace at most `nr` neighbouring slots
//! whose scalarised value it improves. The ideal point is the
//! coordinate-wise best of every objective vector seen so far.

use ndarray::{Array1, Array2, ArrayView1};

use crate::commands::{UniformVectorGenerator, divisions_for_count};
use crate::fitness::Fitness;
use crate::linalg::pairwise_distances;
use crate::random::RandomGenerator;
use crate::solution::Solution;
use crate::strategy::{StrategyContext, Strategy, cap_by_crowding, non_dominated_subset, oriented_matrix};

/// Scalar decomposition g(f | w, z*) of an objective vector.
#[derive(Debug, Clone)]
pub enum Scalarization {
    WeightedSum,
    Tchebycheff,
    /// Penalty-based boundary intersection with penalty factor θ.
    BoundaryIntersection { theta: f64 },
}

impl Scalarization {
    /// Evaluates the decomposition on an already-minimised objective
    /// vector.
    pub fn value(
        &self,
        oriented: &ArrayView1<f64>,
        weight: &ArrayView1<f64>,
        ideal: &Array1<f64>,
    ) -> f64 {
        match self {
            Scalarization::WeightedSum => oriented
                .iter()
                .zip(weight.iter())
                .map(|(&f, &w)| w * f)
                .sum(),
            Scalarization::Tchebycheff => oriented
                .iter()
                .zip(weight.iter())
                .enumerate()
                .map(|(i, (&f, &w))| w.max(1e-6) * (f - ideal[i]).abs())
                .fold(f64::NEG_INFINITY, f64::max),
            Scalarization::BoundaryIntersection { theta } => {
                let norm: f64 = weight.iter().map(|w| w * w).sum::<f64>().sqrt().max(1e-12);
                let translated: Vec<f64> = oriented
                    .iter()
                    .enumerate()
                    .map(|(i, &f)| f - ideal[i])
                    .collect();
                let d1 = translated
                    .iter()
                    .zip(weight.iter())
                    .map(|(&t, &w)| t * w)
                    .sum::<f64>()
                    .abs()
                    / norm;
                let d2 = translated
                    .iter()
                    .zip(weight.iter())
                    .map(|(&t, &w)| {
                        let r = t - d1 * w / norm;
                        r * r
                    })
                    .sum::<f64>()
                    .sqrt();
                d1 + theta * d2
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct MoeadStrategy {
    neighborhood_size: usize,
    /// Maximum slot replacements per offspring; a required parameter, no
    /// default exists.
    replacement_cap: usize,
    scalarization: Scalarization,
    weights: Array2<f64>,
    neighborhoods: Vec<Vec<usize>>,
    ideal: Array1<f64>,
}

impl MoeadStrategy {
    pub fn new(
        neighborhood_size: usize,
        replacement_cap: usize,
        scalarization: Scalarization,
    ) -> Self {
        Self {
            neighborhood_size,
            replacement_cap,
            scalarization,
            weights: Array2::zeros((0, 0)),
            neighborhoods: Vec::new(),
            ideal: Array1::zeros(0),
        }
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    fn oriented_of(fitness: &Fitness, senses: &[bool]) -> Array1<f64> {
        Array1::from_iter(
            fitness
                .objective_values()
                .iter()
                .zip(senses.iter())
                .map(|(&v, &maximize)| if maximize { -v } else { v }),
        )
    }

    fn absorb_into_ideal(&mut self, oriented: &ArrayView1<f64>) {
        for (objective, &value) in oriented.iter().enumerate() {
            self.ideal[objective] = self.ideal[objective].min(value);
        }
    }

    fn setup_weights(&mut self, num_objectives: usize, slots: usize) {
        let divisions = divisions_for_count(num_objectives, slots);
        let mut generator = UniformVectorGenerator::new(num_objectives, divisions);
        generator
            .execute()
            .expect("validated divisions cannot fail generation");
        let lattice = generator.vectors();
        // The lattice holds at least `slots` vectors; one slot per row.
        let mut weights = Array2::zeros((slots, num_objectives));
        for slot in 0..slots {
            for objective in 0..num_objectives {
                weights[[slot, objective]] = lattice[[slot, objective]];
            }
        }

        let distances = pairwise_distances(&weights, &weights);
        let t = self.neighborhood_size.min(slots);
        self.neighborhoods = (0..slots)
            .map(|slot| {
                let mut order: Vec<usize> = (0..slots).collect();
                order.sort_by(|&a, &b| {
                    distances[[slot, a]]
                        .partial_cmp(&distances[[slot, b]])
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                order.truncate(t);
                order
            })
            .collect();
        self.weights = weights;
    }
}

impl<G: Clone> Strategy<G> for MoeadStrategy {
    fn initialize(
        &mut self,
        ctx: &StrategyContext,
        population: &mut Vec<Solution<G>>,
        _rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>> {
        assert_eq!(
            population.len(),
            ctx.target_size,
            "decomposition assigns one population slot per weight vector"
        );
        self.setup_weights(ctx.num_objectives, ctx.target_size);
        let oriented = oriented_matrix(population, &ctx.senses);
        self.ideal = Array1::from_elem(ctx.num_objectives, f64::INFINITY);
        for row in oriented.rows() {
            self.absorb_into_ideal(&row);
        }
        non_dominated_subset(ctx, population, &[])
    }

    /// Two parents per slot, drawn from the slot's neighbourhood; the
    /// parent order therefore fixes "offspring j belongs to slot j".
    fn mating_selection(
        &mut self,
        ctx: &StrategyContext,
        population: &[Solution<G>],
        _archive: &[Solution<G>],
        rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>> {
        let mut parents = Vec::with_capacity(2 * ctx.target_size);
        for slot in 0..population.len() {
            let neighborhood = &self.neighborhoods[slot];
            let first = *rng.choose(neighborhood).expect("non-empty neighbourhood");
            let second = *rng.choose(neighborhood).expect("non-empty neighbourhood");
            parents.push(population[first].clone());
            parents.push(population[second].clone());
        }
        parents
    }

    fn environmental_selection(
        &mut self,
        ctx: &StrategyContext,
        population: &[Solution<G>],
        offspring: &[Solution<G>],
        _archive: &[Solution<G>],
        rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>> {
        let mut survivors: Vec<Solution<G>> = population.to_vec();
        let slots = survivors.len();

        for (slot, child) in offspring.iter().enumerate().take(slots) {
            let child_oriented = Self::oriented_of(&child.fitness, &ctx.senses);
            self.absorb_into_ideal(&child_oriented.view());

            let mut neighborhood = self.neighborhoods[slot].clone();
            rng.shuffle(&mut neighborhood);

            let mut replacements = 0;
            for neighbor in neighborhood {
                if replacements >= self.replacement_cap {
                    break;
                }
                let weight = self.weights.row(neighbor);
                let incumbent_oriented =
                    Self::oriented_of(&survivors[neighbor].fitness, &ctx.senses);
                let child_value =
                    self.scalarization
                        .value(&child_oriented.view(), &weight, &self.ideal);
                let incumbent_value =
                    self.scalarization
                        .value(&incumbent_oriented.view(), &weight, &self.ideal);
                if child_value <= incumbent_value {
                    survivors[neighbor] = child.clone();
                    replacements += 1;
                }
            }
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
        let front = non_dominated_subset(ctx, population, offspring);
        cap_by_crowding(front, ctx.target_size, ctx)
    }
}
