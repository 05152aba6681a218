//! ε-MOEA: steady-state search with an ε-dominance hypercube archive.
//!
//! Follows K. Deb, M. Mohan & S. Mishra, "Evaluating the ε-domination
//! based multi-objective evolutionary algorithm for a quick computation of
//! Pareto-optimal solutions", Evolutionary Computation 13(4), 2005. Every
//! solution is boxed into the hypercube ⌊fᵢ/εᵢ⌋; the archive accepts a
//! candidate only if no member ε-dominates it, evicts the members the
//! candidate ε-dominates, and resolves same-cube collisions by in-cube
//! dominance, then by distance to the cube's best corner. No two archive
//! members ever share a cube.
//!
//! Mating is steady-state flavoured: one parent from the population by
//! Pareto tournament, one from the archive at random. The driver runs it
//! like any other strategy; a variation operator emitting a single
//! offspring per call reproduces the canonical one-offspring iteration.

use crate::comparator::{FitnessComparator, SolutionComparator};
use crate::commands::{GridSpec, HypercubePartitioner};
use crate::error::SearchError;
use crate::fitness::{Extension, Fitness, HypercubeFields};
use crate::random::RandomGenerator;
use crate::solution::{Solution, fitness_matrix};
use crate::strategy::{StrategyContext, Strategy, binary_tournament};

/// How the hypercube widths are obtained.
#[derive(Debug, Clone)]
pub enum EpsilonSpec {
    /// Explicit εᵢ per objective.
    Epsilons(Vec<f64>),
    /// K cubes per axis; widths derived from the declared objective bounds,
    /// falling back to the initial population's extrema.
    CellsPerAxis(usize),
}

pub struct EpsilonMoeaStrategy {
    spec: EpsilonSpec,
    partitioner: Option<HypercubePartitioner>,
    pareto: Option<FitnessComparator>,
    epsilon: Option<FitnessComparator>,
}

impl EpsilonMoeaStrategy {
    pub fn new(spec: EpsilonSpec) -> Result<Self, SearchError> {
        if let EpsilonSpec::Epsilons(epsilons) = &spec {
            if epsilons.is_empty() || epsilons.iter().any(|&e| e <= 0.0) {
                return Err(SearchError::Configuration(
                    "epsilon values must be positive".into(),
                ));
            }
        }
        if let EpsilonSpec::CellsPerAxis(cells) = &spec {
            if *cells == 0 {
                return Err(SearchError::Configuration(
                    "the number of hypercubes per axis must be positive".into(),
                ));
            }
        }
        Ok(Self {
            spec,
            partitioner: None,
            pareto: None,
            epsilon: None,
        })
    }

    fn build_partitioner<G>(
        &self,
        ctx: &StrategyContext,
        population: &[Solution<G>],
    ) -> HypercubePartitioner {
        let grid = match &self.spec {
            EpsilonSpec::Epsilons(epsilons) => GridSpec::Widths(epsilons.clone()),
            EpsilonSpec::CellsPerAxis(cells) => {
                let matrix = fitness_matrix(population);
                let mut lower = Vec::with_capacity(ctx.num_objectives);
                let mut upper = Vec::with_capacity(ctx.num_objectives);
                for objective in 0..ctx.num_objectives {
                    match ctx.bounds.get(objective).copied().flatten() {
                        Some((lo, up)) => {
                            lower.push(lo);
                            upper.push(up);
                        }
                        None => {
                            let column = matrix.column(objective);
                            let lo = column.iter().cloned().fold(f64::INFINITY, f64::min);
                            let up = column.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                            lower.push(lo);
                            upper.push(if up > lo { up } else { lo + 1.0 });
                        }
                    }
                }
                GridSpec::Divisions {
                    per_axis: *cells,
                    lower,
                    upper,
                }
            }
        };
        HypercubePartitioner::new(grid).expect("validated grid spec cannot fail")
    }

    fn stamp<G>(&self, solution: &mut Solution<G>) {
        let partitioner = self.partitioner.as_ref().expect("initialized partitioner");
        let coordinates = partitioner.cell_of(&solution.fitness.objective_values().view());
        solution.fitness.hypercube_mut().coordinates = coordinates;
    }

    /// Squared distance to the cube's best corner, normalised per axis.
    fn corner_distance<G>(&self, solution: &Solution<G>, senses: &[bool]) -> f64 {
        let partitioner = self.partitioner.as_ref().expect("initialized partitioner");
        let coordinates = &solution.fitness.hypercube().coordinates;
        let origin = partitioner.cell_origin(coordinates);
        solution
            .fitness
            .objective_values()
            .iter()
            .enumerate()
            .map(|(axis, &value)| {
                let width = partitioner.width(axis);
                // The best corner of the cube is the lower corner for a
                // minimised axis and the upper corner otherwise.
                let corner = if senses[axis] {
                    origin[axis] + width
                } else {
                    origin[axis]
                };
                let gap = (value - corner) / width;
                gap * gap
            })
            .sum()
    }

    /// The archive insertion rule; keeps the one-member-per-cube invariant.
    fn archive_insert<G: Clone>(
        &self,
        archive: &mut Vec<Solution<G>>,
        candidate: &Solution<G>,
        senses: &[bool],
    ) {
        let epsilon = self.epsilon.as_ref().expect("initialized comparator");
        let pareto = self.pareto.as_ref().expect("initialized comparator");

        if archive
            .iter()
            .any(|member| epsilon.compare(&member.fitness, &candidate.fitness) == 1)
        {
            return;
        }
        archive.retain(|member| epsilon.compare(&candidate.fitness, &member.fitness) != 1);

        let same_cube = archive.iter().position(|member| {
            member.fitness.hypercube().coordinates == candidate.fitness.hypercube().coordinates
        });
        match same_cube {
            None => archive.push(candidate.clone()),
            Some(index) => {
                let incumbent = &archive[index];
                match pareto.compare(&candidate.fitness, &incumbent.fitness) {
                    1 => archive[index] = candidate.clone(),
                    -1 => {}
                    _ => {
                        let candidate_gap = self.corner_distance(candidate, senses);
                        let incumbent_gap = self.corner_distance(incumbent, senses);
                        if candidate_gap < incumbent_gap {
                            archive[index] = candidate.clone();
                        }
                    }
                }
            }
        }
    }
}

impl<G: Clone> Strategy<G> for EpsilonMoeaStrategy {
    fn fitness_prototype(&self, num_objectives: usize) -> Fitness {
        Fitness::objectives(num_objectives)
            .with_extension(Extension::Hypercube(HypercubeFields::default()))
    }

    fn solution_comparator(&self, senses: &[bool]) -> SolutionComparator {
        SolutionComparator::Plain(FitnessComparator::epsilon(senses))
    }

    fn initialize(
        &mut self,
        ctx: &StrategyContext,
        population: &mut Vec<Solution<G>>,
        _rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>> {
        self.partitioner = Some(self.build_partitioner(ctx, population));
        self.pareto = Some(FitnessComparator::pareto(&ctx.senses));
        self.epsilon = Some(FitnessComparator::epsilon(&ctx.senses));

        for solution in population.iter_mut() {
            self.stamp(solution);
        }
        let mut archive = Vec::new();
        for solution in population.iter() {
            self.archive_insert(&mut archive, solution, &ctx.senses);
        }
        archive
    }

    fn mating_selection(
        &mut self,
        _ctx: &StrategyContext,
        population: &[Solution<G>],
        archive: &[Solution<G>],
        rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>> {
        let pareto = self.pareto.as_ref().expect("initialized comparator").clone();
        let population_parent = binary_tournament(population, rng, |a, b| {
            pareto.compare(&a.fitness, &b.fitness)
        })
        .clone();
        let archive_parent = if archive.is_empty() {
            population[rng.gen_range_usize(0, population.len())].clone()
        } else {
            archive[rng.gen_range_usize(0, archive.len())].clone()
        };
        vec![population_parent, archive_parent]
    }

    fn environmental_selection(
        &mut self,
        _ctx: &StrategyContext,
        population: &[Solution<G>],
        offspring: &[Solution<G>],
        _archive: &[Solution<G>],
        rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>> {
        let pareto = self.pareto.as_ref().expect("initialized comparator").clone();
        let mut survivors: Vec<Solution<G>> = population.to_vec();
        for child in offspring {
            let mut child = child.clone();
            self.stamp(&mut child);

            let dominated: Vec<usize> = (0..survivors.len())
                .filter(|&i| pareto.compare(&child.fitness, &survivors[i].fitness) == 1)
                .collect();
            if let Some(&slot) = rng.choose(&dominated) {
                survivors[slot] = child;
                continue;
            }
            let beaten = survivors
                .iter()
                .any(|member| pareto.compare(&member.fitness, &child.fitness) == 1);
            if beaten {
                continue;
            }
            // Mutually non-dominated with every inhabitant: a random slot
            // makes room.
            let slot = rng.gen_range_usize(0, survivors.len());
            survivors[slot] = child;
        }
        survivors
    }

    fn update_archive(
        &mut self,
        ctx: &StrategyContext,
        _population: &[Solution<G>],
        offspring: &[Solution<G>],
        archive: Vec<Solution<G>>,
        _rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>> {
        let mut archive = archive;
        for child in offspring {
            let mut child = child.clone();
            self.stamp(&mut child);
            self.archive_insert(&mut archive, &child, &ctx.senses);
        }
        archive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SearchRandomGenerator;
    use ndarray::Array1;
    use std::collections::HashSet;

    fn solution(values: &[f64]) -> Solution<u32> {
        let mut fitness = Fitness::objectives(values.len())
            .with_extension(Extension::Hypercube(HypercubeFields::default()));
        fitness.set_objective_values(Array1::from(values.to_vec()));
        Solution::new(0, fitness)
    }

    fn context() -> StrategyContext {
        StrategyContext::new(2, vec![false, false], vec![None, None], 4, 50, usize::MAX)
    }

    fn ready_strategy(
        ctx: &StrategyContext,
        population: &mut Vec<Solution<u32>>,
    ) -> (EpsilonMoeaStrategy, Vec<Solution<u32>>) {
        let mut strategy =
            EpsilonMoeaStrategy::new(EpsilonSpec::Epsilons(vec![1.0, 1.0])).unwrap();
        let mut rng = SearchRandomGenerator::new_from_seed(Some(8));
        let archive = strategy.initialize(ctx, population, &mut rng);
        (strategy, archive)
    }

    #[test]
    fn no_two_archive_members_share_a_hypercube() {
        let ctx = context();
        let mut population = vec![
            solution(&[0.1, 3.9]),
            solution(&[0.9, 3.1]), // same cube as the first
            solution(&[1.5, 2.5]),
            solution(&[3.5, 0.5]),
        ];
        let (_, archive) = ready_strategy(&ctx, &mut population);
        let cubes: HashSet<Vec<i64>> = archive
            .iter()
            .map(|s| s.fitness.hypercube().coordinates.clone())
            .collect();
        assert_eq!(cubes.len(), archive.len());
    }

    #[test]
    fn epsilon_dominated_candidates_are_rejected() {
        let ctx = context();
        let mut population = vec![solution(&[0.1, 0.1])];
        let (mut strategy, archive) = ready_strategy(&ctx, &mut population);
        let mut rng = SearchRandomGenerator::new_from_seed(Some(8));
        // (2.5, 2.5) sits in cube (2,2), ε-dominated by cube (0,0).
        let archive = strategy.update_archive(
            &ctx,
            &population,
            &[solution(&[2.5, 2.5])],
            archive,
            &mut rng,
        );
        assert_eq!(archive.len(), 1);
        assert_eq!(archive[0].fitness.hypercube().coordinates, vec![0, 0]);
    }

    #[test]
    fn dominating_candidate_evicts_the_dominated_members() {
        let ctx = context();
        let mut population = vec![solution(&[3.5, 3.5]), solution(&[3.5, 0.5])];
        let (mut strategy, archive) = ready_strategy(&ctx, &mut population);
        assert_eq!(archive.len(), 1, "the ε-dominated member is evicted at insertion");
        let mut rng = SearchRandomGenerator::new_from_seed(Some(8));
        let archive = strategy.update_archive(
            &ctx,
            &population,
            &[solution(&[0.5, 0.5])],
            archive,
            &mut rng,
        );
        assert_eq!(archive.len(), 1);
        assert_eq!(archive[0].fitness.hypercube().coordinates, vec![0, 0]);
    }

    #[test]
    fn same_cube_contest_prefers_the_dominating_member() {
        let ctx = context();
        let mut population = vec![solution(&[0.8, 0.8])];
        let (mut strategy, archive) = ready_strategy(&ctx, &mut population);
        let mut rng = SearchRandomGenerator::new_from_seed(Some(8));
        // Same cube, dominating on both axes.
        let archive = strategy.update_archive(
            &ctx,
            &population,
            &[solution(&[0.2, 0.2])],
            archive,
            &mut rng,
        );
        assert_eq!(archive.len(), 1);
        assert_eq!(
            archive[0].fitness.objective_values().to_vec(),
            vec![0.2, 0.2]
        );
    }

    #[test]
    fn same_cube_tie_breaks_towards_the_best_corner() {
        let ctx = context();
        let mut population = vec![solution(&[0.4, 0.6])];
        let (mut strategy, archive) = ready_strategy(&ctx, &mut population);
        let mut rng = SearchRandomGenerator::new_from_seed(Some(8));
        // (0.6, 0.4) trades off inside the same cube and its distance to
        // the (0,0) corner equals the incumbent's, so the incumbent stays.
        // (0.55, 0.3) also trades off but sits strictly closer to the
        // corner and takes the cube.
        let archive = strategy.update_archive(
            &ctx,
            &population,
            &[solution(&[0.6, 0.4]), solution(&[0.55, 0.3])],
            archive,
            &mut rng,
        );
        assert_eq!(archive.len(), 1);
        assert_eq!(
            archive[0].fitness.objective_values().to_vec(),
            vec![0.55, 0.3]
        );
    }

    #[test]
    fn population_slot_update_replaces_a_dominated_member() {
        let ctx = context();
        let mut population = vec![
            solution(&[3.0, 3.0]),
            solution(&[0.5, 2.0]),
            solution(&[2.0, 0.5]),
            solution(&[2.5, 2.5]),
        ];
        let (mut strategy, _) = ready_strategy(&ctx, &mut population);
        let mut rng = SearchRandomGenerator::new_from_seed(Some(8));
        let survivors = strategy.environmental_selection(
            &ctx,
            &population,
            &[solution(&[1.0, 1.0])],
            &[],
            &mut rng,
        );
        assert_eq!(survivors.len(), 4);
        assert!(
            survivors
                .iter()
                .any(|s| s.fitness.objective_values().to_vec() == vec![1.0, 1.0])
        );
        // One of the dominated members was displaced, the non-dominated two
        // both survive.
        assert!(
            survivors
                .iter()
                .any(|s| s.fitness.objective_values().to_vec() == vec![0.5, 2.0])
        );
        assert!(
            survivors
                .iter()
                .any(|s| s.fitness.objective_values().to_vec() == vec![2.0, 0.5])
        );
    }

    #[test]
    fn invalid_epsilons_are_rejected() {
        assert!(EpsilonMoeaStrategy::new(EpsilonSpec::Epsilons(vec![0.0])).is_err());
        assert!(EpsilonMoeaStrategy::new(EpsilonSpec::CellsPerAxis(0)).is_err());
    }
}
