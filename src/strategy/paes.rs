//! PAES: (1+1) evolution with an adaptive-grid archive.
//!
//! Follows J. Knowles & D. Corne, "Approximating the Nondominated Front
//! Using the Pareto Archived Evolution Strategy", Evolutionary Computation
//! 8(2), 2000. A single incumbent is mutated each generation. A mutant
//! that dominates the incumbent is accepted; one that is dominated is
//! rejected; mutual non-dominance is settled by grid density — the mutant
//! wins only from a less crowded cell. The archive keeps non-dominated
//! solutions inside an adaptive grid over its own bounding box; once the
//! capacity is hit, insertions evict from the densest cell, lowest cell
//! code first and oldest member within it.

use ndarray::Array1;

use crate::comparator::FitnessComparator;
use crate::fitness::{Extension, Fitness, LocationFields};
use crate::random::RandomGenerator;
use crate::solution::Solution;
use crate::strategy::{StrategyContext, Strategy};

#[derive(Debug, Clone)]
pub struct PaesStrategy {
    capacity: usize,
    depth: usize,
    sequence: u64,
}

impl PaesStrategy {
    pub fn new(capacity: usize, depth: usize) -> Self {
        assert!(capacity > 0, "archive capacity must be positive");
        assert!(depth > 0, "grid depth must be positive");
        Self {
            capacity,
            depth,
            sequence: 0,
        }
    }

    fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    /// Bounding box of a set of objective vectors.
    fn bounding_box<G>(members: &[&Solution<G>]) -> (Array1<f64>, Array1<f64>) {
        let m = members[0].fitness.num_objectives();
        let mut min = Array1::from_elem(m, f64::INFINITY);
        let mut max = Array1::from_elem(m, f64::NEG_INFINITY);
        for member in members {
            for (objective, &value) in member.fitness.objective_values().iter().enumerate() {
                min[objective] = min[objective].min(value);
                max[objective] = max[objective].max(value);
            }
        }
        (min, max)
    }

    /// Adaptive-grid cell code: `depth` recursive bisections per objective
    /// over the bounding box.
    fn location_of(
        &self,
        values: &Array1<f64>,
        min: &Array1<f64>,
        max: &Array1<f64>,
    ) -> usize {
        let mut location = 0usize;
        for (objective, &value) in values.iter().enumerate() {
            let mut low = min[objective];
            let mut high = max[objective];
            for level in 0..self.depth {
                let mid = 0.5 * (low + high);
                let bit = if high > low && value > mid { 1 } else { 0 };
                if bit == 1 {
                    low = mid;
                } else {
                    high = mid;
                }
                location |= bit << (objective * self.depth + level);
            }
        }
        location
    }

    /// Restamps every member's location against the bounding box of
    /// `archive` plus `candidate`, and returns the cell occupancy counts of
    /// the archive.
    fn regrid<G>(
        &self,
        archive: &mut [Solution<G>],
        candidate: &Array1<f64>,
    ) -> (std::collections::HashMap<usize, usize>, Array1<f64>, Array1<f64>) {
        let (mut min, mut max) = {
            let members: Vec<&Solution<G>> = archive.iter().collect();
            Self::bounding_box(&members)
        };
        for (objective, &value) in candidate.iter().enumerate() {
            min[objective] = min[objective].min(value);
            max[objective] = max[objective].max(value);
        }

        let mut counts = std::collections::HashMap::new();
        for member in archive.iter_mut() {
            let location = self.location_of(member.fitness.objective_values(), &min, &max);
            member.fitness.location_mut().location = location;
            *counts.entry(location).or_insert(0) += 1;
        }
        (counts, min, max)
    }

    /// Archive insertion with the capacity rule. The mutant must already be
    /// known not to be dominated by any member.
    fn archive_insert<G: Clone>(
        &mut self,
        archive: &mut Vec<Solution<G>>,
        mutant: &Solution<G>,
        pareto: &FitnessComparator,
    ) {
        archive.retain(|member| pareto.compare(&mutant.fitness, &member.fitness) != 1);
        let mut mutant = mutant.clone();
        mutant.fitness.location_mut().sequence = self.next_sequence();

        if archive.len() < self.capacity {
            archive.push(mutant);
            return;
        }

        let (counts, min, max) = self.regrid(archive, mutant.fitness.objective_values());
        let mutant_cell = self.location_of(mutant.fitness.objective_values(), &min, &max);
        mutant.fitness.location_mut().location = mutant_cell;
        let densest = counts.values().copied().max().unwrap_or(0);
        let mutant_density = counts.get(&mutant_cell).copied().unwrap_or(0);
        if mutant_density >= densest {
            return;
        }
        // Evict from the densest region: lowest cell code among the ties,
        // then the oldest member of that cell.
        let cell = counts
            .iter()
            .filter(|&(_, &count)| count == densest)
            .map(|(&cell, _)| cell)
            .min()
            .expect("archive at capacity has at least one cell");
        let victim = archive
            .iter()
            .enumerate()
            .filter(|(_, member)| member.fitness.location().location == cell)
            .min_by_key(|(_, member)| member.fitness.location().sequence)
            .map(|(index, _)| index)
            .expect("densest cell is non-empty");
        archive.remove(victim);
        archive.push(mutant);
    }
}

impl<G: Clone> Strategy<G> for PaesStrategy {
    fn fitness_prototype(&self, num_objectives: usize) -> Fitness {
        Fitness::objectives(num_objectives)
            .with_extension(Extension::Location(LocationFields::default()))
    }

    fn initialize(
        &mut self,
        _ctx: &StrategyContext,
        population: &mut Vec<Solution<G>>,
        _rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>> {
        assert_eq!(
            population.len(),
            1,
            "the (1+1) strategy keeps a single incumbent"
        );
        let mut incumbent = population[0].clone();
        incumbent.fitness.location_mut().sequence = self.next_sequence();
        vec![incumbent]
    }

    fn mating_selection(
        &mut self,
        _ctx: &StrategyContext,
        population: &[Solution<G>],
        _archive: &[Solution<G>],
        _rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>> {
        vec![population[0].clone()]
    }

    fn environmental_selection(
        &mut self,
        ctx: &StrategyContext,
        population: &[Solution<G>],
        offspring: &[Solution<G>],
        archive: &[Solution<G>],
        _rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>> {
        let incumbent = &population[0];
        let Some(mutant) = offspring.first() else {
            return vec![incumbent.clone()];
        };
        let pareto = FitnessComparator::pareto(&ctx.senses);
        match pareto.compare(&mutant.fitness, &incumbent.fitness) {
            1 => vec![mutant.clone()],
            -1 => vec![incumbent.clone()],
            _ => {
                if archive
                    .iter()
                    .any(|member| pareto.compare(&member.fitness, &mutant.fitness) == 1)
                {
                    return vec![incumbent.clone()];
                }
                // Mutual non-dominance: the less crowded cell wins.
                let mut scratch: Vec<Solution<G>> = archive.to_vec();
                if scratch.is_empty() {
                    return vec![mutant.clone()];
                }
                let (counts, min, max) =
                    self.regrid(&mut scratch, mutant.fitness.objective_values());
                let mutant_cell =
                    self.location_of(mutant.fitness.objective_values(), &min, &max);
                let incumbent_cell =
                    self.location_of(incumbent.fitness.objective_values(), &min, &max);
                let mutant_density = counts.get(&mutant_cell).copied().unwrap_or(0);
                let incumbent_density = counts.get(&incumbent_cell).copied().unwrap_or(0);
                if mutant_density < incumbent_density {
                    vec![mutant.clone()]
                } else {
                    vec![incumbent.clone()]
                }
            }
        }
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
        let pareto = FitnessComparator::pareto(&ctx.senses);
        for mutant in offspring {
            let dominated = archive
                .iter()
                .any(|member| pareto.compare(&member.fitness, &mutant.fitness) == 1);
            if !dominated {
                self.archive_insert(&mut archive, mutant, &pareto);
            }
        }
        archive
    }
}
