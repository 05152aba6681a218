//! # `operators` – Variation Contract and Population Hygiene
//!
//! The core treats genomes as opaque: recombination and mutation live
//! behind the [`VariationOperator`] contract, and the only structural hook
//! the driver offers is an optional [`PopulationCleaner`] that drops
//! duplicate offspring genomes before they are evaluated. Concrete
//! crossovers and mutators belong to the surrounding experiment code, not
//! to this crate.

use crate::random::RandomGenerator;
use crate::solution::Solution;

/// Creates offspring genomes from an ordered parent list. The parent order
/// is the one mating selection produced; operators that pair parents
/// consume them two by two.
pub trait VariationOperator<G> {
    fn variate(&self, parents: &[Solution<G>], rng: &mut impl RandomGenerator) -> Vec<G>;
}

/// Removes offspring genomes the run should not evaluate again.
pub trait PopulationCleaner<G> {
    fn clean(&self, offspring: Vec<G>, population: &[Solution<G>]) -> Vec<G>;
}

/// Default cleaner: keeps everything.
#[derive(Debug, Clone, Default)]
pub struct NoCleaner;

impl<G> PopulationCleaner<G> for NoCleaner {
    fn clean(&self, offspring: Vec<G>, _population: &[Solution<G>]) -> Vec<G> {
        offspring
    }
}

/// Drops offspring equal to an earlier offspring or to a current inhabitant.
#[derive(Debug, Clone, Default)]
pub struct ExactDuplicatesCleaner;

impl ExactDuplicatesCleaner {
    pub fn new() -> Self {
        Self
    }
}

impl<G: PartialEq> PopulationCleaner<G> for ExactDuplicatesCleaner {
    fn clean(&self, offspring: Vec<G>, population: &[Solution<G>]) -> Vec<G> {
        let mut kept: Vec<G> = Vec::with_capacity(offspring.len());
        for genome in offspring {
            let seen = kept.iter().any(|k| *k == genome)
                || population.iter().any(|s| s.genome == genome);
            if !seen {
                kept.push(genome);
            }
        }
        kept
    }
}
