//! Non-dominated extraction over an objective matrix.

use ndarray::{Array1, Array2};

use crate::comparator::{ObjectiveComparator, component_comparators};
use crate::commands::dominance_sign;
use crate::error::SearchError;

/// Extracts the indices of the non-dominated rows of an objective matrix.
///
/// The result is an antichain: no two kept rows Pareto-dominate each other,
/// and every dropped row is weakly dominated by some kept row. With
/// violations set (the feasible variant), infeasible rows are filtered out
/// before extraction; when no feasible row exists the whole matrix
/// participates, so a non-empty input always yields a non-empty front.
pub struct NonDominatedExtractor {
    fitness: Array2<f64>,
    components: Vec<ObjectiveComparator>,
    violations: Option<Array1<f64>>,
    front: Vec<usize>,
}

impl NonDominatedExtractor {
    pub fn new(fitness: Array2<f64>, senses: &[bool]) -> Self {
        Self {
            fitness,
            components: component_comparators(senses),
            violations: None,
            front: Vec::new(),
        }
    }

    /// Enables the feasibility pre-filter.
    pub fn set_violations(&mut self, violations: Array1<f64>) {
        self.violations = Some(violations);
    }

    pub fn execute(&mut self) -> Result<(), SearchError> {
        if self.fitness.nrows() == 0 {
            return Err(SearchError::invalid_population("non-dominated extraction"));
        }

        let candidates: Vec<usize> = match &self.violations {
            Some(violations) => {
                let feasible: Vec<usize> = (0..self.fitness.nrows())
                    .filter(|&i| violations[i] <= 0.0)
                    .collect();
                if feasible.is_empty() {
                    (0..self.fitness.nrows()).collect()
                } else {
                    feasible
                }
            }
            None => (0..self.fitness.nrows()).collect(),
        };

        let mut kept: Vec<usize> = Vec::new();
        for &candidate in &candidates {
            let row = self.fitness.row(candidate);
            let mut dominated = false;
            kept.retain(|&keeper| {
                match dominance_sign(&row, &self.fitness.row(keeper), &self.components) {
                    1 => false,
                    -1 => {
                        dominated = true;
                        true
                    }
                    _ => true,
                }
            });
            if !dominated {
                kept.push(candidate);
            }
        }
        kept.sort_unstable();
        self.front = kept;
        Ok(())
    }

    /// Indices of the non-dominated rows, ascending.
    pub fn front(&self) -> &[usize] {
        &self.front
    }
}
