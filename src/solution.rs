//! # `solution` – Opaque Genomes With Attached Fitness
//!
//! A [`Solution`] pairs an opaque genome value with its [`Fitness`]. The
//! core never inspects the genome; only the species provider and the
//! variation operators do. Lists (`Vec<Solution<G>>`) exclusively own their
//! elements — when the same logical solution must appear in two lists
//! (population and archive, say) a `clone()` produces the independent copy.
//!
//! The free functions here are the bridge between solution lists and the
//! numeric commands: they project the per-solution fitness values into the
//! `ndarray` matrices the commands compute on.

use ndarray::{Array1, Array2};

use crate::fitness::Fitness;

#[derive(Debug, Clone)]
pub struct Solution<G> {
    pub genome: G,
    pub fitness: Fitness,
}

impl<G> Solution<G> {
    pub fn new(genome: G, fitness: Fitness) -> Self {
        Self { genome, fitness }
    }
}

/// Objective matrix of a solution list, one row per solution.
///
/// An empty list yields a `0 × 0` matrix; commands that require content
/// raise `InvalidPopulation` themselves.
pub fn fitness_matrix<G>(solutions: &[Solution<G>]) -> Array2<f64> {
    let Some(first) = solutions.first() else {
        return Array2::zeros((0, 0));
    };
    let m = first.fitness.num_objectives();
    let mut matrix = Array2::zeros((solutions.len(), m));
    for (row, solution) in solutions.iter().enumerate() {
        debug_assert_eq!(
            solution.fitness.num_objectives(),
            m,
            "all fitness objects in one population share M"
        );
        for (col, &value) in solution.fitness.objective_values().iter().enumerate() {
            matrix[[row, col]] = value;
        }
    }
    matrix
}

/// Aggregate violations of a list, `0.0` for unconstrained members.
pub fn violation_vector<G>(solutions: &[Solution<G>]) -> Array1<f64> {
    Array1::from_iter(
        solutions
            .iter()
            .map(|s| s.fitness.violation().unwrap_or(0.0).max(0.0)),
    )
}

/// Independent copies of two lists merged in order.
pub fn merged<G: Clone>(a: &[Solution<G>], b: &[Solution<G>]) -> Vec<Solution<G>> {
    let mut merged = Vec::with_capacity(a.len() + b.len());
    merged.extend(a.iter().cloned());
    merged.extend(b.iter().cloned());
    merged
}

/// Copies of the solutions at `indices`, in index order.
pub fn selected<G: Clone>(solutions: &[Solution<G>], indices: &[usize]) -> Vec<Solution<G>> {
    indices.iter().map(|&i| solutions[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn solution(values: &[f64]) -> Solution<u32> {
        let mut fitness = Fitness::objectives(values.len());
        fitness.set_objective_values(Array1::from(values.to_vec()));
        Solution::new(0, fitness)
    }

    #[test]
    fn fitness_matrix_rows_follow_list_order() {
        let population = vec![solution(&[1.0, 2.0]), solution(&[3.0, 4.0])];
        let matrix = fitness_matrix(&population);
        assert_eq!(matrix, array![[1.0, 2.0], [3.0, 4.0]]);
    }

    #[test]
    fn fitness_matrix_of_empty_list_is_empty() {
        let population: Vec<Solution<u32>> = Vec::new();
        assert_eq!(fitness_matrix(&population).nrows(), 0);
    }

    #[test]
    fn merged_clones_are_independent() {
        let a = vec![solution(&[1.0])];
        let b = vec![solution(&[2.0])];
        let mut pool = merged(&a, &b);
        pool[0].fitness.set_objective_value(0, 9.0);
        assert_eq!(a[0].fitness.objective_value(0), 1.0);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn selected_respects_index_order() {
        let population = vec![solution(&[1.0]), solution(&[2.0]), solution(&[3.0])];
        let picked = selected(&population, &[2, 0]);
        assert_eq!(picked[0].fitness.objective_value(0), 3.0);
        assert_eq!(picked[1].fitness.objective_value(0), 1.0);
    }

    #[test]
    fn violation_vector_defaults_to_zero() {
        let mut constrained = solution(&[1.0]);
        constrained.fitness.set_violation(2.5);
        let population = vec![solution(&[0.0]), constrained];
        assert_eq!(violation_vector(&population), array![0.0, 2.5]);
    }
}
