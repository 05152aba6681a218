//! Fast non-dominated sorting: partition a population into Pareto fronts.

use ndarray::{Array1, Array2};
use num_traits::Zero;

use crate::comparator::{ObjectiveComparator, component_comparators};
use crate::commands::dominance_sign;
use crate::error::SearchError;

/// Splits an objective matrix into ordered non-dominated fronts
/// F₀, F₁, …: F₀ is the non-dominated set, F₍ₖ₊₁₎ the non-dominated set of
/// what remains after removing F₀…Fₖ.
///
/// Runs the fast-non-dominated-sort in O(M·N²). The `dominates` adjacency
/// and the dominated-by counters live in generation-scoped index buffers
/// local to `execute`, so no solution handles are retained past the call.
pub struct PopulationSplitter {
    fitness: Array2<f64>,
    components: Vec<ObjectiveComparator>,
    fronts: Vec<Vec<usize>>,
}

impl PopulationSplitter {
    pub fn new(fitness: Array2<f64>, senses: &[bool]) -> Self {
        Self {
            fitness,
            components: component_comparators(senses),
            fronts: Vec::new(),
        }
    }

    pub fn execute(&mut self) -> Result<(), SearchError> {
        let n = self.fitness.nrows();
        if n == 0 {
            return Err(SearchError::invalid_population("front splitting"));
        }

        let mut dominates: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut dominated_by: Vec<usize> = vec![0; n];

        for i in 0..n {
            for j in (i + 1)..n {
                match dominance_sign(&self.fitness.row(i), &self.fitness.row(j), &self.components)
                {
                    1 => {
                        dominates[i].push(j);
                        dominated_by[j] += 1;
                    }
                    -1 => {
                        dominates[j].push(i);
                        dominated_by[i] += 1;
                    }
                    _ => {}
                }
            }
        }

        let mut fronts: Vec<Vec<usize>> = Vec::new();
        let mut current: Vec<usize> = (0..n).filter(|&i| dominated_by[i].is_zero()).collect();
        while !current.is_empty() {
            let mut next: Vec<usize> = Vec::new();
            for &member in &current {
                for &worse in &dominates[member] {
                    dominated_by[worse] -= 1;
                    if dominated_by[worse] == 0 {
                        next.push(worse);
                    }
                }
            }
            next.sort_unstable();
            fronts.push(std::mem::replace(&mut current, next));
        }

        self.fronts = fronts;
        Ok(())
    }

    /// Ordered fronts of row indices; each front ascending.
    pub fn fronts(&self) -> &[Vec<usize>] {
        &self.fronts
    }

    /// Front rank per row, the partition induced by `fronts()`.
    pub fn ranks(&self) -> Array1<usize> {
        let n = self.fitness.nrows();
        let mut ranks = Array1::zeros(n);
        for (rank, front) in self.fronts.iter().enumerate() {
            for &index in front {
                ranks[index] = rank;
            }
        }
        ranks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::NonDominatedExtractor;
    use ndarray::array;

    fn nine_points() -> Array2<f64> {
        array![
            [5.0, 5.0],
            [4.0, 6.0],
            [6.0, 4.0],
            [1.0, 1.0],
            [3.0, 4.0],
            [2.0, 1.0],
            [1.0, 2.0],
            [4.0, 3.0],
            [0.0, 0.0],
        ]
    }

    #[test]
    fn front_sizes_on_nine_point_population() {
        // Maximising both objectives the fronts are [3, 2, 2, 1, 1].
        let mut splitter = PopulationSplitter::new(nine_points(), &[true, true]);
        splitter.execute().unwrap();
        let sizes: Vec<usize> = splitter.fronts().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 2, 2, 1, 1]);
    }

    #[test]
    fn fronts_partition_the_population() {
        let fitness = nine_points();
        let mut splitter = PopulationSplitter::new(fitness.clone(), &[true, true]);
        splitter.execute().unwrap();

        let mut all: Vec<usize> = splitter.fronts().iter().flatten().copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..fitness.nrows()).collect::<Vec<_>>());

        // Rank r non-empty implies every earlier rank non-empty by
        // construction; check the ranks vector is consistent.
        let ranks = splitter.ranks();
        for (rank, front) in splitter.fronts().iter().enumerate() {
            for &index in front {
                assert_eq!(ranks[index], rank);
            }
        }
    }

    #[test]
    fn first_front_equals_non_dominated_extraction() {
        let fitness = nine_points();
        let senses = [true, true];
        let mut splitter = PopulationSplitter::new(fitness.clone(), &senses);
        splitter.execute().unwrap();

        let mut extractor = NonDominatedExtractor::new(fitness, &senses);
        extractor.execute().unwrap();

        assert_eq!(splitter.fronts()[0], extractor.front());
    }

    #[test]
    fn chain_produces_singleton_fronts() {
        let fitness = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0]];
        let mut splitter = PopulationSplitter::new(fitness, &[false, false]);
        splitter.execute().unwrap();
        assert_eq!(splitter.fronts(), &[vec![0], vec![1], vec![2]]);
        assert_eq!(splitter.ranks(), array![0, 1, 2]);
    }

    #[test]
    fn empty_input_is_rejected() {
        let mut splitter = PopulationSplitter::new(Array2::zeros((0, 3)), &[false, false, false]);
        assert!(matches!(
            splitter.execute().unwrap_err(),
            SearchError::InvalidPopulation { .. }
        ));
    }
}
