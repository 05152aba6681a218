//! Crowding distance over one front.

use ndarray::{Array1, Array2};

use crate::error::SearchError;

/// Computes the crowding distance of each row of a front's objective
/// matrix: per objective, the two extreme rows receive +∞ and every
/// interior row accumulates the normalised neighbour gap
/// `(v₍ᵢ₊₁₎ − v₍ᵢ₋₁₎) / (max − min)`. Degenerate objectives
/// (`max == min`) contribute nothing. Sorting is stable, so distance ties
/// between duplicate values preserve input order.
pub struct CrowdingDistanceCalculator {
    fitness: Array2<f64>,
    min: Array1<f64>,
    max: Array1<f64>,
    distances: Array1<f64>,
}

impl CrowdingDistanceCalculator {
    pub fn new(fitness: Array2<f64>, min: Array1<f64>, max: Array1<f64>) -> Self {
        Self {
            fitness,
            min,
            max,
            distances: Array1::zeros(0),
        }
    }

    pub fn execute(&mut self) -> Result<(), SearchError> {
        let n = self.fitness.nrows();
        if n == 0 {
            return Err(SearchError::invalid_population("crowding distance"));
        }
        let m = self.fitness.ncols();
        let mut distances = Array1::zeros(n);

        if n <= 2 {
            distances.fill(f64::INFINITY);
            self.distances = distances;
            return Ok(());
        }

        for objective in 0..m {
            let column = self.fitness.column(objective);
            let mut order: Vec<usize> = (0..n).collect();
            order.sort_by(|&a, &b| {
                column[a]
                    .partial_cmp(&column[b])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            distances[order[0]] = f64::INFINITY;
            distances[order[n - 1]] = f64::INFINITY;

            let range = self.max[objective] - self.min[objective];
            if range <= 0.0 {
                continue;
            }
            for window in 1..(n - 1) {
                let gap = column[order[window + 1]] - column[order[window - 1]];
                distances[order[window]] += gap / range;
            }
        }

        self.distances = distances;
        Ok(())
    }

    pub fn distances(&self) -> &Array1<f64> {
        &self.distances
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn four_point_front_with_duplicates() {
        // {(0,1), (0.5,0.5), (1,0), (0.5,0.5)} with min (0,0), max (1,1):
        // extremes per objective get +∞, the duplicated interior points each
        // accumulate 0.5 + 0.5 = 1.0.
        let fitness = array![[0.0, 1.0], [0.5, 0.5], [1.0, 0.0], [0.5, 0.5]];
        let mut calculator =
            CrowdingDistanceCalculator::new(fitness, array![0.0, 0.0], array![1.0, 1.0]);
        calculator.execute().unwrap();
        let distances = calculator.distances();
        assert!(distances[0].is_infinite());
        assert!(distances[2].is_infinite());
        assert_eq!(distances[1], 1.0);
        assert_eq!(distances[3], 1.0);
    }

    #[test]
    fn interior_distances_are_finite_and_non_negative() {
        let fitness = array![[0.0, 4.0], [1.0, 3.0], [2.0, 2.0], [3.0, 1.0], [4.0, 0.0]];
        let mut calculator =
            CrowdingDistanceCalculator::new(fitness, array![0.0, 0.0], array![4.0, 4.0]);
        calculator.execute().unwrap();
        let distances = calculator.distances();
        assert!(distances[0].is_infinite());
        assert!(distances[4].is_infinite());
        for &d in distances.iter().take(4).skip(1) {
            assert!(d.is_finite() && d >= 0.0);
        }
    }

    #[test]
    fn degenerate_objective_contributes_zero() {
        // Second objective is constant: only the first objective spreads.
        let fitness = array![[0.0, 1.0], [1.0, 1.0], [2.0, 1.0]];
        let mut calculator =
            CrowdingDistanceCalculator::new(fitness, array![0.0, 1.0], array![2.0, 1.0]);
        calculator.execute().unwrap();
        let distances = calculator.distances();
        // Middle point: (2-0)/2 = 1 from objective 0, nothing from the flat
        // objective despite being an extreme there (∞ only from objective 0
        // boundaries, which are rows 0 and 2).
        assert_eq!(distances[1], 1.0);
    }

    #[test]
    fn tiny_fronts_are_all_boundary() {
        let fitness = array![[0.0, 1.0], [1.0, 0.0]];
        let mut calculator =
            CrowdingDistanceCalculator::new(fitness, array![0.0, 0.0], array![1.0, 1.0]);
        calculator.execute().unwrap();
        assert!(calculator.distances().iter().all(|d| d.is_infinite()));
    }

    #[test]
    fn empty_front_is_rejected() {
        let mut calculator = CrowdingDistanceCalculator::new(
            Array2::zeros((0, 2)),
            array![0.0, 0.0],
            array![1.0, 1.0],
        );
        assert!(matches!(
            calculator.execute().unwrap_err(),
            SearchError::InvalidPopulation { .. }
        ));
    }
}
