//! # `commands` – Reusable Population Algorithms
//!
//! Single-shot computations shared by the strategy layer: non-dominated
//! extraction, fast non-dominated front splitting, crowding distance,
//! objective scaling and inversion, Das–Dennis / uniform reference-vector
//! generation and hypercube partitioning.
//!
//! Every command follows the same shape: construct with the required
//! inputs, optionally adjust through setters, run `execute()`, then read
//! the result through a dedicated getter. Commands compute on an
//! `Array2<f64>` objective matrix (one row per solution) plus per-objective
//! orientation, and return index-based results so callers can map back to
//! their solution lists. An empty input matrix fails with
//! `InvalidPopulation`.

mod crowding;
mod hypercube;
mod non_dominated;
mod scaling;
mod splitter;
mod vectors;

pub use crowding::CrowdingDistanceCalculator;
pub use hypercube::{GridSpec, HypercubePartitioner};
pub use non_dominated::NonDominatedExtractor;
pub use scaling::{ObjectiveInverter, ObjectiveScaler, ObjectiveScalerNoBounds};
pub use splitter::PopulationSplitter;
pub use vectors::{DasDennisVectorGenerator, UniformVectorGenerator, divisions_for_count};

use ndarray::ArrayView1;

use crate::comparator::ObjectiveComparator;

/// Pareto sign between two objective rows: `+1` when `a` dominates, `-1`
/// when `b` does, `0` for incomparable or equal rows.
pub(crate) fn dominance_sign(
    a: &ArrayView1<f64>,
    b: &ArrayView1<f64>,
    components: &[ObjectiveComparator],
) -> i32 {
    let mut verdict = 0;
    for (i, component) in components.iter().enumerate() {
        let sign = component.compare(a[i], b[i]);
        if sign == 0 {
            continue;
        }
        if verdict == 0 {
            verdict = sign;
        } else if verdict != sign {
            return 0;
        }
    }
    verdict
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::component_comparators;
    use ndarray::array;

    #[test]
    fn dominance_sign_respects_orientation() {
        let maximize = component_comparators(&[true, true]);
        let minimize = component_comparators(&[false, false]);
        let a = array![2.0, 2.0];
        let b = array![1.0, 1.0];
        assert_eq!(dominance_sign(&a.view(), &b.view(), &maximize), 1);
        assert_eq!(dominance_sign(&a.view(), &b.view(), &minimize), -1);
    }

    #[test]
    fn dominance_sign_mixed_signs_is_incomparable() {
        let components = component_comparators(&[false, false]);
        let a = array![1.0, 2.0];
        let b = array![2.0, 1.0];
        assert_eq!(dominance_sign(&a.view(), &b.view(), &components), 0);
    }
}
