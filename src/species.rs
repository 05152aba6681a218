//! # `species` – Genome Providers
//!
//! A species knows how to create fresh genomes for initialisation. The
//! generational driver only needs the [`SpeciesProvider`] contract; the
//! swarm driver additionally needs coordinate bounds to clamp positions and
//! velocities, which is what [`RealSpecies`] provides for real-vector
//! encodings.

use ndarray::Array1;

use crate::error::SearchError;
use crate::random::RandomGenerator;

/// Provider of fresh genomes at initialisation.
pub trait SpeciesProvider<G> {
    fn sample(&self, count: usize, rng: &mut impl RandomGenerator) -> Vec<G>;
}

/// Real-vector species with per-coordinate bounds.
#[derive(Debug, Clone)]
pub struct RealSpecies {
    lower: Array1<f64>,
    upper: Array1<f64>,
}

impl RealSpecies {
    pub fn new(lower: Array1<f64>, upper: Array1<f64>) -> Result<Self, SearchError> {
        if lower.len() != upper.len() || lower.is_empty() {
            return Err(SearchError::Configuration(
                "species bounds must be non-empty and of equal length".into(),
            ));
        }
        if lower.iter().zip(upper.iter()).any(|(&lo, &up)| lo >= up) {
            return Err(SearchError::Configuration(
                "species lower bounds must be below upper bounds".into(),
            ));
        }
        Ok(Self { lower, upper })
    }

    /// Uniform bounds over `num_vars` coordinates.
    pub fn uniform(num_vars: usize, lower: f64, upper: f64) -> Result<Self, SearchError> {
        Self::new(
            Array1::from_elem(num_vars, lower),
            Array1::from_elem(num_vars, upper),
        )
    }

    pub fn num_vars(&self) -> usize {
        self.lower.len()
    }

    pub fn lower(&self) -> &Array1<f64> {
        &self.lower
    }

    pub fn upper(&self) -> &Array1<f64> {
        &self.upper
    }

    /// Clamps a position into the species bounds, coordinate-wise.
    pub fn clamp(&self, genome: &mut Array1<f64>) {
        for (i, value) in genome.iter_mut().enumerate() {
            *value = value.clamp(self.lower[i], self.upper[i]);
        }
    }
}

impl SpeciesProvider<Array1<f64>> for RealSpecies {
    fn sample(&self, count: usize, rng: &mut impl RandomGenerator) -> Vec<Array1<f64>> {
        (0..count)
            .map(|_| {
                Array1::from_iter(
                    self.lower
                        .iter()
                        .zip(self.upper.iter())
                        .map(|(&lo, &up)| rng.gen_range_f64(lo, up)),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SearchRandomGenerator;
    use ndarray::array;

    #[test]
    fn sample_respects_bounds() {
        let species = RealSpecies::uniform(3, -1.0, 2.0).unwrap();
        let mut rng = SearchRandomGenerator::new_from_seed(Some(11));
        for genome in species.sample(50, &mut rng) {
            assert_eq!(genome.len(), 3);
            for &v in genome.iter() {
                assert!((-1.0..2.0).contains(&v));
            }
        }
    }

    #[test]
    fn clamp_pulls_back_into_bounds() {
        let species = RealSpecies::new(array![0.0, 0.0], array![1.0, 1.0]).unwrap();
        let mut genome = array![-0.5, 1.5];
        species.clamp(&mut genome);
        assert_eq!(genome, array![0.0, 1.0]);
    }

    #[test]
    fn degenerate_bounds_are_rejected() {
        assert!(RealSpecies::uniform(2, 1.0, 1.0).is_err());
        assert!(RealSpecies::new(array![0.0], array![]).is_err());
    }
}
