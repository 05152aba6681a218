//! Hypercube / grid partitioning of the objective space.

use ndarray::{Array2, ArrayView1};

use crate::error::SearchError;

/// How the objective space is cut into cells.
#[derive(Debug, Clone)]
pub enum GridSpec {
    /// Fixed cell width (εᵢ) per objective; cell = ⌊fᵢ / εᵢ⌋.
    Widths(Vec<f64>),
    /// Fixed number of cells per objective over declared bounds; the width
    /// is derived and coordinates are clamped into `[0, per_axis)`.
    Divisions {
        per_axis: usize,
        lower: Vec<f64>,
        upper: Vec<f64>,
    },
}

/// Maps objective vectors to integer hypercube coordinates, either one row
/// at a time (`cell_of`) or for a whole matrix via the command face
/// (`set_fitness` + `execute` + `coordinates`).
pub struct HypercubePartitioner {
    spec: GridSpec,
    fitness: Array2<f64>,
    coordinates: Vec<Vec<i64>>,
}

impl HypercubePartitioner {
    pub fn new(spec: GridSpec) -> Result<Self, SearchError> {
        match &spec {
            GridSpec::Widths(widths) => {
                if widths.is_empty() || widths.iter().any(|&w| w <= 0.0) {
                    return Err(SearchError::Configuration(
                        "hypercube widths must be positive".into(),
                    ));
                }
            }
            GridSpec::Divisions {
                per_axis,
                lower,
                upper,
            } => {
                if *per_axis == 0 {
                    return Err(SearchError::Configuration(
                        "hypercube divisions must be positive".into(),
                    ));
                }
                if lower.len() != upper.len() || lower.is_empty() {
                    return Err(SearchError::Configuration(
                        "hypercube bounds must be non-empty and of equal length".into(),
                    ));
                }
                if lower.iter().zip(upper.iter()).any(|(&lo, &up)| lo >= up) {
                    return Err(SearchError::Configuration(
                        "hypercube lower bounds must be below upper bounds".into(),
                    ));
                }
            }
        }
        Ok(Self {
            spec,
            fitness: Array2::zeros((0, 0)),
            coordinates: Vec::new(),
        })
    }

    pub fn num_objectives(&self) -> usize {
        match &self.spec {
            GridSpec::Widths(widths) => widths.len(),
            GridSpec::Divisions { lower, .. } => lower.len(),
        }
    }

    /// Cell width along `axis`.
    pub fn width(&self, axis: usize) -> f64 {
        match &self.spec {
            GridSpec::Widths(widths) => widths[axis],
            GridSpec::Divisions {
                per_axis,
                lower,
                upper,
            } => (upper[axis] - lower[axis]) / *per_axis as f64,
        }
    }

    /// Integer cell coordinates of one objective vector.
    pub fn cell_of(&self, values: &ArrayView1<f64>) -> Vec<i64> {
        (0..self.num_objectives())
            .map(|axis| self.axis_cell(axis, values[axis]))
            .collect()
    }

    fn axis_cell(&self, axis: usize, value: f64) -> i64 {
        match &self.spec {
            GridSpec::Widths(widths) => (value / widths[axis]).floor() as i64,
            GridSpec::Divisions {
                per_axis, lower, ..
            } => {
                let cell = ((value - lower[axis]) / self.width(axis)).floor() as i64;
                cell.clamp(0, *per_axis as i64 - 1)
            }
        }
    }

    /// Coordinates of the lower corner of a cell, in objective units.
    pub fn cell_origin(&self, coordinates: &[i64]) -> Vec<f64> {
        coordinates
            .iter()
            .enumerate()
            .map(|(axis, &cell)| {
                let offset = match &self.spec {
                    GridSpec::Widths(_) => 0.0,
                    GridSpec::Divisions { lower, .. } => lower[axis],
                };
                offset + cell as f64 * self.width(axis)
            })
            .collect()
    }

    pub fn set_fitness(&mut self, fitness: Array2<f64>) {
        self.fitness = fitness;
    }

    pub fn execute(&mut self) -> Result<(), SearchError> {
        if self.fitness.nrows() == 0 {
            return Err(SearchError::invalid_population("hypercube partitioning"));
        }
        self.coordinates = self
            .fitness
            .rows()
            .into_iter()
            .map(|row| self.cell_of(&row))
            .collect();
        Ok(())
    }

    /// One coordinate vector per fitness row.
    pub fn coordinates(&self) -> &[Vec<i64>] {
        &self.coordinates
    }
}
