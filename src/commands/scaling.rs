//! Objective scaling and inversion commands.

use ndarray::{Array1, Array2};
use ndarray_stats::QuantileExt;

use crate::error::SearchError;

/// Rewrites objective values into `[0, 1]` according to supplied bounds,
/// or — with `inverse()` — maps unit-scaled values back into the bounds.
/// Scaling then unscaling restores the original matrix up to floating-point
/// round-off.
pub struct ObjectiveScaler {
    fitness: Array2<f64>,
    min: Array1<f64>,
    max: Array1<f64>,
    inverse: bool,
    scaled: Array2<f64>,
}

impl ObjectiveScaler {
    pub fn new(fitness: Array2<f64>, min: Array1<f64>, max: Array1<f64>) -> Self {
        Self {
            fitness,
            min,
            max,
            inverse: false,
            scaled: Array2::zeros((0, 0)),
        }
    }

    /// Switches to the inverse transform (unit interval back into bounds).
    pub fn inverse(mut self) -> Self {
        self.inverse = true;
        self
    }

    pub fn execute(&mut self) -> Result<(), SearchError> {
        if self.fitness.nrows() == 0 {
            return Err(SearchError::invalid_population("objective scaling"));
        }
        let mut scaled = self.fitness.clone();
        for (objective, mut column) in scaled.columns_mut().into_iter().enumerate() {
            let min = self.min[objective];
            let range = self.max[objective] - min;
            if self.inverse {
                column.mapv_inplace(|v| min + v * range);
            } else if range > 0.0 {
                column.mapv_inplace(|v| (v - min) / range);
            } else {
                column.fill(0.0);
            }
        }
        self.scaled = scaled;
        Ok(())
    }

    pub fn scaled(&self) -> &Array2<f64> {
        &self.scaled
    }
}

/// Same transform with bounds taken from the matrix itself (per-column
/// minimum and maximum of the current population).
pub struct ObjectiveScalerNoBounds {
    fitness: Array2<f64>,
    scaled: Array2<f64>,
}

impl ObjectiveScalerNoBounds {
    pub fn new(fitness: Array2<f64>) -> Self {
        Self {
            fitness,
            scaled: Array2::zeros((0, 0)),
        }
    }

    pub fn execute(&mut self) -> Result<(), SearchError> {
        if self.fitness.nrows() == 0 {
            return Err(SearchError::invalid_population("objective scaling"));
        }
        let m = self.fitness.ncols();
        let mut min = Array1::zeros(m);
        let mut max = Array1::zeros(m);
        for objective in 0..m {
            let column = self.fitness.column(objective);
            min[objective] = *column.min().expect("non-empty column");
            max[objective] = *column.max().expect("non-empty column");
        }
        let mut inner = ObjectiveScaler::new(self.fitness.clone(), min, max);
        inner.execute()?;
        self.scaled = inner.scaled;
        Ok(())
    }

    pub fn scaled(&self) -> &Array2<f64> {
        &self.scaled
    }
}

/// Negates every component, flipping the orientation of all objectives.
pub struct ObjectiveInverter {
    fitness: Array2<f64>,
    inverted: Array2<f64>,
}

impl ObjectiveInverter {
    pub fn new(fitness: Array2<f64>) -> Self {
        Self {
            fitness,
            inverted: Array2::zeros((0, 0)),
        }
    }

    pub fn execute(&mut self) -> Result<(), SearchError> {
        if self.fitness.nrows() == 0 {
            return Err(SearchError::invalid_population("objective inversion"));
        }
        self.inverted = self.fitness.mapv(|v| -v);
        Ok(())
    }

    pub fn inverted(&self) -> &Array2<f64> {
        &self.inverted
    }
}
