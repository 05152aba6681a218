//! Reference-vector generation on the unit simplex.

use ndarray::Array2;

use crate::error::SearchError;

/// Das–Dennis simplex-lattice reference vectors.
///
/// The single-layer form emits every M-tuple of non-negative integers
/// summing to `outer_divisions`, normalised by the division count —
/// `C(M + p − 1, p)` vectors in total. The two-layer form appends an inner
/// layer built with `inner_divisions` and shrunk halfway towards the
/// simplex centre.
pub struct DasDennisVectorGenerator {
    num_objectives: usize,
    outer_divisions: usize,
    inner_divisions: Option<usize>,
    vectors: Array2<f64>,
}

impl DasDennisVectorGenerator {
    pub fn new(num_objectives: usize, outer_divisions: usize) -> Self {
        Self {
            num_objectives,
            outer_divisions,
            inner_divisions: None,
            vectors: Array2::zeros((0, 0)),
        }
    }

    /// Enables the two-layer form.
    pub fn with_inner_divisions(mut self, inner_divisions: usize) -> Self {
        self.inner_divisions = Some(inner_divisions);
        self
    }

    pub fn execute(&mut self) -> Result<(), SearchError> {
        if self.num_objectives == 0 {
            return Err(SearchError::Configuration(
                "reference vectors need at least one objective".into(),
            ));
        }
        if self.outer_divisions == 0 {
            return Err(SearchError::Configuration(
                "outer divisions must be positive".into(),
            ));
        }
        if self.inner_divisions == Some(0) {
            return Err(SearchError::Configuration(
                "inner divisions must be positive when the two-layer form is used".into(),
            ));
        }

        let mut rows = simplex_lattice(self.num_objectives, self.outer_divisions);
        if let Some(inner) = self.inner_divisions {
            let shift = 0.5 / self.num_objectives as f64;
            let shrunk = simplex_lattice(self.num_objectives, inner)
                .into_iter()
                .map(|row| row.into_iter().map(|v| 0.5 * v + shift).collect());
            rows.extend(shrunk);
        }

        let count = rows.len();
        let mut vectors = Array2::zeros((count, self.num_objectives));
        for (i, row) in rows.iter().enumerate() {
            for (j, &value) in row.iter().enumerate() {
                vectors[[i, j]] = value;
            }
        }
        self.vectors = vectors;
        Ok(())
    }

    /// One reference vector per row, coordinates summing to 1.
    pub fn vectors(&self) -> &Array2<f64> {
        &self.vectors
    }
}

/// Uniform simplex vectors: the single-layer lattice with parameter `H`,
/// `C(M + H − 1, H)` vectors.
pub struct UniformVectorGenerator {
    inner: DasDennisVectorGenerator,
}

impl UniformVectorGenerator {
    pub fn new(num_objectives: usize, divisions: usize) -> Self {
        Self {
            inner: DasDennisVectorGenerator::new(num_objectives, divisions),
        }
    }

    pub fn execute(&mut self) -> Result<(), SearchError> {
        self.inner.execute()
    }

    pub fn vectors(&self) -> &Array2<f64> {
        self.inner.vectors()
    }
}

/// Normalised lattice points: all combinations of non-negative integers of
/// length `m` summing to `divisions`, divided by `divisions`.
fn simplex_lattice(m: usize, divisions: usize) -> Vec<Vec<f64>> {
    let mut points: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = Vec::with_capacity(m);
    lattice_combinations(m, divisions, &mut current, &mut points);
    points
        .into_iter()
        .map(|combination| {
            combination
                .into_iter()
                .map(|k| k as f64 / divisions as f64)
                .collect()
        })
        .collect()
}

/// Recursively distributes `remaining` across the components left to fill.
fn lattice_combinations(
    m: usize,
    remaining: usize,
    current: &mut Vec<usize>,
    points: &mut Vec<Vec<usize>>,
) {
    if current.len() == m - 1 {
        current.push(remaining);
        points.push(current.clone());
        current.pop();
        return;
    }
    for value in 0..=remaining {
        current.push(value);
        lattice_combinations(m, remaining - value, current, points);
        current.pop();
    }
}

/// Binomial coefficient `n choose k`.
pub(crate) fn binomial_coefficient(n: usize, k: usize) -> usize {
    let mut result = 1usize;
    for i in 0..k {
        result = result * (n - i) / (i + 1);
    }
    result
}

/// Smallest division count whose single-layer lattice holds at least
/// `target` vectors — used when a strategy needs "roughly one vector per
/// population slot".
pub fn divisions_for_count(num_objectives: usize, target: usize) -> usize {
    let mut divisions = 1;
    loop {
        let count = binomial_coefficient(divisions + num_objectives - 1, num_objectives - 1);
        if count >= target {
            return divisions;
        }
        divisions += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    #[rstest]
    #[case(3, 12, 91)]
    #[case(5, 6, 210)]
    #[case(2, 149, 150)]
    #[case(3, 25, 351)]
    #[case(4, 12, 455)]
    fn single_layer_counts(#[case] m: usize, #[case] divisions: usize, #[case] expected: usize) {
        let mut generator = UniformVectorGenerator::new(m, divisions);
        generator.execute().unwrap();
        assert_eq!(generator.vectors().nrows(), expected);
        assert_eq!(expected, binomial_coefficient(m + divisions - 1, m - 1));
    }

    #[rstest]
    #[case(3, 2, 1, 9)]
    #[case(8, 3, 2, 156)]
    fn two_layer_counts(
        #[case] m: usize,
        #[case] outer: usize,
        #[case] inner: usize,
        #[case] expected: usize,
    ) {
        let mut generator =
            DasDennisVectorGenerator::new(m, outer).with_inner_divisions(inner);
        generator.execute().unwrap();
        assert_eq!(generator.vectors().nrows(), expected);
    }

    #[test]
    fn coordinates_sum_to_one() {
        let mut generator = DasDennisVectorGenerator::new(3, 7).with_inner_divisions(2);
        generator.execute().unwrap();
        for row in generator.vectors().rows() {
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn inner_layer_is_shrunk_towards_the_centre() {
        let mut generator = DasDennisVectorGenerator::new(3, 1).with_inner_divisions(1);
        generator.execute().unwrap();
        let vectors = generator.vectors();
        // Outer corners carry a 1.0 coordinate; inner corners max out at
        // 0.5 + 1/6.
        let outer_max = vectors.row(0).iter().cloned().fold(f64::MIN, f64::max);
        let inner_max = vectors
            .row(vectors.nrows() - 1)
            .iter()
            .cloned()
            .fold(f64::MIN, f64::max);
        assert_eq!(outer_max, 1.0);
        assert_abs_diff_eq!(inner_max, 0.5 + 1.0 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn divisions_for_count_is_minimal() {
        // C(H+1, 1): 2 objectives, H divisions gives H+1 vectors.
        assert_eq!(divisions_for_count(2, 100), 99);
        // 3 objectives: C(H+2, 2) ≥ 91 first at H = 12.
        assert_eq!(divisions_for_count(3, 91), 12);
        assert_eq!(divisions_for_count(3, 92), 13);
    }

    #[test]
    fn zero_divisions_is_a_configuration_error() {
        let mut generator = DasDennisVectorGenerator::new(3, 0);
        assert!(matches!(
            generator.execute().unwrap_err(),
            SearchError::Configuration(_)
        ));
    }
}
