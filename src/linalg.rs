//! # `linalg` – Dense Kernels For the Strategy Layer
//!
//! The numeric kernels the strategies lean on: pairwise Euclidean
//! distances between objective-vector sets (SPEA2's k-NN density, MOEA/D's
//! weight neighbourhoods), acute angles and perpendicular distances to
//! reference vectors (RVEA's partitions, NSGA-III's association) and the
//! small linear solve behind NSGA-III's intercept regression.
//!
//! All three pairwise kernels expand around the same inner-product matrix,
//! so the heavy part of each is a single `faer` Gram product; the per-row
//! norm terms stay on the `ndarray` side.

use faer::Mat;
use faer::linalg::solvers::Solve;
use faer_ext::IntoFaer;

use ndarray::{Array1, Array2};

/// Inner-product matrix between two row sets: entry (i, j) = aᵢ · bⱼ.
fn gram_matrix(a: &Array2<f64>, b: &Array2<f64>) -> Mat<f64> {
    a.view().into_faer() * b.view().into_faer().transpose()
}

/// Squared row norms, the diagonal terms of the distance expansion.
fn squared_row_norms(rows: &Array2<f64>) -> Vec<f64> {
    rows.rows().into_iter().map(|row| row.dot(&row)).collect()
}

/// Euclidean distances between the rows of `data` (n × d) and the rows of
/// `reference` (m × d), as an n × m matrix. ‖x − y‖² is expanded into the
/// two norm terms and one inner product.
pub fn pairwise_distances(data: &Array2<f64>, reference: &Array2<f64>) -> Array2<f64> {
    let products = gram_matrix(data, reference);
    let data_norms = squared_row_norms(data);
    let reference_norms = squared_row_norms(reference);
    Array2::from_shape_fn((data.nrows(), reference.nrows()), |(i, j)| {
        // Round-off can push the expansion slightly below zero.
        (data_norms[i] + reference_norms[j] - 2.0 * *products.get(i, j))
            .max(0.0)
            .sqrt()
    })
}

/// Acute angles (radians) between objective vectors and reference
/// directions. Zero-length rows are treated as aligned.
pub fn cross_acute_angles(points: &Array2<f64>, directions: &Array2<f64>) -> Array2<f64> {
    let products = gram_matrix(points, directions);
    let point_norms: Vec<f64> = squared_row_norms(points)
        .into_iter()
        .map(f64::sqrt)
        .collect();
    let direction_norms: Vec<f64> = squared_row_norms(directions)
        .into_iter()
        .map(f64::sqrt)
        .collect();
    Array2::from_shape_fn((points.nrows(), directions.nrows()), |(i, j)| {
        let denominator = point_norms[i] * direction_norms[j];
        if denominator > 0.0 {
            (*products.get(i, j) / denominator).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        }
    })
}

/// Perpendicular distances from the rows of `points` to the lines spanned
/// by the rows of `directions`. A degenerate direction falls back to the
/// point's own norm.
pub fn perpendicular_distances(points: &Array2<f64>, directions: &Array2<f64>) -> Array2<f64> {
    let products = gram_matrix(points, directions);
    let point_norms = squared_row_norms(points);
    let direction_norms = squared_row_norms(directions);
    Array2::from_shape_fn((points.nrows(), directions.nrows()), |(i, j)| {
        if direction_norms[j] <= 0.0 {
            return point_norms[i].max(0.0).sqrt();
        }
        // ‖p‖² − (p·d)²/‖d‖² is the squared residual of the projection.
        let projection = *products.get(i, j);
        (point_norms[i] - projection * projection / direction_norms[j])
            .max(0.0)
            .sqrt()
    })
}

/// Solves the square system `a · x = b` via partial-pivot LU. Returns `None`
/// when the solution is not finite (singular or near-singular systems).
pub fn solve_linear_system(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n == 0 || a.ncols() != n || b.len() != n {
        return None;
    }
    let lhs = a.view().into_faer();
    let rhs = Mat::from_fn(n, 1, |i, _| b[i]);
    let lu = lhs.partial_piv_lu();
    let solved = lu.solve(&rhs);
    let x = Array1::from_iter((0..n).map(|i| *solved.get(i, 0)));
    if x.iter().all(|v| v.is_finite()) { Some(x) } else { None }
}
