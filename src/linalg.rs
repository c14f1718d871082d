//! Linalg
//!
//! 3 x 3 moment matrices of the 2SLS estimator on the nalgebra backend.
//!
//! ## Design notes
//!
//! * Rows and columns are equilibrated before the rank check, so the units of a
//!   regressor or instrument never decide whether a design counts as singular.
//! * The rank check uses the singular values of the equilibrated matrix.
use nalgebra::{Matrix3, Vector3};

/// Reciprocal condition number (smallest over largest singular value of the
/// equilibrated matrix) below which a matrix is treated as singular.
pub const RCOND_TOLERANCE: f64 = 1e-12;

/// Sum of weighted outer products `sum_i w_i * a_i * b_i^T`.
pub fn cross_product<'a, I>(columns: I) -> Matrix3<f64>
where
    I: IntoIterator<Item = (&'a Vector3<f64>, &'a Vector3<f64>, f64)>,
{
    columns
        .into_iter()
        .fold(Matrix3::zeros(), |m, (a, b, w)| m + (a * b.transpose()) * w)
}

/// Invert `a` after scaling its rows and columns to unit max-norm.
///
/// Returns `None` when `a` has non-finite entries, a zero row or column, or a
/// reciprocal condition number (after equilibration) below [`RCOND_TOLERANCE`].
pub fn equilibrated_inverse(a: &Matrix3<f64>) -> Option<Matrix3<f64>> {
    if a.iter().any(|v| !v.is_finite()) {
        return None;
    }
    // a = R * scaled * C with diagonal R and C.
    let r = Vector3::from_fn(|i, _| a.row(i).amax());
    if r.iter().any(|v| *v == 0.0) {
        return None;
    }
    let row_scaled = Matrix3::from_fn(|i, j| a[(i, j)] / r[i]);
    let c = Vector3::from_fn(|j, _| row_scaled.column(j).amax());
    if c.iter().any(|v| *v == 0.0) {
        return None;
    }
    let scaled = Matrix3::from_fn(|i, j| row_scaled[(i, j)] / c[j]);

    let singular_values = scaled.singular_values();
    if singular_values.min() <= RCOND_TOLERANCE * singular_values.max() {
        return None;
    }
    let scaled_inv = scaled.try_inverse()?;
    // a^-1 = C^-1 * scaled^-1 * R^-1
    Some(Matrix3::from_fn(|i, j| scaled_inv[(i, j)] / (c[i] * r[j])))
}

/// Row-major array view of a 3 x 3 matrix.
pub fn to_rows(m: &Matrix3<f64>) -> [[f64; 3]; 3] {
    [
        [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
        [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
        [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
    ]
}
