//! Dense linear-algebra primitives used by the modal solver.
//!
//! Thin wrappers over [`nalgebra`] that add the domain checks the solver
//! relies on: diagonal square roots that reject negative entries, a
//! reciprocal square root that maps zero to zero, and a symmetric
//! eigen-decomposition with a deterministic (ascending) mode ordering.
//!
//! None of these functions mutate their arguments.

use nalgebra::{DMatrix, DVector};

use crate::error::{MdofError, Result};

/// Eigenvalues and unit-norm eigenvectors of a symmetric matrix.
#[derive(Debug, Clone)]
pub struct SymmetricEigen {
    /// Eigenvalues in ascending order
    pub eigenvalues: DVector<f64>,
    /// Unit-norm eigenvectors stored as columns, in the same order
    pub eigenvectors: DMatrix<f64>,
}

/// Element-wise square root of the diagonal of `m`.
///
/// Off-diagonal entries of the result are zero.
pub fn diag_sqrt(m: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let mut diag = m.diagonal();
    for (index, value) in diag.iter_mut().enumerate() {
        if *value < 0.0 {
            return Err(MdofError::NegativeSqrt {
                stage: "mass square root",
                index,
                value: *value,
            });
        }
        *value = value.sqrt();
    }
    Ok(DMatrix::from_diagonal(&diag))
}

/// Element-wise reciprocal square root of the diagonal of `m`.
///
/// A zero diagonal entry maps to `0` rather than infinity, so unused
/// degrees of freedom drop out of the transform instead of poisoning it.
pub fn diag_inv_sqrt(m: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let mut diag = m.diagonal();
    for (index, value) in diag.iter_mut().enumerate() {
        if *value < 0.0 {
            return Err(MdofError::NegativeSqrt {
                stage: "mass inverse square root",
                index,
                value: *value,
            });
        }
        *value = if *value == 0.0 { 0.0 } else { value.sqrt().recip() };
    }
    Ok(DMatrix::from_diagonal(&diag))
}

/// Check that `m` is square and symmetric to within `tolerance`, relative
/// to its largest absolute entry.
pub fn check_symmetric(m: &DMatrix<f64>, tolerance: f64, stage: &'static str) -> Result<()> {
    if !m.is_square() {
        return Err(MdofError::NotSquare {
            what: stage,
            rows: m.nrows(),
            cols: m.ncols(),
        });
    }

    let scale = m.amax().max(f64::MIN_POSITIVE);
    let n = m.nrows();
    for i in 0..n {
        for j in (i + 1)..n {
            let deviation = (m[(i, j)] - m[(j, i)]).abs();
            if deviation > tolerance * scale || deviation.is_nan() {
                return Err(MdofError::AsymmetricMatrix {
                    stage,
                    row: i,
                    col: j,
                    deviation,
                });
            }
        }
    }
    Ok(())
}

/// Eigen-decompose a symmetric matrix.
///
/// Eigenpairs are sorted by ascending eigenvalue and every eigenvector is
/// rescaled to unit Euclidean norm. Fails with a domain error if `w` is not
/// symmetric or the decomposition produces a non-finite value.
pub fn symmetric_eigendecompose(w: &DMatrix<f64>, tolerance: f64) -> Result<SymmetricEigen> {
    check_symmetric(w, tolerance, "stiffness operator")?;

    let eigen = w.clone().symmetric_eigen();
    if !all_finite(eigen.eigenvalues.as_slice()) || !all_finite(eigen.eigenvectors.as_slice()) {
        return Err(MdofError::non_finite("eigen-decomposition"));
    }

    let n = eigen.eigenvalues.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));

    let eigenvalues = DVector::from_iterator(n, order.iter().map(|&k| eigen.eigenvalues[k]));
    let eigenvectors =
        normalize_columns(&DMatrix::from_fn(n, n, |i, j| eigen.eigenvectors[(i, order[j])]));

    Ok(SymmetricEigen {
        eigenvalues,
        eigenvectors,
    })
}

/// Rescale every column of `m` to unit Euclidean norm.
///
/// Zero columns are left untouched.
pub fn normalize_columns(m: &DMatrix<f64>) -> DMatrix<f64> {
    let mut out = m.clone();
    for mut column in out.column_iter_mut() {
        let norm = column.norm();
        if norm > 0.0 {
            column /= norm;
        }
    }
    out
}

/// Largest absolute deviation of `m` from the identity matrix.
pub fn identity_deviation(m: &DMatrix<f64>) -> f64 {
    let identity = DMatrix::<f64>::identity(m.nrows(), m.ncols());
    (m - identity).amax()
}

/// True if every value is finite.
pub fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}
