//! Eager validation of system inputs.

use nalgebra::{DMatrix, DVector};

use crate::error::{MdofError, Result};

/// Validate the raw inputs of a [`super::System`].
///
/// Checks, in order:
/// - The mass matrix is square and non-empty
/// - The stiffness matrix and initial-condition vectors match its dimension
/// - Every input value is finite
/// - The mass matrix is diagonal with strictly positive entries
///
/// Symmetry of the stiffness matrix is a numerical property and is checked
/// during decomposition instead.
pub fn validate_inputs(
    mass: &DMatrix<f64>,
    stiffness: &DMatrix<f64>,
    alpha: f64,
    beta: f64,
    x0: &DVector<f64>,
    v0: &DVector<f64>,
) -> Result<()> {
    if !mass.is_square() {
        return Err(MdofError::NotSquare {
            what: "mass matrix",
            rows: mass.nrows(),
            cols: mass.ncols(),
        });
    }

    let n = mass.nrows();
    if n == 0 {
        return Err(MdofError::EmptySystem);
    }

    if !stiffness.is_square() {
        return Err(MdofError::NotSquare {
            what: "stiffness matrix",
            rows: stiffness.nrows(),
            cols: stiffness.ncols(),
        });
    }
    if stiffness.nrows() != n {
        return Err(MdofError::dimension("stiffness matrix", n, stiffness.nrows()));
    }
    if x0.len() != n {
        return Err(MdofError::dimension("initial displacement", n, x0.len()));
    }
    if v0.len() != n {
        return Err(MdofError::dimension("initial velocity", n, v0.len()));
    }

    let finite_checks: [(&'static str, bool); 6] = [
        ("mass matrix", mass.iter().all(|v| v.is_finite())),
        ("stiffness matrix", stiffness.iter().all(|v| v.is_finite())),
        ("alpha", alpha.is_finite()),
        ("beta", beta.is_finite()),
        ("initial displacement", x0.iter().all(|v| v.is_finite())),
        ("initial velocity", v0.iter().all(|v| v.is_finite())),
    ];
    if let Some((what, _)) = finite_checks.iter().find(|(_, ok)| !*ok) {
        return Err(MdofError::NonFiniteInput { what: *what });
    }

    for row in 0..n {
        for col in 0..n {
            let value = mass[(row, col)];
            if row != col && value != 0.0 {
                return Err(MdofError::NonDiagonalMass { row, col, value });
            }
        }
        let value = mass[(row, row)];
        if value <= 0.0 {
            return Err(MdofError::NonPositiveMass { index: row, value });
        }
    }

    Ok(())
}

/// Build a square matrix from nested rows, rejecting ragged input.
pub fn matrix_from_rows(what: &'static str, rows: &[Vec<f64>]) -> Result<DMatrix<f64>> {
    let n = rows.len();
    if let Some(row) = rows.iter().find(|row| row.len() != n) {
        return Err(MdofError::NotSquare {
            what,
            rows: n,
            cols: row.len(),
        });
    }
    Ok(DMatrix::from_fn(n, n, |i, j| rows[i][j]))
}

/// Validate a simulation horizon.
pub fn validate_horizon(horizon: f64) -> Result<()> {
    if horizon.is_finite() && horizon > 0.0 {
        Ok(())
    } else {
        Err(MdofError::InvalidHorizon { horizon })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_inputs() -> (DMatrix<f64>, DMatrix<f64>, DVector<f64>, DVector<f64>) {
        (
            DMatrix::from_diagonal(&DVector::from_vec(vec![1.0, 2.0])),
            DMatrix::from_row_slice(2, 2, &[2.0, -1.0, -1.0, 2.0]),
            DVector::from_vec(vec![1.0, 0.0]),
            DVector::zeros(2),
        )
    }

    #[test]
    fn test_valid_inputs() {
        let (m, k, x0, v0) = ok_inputs();
        assert!(validate_inputs(&m, &k, 0.1, 0.01, &x0, &v0).is_ok());
    }

    #[test]
    fn test_off_diagonal_mass_rejected() {
        let (_, k, x0, v0) = ok_inputs();
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 0.5, 0.0, 1.0]);
        let err = validate_inputs(&m, &k, 0.0, 0.0, &x0, &v0).unwrap_err();
        assert!(matches!(err, MdofError::NonDiagonalMass { row: 0, col: 1, .. }));
    }

    #[test]
    fn test_zero_mass_rejected() {
        let (_, k, x0, v0) = ok_inputs();
        let m = DMatrix::from_diagonal(&DVector::from_vec(vec![1.0, 0.0]));
        let err = validate_inputs(&m, &k, 0.0, 0.0, &x0, &v0).unwrap_err();
        assert!(matches!(err, MdofError::NonPositiveMass { index: 1, .. }));
    }

    #[test]
    fn test_vector_dimension_checked() {
        let (m, k, _, v0) = ok_inputs();
        let x0 = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let err = validate_inputs(&m, &k, 0.0, 0.0, &x0, &v0).unwrap_err();
        assert!(matches!(
            err,
            MdofError::DimensionMismatch {
                expected: 2,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_nan_rejected() {
        let (m, k, x0, v0) = ok_inputs();
        let err = validate_inputs(&m, &k, f64::NAN, 0.0, &x0, &v0).unwrap_err();
        assert!(matches!(err, MdofError::NonFiniteInput { what: "alpha" }));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let rows = vec![vec![1.0, 0.0], vec![0.0]];
        let err = matrix_from_rows("stiffness matrix", &rows).unwrap_err();
        assert!(matches!(err, MdofError::NotSquare { rows: 2, cols: 1, .. }));
    }

    #[test]
    fn test_horizon() {
        assert!(validate_horizon(1.0).is_ok());
        assert!(validate_horizon(0.0).is_err());
        assert!(validate_horizon(f64::INFINITY).is_err());
    }
}
