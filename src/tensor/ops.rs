//! # Tensor Operations
//!
//! Thin, shape-checked wrappers over `ndarray`. A dimension mismatch is
//! reported as [`TensorError::ShapeMismatch`] instead of a panic inside the
//! substrate.

use super::{Matrix, TensorError, Vector};
use ndarray::Axis;

/// Fails unless `a` and `b` have identical shapes.
pub fn ensure_same_shape(op: &'static str, a: &Matrix, b: &Matrix) -> Result<(), TensorError> {
    if a.shape() != b.shape() {
        return Err(TensorError::shape(op, a.shape(), b.shape()));
    }
    Ok(())
}

/// `a · b`, for `a: (N, K)` and `b: (K, M)`.
pub fn matmul(a: &Matrix, b: &Matrix) -> Result<Matrix, TensorError> {
    if a.ncols() != b.nrows() {
        return Err(TensorError::shape(
            "matmul",
            &[a.nrows(), b.nrows()],
            a.shape(),
        ));
    }
    Ok(a.dot(b))
}

/// `a · bᵗ`, for `a: (N, M)` and `b: (K, M)`.
pub fn matmul_t(a: &Matrix, b: &Matrix) -> Result<Matrix, TensorError> {
    if a.ncols() != b.ncols() {
        return Err(TensorError::shape(
            "matmul_t",
            &[a.nrows(), b.ncols()],
            a.shape(),
        ));
    }
    Ok(a.dot(&b.t()))
}

/// `aᵗ · b`, for `a: (N, K)` and `b: (N, M)`. Both share the batch axis.
pub fn t_matmul(a: &Matrix, b: &Matrix) -> Result<Matrix, TensorError> {
    if a.nrows() != b.nrows() {
        return Err(TensorError::shape(
            "t_matmul",
            &[a.nrows(), b.ncols()],
            b.shape(),
        ));
    }
    Ok(a.t().dot(b))
}

/// Adds `bias: (M,)` to every row of `x: (N, M)`.
pub fn add_bias(x: Matrix, bias: &Vector) -> Result<Matrix, TensorError> {
    if x.ncols() != bias.len() {
        return Err(TensorError::shape("add_bias", &[x.ncols()], bias.shape()));
    }
    Ok(x + bias)
}

/// Sum over the batch axis: `(N, M) -> (M,)`.
pub fn sum_batch(x: &Matrix) -> Vector {
    x.sum_axis(Axis(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    #[test]
    fn matmul_matches_hand_computation() {
        let a = arr2(&[[1.0, 2.0], [3.0, 4.0]]);
        let b = arr2(&[[5.0], [6.0]]);
        assert_eq!(matmul(&a, &b).unwrap(), arr2(&[[17.0], [39.0]]));
    }

    #[test]
    fn matmul_rejects_inner_dimension_mismatch() {
        let a = Matrix::zeros((2, 3));
        let b = Matrix::zeros((2, 4));
        let err = matmul(&a, &b).unwrap_err();
        assert_eq!(
            err,
            TensorError::ShapeMismatch {
                op: "matmul",
                expected: vec![2, 2],
                got: vec![2, 3],
            }
        );
    }

    #[test]
    fn transposed_products() {
        let a = arr2(&[[1.0, 2.0], [3.0, 4.0]]);
        let b = arr2(&[[1.0, 0.0], [0.0, 2.0]]);
        assert_eq!(matmul_t(&a, &b).unwrap(), arr2(&[[1.0, 4.0], [3.0, 8.0]]));
        assert_eq!(t_matmul(&a, &b).unwrap(), arr2(&[[1.0, 6.0], [2.0, 8.0]]));
        assert!(t_matmul(&a, &Matrix::zeros((3, 2))).is_err());
        assert!(matmul_t(&a, &Matrix::zeros((2, 3))).is_err());
    }

    #[test]
    fn bias_broadcasts_over_batch() {
        let x = Matrix::zeros((3, 2));
        let out = add_bias(x, &arr1(&[1.0, -1.0])).unwrap();
        assert_eq!(out, arr2(&[[1.0, -1.0], [1.0, -1.0], [1.0, -1.0]]));
        assert!(add_bias(Matrix::zeros((3, 2)), &arr1(&[1.0])).is_err());
    }

    #[test]
    fn sum_batch_reduces_axis_zero() {
        let x = arr2(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        assert_eq!(sum_batch(&x), arr1(&[9.0, 12.0]));
    }
}
