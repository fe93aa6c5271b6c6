//! # Tensor Module
//!
//! Array aliases, the crate-wide error type, and the small set of
//! shape-checked `ndarray` operations the layers are built from.

use ndarray::{Array1, Array2, Dimension};

// --- Submodules ---
pub mod init;
pub mod ops;

// --- Re-exports ---
pub use init::{Constant, Initializer, StandardNormal, Uniform};

// --- Error Handling ---
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TensorError {
    #[error("Shape mismatch in {op}: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        op: &'static str,
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    #[error("{layer}: backward called without a preceding forward")]
    UninitializedState { layer: &'static str },
    #[error("{layer}: forward called again before backward consumed the cached batch")]
    StaleState { layer: &'static str },
}

impl TensorError {
    pub(crate) fn shape(op: &'static str, expected: &[usize], got: &[usize]) -> Self {
        TensorError::ShapeMismatch {
            op,
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }
}

/// Element type of every array in the crate.
pub type TensorData = f64;

/// A batch of samples: axis 0 indexes the batch, axis 1 the features.
pub type Matrix = Array2<TensorData>;

/// A per-feature vector such as a bias.
pub type Vector = Array1<TensorData>;

// --- Helper functions ---

/// Largest absolute elementwise difference between two arrays of the same shape.
pub fn max_abs_diff<D: Dimension>(
    a: &ndarray::Array<TensorData, D>,
    b: &ndarray::Array<TensorData, D>,
) -> Result<TensorData, TensorError> {
    if a.shape() != b.shape() {
        return Err(TensorError::shape("max_abs_diff", a.shape(), b.shape()));
    }
    Ok(a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, TensorData::max))
}

/// Whether `a` and `b` have the same shape and agree elementwise within `tolerance`.
///
/// NaN never compares close, not even to itself.
pub fn all_close<D: Dimension>(
    a: &ndarray::Array<TensorData, D>,
    b: &ndarray::Array<TensorData, D>,
    tolerance: TensorData,
) -> bool {
    a.shape() == b.shape()
        && a
            .iter()
            .zip(b.iter())
            .all(|(x, y)| (x - y).abs() <= tolerance)
}

/// Whether every element is finite (no NaN or infinity).
pub fn is_finite<D: Dimension>(a: &ndarray::Array<TensorData, D>) -> bool {
    a.iter().all(|v| v.is_finite())
}
