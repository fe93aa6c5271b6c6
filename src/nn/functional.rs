//! # Neural Network Functional Interface (`nn::functional`)
//!
//! Stateless elementwise functions. The layer modules cache what these need
//! and call them from `forward`/`backward`.

use crate::tensor::{ops, Matrix, TensorData, TensorError};

/// Logistic function `1 / (1 + exp(-x))`.
///
/// Branches on the sign of `x` so `exp` is only ever evaluated on a
/// non-positive argument and cannot overflow.
pub fn sigmoid_scalar(x: TensorData) -> TensorData {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Applies the Sigmoid function element-wise.
pub fn sigmoid(input: &Matrix) -> Matrix {
    input.mapv(sigmoid_scalar)
}

/// Gradient of the sigmoid given its own output: `dout * out * (1 - out)`.
pub fn sigmoid_backward(out: &Matrix, dout: &Matrix) -> Result<Matrix, TensorError> {
    ops::ensure_same_shape("sigmoid_backward", out, dout)?;
    let mut dx = out.mapv(|y| y * (1.0 - y));
    dx *= dout;
    Ok(dx)
}
